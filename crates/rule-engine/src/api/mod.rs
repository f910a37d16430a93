//! REST API 层
//!
//! 基于 axum 暴露规则的管理、解析、组合与评估端点。

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;

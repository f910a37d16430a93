//! 路由配置模块
//!
//! 定义规则引擎 REST API 端点的路由映射

use axum::{
    Router, middleware,
    routing::{get, post},
};
use rule_shared::observability::middleware as obs_middleware;

use super::{handlers, state::AppState};

/// 构建规则管理相关的路由
pub fn rule_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route("/rules/parse", post(handlers::parse_rule))
        .route("/rules/combine", post(handlers::combine_rules))
        .route("/rules/evaluate", post(handlers::evaluate_rule))
        .route("/rules/stats", get(handlers::rule_stats))
        .route(
            "/rules/{id}",
            get(handlers::get_rule).delete(handlers::delete_rule),
        )
}

/// 构建完整的应用路由，挂载 `/api` 前缀与可观测性中间件
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", rule_routes())
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

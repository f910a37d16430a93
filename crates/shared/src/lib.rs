//! 共享库
//!
//! 规则引擎服务共用的配置加载和可观测性基础设施。

pub mod config;
pub mod observability;

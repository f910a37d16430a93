//! 规则引擎服务
//!
//! 提供 REST 接口的规则解析、组合与评估服务。

use anyhow::Result;
use axum::http::HeaderValue;
use rule_engine::api::{self, AppState};
use rule_engine::RuleStore;
use rule_shared::config::AppConfig;
use rule_shared::observability;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load("rule-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting rule-engine service...");

    let store = RuleStore::new();
    info!("Rule store initialized");

    let state = AppState::new(store);

    let app = api::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("HTTP server listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// CORS 配置：通过 RULES_CORS_ORIGINS 环境变量控制允许的来源，默认允许全部
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let allowed_origins = std::env::var("RULES_CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    if allowed_origins == "*" {
        if config.is_production() {
            warn!("RULES_CORS_ORIGINS=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 监听关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

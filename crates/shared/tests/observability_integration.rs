//! 共享基础设施集成测试
//!
//! 测试配置分层加载、指标记录和 HTTP 中间件。

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use rule_shared::observability::metrics::{
        record_http_request, record_rule_combine, record_rule_evaluation, record_rule_parse,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/rules", 200, 0.05);
        record_http_request("POST", "/api/rules", 201, 0.12);
        record_http_request("DELETE", "/api/rules/{id}", 404, 0.01);
        record_http_request("POST", "/api/rules/evaluate", 400, 0.02);
    }

    #[test]
    fn test_record_rule_metrics() {
        record_rule_parse("ok");
        record_rule_parse("STACK_UNDERFLOW");
        record_rule_combine(0, "EMPTY_RULE_SET");
        record_rule_combine(5, "ok");
        record_rule_evaluation("matched", 0.001);
        record_rule_evaluation("not_matched", 0.002);
        record_rule_evaluation("MISSING_FIELD", 0.0005);
    }

    #[test]
    fn test_metrics_with_edge_cases() {
        record_http_request("", "", 0, 0.0);

        let long_path = "/api/".to_string() + &"x".repeat(1000);
        record_http_request("GET", &long_path, 200, 0.01);

        record_rule_evaluation("matched", 999.99);
    }
}

// ============================================================================
// 中间件测试
// ============================================================================

mod middleware_tests {
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use rule_shared::observability::middleware::{
        REQUEST_ID_HEADER, RequestId, http_tracing, request_id,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/echo",
                get(|axum::Extension(id): axum::Extension<RequestId>| async move {
                    id.as_str().to_string()
                }),
            )
            .layer(middleware::from_fn(http_tracing))
            .layer(middleware::from_fn(request_id))
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header(REQUEST_ID_HEADER, "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"req-123");
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = app()
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&header).is_ok());
    }

    #[test]
    fn test_request_id_debug() {
        let id = RequestId("debug-test".to_string());
        assert!(format!("{:?}", id).contains("debug-test"));
    }
}

// ============================================================================
// 配置测试
// ============================================================================

mod config_tests {
    use rule_shared::config::AppConfig;
    use std::fs;

    #[test]
    fn test_layered_loading() {
        let dir = std::env::temp_dir().join(format!("rule-shared-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        fs::write(
            dir.join("default.toml"),
            "[server]\nport = 4000\n\n[observability]\nlog_level = \"warn\"\nmetrics_enabled = false\n",
        )
        .unwrap();
        fs::write(
            dir.join("staging.toml"),
            "[observability]\nlog_format = \"json\"\n",
        )
        .unwrap();
        fs::write(
            dir.join("rule-engine.toml"),
            "[server]\nhost = \"127.0.0.1\"\n",
        )
        .unwrap();

        // SAFETY: 本测试文件中只有这一个测试修改环境变量
        unsafe {
            std::env::set_var("CONFIG_DIR", &dir);
            std::env::set_var("RULES_ENV", "staging");
            std::env::set_var("RULES_OBSERVABILITY__METRICS_PORT", "9191");
        }

        let config = AppConfig::load("rule-engine").unwrap();

        assert_eq!(config.service_name, "rule-engine");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.server_addr(), "127.0.0.1:4000");
        assert_eq!(config.observability.log_level, "warn");
        assert!(config.observability.json_logs());
        assert!(!config.observability.metrics_enabled);
        assert_eq!(config.observability.metrics_port, 9191);
        assert_eq!(config.observability.service_name, "rule-engine");

        // 服务端口变量覆盖所有文件配置
        unsafe {
            std::env::set_var("RULE_ENGINE_PORT", "5050");
        }
        let config = AppConfig::load("rule-engine").unwrap();
        assert_eq!(config.server.port, 5050);

        unsafe {
            std::env::remove_var("CONFIG_DIR");
            std::env::remove_var("RULES_ENV");
            std::env::remove_var("RULES_OBSERVABILITY__METRICS_PORT");
            std::env::remove_var("RULE_ENGINE_PORT");
        }
        let _ = fs::remove_dir_all(&dir);
    }
}

// ============================================================================
// Guard 测试
// ============================================================================

mod guard_tests {
    use rule_shared::observability::ObservabilityGuard;

    #[test]
    fn test_empty_guard() {
        for _ in 0..10 {
            let guard = ObservabilityGuard::empty();
            drop(guard);
        }
    }
}

//! 规则引擎错误到 HTTP 响应的映射

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::RuleError;

impl RuleError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RuleNotFound(_) => StatusCode::NOT_FOUND,
            // 解析、组合、评估错误都是确定性的请求问题，不可重试
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for RuleError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl IntoResponse for RuleError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::warn!(code = self.code(), error = %self, "请求处理失败");

        let body = json!({
            "success": false,
            "code": self.code(),
            "message": self.to_string(),
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

//! HTTP 请求/响应 DTO

use crate::models::EvaluationResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

/// API 统一响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（无数据）
    pub fn success_empty() -> ApiResponse<()> {
        ApiResponse {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: None,
        }
    }
}

/// 创建规则请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleRequest {
    #[validate(
        length(min = 1, max = 100, message = "规则名称长度必须在1-100个字符之间"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "规则描述不能超过500个字符"))]
    pub description: String,
    pub rule_string: String,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("规则名称不能为空".into()));
    }
    Ok(())
}

/// 解析规则文本请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRuleRequest {
    pub rule_string: String,
}

/// 组合规则请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineRulesRequest {
    pub rule_ids: Vec<String>,
}

/// 评估请求
///
/// `ast` 与 `ruleId` 二选一：直接评估传入的 AST，或评估已存储的规则。
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_evaluate_request"))]
pub struct EvaluateRequest {
    pub ast: Option<Value>,
    pub rule_id: Option<String>,
    pub data: Value,
    #[serde(default)]
    pub trace: bool,
}

fn validate_evaluate_request(req: &EvaluateRequest) -> Result<(), ValidationError> {
    match (&req.ast, &req.rule_id) {
        (Some(_), Some(_)) => {
            return Err(ValidationError::new("target")
                .with_message("ast 和 ruleId 只能指定其中一个".into()));
        }
        (None, None) => {
            return Err(ValidationError::new("target").with_message("必须指定 ast 或 ruleId".into()));
        }
        _ => {}
    }

    if !req.data.is_object() {
        return Err(ValidationError::new("data").with_message("data 必须是 JSON 对象".into()));
    }

    Ok(())
}

/// 评估响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub matched_conditions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_ms: i64,
}

impl From<EvaluationResult> for EvaluateResponse {
    fn from(result: EvaluationResult) -> Self {
        Self {
            result: result.matched,
            rule_id: result.rule_id,
            matched_conditions: result.matched_conditions,
            evaluation_trace: result.evaluation_trace,
            evaluation_time_ms: result.evaluation_time_ms,
        }
    }
}

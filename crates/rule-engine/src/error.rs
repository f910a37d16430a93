//! 规则引擎错误类型
//!
//! 解析期：`EmptyInput` / `MalformedExpression` / `StackUnderflow`；
//! 组合期：`EmptyRuleSet`；
//! 评估期：`MissingField` / `TypeMismatch` / `InvalidNode`。
//! 所有错误都是确定性的，不做内部重试。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则文本为空")]
    EmptyInput,

    #[error("规则表达式格式错误 (位置 {position}): {reason}")]
    MalformedExpression { reason: String, position: usize },

    #[error("操作数不足: 操作符 '{token}' (位置 {position}) 缺少操作数")]
    StackUnderflow { token: String, position: usize },

    #[error("待组合的规则列表为空")]
    EmptyRuleSet,

    #[error("字段不存在: {0}")]
    MissingField(String),

    #[error("类型不匹配: {field} {operator} 期望 {expected}, 实际 {actual}")]
    TypeMismatch {
        operator: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("无效的表达式节点: {0}")]
    InvalidNode(String),

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;

impl RuleError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::MalformedExpression { .. } => "MALFORMED_EXPRESSION",
            Self::StackUnderflow { .. } => "STACK_UNDERFLOW",
            Self::EmptyRuleSet => "EMPTY_RULE_SET",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::InvalidNode(_) => "INVALID_NODE",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// 是否为规则文本解析阶段的错误
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::MalformedExpression { .. } | Self::StackUnderflow { .. }
        )
    }

    /// 是否为评估阶段的错误
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::TypeMismatch { .. } | Self::InvalidNode(_)
        )
    }

    pub(crate) fn malformed(reason: impl Into<String>, position: usize) -> Self {
        Self::MalformedExpression {
            reason: reason.into(),
            position,
        }
    }
}

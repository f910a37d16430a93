//! 规则操作符定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 比较操作符
///
/// 序列化形式即规则文本中的符号，如 `">="`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
}

impl ComparisonOperator {
    /// 从规则 token 识别比较操作符
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            "=" => Some(Self::Eq),
            ">=" => Some(Self::Gte),
            "<=" => Some(Self::Lte),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }

    /// 是否为排序比较（需要两侧可排序）
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Self::Eq)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 逻辑操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// 从规则 token 识别逻辑操作符（区分大小写）
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    /// 应用到两个已求值的子结果
    pub fn apply(&self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left && right,
            Self::Or => left || right,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

//! 规则引擎领域模型

use crate::error::{Result, RuleError};
use crate::operators::{ComparisonOperator, LogicalOperator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// 规则定义：一个具名的 AST 持有者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ast: ExpressionNode,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(name: impl Into<String>, description: impl Into<String>, ast: ExpressionNode) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            ast,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 比较节点中的字面量
///
/// 解析时即确定类型，序列化时保留类型标签，避免重新加载后按字符串重新推断。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl Literal {
    /// 将原始 token 解析为最窄的字面量类型：数值 > 布尔关键字 > 字符串
    pub fn resolve(token: &str) -> Self {
        if let Ok(n) = token.parse::<f64>() {
            if n.is_finite() {
                return Self::Number(n);
            }
        }

        match token {
            "true" => Self::Boolean(true),
            "false" => Self::Boolean(false),
            _ => Self::String(token.to_string()),
        }
    }

    /// 获取类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// 表达式树允许的最大深度（单个比较节点深度为 1）
///
/// 该深度下的树序列化为 JSON 后嵌套层数仍低于 serde_json 的解析上限，
/// 解析结果可以原样作为 AST 提交评估。
pub const MAX_DEPTH: usize = 100;

/// 表达式节点
///
/// 逻辑节点独占左右子树；比较节点持有字段名和已解析的字面量。
/// 节点构造完成后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpressionNode {
    Operator {
        operator: LogicalOperator,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },
    Comparison {
        operator: ComparisonOperator,
        field: String,
        value: Literal,
    },
}

impl ExpressionNode {
    pub fn comparison(
        field: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<Literal>,
    ) -> Self {
        Self::Comparison {
            operator,
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn logical(operator: LogicalOperator, left: Self, right: Self) -> Self {
        Self::Operator {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::logical(LogicalOperator::And, left, right)
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::logical(LogicalOperator::Or, left, right)
    }

    /// 从 JSON 解码节点，结构不合法时返回 `InvalidNode`
    pub fn from_json_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| RuleError::InvalidNode(e.to_string()))
    }

    /// 比较节点数量
    pub fn comparison_count(&self) -> usize {
        match self {
            Self::Operator { left, right, .. } => left.comparison_count() + right.comparison_count(),
            Self::Comparison { .. } => 1,
        }
    }

    /// 树深度（单个比较节点深度为 1）
    pub fn depth(&self) -> usize {
        match self {
            Self::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
            Self::Comparison { .. } => 1,
        }
    }
}

/// 以后缀形式输出，例如 `age 18 >= income 50000 < AND`
impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator {
                operator,
                left,
                right,
            } => write!(f, "{} {} {}", left, right, operator),
            Self::Comparison {
                operator,
                field,
                value,
            } => write!(f, "{} {} {}", field, value, operator),
        }
    }
}

/// 评估输入记录 - 字段名到动态类型值的映射
#[derive(Debug, Clone)]
pub struct Record {
    data: Value,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            data: Value::Object(serde_json::Map::new()),
        }
    }
}

impl Record {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// 从 JSON 对象创建
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let data: Value = serde_json::from_str(json)?;
        Ok(Self { data })
    }

    /// 获取字段值
    ///
    /// 优先按完整字段名查找；找不到且字段名含 `.` 时按嵌套路径查找
    /// （如 "user.profile.age" 或 "items.0.name"）。`null` 视为缺失。
    pub fn get_field(&self, field: &str) -> Option<&Value> {
        let found = match self.data.get(field) {
            Some(v) => Some(v),
            None if field.contains('.') => self.get_path(field),
            None => None,
        };

        found.filter(|v| !v.is_null())
    }

    fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.data;

        for part in path.split('.') {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    current = arr.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    /// 获取底层数据
    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let map: serde_json::Map<String, Value> =
            iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            data: Value::Object(map),
        }
    }
}

/// 评估结果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub matched_conditions: Vec<String>,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_ms: i64,
}

impl EvaluationResult {
    pub fn for_rule(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: Some(rule_id.into()),
            ..Default::default()
        }
    }
}

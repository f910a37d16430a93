//! 条件评估器
//!
//! 比较语义：
//! - `=` 严格比较类型和值，数值 30 与字符串 "30" 永不相等，不做任何类型转换；
//! - `>` `<` `>=` `<=` 要求两侧同为数值（按数值比较）或同为字符串（按字典序比较），
//!   否则返回 `TypeMismatch`。

use crate::error::{Result, RuleError};
use crate::models::{ExpressionNode, Literal, MAX_DEPTH, Record};
use crate::operators::ComparisonOperator;
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// 对记录评估表达式树
///
/// 逻辑节点总是评估左右两个子节点，任一子节点的错误都会被报告。
/// 深度超过 [`MAX_DEPTH`] 的树返回 `InvalidNode`。
pub fn evaluate(node: &ExpressionNode, record: &Record) -> Result<bool> {
    evaluate_at(node, record, 1)
}

fn evaluate_at(node: &ExpressionNode, record: &Record, depth: usize) -> Result<bool> {
    if depth > MAX_DEPTH {
        return Err(depth_exceeded());
    }

    match node {
        ExpressionNode::Operator {
            operator,
            left,
            right,
        } => {
            let left = evaluate_at(left, record, depth + 1)?;
            let right = evaluate_at(right, record, depth + 1)?;
            Ok(operator.apply(left, right))
        }
        ExpressionNode::Comparison {
            operator,
            field,
            value,
        } => ConditionEvaluator::evaluate(field, record.get_field(field), *operator, value),
    }
}

pub(crate) fn depth_exceeded() -> RuleError {
    RuleError::InvalidNode(format!("表达式深度超过上限 {}", MAX_DEPTH))
}

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 评估单个比较
    ///
    /// # Arguments
    /// * `field` - 字段名（用于错误信息）
    /// * `field_value` - 从记录中获取的字段值，`None` 表示缺失
    /// * `operator` - 比较操作符
    /// * `expected` - 规则中的字面量
    pub fn evaluate(
        field: &str,
        field_value: Option<&Value>,
        operator: ComparisonOperator,
        expected: &Literal,
    ) -> Result<bool> {
        Self::check_node(field, expected)?;

        let actual = field_value.ok_or_else(|| RuleError::MissingField(field.to_string()))?;

        match operator {
            ComparisonOperator::Eq => Ok(Self::strict_eq(actual, expected)),
            _ => {
                let ordering = Self::compare(field, operator, actual, expected)?;
                Ok(Self::matches_ordering(operator, ordering))
            }
        }
    }

    /// 校验比较节点的构造不变量
    fn check_node(field: &str, expected: &Literal) -> Result<()> {
        if field.is_empty() {
            return Err(RuleError::InvalidNode("比较节点的字段名为空".to_string()));
        }

        if let Literal::Number(n) = expected {
            if !n.is_finite() {
                return Err(RuleError::InvalidNode(format!(
                    "字段 '{}' 的数值字面量无效: {}",
                    field, n
                )));
            }
        }

        Ok(())
    }

    /// 严格相等：类型不同即不相等
    fn strict_eq(actual: &Value, expected: &Literal) -> bool {
        match (actual, expected) {
            (Value::Number(n), Literal::Number(m)) => {
                Self::compare_numbers(n, *m) == Some(Ordering::Equal)
            }
            (Value::String(s), Literal::String(t)) => s == t,
            (Value::Bool(b), Literal::Boolean(c)) => b == c,
            _ => false,
        }
    }

    /// 排序比较，返回 actual 相对 expected 的顺序
    fn compare(
        field: &str,
        operator: ComparisonOperator,
        actual: &Value,
        expected: &Literal,
    ) -> Result<Ordering> {
        let ordering = match (actual, expected) {
            (Value::Number(n), Literal::Number(m)) => Self::compare_numbers(n, *m),
            (Value::String(s), Literal::String(t)) => Some(s.as_str().cmp(t.as_str())),
            _ => None,
        };

        ordering.ok_or_else(|| RuleError::TypeMismatch {
            operator: operator.to_string(),
            field: field.to_string(),
            expected: match expected {
                Literal::Boolean(_) => "number or string".to_string(),
                other => other.type_name().to_string(),
            },
            actual: Self::type_name(actual).to_string(),
        })
    }

    /// 数值比较
    ///
    /// 记录中的整数与整数值字面量按整数精确比较，超过 2^53 的整数不会因转换为 f64 而被舍入；
    /// 其余情况按 f64 比较。
    fn compare_numbers(actual: &Number, expected: f64) -> Option<Ordering> {
        let integer = actual
            .as_i64()
            .map(i128::from)
            .or_else(|| actual.as_u64().map(i128::from));

        match integer {
            Some(i) if expected.fract() == 0.0 && expected.abs() < i128::MAX as f64 => {
                Some(i.cmp(&(expected as i128)))
            }
            _ => actual.as_f64().and_then(|n| n.partial_cmp(&expected)),
        }
    }

    fn matches_ordering(operator: ComparisonOperator, ordering: Ordering) -> bool {
        match operator {
            ComparisonOperator::Gt => ordering == Ordering::Greater,
            ComparisonOperator::Gte => ordering != Ordering::Less,
            ComparisonOperator::Lt => ordering == Ordering::Less,
            ComparisonOperator::Lte => ordering != Ordering::Greater,
            ComparisonOperator::Eq => ordering == Ordering::Equal,
        }
    }

    /// 获取值的类型名称
    pub fn type_name(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

//! 规则编译器
//!
//! 校验规则 AST 的构造不变量，并预提取规则读取的字段集合。
//! 从文本解析得到的 AST 天然满足不变量；从 JSON 反序列化得到的 AST 需要在此校验。

use crate::error::{Result, RuleError};
use crate::models::{ExpressionNode, Literal, MAX_DEPTH, Rule};
use std::collections::HashSet;

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 原始规则
    pub rule: Rule,
    /// 规则中使用的所有字段
    pub required_fields: HashSet<String>,
    /// 编译版本号
    pub compile_version: u64,
}

impl CompiledRule {
    pub fn id(&self) -> &str {
        &self.rule.id
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn root(&self) -> &ExpressionNode {
        &self.rule.ast
    }
}

/// 规则编译器
#[derive(Debug, Default)]
pub struct RuleCompiler {
    compile_version: u64,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self { compile_version: 0 }
    }

    /// 从 JSON 字符串编译规则
    pub fn compile_from_json(&mut self, json: &str) -> Result<CompiledRule> {
        let rule: Rule = serde_json::from_str(json)?;
        self.compile(rule)
    }

    /// 编译规则
    pub fn compile(&mut self, rule: Rule) -> Result<CompiledRule> {
        if rule.id.is_empty() {
            return Err(RuleError::Validation("规则 ID 不能为空".to_string()));
        }

        validate_node(&rule.ast, "root")?;

        let mut required_fields = HashSet::new();
        collect_fields(&rule.ast, &mut required_fields);

        self.compile_version += 1;

        Ok(CompiledRule {
            rule,
            required_fields,
            compile_version: self.compile_version,
        })
    }
}

/// 校验节点不变量：字段名非空、数值字面量有限、深度不超过 [`MAX_DEPTH`]
pub fn validate_node(node: &ExpressionNode, path: &str) -> Result<()> {
    validate_at(node, path, 1)
}

fn validate_at(node: &ExpressionNode, path: &str, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(RuleError::InvalidNode(format!(
            "节点 '{}' 超过最大深度 {}",
            path, MAX_DEPTH
        )));
    }

    match node {
        ExpressionNode::Operator { left, right, .. } => {
            validate_at(left, &format!("{}.left", path), depth + 1)?;
            validate_at(right, &format!("{}.right", path), depth + 1)
        }
        ExpressionNode::Comparison { field, value, .. } => {
            if field.is_empty() {
                return Err(RuleError::InvalidNode(format!(
                    "节点 '{}' 的字段名为空",
                    path
                )));
            }

            if let Literal::Number(n) = value {
                if !n.is_finite() {
                    return Err(RuleError::InvalidNode(format!(
                        "节点 '{}' 的数值字面量无效: {}",
                        path, n
                    )));
                }
            }

            Ok(())
        }
    }
}

fn collect_fields(node: &ExpressionNode, fields: &mut HashSet<String>) {
    match node {
        ExpressionNode::Operator { left, right, .. } => {
            collect_fields(left, fields);
            collect_fields(right, fields);
        }
        ExpressionNode::Comparison { field, .. } => {
            fields.insert(field.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::ComparisonOperator;
    use crate::parser::parse;

    #[test]
    fn test_compile_extracts_fields() {
        let rule = Rule::new("r", "", parse("age 18 >= income 50000 < AND age 65 < AND").unwrap());
        let compiled = RuleCompiler::new().compile(rule).unwrap();

        assert_eq!(compiled.required_fields.len(), 2);
        assert!(compiled.required_fields.contains("age"));
        assert!(compiled.required_fields.contains("income"));
    }

    #[test]
    fn test_compile_version_increments() {
        let mut compiler = RuleCompiler::new();
        let node = parse("age 1 >").unwrap();
        let first = compiler.compile(Rule::new("a", "", node.clone())).unwrap();
        let second = compiler.compile(Rule::new("b", "", node)).unwrap();
        assert_eq!(first.compile_version, 1);
        assert_eq!(second.compile_version, 2);
    }

    #[test]
    fn test_compile_rejects_empty_field() {
        let ast = ExpressionNode::and(
            ExpressionNode::comparison("age", ComparisonOperator::Gt, 1),
            ExpressionNode::comparison("", ComparisonOperator::Eq, "x"),
        );
        let err = RuleCompiler::new().compile(Rule::new("r", "", ast)).unwrap_err();
        match err {
            RuleError::InvalidNode(msg) => assert!(msg.contains("root.right")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_compile_rejects_over_deep_ast() {
        let mut ast = ExpressionNode::comparison("f", ComparisonOperator::Gt, 0);
        for _ in 0..MAX_DEPTH {
            ast = ExpressionNode::and(ast, ExpressionNode::comparison("f", ComparisonOperator::Gt, 0));
        }

        let err = RuleCompiler::new().compile(Rule::new("r", "", ast)).unwrap_err();
        assert!(matches!(err, RuleError::InvalidNode(ref msg) if msg.contains("root.left")));
    }

    #[test]
    fn test_compile_from_json() {
        let json = r#"
        {
            "id": "rule-001",
            "name": "adult",
            "ast": {
                "type": "comparison",
                "operator": ">=",
                "field": "age",
                "value": {"type": "number", "value": 18}
            }
        }
        "#;

        let compiled = RuleCompiler::new().compile_from_json(json).unwrap();
        assert_eq!(compiled.id(), "rule-001");
        assert_eq!(compiled.name(), "adult");
        assert_eq!(compiled.rule.description, "");
    }

    #[test]
    fn test_compile_rejects_empty_id() {
        let mut rule = Rule::new("r", "", parse("age 1 >").unwrap());
        rule.id.clear();
        assert!(matches!(
            RuleCompiler::new().compile(rule),
            Err(RuleError::Validation(_))
        ));
    }
}

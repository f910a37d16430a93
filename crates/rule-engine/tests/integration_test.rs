//! 规则引擎集成测试
//!
//! 测试规则文本解析、组合、存储、评估的完整工作流。

use rule_engine::{
    ComparisonOperator, ExpressionNode, Literal, LogicalOperator, MAX_DEPTH, Record, RuleError,
    RuleExecutor, RuleStore, combine, evaluate, parse,
};
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    Record::new(value)
}

/// 创建测试记录：模拟一个申请人
fn create_applicant() -> Record {
    record(json!({
        "age": 32,
        "income": 42000,
        "status": "active",
        "verified": true,
        "profile": {
            "country": "CN",
            "score": 710
        }
    }))
}

mod parsing {
    use super::*;

    #[test]
    fn test_single_comparison_structure() {
        let node = parse("age 30 >").unwrap();

        assert_eq!(
            node,
            ExpressionNode::Comparison {
                operator: ComparisonOperator::Gt,
                field: "age".to_string(),
                value: Literal::Number(30.0),
            }
        );
    }

    #[test]
    fn test_nested_structure() {
        let node = parse("age 18 >= income 50000 < AND").unwrap();

        assert_eq!(
            node,
            ExpressionNode::and(
                ExpressionNode::comparison("age", ComparisonOperator::Gte, 18),
                ExpressionNode::comparison("income", ComparisonOperator::Lt, 50000),
            )
        );
    }

    #[test]
    fn test_literal_resolution() {
        let node = parse("verified true =").unwrap();
        assert!(matches!(
            node,
            ExpressionNode::Comparison { value: Literal::Boolean(true), .. }
        ));

        // 大小写敏感：TRUE 是字符串
        let node = parse("verified TRUE =").unwrap();
        assert!(matches!(
            node,
            ExpressionNode::Comparison { value: Literal::String(ref s), .. } if s == "TRUE"
        ));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(parse(""), Err(RuleError::EmptyInput)));
        assert!(matches!(parse("   \t\n"), Err(RuleError::EmptyInput)));
        assert!(matches!(
            parse("AND age"),
            Err(RuleError::StackUnderflow { .. })
        ));
        assert!(matches!(
            parse("age 30"),
            Err(RuleError::MalformedExpression { .. })
        ));
        assert!(matches!(
            parse("age > 30"),
            Err(RuleError::StackUnderflow { .. })
        ));
        assert!(matches!(
            parse("30 age >"),
            Err(RuleError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn test_deep_chains_are_bounded() {
        let chained = |n: usize| {
            let mut text = String::from("f 0 >=");
            for _ in 1..n {
                text.push_str(" f 0 >= AND");
            }
            text
        };

        let node = parse(&chained(MAX_DEPTH)).unwrap();
        assert!(evaluate(&node, &record(json!({"f": 1}))).unwrap());
        assert!(serde_json::to_string(&node).is_ok());

        assert!(matches!(
            parse(&chained(MAX_DEPTH + 1)),
            Err(RuleError::MalformedExpression { .. })
        ));
        assert!(matches!(
            parse(&chained(100_000)),
            Err(RuleError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn test_lowercase_keyword_is_operand() {
        // "and" 不是运算符，剩余多个槽位
        assert!(matches!(
            parse("a 1 = b 2 = and"),
            Err(RuleError::MalformedExpression { .. })
        ));
    }
}

mod evaluation {
    use super::*;

    #[test]
    fn test_numeric_comparison() {
        let rule = parse("age 30 >").unwrap();

        assert!(evaluate(&rule, &record(json!({"age": 45}))).unwrap());
        assert!(!evaluate(&rule, &record(json!({"age": 10}))).unwrap());
        assert!(matches!(
            evaluate(&rule, &record(json!({}))),
            Err(RuleError::MissingField(ref f)) if f == "age"
        ));
    }

    #[test]
    fn test_strict_equality() {
        let rule = parse("status active =").unwrap();

        assert!(evaluate(&rule, &record(json!({"status": "active"}))).unwrap());
        assert!(!evaluate(&rule, &record(json!({"status": 1}))).unwrap());

        // 字符串 "30" 与数字 30 不相等
        let rule = parse("code 30 =").unwrap();
        assert!(!evaluate(&rule, &record(json!({"code": "30"}))).unwrap());
        assert!(evaluate(&rule, &record(json!({"code": 30}))).unwrap());
    }

    #[test]
    fn test_ordering_type_mismatch() {
        let rule = parse("age 30 >").unwrap();
        let err = evaluate(&rule, &record(json!({"age": "forty"}))).unwrap_err();
        assert!(matches!(err, RuleError::TypeMismatch { .. }));

        let rule = parse("verified true >").unwrap();
        let err = evaluate(&rule, &record(json!({"verified": true}))).unwrap_err();
        assert!(matches!(err, RuleError::TypeMismatch { .. }));
    }

    #[test]
    fn test_string_ordering() {
        let rule = parse("name m <").unwrap();
        assert!(evaluate(&rule, &record(json!({"name": "alice"}))).unwrap());
        assert!(!evaluate(&rule, &record(json!({"name": "zoe"}))).unwrap());
    }

    #[test]
    fn test_logical_composition() {
        let rule = parse("age 18 >= income 50000 < AND").unwrap();
        assert!(evaluate(&rule, &create_applicant()).unwrap());

        let rule = parse("age 40 > status active = OR").unwrap();
        assert!(evaluate(&rule, &create_applicant()).unwrap());

        let rule = parse("age 40 > status closed = OR").unwrap();
        assert!(!evaluate(&rule, &create_applicant()).unwrap());
    }

    #[test]
    fn test_errors_surface_from_either_side() {
        // 左侧已为 false，右侧缺失字段仍然报错
        let rule = parse("age 99 > missing 1 = AND").unwrap();
        assert!(matches!(
            evaluate(&rule, &create_applicant()),
            Err(RuleError::MissingField(_))
        ));

        // 左侧已为 true，右侧缺失字段仍然报错
        let rule = parse("age 18 > missing 1 = OR").unwrap();
        assert!(matches!(
            evaluate(&rule, &create_applicant()),
            Err(RuleError::MissingField(_))
        ));
    }

    #[test]
    fn test_nested_field_lookup() {
        let rule = parse("profile.score 700 >= profile.country CN = AND").unwrap();
        assert!(evaluate(&rule, &create_applicant()).unwrap());
    }

    #[test]
    fn test_null_is_missing() {
        let rule = parse("age 30 >").unwrap();
        assert!(matches!(
            evaluate(&rule, &record(json!({"age": null}))),
            Err(RuleError::MissingField(_))
        ));
    }

    #[test]
    fn test_repeated_evaluation_is_stable() {
        let rule = parse("age 18 >= income 50000 < AND").unwrap();
        let data = create_applicant();

        let first = evaluate(&rule, &data).unwrap();
        for _ in 0..10 {
            assert_eq!(evaluate(&rule, &data).unwrap(), first);
        }
    }
}

mod combining {
    use super::*;

    #[test]
    fn test_combine_single_is_identity() {
        let a = parse("age 18 >=").unwrap();
        assert_eq!(combine(vec![a.clone()]).unwrap(), a);
    }

    #[test]
    fn test_combine_is_left_associative() {
        let a = parse("a 1 =").unwrap();
        let b = parse("b 2 =").unwrap();
        let c = parse("c 3 =").unwrap();

        let combined = combine(vec![a.clone(), b.clone(), c.clone()]).unwrap();

        assert_eq!(
            combined,
            ExpressionNode::logical(
                LogicalOperator::And,
                ExpressionNode::logical(LogicalOperator::And, a, b),
                c,
            )
        );
    }

    #[test]
    fn test_combine_empty() {
        assert!(matches!(combine(vec![]), Err(RuleError::EmptyRuleSet)));
    }

    #[test]
    fn test_combined_rule_evaluation() {
        let combined = combine(vec![
            parse("age 18 >=").unwrap(),
            parse("status active =").unwrap(),
            parse("profile.score 600 >").unwrap(),
        ])
        .unwrap();

        assert!(evaluate(&combined, &create_applicant()).unwrap());
        assert!(
            !evaluate(
                &combined,
                &record(json!({"age": 20, "status": "inactive", "profile": {"score": 900}}))
            )
            .unwrap()
        );
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_literal_tags_survive_round_trip() {
        let text_literal = parse("code \"30\" =").unwrap();
        let number_literal = parse("code 30 =").unwrap();

        let json = serde_json::to_value(&number_literal).unwrap();
        assert_eq!(json["value"]["type"], "number");

        let back = ExpressionNode::from_json_value(json).unwrap();
        assert_eq!(back, number_literal);

        // 引号是字符串的一部分，解析结果仍是字符串字面量
        let json = serde_json::to_value(&text_literal).unwrap();
        assert_eq!(json["value"]["type"], "string");
        assert_eq!(json["value"]["value"], "\"30\"");
    }

    #[test]
    fn test_wire_form() {
        let node = parse("age 18 >= verified true = OR").unwrap();
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(
            json,
            json!({
                "type": "operator",
                "operator": "OR",
                "left": {
                    "type": "comparison",
                    "operator": ">=",
                    "field": "age",
                    "value": {"type": "number", "value": 18.0}
                },
                "right": {
                    "type": "comparison",
                    "operator": "=",
                    "field": "verified",
                    "value": {"type": "boolean", "value": true}
                }
            })
        );
    }

    #[test]
    fn test_invalid_ast() {
        let result = ExpressionNode::from_json_value(json!({
            "type": "comparison",
            "operator": "!=",
            "field": "age",
            "value": {"type": "number", "value": 1}
        }));

        assert!(matches!(result, Err(RuleError::InvalidNode(_))));
    }
}

mod store_workflow {
    use super::*;

    #[test]
    fn test_create_combine_execute() {
        let store = RuleStore::new();

        let adult = store.create("adult", "", "age 18 >=").unwrap();
        let active = store.create("active", "活跃用户", "status active =").unwrap();
        assert_eq!(store.len(), 2);

        let combined = store
            .combine_ids(&[adult.id.clone(), active.id.clone()])
            .unwrap();
        assert_eq!(combined, ExpressionNode::and(adult.ast.clone(), active.ast.clone()));

        let executor = RuleExecutor::new().with_trace();
        let result = executor.execute_node(&combined, &create_applicant()).unwrap();

        assert!(result.matched);
        assert_eq!(
            result.matched_conditions,
            vec!["age >= 18".to_string(), "status = active".to_string()]
        );
        assert_eq!(result.evaluation_trace.len(), 3);
    }

    #[test]
    fn test_stored_rule_execution() {
        let store = RuleStore::new();
        let rule = store.create("high_score", "", "profile.score 800 >").unwrap();

        let compiled = store.get(&rule.id).unwrap();
        assert!(compiled.required_fields.contains("profile.score"));

        let result = RuleExecutor::new()
            .execute(&compiled, &create_applicant())
            .unwrap();
        assert!(!result.matched);
        assert_eq!(result.rule_id.as_deref(), Some(rule.id.as_str()));
        assert!(result.matched_conditions.is_empty());
    }

    #[test]
    fn test_unknown_rule_in_combination() {
        let store = RuleStore::new();
        let rule = store.create("adult", "", "age 18 >=").unwrap();

        let err = store
            .combine_ids(&[rule.id, "missing".to_string()])
            .unwrap_err();
        assert!(matches!(err, RuleError::RuleNotFound(ref id) if id == "missing"));
    }

    #[test]
    fn test_invalid_rule_text_is_not_stored() {
        let store = RuleStore::new();

        assert!(store.create("broken", "", "age > 30").is_err());
        assert!(store.is_empty());
    }
}

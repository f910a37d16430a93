//! 规则执行器
//!
//! 在求值的同时收集匹配的比较条件，可选记录逐节点的评估追踪。

use crate::compiler::CompiledRule;
use crate::error::Result;
use crate::evaluator::{ConditionEvaluator, depth_exceeded};
use crate::models::MAX_DEPTH;
use crate::models::{EvaluationResult, ExpressionNode, Record};
use std::time::Instant;

/// 规则执行器
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExecutor {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 执行已编译规则
    pub fn execute(&self, rule: &CompiledRule, record: &Record) -> Result<EvaluationResult> {
        let result = EvaluationResult::for_rule(rule.id());
        self.run(rule.root(), record, result)
    }

    /// 执行任意表达式树（不关联规则）
    pub fn execute_node(&self, node: &ExpressionNode, record: &Record) -> Result<EvaluationResult> {
        self.run(node, record, EvaluationResult::default())
    }

    fn run(
        &self,
        node: &ExpressionNode,
        record: &Record,
        mut result: EvaluationResult,
    ) -> Result<EvaluationResult> {
        let start = Instant::now();

        result.matched = self.evaluate_node(node, record, &mut result, "root", 1)?;
        result.evaluation_time_ms = start.elapsed().as_millis() as i64;

        Ok(result)
    }

    /// 递归评估节点
    fn evaluate_node(
        &self,
        node: &ExpressionNode,
        record: &Record,
        result: &mut EvaluationResult,
        path: &str,
        depth: usize,
    ) -> Result<bool> {
        if depth > MAX_DEPTH {
            return Err(depth_exceeded());
        }

        match node {
            ExpressionNode::Operator {
                operator,
                left,
                right,
            } => {
                // 两侧都求值，保证任一侧的错误都能暴露
                let left_matched = self.evaluate_node(
                    left,
                    record,
                    result,
                    &format!("{}.left", path),
                    depth + 1,
                )?;
                let right_matched = self.evaluate_node(
                    right,
                    record,
                    result,
                    &format!("{}.right", path),
                    depth + 1,
                )?;
                let matched = operator.apply(left_matched, right_matched);

                if self.trace_enabled {
                    result.evaluation_trace.push(format!(
                        "{}: {} ({}, {}) => {}",
                        path,
                        operator,
                        left_matched,
                        right_matched,
                        if matched { "MATCHED" } else { "NOT_MATCHED" }
                    ));
                }

                Ok(matched)
            }
            ExpressionNode::Comparison {
                operator,
                field,
                value,
            } => {
                let matched = ConditionEvaluator::evaluate(
                    field,
                    record.get_field(field),
                    *operator,
                    value,
                )?;

                if self.trace_enabled {
                    result.evaluation_trace.push(format!(
                        "{}: {} {} {} => {}",
                        path,
                        field,
                        operator,
                        value,
                        if matched { "MATCHED" } else { "NOT_MATCHED" }
                    ));
                }

                if matched {
                    result
                        .matched_conditions
                        .push(format!("{} {} {}", field, operator, value));
                }

                Ok(matched)
            }
        }
    }
}

//! 规则组合
//!
//! 将多棵表达式树按左结合方式折叠成一棵：`((r0 AND r1) AND r2) AND ...`

use crate::error::{Result, RuleError};
use crate::models::{ExpressionNode, MAX_DEPTH};
use crate::operators::LogicalOperator;

/// 以 AND 组合多条规则
///
/// 只有一条规则时原样返回，不包装单子节点的 AND。
pub fn combine(nodes: Vec<ExpressionNode>) -> Result<ExpressionNode> {
    combine_with(LogicalOperator::And, nodes)
}

/// 以指定逻辑操作符组合多条规则
///
/// 组合结果的深度超过 [`MAX_DEPTH`] 时返回 `InvalidNode`。
pub fn combine_with(operator: LogicalOperator, nodes: Vec<ExpressionNode>) -> Result<ExpressionNode> {
    let mut iter = nodes.into_iter();
    let first = iter.next().ok_or(RuleError::EmptyRuleSet)?;
    let mut depth = first.depth();

    iter.enumerate().try_fold(first, |acc, (i, next)| {
        depth = 1 + depth.max(next.depth());
        if depth > MAX_DEPTH {
            return Err(RuleError::InvalidNode(format!(
                "组合第 {} 条规则后表达式深度 {} 超过上限 {}",
                i + 2,
                depth,
                MAX_DEPTH
            )));
        }
        Ok(ExpressionNode::logical(operator, acc, next))
    })
}

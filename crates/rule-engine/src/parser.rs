//! 规则文本解析器
//!
//! 规则文本采用后缀表示法（逆波兰式）：
//! - 比较：`field value OP`，如 `age 30 >`
//! - 逻辑：`<expr1> <expr2> AND|OR`
//!
//! 使用显式栈单遍归约，无需前瞻和优先级表。中缀写法（如 `age > 30`）
//! 会被拒绝而不是被静默误解析。

use crate::error::{Result, RuleError};
use crate::models::{ExpressionNode, Literal, MAX_DEPTH};
use crate::operators::{ComparisonOperator, LogicalOperator};
use tracing::debug;

/// 规则文本中的一个 token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    /// 在 token 序列中的位置（从 1 开始）
    pub position: usize,
}

/// 按空白切分规则文本
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    let tokens: Vec<Token<'_>> = input
        .split_whitespace()
        .enumerate()
        .map(|(i, text)| Token {
            text,
            position: i + 1,
        })
        .collect();

    if tokens.is_empty() {
        return Err(RuleError::EmptyInput);
    }

    Ok(tokens)
}

/// 解析规则文本为表达式树
pub fn parse(input: &str) -> Result<ExpressionNode> {
    let tokens = tokenize(input)?;
    let token_count = tokens.len();

    let mut builder = ExpressionBuilder::new();
    for token in tokens {
        builder.push(token)?;
    }
    let node = builder.finish()?;

    debug!(tokens = token_count, comparisons = node.comparison_count(), "规则解析完成");
    Ok(node)
}

/// 栈槽：已构建的节点（附带树深度）或尚未归约的原始 token
#[derive(Debug)]
enum Slot<'a> {
    Pending(Token<'a>),
    Node(ExpressionNode, usize),
}

impl Slot<'_> {
    fn describe(&self) -> String {
        match self {
            Slot::Pending(token) => format!("'{}'", token.text),
            Slot::Node(node, _) => format!("[{}]", node),
        }
    }
}

/// 表达式构建器
///
/// 逐个接收 token 并在栈上归约，`finish` 时要求栈上恰好剩一个完整节点。
/// 树深度超过 [`MAX_DEPTH`] 时拒绝继续归约。
#[derive(Debug, Default)]
pub(crate) struct ExpressionBuilder<'a> {
    stack: Vec<Slot<'a>>,
    last_position: usize,
}

impl<'a> ExpressionBuilder<'a> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 消费一个 token
    pub(crate) fn push(&mut self, token: Token<'a>) -> Result<()> {
        self.last_position = token.position;

        if let Some(kind) = LogicalOperator::from_token(token.text) {
            return self.reduce_logical(kind, &token);
        }

        if let Some(op) = ComparisonOperator::from_token(token.text) {
            return self.reduce_comparison(op, &token);
        }

        self.stack.push(Slot::Pending(token));
        Ok(())
    }

    /// 结束构建
    pub(crate) fn finish(mut self) -> Result<ExpressionNode> {
        let position = self.last_position;

        if self.stack.len() != 1 {
            let remaining: Vec<String> = self.stack.iter().map(Slot::describe).collect();
            return Err(RuleError::malformed(
                format!(
                    "表达式结束时栈上应恰好剩余 1 个表达式，实际 {} 个: {}",
                    self.stack.len(),
                    remaining.join(" ")
                ),
                position,
            ));
        }

        match self.stack.pop() {
            Some(Slot::Node(node, _)) => Ok(node),
            Some(Slot::Pending(token)) => Err(RuleError::malformed(
                format!("'{}' 不是完整的表达式，缺少比较操作符", token.text),
                token.position,
            )),
            None => Err(RuleError::malformed("表达式为空", position)),
        }
    }

    fn pop(&mut self, operator: &Token<'_>) -> Result<Slot<'a>> {
        self.stack.pop().ok_or_else(|| RuleError::StackUnderflow {
            token: operator.text.to_string(),
            position: operator.position,
        })
    }

    fn reduce_logical(&mut self, kind: LogicalOperator, token: &Token<'_>) -> Result<()> {
        let right = self.pop(token)?;
        let left = self.pop(token)?;

        let (left, right, depth) = match (left, right) {
            (Slot::Node(left, l), Slot::Node(right, r)) => (left, right, 1 + l.max(r)),
            (left, right) => {
                return Err(RuleError::malformed(
                    format!(
                        "逻辑操作符 '{}' 只能连接表达式，不能连接原始值: {} {}",
                        token.text,
                        left.describe(),
                        right.describe()
                    ),
                    token.position,
                ));
            }
        };

        if depth > MAX_DEPTH {
            return Err(RuleError::malformed(
                format!("表达式嵌套深度 {} 超过上限 {}", depth, MAX_DEPTH),
                token.position,
            ));
        }

        self.stack
            .push(Slot::Node(ExpressionNode::logical(kind, left, right), depth));
        Ok(())
    }

    fn reduce_comparison(&mut self, op: ComparisonOperator, token: &Token<'_>) -> Result<()> {
        let value = match self.pop(token)? {
            Slot::Pending(value) => value,
            Slot::Node(node, _) => {
                return Err(RuleError::malformed(
                    format!("比较操作符 '{}' 的值不能是表达式 [{}]", token.text, node),
                    token.position,
                ))
            }
        };

        let field = match self.pop(token)? {
            Slot::Pending(field) => field,
            Slot::Node(node, _) => {
                return Err(RuleError::malformed(
                    format!("比较操作符 '{}' 的字段不能是表达式 [{}]", token.text, node),
                    token.position,
                ))
            }
        };

        // 字段位置出现数值或布尔字面量，说明操作数顺序写反了
        if !matches!(Literal::resolve(field.text), Literal::String(_)) {
            return Err(RuleError::malformed(
                format!(
                    "比较操作符 '{}' 期望字段名，实际为字面量 '{}'",
                    token.text, field.text
                ),
                field.position,
            ));
        }

        self.stack.push(Slot::Node(
            ExpressionNode::Comparison {
                operator: op,
                field: field.text.to_string(),
                value: Literal::resolve(value.text),
            },
            1,
        ));
        Ok(())
    }
}

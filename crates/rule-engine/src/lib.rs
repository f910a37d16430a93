//! 后缀表达式规则引擎
//!
//! 提供可复用的规则评估能力，支持：
//! - 后缀（逆波兰）规则文本的分词和解析
//! - 多条规则按逻辑运算符组合
//! - 严格类型的记录评估
//! - 规则编译、内存存储和 REST 服务接口

pub mod api;
pub mod combiner;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod models;
pub mod operators;
pub mod parser;
pub mod store;

pub use combiner::{combine, combine_with};
pub use compiler::{CompiledRule, RuleCompiler};
pub use error::{Result, RuleError};
pub use evaluator::{ConditionEvaluator, evaluate};
pub use executor::RuleExecutor;
pub use models::{EvaluationResult, ExpressionNode, Literal, MAX_DEPTH, Record, Rule};
pub use operators::{ComparisonOperator, LogicalOperator};
pub use parser::{Token, parse, tokenize};
pub use store::{RuleStore, RuleStoreStats};

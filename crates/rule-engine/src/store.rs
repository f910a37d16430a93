//! 规则存储管理
//!
//! 使用 DashMap 提供线程安全的内存规则缓存，支持规则的创建、加载、删除和按 ID 组合。

use crate::combiner::combine;
use crate::compiler::{CompiledRule, RuleCompiler};
use crate::error::{Result, RuleError};
use crate::models::{ExpressionNode, Rule};
use crate::parser::parse;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 规则存储
#[derive(Clone)]
pub struct RuleStore {
    /// 编译后的规则缓存
    rules: Arc<DashMap<String, CompiledRule>>,
    /// 规则编译器
    compiler: Arc<parking_lot::Mutex<RuleCompiler>>,
}

impl RuleStore {
    /// 创建新的规则存储
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
            compiler: Arc::new(parking_lot::Mutex::new(RuleCompiler::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 从规则文本创建新规则
    #[instrument(skip(self, description, rule_text))]
    pub fn create(&self, name: &str, description: &str, rule_text: &str) -> Result<Rule> {
        let ast = parse(rule_text)?;
        let rule = Rule::new(name, description, ast);
        self.load(rule.clone())?;
        Ok(rule)
    }

    /// 加载规则（已存在同 ID 规则时覆盖）
    #[instrument(skip(self, rule), fields(rule_id = %rule.id, rule_name = %rule.name))]
    pub fn load(&self, rule: Rule) -> Result<()> {
        let compiled = {
            let mut compiler = self.compiler.lock();
            compiler.compile(rule)?
        };

        let rule_id = compiled.id().to_string();
        self.rules.insert(rule_id.clone(), compiled);

        info!("规则已加载: {}", rule_id);
        Ok(())
    }

    /// 加载规则（从 JSON 字符串）
    #[instrument(skip(self, json))]
    pub fn load_from_json(&self, json: &str) -> Result<String> {
        let compiled = {
            let mut compiler = self.compiler.lock();
            compiler.compile_from_json(json)?
        };

        let rule_id = compiled.id().to_string();
        self.rules.insert(rule_id.clone(), compiled);

        info!("规则已加载: {}", rule_id);
        Ok(rule_id)
    }

    /// 删除规则
    #[instrument(skip(self))]
    pub fn delete(&self, rule_id: &str) -> Result<()> {
        if self.rules.remove(rule_id).is_some() {
            info!("规则已删除: {}", rule_id);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", rule_id);
            Err(RuleError::RuleNotFound(rule_id.to_string()))
        }
    }

    pub fn get(&self, rule_id: &str) -> Option<CompiledRule> {
        self.rules.get(rule_id).map(|r| r.clone())
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains_key(rule_id)
    }

    /// 获取所有规则，按创建时间排序
    pub fn list_all(&self) -> Vec<Rule> {
        let mut rules: Vec<Rule> = self.rules.iter().map(|r| r.rule.clone()).collect();
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        rules
    }

    /// 按调用方给定的顺序取出规则 AST 并以 AND 组合
    #[instrument(skip(self))]
    pub fn combine_ids(&self, rule_ids: &[String]) -> Result<ExpressionNode> {
        let nodes = rule_ids
            .iter()
            .map(|id| {
                self.rules
                    .get(id)
                    .map(|r| r.rule.ast.clone())
                    .ok_or_else(|| RuleError::RuleNotFound(id.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let combined = combine(nodes)?;
        info!(rules = rule_ids.len(), "规则已组合");
        Ok(combined)
    }

    /// 清空所有规则
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.rules.len();
        self.rules.clear();
        info!("已清空 {} 条规则", count);
    }

    /// 获取规则统计信息
    pub fn stats(&self) -> RuleStoreStats {
        let rules_count = self.rules.len();
        let total_fields: usize = self.rules.iter().map(|r| r.required_fields.len()).sum();

        RuleStoreStats {
            rules_count,
            total_fields,
            avg_fields_per_rule: if rules_count > 0 {
                total_fields as f64 / rules_count as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 规则存储统计信息
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStoreStats {
    pub rules_count: usize,
    pub total_fields: usize,
    pub avg_fields_per_rule: f64,
}

//! 规则 API 处理器
//!
//! 实现规则的创建、查询、删除，以及解析、组合与评估端点。

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rule_shared::observability::metrics;
use std::time::Instant;
use tracing::{info, instrument};
use validator::Validate;

use super::dto::{
    ApiResponse, CombineRulesRequest, CreateRuleRequest, EvaluateRequest, EvaluateResponse,
    ParseRuleRequest,
};
use super::state::AppState;
use crate::compiler::validate_node;
use crate::error::{Result, RuleError};
use crate::models::{EvaluationResult, ExpressionNode, Record, Rule};
use crate::parser::parse;
use crate::store::RuleStoreStats;

/// 记录解析指标后原样返回结果
fn track_parse<T>(result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => metrics::record_rule_parse("ok"),
        Err(e) => metrics::record_rule_parse(e.code()),
    }
    result
}

/// 创建规则
///
/// POST /api/rules
#[instrument(skip(state, req), fields(rule_name = %req.name))]
pub async fn create_rule(
    State(state): State<AppState>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Rule>>)> {
    req.validate()?;

    let rule = track_parse(state.store.create(&req.name, &req.description, &req.rule_string))?;

    info!(rule_id = %rule.id, rule_name = %rule.name, "规则已创建");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(rule))))
}

/// 获取全部规则
///
/// GET /api/rules
pub async fn list_rules(State(state): State<AppState>) -> Json<ApiResponse<Vec<Rule>>> {
    Json(ApiResponse::success(state.store.list_all()))
}

/// 获取单个规则
///
/// GET /api/rules/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Rule>>> {
    let compiled = state
        .store
        .get(&id)
        .ok_or_else(|| RuleError::RuleNotFound(id.clone()))?;

    Ok(Json(ApiResponse::success(compiled.rule)))
}

/// 删除规则
///
/// DELETE /api/rules/{id}
#[instrument(skip(state))]
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state.store.delete(&id)?;

    info!(rule_id = %id, "规则已删除");

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 解析规则文本，返回表达式树但不存储
///
/// POST /api/rules/parse
#[instrument(skip(req))]
pub async fn parse_rule(
    Json(req): Json<ParseRuleRequest>,
) -> Result<Json<ApiResponse<ExpressionNode>>> {
    let ast = track_parse(parse(&req.rule_string))?;
    Ok(Json(ApiResponse::success(ast)))
}

/// 按给定顺序以 AND 组合已存储的规则
///
/// POST /api/rules/combine
#[instrument(skip(state, req), fields(rule_count = req.rule_ids.len()))]
pub async fn combine_rules(
    State(state): State<AppState>,
    Json(req): Json<CombineRulesRequest>,
) -> Result<Json<ApiResponse<ExpressionNode>>> {
    let rule_count = req.rule_ids.len();

    match state.store.combine_ids(&req.rule_ids) {
        Ok(ast) => {
            metrics::record_rule_combine(rule_count, "ok");
            Ok(Json(ApiResponse::success(ast)))
        }
        Err(e) => {
            metrics::record_rule_combine(rule_count, e.code());
            Err(e)
        }
    }
}

/// 评估规则
///
/// POST /api/rules/evaluate
#[instrument(skip(state, req), fields(rule_id = ?req.rule_id, trace = req.trace))]
pub async fn evaluate_rule(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<ApiResponse<EvaluateResponse>>> {
    req.validate()?;

    let start = Instant::now();
    let result = run_evaluation(&state, req);
    let duration = start.elapsed().as_secs_f64();

    match &result {
        Ok(r) if r.matched => metrics::record_rule_evaluation("matched", duration),
        Ok(_) => metrics::record_rule_evaluation("not_matched", duration),
        Err(e) => metrics::record_rule_evaluation(e.code(), duration),
    }

    Ok(Json(ApiResponse::success(result?.into())))
}

fn run_evaluation(state: &AppState, req: EvaluateRequest) -> Result<EvaluationResult> {
    let executor = if req.trace {
        state.executor.with_trace()
    } else {
        state.executor
    };
    let record = Record::new(req.data);

    match (req.ast, req.rule_id) {
        (Some(ast), _) => {
            let node = ExpressionNode::from_json_value(ast)?;
            validate_node(&node, "root")?;
            executor.execute_node(&node, &record)
        }
        (None, Some(rule_id)) => {
            let compiled = state
                .store
                .get(&rule_id)
                .ok_or(RuleError::RuleNotFound(rule_id))?;
            executor.execute(&compiled, &record)
        }
        (None, None) => Err(RuleError::Validation("必须指定 ast 或 ruleId".to_string())),
    }
}

/// 获取规则存储统计
///
/// GET /api/rules/stats
pub async fn rule_stats(State(state): State<AppState>) -> Json<ApiResponse<RuleStoreStats>> {
    Json(ApiResponse::success(state.store.stats()))
}

/// 健康检查
///
/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

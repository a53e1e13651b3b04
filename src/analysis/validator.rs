// ==========================================
// GMAO 维护数据核心 - AMDEC 结果校验器
// ==========================================
// 红线: 只保留与输入聚合完全匹配的模型条目（封闭集合校验）
//       输出条数 == 输入聚合条数, 顺序与输入一致
// ==========================================
// 规则: F 频率 / G 严重度 / D 可检测度, 1..=5
//       模型缺失的评分用规则评分补齐, 越界评分夹到 1..=5
// ==========================================

use crate::analysis::aggregates::{normalize_key, FailureAggregate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};

/// 默认可检测度（中间值）
pub const DEFAULT_DETECTABILITY: u8 = 3;

const COMPONENT_KEYS: &[&str] = &["component", "composant", "organe"];
const FAILURE_TYPE_KEYS: &[&str] = &["failureType", "failure_type", "typePanne", "mode"];
const FREQUENCY_KEYS: &[&str] = &["frequency", "F", "frequence", "occurrence"];
const GRAVITY_KEYS: &[&str] = &["gravity", "G", "gravite", "severity"];
const DETECTABILITY_KEYS: &[&str] = &["detectability", "D", "detection"];
const ACTION_KEYS: &[&str] = &["action", "recommendedAction", "actionRecommandee"];

// ==========================================
// 规则评分
// ==========================================

/// 频率评分（按次数）
pub fn frequency_score(count: u32) -> u8 {
    match count {
        c if c >= 50 => 5,
        c if c >= 30 => 4,
        c if c >= 15 => 3,
        c if c >= 5 => 2,
        _ => 1,
    }
}

/// 影响值 = 总成本 + 停机小时 × 10
///
/// 成本按原值计入（权重 1, 不除以 1000）: 成本 5000、停机 120 h 的聚合
/// 影响值为 6200, 严重度为 5; 若按 成本/1000 计则只有 1205, 严重度降为 3。
pub fn gravity_impact(total_cost: f64, total_downtime: f64) -> f64 {
    total_cost + total_downtime * 10.0
}

/// 严重度评分（按影响值）
pub fn gravity_score(total_cost: f64, total_downtime: f64) -> u8 {
    let impact = gravity_impact(total_cost, total_downtime);
    if impact >= 3000.0 {
        5
    } else if impact >= 1500.0 {
        4
    } else if impact >= 500.0 {
        3
    } else if impact >= 100.0 {
        2
    } else {
        1
    }
}

pub fn fallback_action(component: &str, failure_type: &str) -> String {
    format!(
        "Analyser les causes de « {} » sur {} et définir un plan de maintenance préventive adapté",
        failure_type, component
    )
}

// ==========================================
// 输出
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Model,    // 模型条目（已校验）
    Fallback, // 规则补齐
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedEntry {
    pub component: String,
    pub failure_type: String,
    pub count: u32,
    pub frequency: u8,
    pub gravity: u8,
    pub detectability: u8,
    pub action: String,
    pub source: EntrySource,
}

impl ValidatedEntry {
    /// 临界度 C = F × G × D
    pub fn criticality(&self) -> u32 {
        u32::from(self.frequency) * u32::from(self.gravity) * u32::from(self.detectability)
    }

    fn fallback(aggregate: &FailureAggregate) -> Self {
        Self {
            component: aggregate.component.clone(),
            failure_type: aggregate.failure_type.clone(),
            count: aggregate.count,
            frequency: frequency_score(aggregate.count),
            gravity: gravity_score(aggregate.total_cost, aggregate.total_downtime),
            detectability: DEFAULT_DETECTABILITY,
            action: fallback_action(&aggregate.component, &aggregate.failure_type),
            source: EntrySource::Fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub entries: Vec<ValidatedEntry>,
    pub hallucinations: usize, // 不匹配任何输入的模型条目
    pub backfilled: usize,     // 规则补齐的条目
}

// ==========================================
// 宽松读取模型条目
// ==========================================

fn text_field<'a>(entry: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| entry.get(*k))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn score_field(entry: &Map<String, Value>, keys: &[&str]) -> Option<u8> {
    let value = keys.iter().find_map(|k| entry.get(*k))?;
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.round().clamp(1.0, 5.0) as u8)
}

// ==========================================
// 校验
// ==========================================

/// 用输入聚合校验模型条目, 返回与输入等长、同序的结果
pub fn validate(aggregates: &[FailureAggregate], llm_entries: &[Value]) -> ValidationReport {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for (i, aggregate) in aggregates.iter().enumerate() {
        index
            .entry((
                normalize_key(&aggregate.component),
                normalize_key(&aggregate.failure_type),
            ))
            .or_insert(i);
    }

    let mut slots: Vec<Option<ValidatedEntry>> = vec![None; aggregates.len()];
    let mut hallucinations = 0usize;

    for raw in llm_entries {
        let Some(entry) = raw.as_object() else {
            hallucinations += 1;
            continue;
        };
        let (Some(component), Some(failure_type)) = (
            text_field(entry, COMPONENT_KEYS),
            text_field(entry, FAILURE_TYPE_KEYS),
        ) else {
            hallucinations += 1;
            continue;
        };

        let key = (normalize_key(component), normalize_key(failure_type));
        let Some(&i) = index.get(&key) else {
            warn!(component = component, failure_type = failure_type, "模型条目不在输入中, 已丢弃");
            hallucinations += 1;
            continue;
        };
        // 同一输入只取第一个匹配条目
        if slots[i].is_some() {
            continue;
        }

        let aggregate = &aggregates[i];
        let rule = ValidatedEntry::fallback(aggregate);
        slots[i] = Some(ValidatedEntry {
            frequency: score_field(entry, FREQUENCY_KEYS).unwrap_or(rule.frequency),
            gravity: score_field(entry, GRAVITY_KEYS).unwrap_or(rule.gravity),
            detectability: score_field(entry, DETECTABILITY_KEYS).unwrap_or(rule.detectability),
            action: text_field(entry, ACTION_KEYS)
                .map(str::to_string)
                .unwrap_or(rule.action),
            source: EntrySource::Model,
            ..rule
        });
    }

    let mut backfilled = 0usize;
    let entries: Vec<ValidatedEntry> = slots
        .into_iter()
        .zip(aggregates)
        .map(|(slot, aggregate)| {
            slot.unwrap_or_else(|| {
                backfilled += 1;
                ValidatedEntry::fallback(aggregate)
            })
        })
        .collect();

    info!(
        inputs = aggregates.len(),
        model_entries = llm_entries.len(),
        hallucinations = hallucinations,
        backfilled = backfilled,
        "AMDEC 结果校验完成"
    );

    ValidationReport {
        entries,
        hallucinations,
        backfilled,
    }
}

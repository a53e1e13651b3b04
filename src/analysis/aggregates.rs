// ==========================================
// GMAO 维护数据核心 - 故障聚合
// ==========================================
// 输入: 工单
// 输出: 按 (部件, 故障类型) 聚合的次数 / 成本 / 停机时间
// 约束: 仅用于一次分析调用, 不落库
// ==========================================

use crate::domain::maintenance::WorkOrder;
use crate::importer::derivation::UNSPECIFIED;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// FailureAggregate
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureAggregate {
    pub component: String,
    pub failure_type: String,
    pub count: u32,
    pub total_cost: f64,
    pub total_downtime: f64, // 小时
}

/// 比较用的规范化: 去首尾空白, 小写, 连续空白折叠为一个空格
///
/// 只用于比较, 不用于显示
pub fn normalize_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 由工单构建故障聚合（预防性工单不计入）
///
/// 结果按次数降序, 次数相同按部件名排序
pub fn aggregate_failures(work_orders: &[WorkOrder]) -> Vec<FailureAggregate> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut aggregates: Vec<FailureAggregate> = Vec::new();

    for wo in work_orders.iter().filter(|wo| !wo.is_preventive()) {
        let component = display_or_unspecified(wo.component.as_deref());
        let failure_type = display_or_unspecified(wo.failure_type.as_deref());
        let key = (normalize_key(&component), normalize_key(&failure_type));

        let slot = *index.entry(key).or_insert_with(|| {
            aggregates.push(FailureAggregate {
                component,
                failure_type,
                count: 0,
                total_cost: 0.0,
                total_downtime: 0.0,
            });
            aggregates.len() - 1
        });

        let aggregate = &mut aggregates[slot];
        aggregate.count += 1;
        aggregate.total_cost += finite(wo.intervention_cost());
        aggregate.total_downtime += finite(wo.downtime_hours);
    }

    aggregates.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.component.cmp(&b.component))
            .then_with(|| a.failure_type.cmp(&b.failure_type))
    });
    aggregates
}

fn display_or_unspecified(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNSPECIFIED)
        .to_string()
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

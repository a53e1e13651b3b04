// ==========================================
// GMAO 维护数据核心 - KPI 记录
// ==========================================
// 每次重算全量替换, 无独立生命周期
// ==========================================

use crate::domain::types::MetricType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    pub id: String,
    pub period: String,             // YYYY-MM
    pub metric_type: MetricType,
    pub value: f64,                 // 永不为 NaN / Infinity
    pub asset_code: Option<String>, // None = 全厂汇总
}

// ==========================================
// GMAO 维护数据核心 - 备件（PDR）领域模型
// ==========================================
// 与工单独立; 库存阈值监控见 engine::stock_monitor
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Part - 备件库存
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub reference: String,          // Référence / SKU
    pub name: String,               // Désignation
    pub stock_on_hand: f64,         // 当前库存
    pub safety_stock: f64,          // 安全库存
    pub reorder_point: f64,         // 再订货点
    pub unit_cost: Option<f64>,
    pub lead_time_days: Option<i64>,
}

// ==========================================
// PartDemand - 备件消耗（按月）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDemand {
    pub id: String,
    pub part_ref: String,
    pub period: String,             // YYYY-MM
    pub quantity: f64,
}

// ==========================================
// 库存状态 (Stock Status)
// ==========================================
// 严重度从高到低: OutOfStock > BelowSafetyStock > BelowReorderPoint > Ok
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    OutOfStock,
    BelowSafetyStock,
    BelowReorderPoint,
    Ok,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::OutOfStock => write!(f, "OUT_OF_STOCK"),
            StockStatus::BelowSafetyStock => write!(f, "BELOW_SAFETY_STOCK"),
            StockStatus::BelowReorderPoint => write!(f, "BELOW_REORDER_POINT"),
            StockStatus::Ok => write!(f, "OK"),
        }
    }
}

// ==========================================
// 需求策略 (Demand Strategy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemandStrategy {
    TimeSeries,   // 规律消耗, 低波动
    Statistical,  // 间歇消耗
    SafetyStock,  // 偶发消耗
}

impl fmt::Display for DemandStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandStrategy::TimeSeries => write!(f, "time-series"),
            DemandStrategy::Statistical => write!(f, "statistical"),
            DemandStrategy::SafetyStock => write!(f, "safety-stock"),
        }
    }
}

// ==========================================
// ConfidenceLevel - MTBF 统计/预测的可信度
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "high"),
            ConfidenceLevel::Medium => write!(f, "medium"),
            ConfidenceLevel::Low => write!(f, "low"),
        }
    }
}

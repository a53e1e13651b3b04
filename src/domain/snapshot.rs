// ==========================================
// GMAO 维护数据核心 - 本地存储快照（备份）
// ==========================================
// 导出 → JSON → 导入 必须还原每个集合（与顺序无关）
// ==========================================

use crate::domain::amdec::{AmdecRawRow, FailureMode, FunctionRecord};
use crate::domain::kpi::KpiRecord;
use crate::domain::maintenance::{Asset, WorkOrder};
use crate::domain::part::{Part, PartDemand};
use crate::domain::types::Collection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 快照格式版本
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub work_orders: Vec<WorkOrder>,
    #[serde(default)]
    pub functions: Vec<FunctionRecord>,
    #[serde(default)]
    pub failure_modes: Vec<FailureMode>,
    #[serde(default)]
    pub amdec_rows: Vec<AmdecRawRow>,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub part_demand: Vec<PartDemand>,
    #[serde(default)]
    pub kpis: Vec<KpiRecord>,
}

impl StoreSnapshot {
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            assets: Vec::new(),
            work_orders: Vec::new(),
            functions: Vec::new(),
            failure_modes: Vec::new(),
            amdec_rows: Vec::new(),
            parts: Vec::new(),
            part_demand: Vec::new(),
            kpis: Vec::new(),
        }
    }

    /// 各集合记录数
    pub fn counts(&self) -> BTreeMap<Collection, usize> {
        BTreeMap::from([
            (Collection::Assets, self.assets.len()),
            (Collection::WorkOrders, self.work_orders.len()),
            (Collection::Functions, self.functions.len()),
            (Collection::FailureModes, self.failure_modes.len()),
            (Collection::AmdecRows, self.amdec_rows.len()),
            (Collection::Parts, self.parts.len()),
            (Collection::PartDemand, self.part_demand.len()),
            (Collection::Kpis, self.kpis.len()),
        ])
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

// ==========================================
// GMAO 维护数据核心 - 本地存储 Trait
// ==========================================
// 职责: 定义各记录集合的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::amdec::{AmdecRawRow, FailureMode, FunctionRecord};
use crate::domain::kpi::KpiRecord;
use crate::domain::maintenance::{Asset, WorkOrder};
use crate::domain::part::{Part, PartDemand};
use crate::domain::snapshot::StoreSnapshot;
use crate::domain::types::{Collection, MetricType};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

// ==========================================
// 查询过滤条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkOrderFilter {
    pub asset_code: Option<String>,
    pub period: Option<String>, // YYYY-MM（按开始时间）
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiFilter {
    pub metric: Option<MetricType>,
    pub asset_code: Option<String>,
    pub fleet_only: bool, // 仅全厂汇总（asset_code IS NULL）
    pub period: Option<String>,
}

// ==========================================
// MaintenanceStore Trait
// ==========================================
// 实现者: SqliteMaintenanceStore
#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    // ===== 设备 =====
    async fn insert_assets(&self, assets: Vec<Asset>) -> RepositoryResult<usize>;
    async fn list_assets(&self) -> RepositoryResult<Vec<Asset>>;
    async fn find_asset_by_code(&self, code: &str) -> RepositoryResult<Option<Asset>>;

    // ===== 工单（只追加）=====
    async fn insert_work_orders(&self, work_orders: Vec<WorkOrder>) -> RepositoryResult<usize>;
    async fn list_work_orders(&self, filter: &WorkOrderFilter) -> RepositoryResult<Vec<WorkOrder>>;

    // ===== AMDEC =====
    async fn insert_functions(&self, functions: Vec<FunctionRecord>) -> RepositoryResult<usize>;
    async fn list_functions(&self) -> RepositoryResult<Vec<FunctionRecord>>;
    async fn find_function_by_name(&self, name: &str) -> RepositoryResult<Option<FunctionRecord>>;
    async fn insert_failure_modes(&self, modes: Vec<FailureMode>) -> RepositoryResult<usize>;
    async fn list_failure_modes(&self) -> RepositoryResult<Vec<FailureMode>>;
    async fn insert_amdec_rows(&self, rows: Vec<AmdecRawRow>) -> RepositoryResult<usize>;
    async fn list_amdec_rows(&self) -> RepositoryResult<Vec<AmdecRawRow>>;

    // ===== 备件 =====
    async fn insert_parts(&self, parts: Vec<Part>) -> RepositoryResult<usize>;
    async fn list_parts(&self) -> RepositoryResult<Vec<Part>>;
    async fn insert_part_demand(&self, demand: Vec<PartDemand>) -> RepositoryResult<usize>;
    async fn list_part_demand(&self, part_ref: Option<&str>) -> RepositoryResult<Vec<PartDemand>>;

    // ===== KPI（整体替换）=====
    /// 在一个事务内删除全部 KPI 并写入新集合
    async fn replace_kpis(&self, kpis: Vec<KpiRecord>) -> RepositoryResult<usize>;
    async fn list_kpis(&self, filter: &KpiFilter) -> RepositoryResult<Vec<KpiRecord>>;

    // ===== 维护 =====
    async fn count(&self, collection: Collection) -> RepositoryResult<usize>;

    /// 清空所有集合
    async fn clear_all(&self) -> RepositoryResult<()>;

    /// 导出全部集合
    async fn export_snapshot(&self) -> RepositoryResult<StoreSnapshot>;

    /// 用快照替换全部集合（单事务）
    ///
    /// # 返回
    /// - 各集合写入数量
    async fn import_snapshot(
        &self,
        snapshot: StoreSnapshot,
    ) -> RepositoryResult<BTreeMap<Collection, usize>>;
}

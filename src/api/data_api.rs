// ==========================================
// GMAO 维护数据核心 - 数据管理 API
// ==========================================
// 职责: KPI 重算/查询、库存监控、快照导出/还原、清空、服务端 ETL
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportConfigReader;
use crate::domain::kpi::KpiRecord;
use crate::domain::maintenance::WorkOrder;
use crate::domain::snapshot::StoreSnapshot;
use crate::domain::types::Collection;
use crate::engine::{KpiRecalcSummary, KpiRecalculator, StockAlert, StockMonitor};
use crate::etl::{run_etl_script, EtlOutcome};
use crate::repository::{KpiFilter, MaintenanceStore, WorkOrderFilter};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct DataApi<S, C>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
{
    store: Arc<S>,
    config: Arc<C>,
    recalculator: KpiRecalculator<S>,
    stock_monitor: StockMonitor<S>,
}

impl<S, C> DataApi<S, C>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
{
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self {
            recalculator: KpiRecalculator::new(store.clone()),
            stock_monitor: StockMonitor::new(store.clone()),
            store,
            config,
        }
    }

    // ==========================================
    // KPI
    // ==========================================

    /// 全量重算 KPI（替换 KPI 集合）
    pub async fn recalc_kpis(&self) -> ApiResult<KpiRecalcSummary> {
        Ok(self.recalculator.recalculate().await?)
    }

    pub async fn list_kpis(&self, filter: &KpiFilter) -> ApiResult<Vec<KpiRecord>> {
        if let Some(period) = filter.period.as_deref() {
            validate_period(period)?;
        }
        Ok(self.store.list_kpis(filter).await?)
    }

    pub async fn list_work_orders(&self, filter: &WorkOrderFilter) -> ApiResult<Vec<WorkOrder>> {
        if let Some(period) = filter.period.as_deref() {
            validate_period(period)?;
        }
        Ok(self.store.list_work_orders(filter).await?)
    }

    // ==========================================
    // 备件库存
    // ==========================================

    pub async fn stock_alerts(&self, only_alerts: bool) -> ApiResult<Vec<StockAlert>> {
        Ok(self.stock_monitor.evaluate_all(only_alerts).await?)
    }

    // ==========================================
    // 快照 / 清空
    // ==========================================

    /// 导出全部集合为 JSON 文档
    pub async fn export_snapshot(&self) -> ApiResult<String> {
        let snapshot = self.store.export_snapshot().await?;
        snapshot
            .to_json()
            .map_err(|e| ApiError::InternalError(format!("sérialisation de la sauvegarde : {}", e)))
    }

    /// 用 JSON 快照替换全部集合
    #[instrument(skip(self, raw), fields(size = raw.len()))]
    pub async fn restore_snapshot(&self, raw: &str) -> ApiResult<BTreeMap<Collection, usize>> {
        let snapshot = StoreSnapshot::from_json(raw.trim_start_matches('\u{feff}'))
            .map_err(|e| ApiError::InvalidSnapshot(e.to_string()))?;
        Ok(self.store.import_snapshot(snapshot).await?)
    }

    pub async fn clear_all(&self) -> ApiResult<()> {
        self.store.clear_all().await?;
        warn!("全部集合已清空");
        Ok(())
    }

    /// 各集合记录数
    pub async fn counts(&self) -> ApiResult<BTreeMap<Collection, usize>> {
        let mut counts = BTreeMap::new();
        for collection in Collection::ALL {
            counts.insert(collection, self.store.count(collection).await?);
        }
        Ok(counts)
    }

    // ==========================================
    // 服务端 ETL
    // ==========================================

    /// 调用服务端 ETL 脚本处理文件
    pub async fn run_etl(&self, file_path: &Path, tenant_id: &str) -> ApiResult<EtlOutcome> {
        if tenant_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("identifiant de tenant vide".to_string()));
        }
        if !file_path.exists() {
            return Err(ApiError::InvalidInput(format!(
                "fichier introuvable : {}",
                file_path.display()
            )));
        }
        let settings = self.config.get_etl_settings().await?;
        let outcome = run_etl_script(&settings, file_path, tenant_id.trim()).await?;
        info!(success = outcome.success, tenant_id = tenant_id, "ETL 服务端处理完成");
        Ok(outcome)
    }
}

/// 校验期间格式 YYYY-MM
fn validate_period(period: &str) -> ApiResult<()> {
    let valid = period
        .split_once('-')
        .map(|(y, m)| {
            y.len() == 4
                && y.chars().all(|c| c.is_ascii_digit())
                && m.parse::<u32>().map(|m| (1..=12).contains(&m)).unwrap_or(false)
                && m.len() == 2
        })
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(format!(
            "période invalide « {} » (format attendu AAAA-MM)",
            period
        )))
    }
}

// ==========================================
// GMAO 维护数据核心 - 上传 API
// ==========================================
// 职责: 单文件上传入口（CSV / XLS / XLSX / JSON 快照）
// 流程: 表格文件 → 导入器 → （工单类）KPI 重算
//       JSON 文件 → 快照还原（替换全部集合）
// 输出: UploadSummary 或 ApiError（可转换为 ErrorPayload）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportConfigReader;
use crate::domain::import::{ImportOutcome, PartialRowSkipped};
use crate::domain::snapshot::StoreSnapshot;
use crate::domain::types::{Collection, FileFormat, RecordFamily};
use crate::engine::KpiRecalculator;
use crate::i18n;
use crate::importer::error::ImportError;
use crate::importer::{ImportOptions, MaintenanceImporter, MaintenanceImporterImpl};
use crate::repository::MaintenanceStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// UploadSummary - 上传结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadKind {
    TabularImport,
    SnapshotRestore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub file_name: String,
    pub kind: UploadKind,
    pub family: Option<RecordFamily>,
    pub sheet_name: Option<String>,
    pub header_row: Option<usize>,
    pub created: BTreeMap<Collection, usize>,
    pub skipped: Vec<PartialRowSkipped>,
    pub filtered_out: usize,
    pub outcome: ImportOutcome,
    pub kpi_records: Option<usize>, // 导入后重算的 KPI 记录数
    pub message: String,
}

impl UploadSummary {
    pub fn created_in(&self, collection: Collection) -> usize {
        self.created.get(&collection).copied().unwrap_or(0)
    }
}

// ==========================================
// UploadApi
// ==========================================
pub struct UploadApi<S, C>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
{
    store: Arc<S>,
    config: Arc<C>,
    importer: MaintenanceImporterImpl<S, C>,
    recalculator: KpiRecalculator<S>,
}

impl<S, C> UploadApi<S, C>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
{
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self {
            importer: MaintenanceImporterImpl::new(store.clone(), config.clone()),
            recalculator: KpiRecalculator::new(store.clone()),
            store,
            config,
        }
    }

    /// 上传文件内容
    ///
    /// # 参数
    /// - file_name: 原始文件名（扩展名决定格式）
    /// - bytes: 文件内容
    /// - machine_filter: 目标设备过滤（仅工单类文件生效）
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        machine_filter: Option<&str>,
    ) -> ApiResult<UploadSummary> {
        match FileFormat::from_file_name(file_name) {
            Some(FileFormat::Json) => self.restore_snapshot(file_name, bytes).await,
            Some(_) => self.import_tabular(file_name, bytes, machine_filter).await,
            None => {
                let extension = file_name
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_lowercase())
                    .unwrap_or_default();
                Err(ImportError::UnsupportedFormat(extension).into())
            }
        }
    }

    /// 从磁盘上传
    pub async fn upload_file(
        &self,
        path: &Path,
        machine_filter: Option<&str>,
    ) -> ApiResult<UploadSummary> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()).into());
        }
        let bytes = tokio::fs::read(path).await.map_err(ImportError::from)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        self.upload(&file_name, &bytes, machine_filter).await
    }

    async fn import_tabular(
        &self,
        file_name: &str,
        bytes: &[u8],
        machine_filter: Option<&str>,
    ) -> ApiResult<UploadSummary> {
        let options = machine_filter
            .map(ImportOptions::with_machine_filter)
            .unwrap_or_default();
        let summary = self.importer.import_bytes(file_name, bytes, &options).await?;

        // 工单类导入后全量重算 KPI
        let settings = self.config.get_import_settings().await?;
        let touches_work_orders = matches!(
            summary.family,
            RecordFamily::WorkOrders | RecordFamily::AmdecFromWorkOrders
        );
        let kpi_records = if settings.recalc_kpis_after_import
            && touches_work_orders
            && summary.created_in(Collection::WorkOrders) > 0
        {
            Some(self.recalculator.recalculate().await?.kpi_records)
        } else {
            None
        };

        let message = match summary.outcome {
            ImportOutcome::Imported => i18n::t_with_args(
                "upload.imported",
                &[
                    ("created", &summary.total_created().to_string()),
                    ("skipped", &summary.skipped.len().to_string()),
                ],
            ),
            ImportOutcome::NoValidRecords => i18n::t("upload.no_valid_records"),
        };

        Ok(UploadSummary {
            file_name: summary.file_name,
            kind: UploadKind::TabularImport,
            family: Some(summary.family),
            sheet_name: summary.sheet_name,
            header_row: Some(summary.header_row),
            created: summary.created,
            skipped: summary.skipped,
            filtered_out: summary.filtered_out,
            outcome: summary.outcome,
            kpi_records,
            message,
        })
    }

    async fn restore_snapshot(&self, file_name: &str, bytes: &[u8]) -> ApiResult<UploadSummary> {
        let text = String::from_utf8_lossy(bytes);
        let snapshot = StoreSnapshot::from_json(text.trim_start_matches('\u{feff}'))
            .map_err(|e| ApiError::InvalidSnapshot(e.to_string()))?;
        let created = self.store.import_snapshot(snapshot).await?;
        let total: usize = created.values().sum();
        info!(file_name = file_name, records = total, "快照还原完成");

        Ok(UploadSummary {
            file_name: file_name.to_string(),
            kind: UploadKind::SnapshotRestore,
            family: None,
            sheet_name: None,
            header_row: None,
            created,
            skipped: Vec::new(),
            filtered_out: 0,
            outcome: if total == 0 {
                ImportOutcome::NoValidRecords
            } else {
                ImportOutcome::Imported
            },
            kpi_records: None,
            message: i18n::t_with_args("upload.snapshot_restored", &[("created", &total.to_string())]),
        })
    }
}

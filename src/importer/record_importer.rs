// ==========================================
// GMAO 维护数据核心 - 记录导入器
// ==========================================
// 阶段 2: 已分类的行 → 强类型记录 → 落库（只追加）
// 规则: 行级问题只跳过并记录（PartialRowSkipped）, 不中断导入
//       首次出现的设备编码自动建档; 功能按名称复用
// ==========================================

use crate::config::ImportSettings;
use crate::domain::amdec::{AmdecRawRow, FailureMode, FunctionRecord};
use crate::domain::import::PartialRowSkipped;
use crate::domain::maintenance::{Asset, WorkOrder};
use crate::domain::types::Collection;
use crate::importer::derivation::{canonicalize_scores, derive_amdec};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{
    ColumnMap, FieldMapper, WorkOrderRow, FAILURE_MODE_FIELDS, PART_DEMAND_FIELDS, PART_FIELDS,
    WORK_ORDER_FIELDS,
};
use crate::importer::schema_classifier::HeaderSet;
use crate::importer::vocabulary::normalize_header;
use crate::repository::MaintenanceStore;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// DataRow - 表头之后的非空数据行
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct DataRow<'a> {
    pub row_number: usize, // 源表行号（1 起）
    pub cells: &'a [String],
}

// ==========================================
// FamilyOutcome - 单个记录族的导入结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyOutcome {
    pub created: BTreeMap<Collection, usize>,
    pub skipped: Vec<PartialRowSkipped>,
    pub filtered_out: usize,
}

impl FamilyOutcome {
    fn skip(&mut self, row_number: usize, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(row_number = row_number, reason = %reason, "行被跳过");
        self.skipped.push(PartialRowSkipped { row_number, reason });
    }

    fn record(&mut self, collection: Collection, count: usize) {
        *self.created.entry(collection).or_insert(0) += count;
    }
}

// ==========================================
// RecordImporter
// ==========================================
pub struct RecordImporter<'a, S: MaintenanceStore + ?Sized> {
    store: &'a S,
    mapper: &'a FieldMapper,
    settings: &'a ImportSettings,
    source_file: String,
    known_assets: HashSet<String>, // 本次导入已确认存在的设备编码
}

impl<'a, S: MaintenanceStore + ?Sized> RecordImporter<'a, S> {
    pub fn new(
        store: &'a S,
        mapper: &'a FieldMapper,
        settings: &'a ImportSettings,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mapper,
            settings,
            source_file: source_file.into(),
            known_assets: HashSet::new(),
        }
    }

    /// 设备编码首次出现时建档（返回需要写入的新设备）
    async fn ensure_asset(&mut self, code: &str, pending: &mut Vec<Asset>) -> ImportResult<()> {
        if self.known_assets.contains(code) {
            return Ok(());
        }
        if self.store.find_asset_by_code(code).await?.is_none() {
            debug!(asset_code = code, "自动创建设备");
            pending.push(Asset::new(code));
        }
        self.known_assets.insert(code.to_string());
        Ok(())
    }

    /// 功能按名称复用（不区分大小写）; 返回最终使用的功能 ID
    async fn resolve_function(
        &self,
        function: &FunctionRecord,
        pending: &mut Vec<FunctionRecord>,
    ) -> ImportResult<String> {
        let key = normalize_header(&function.name);
        if let Some(existing) = pending.iter().find(|f| normalize_header(&f.name) == key) {
            return Ok(existing.id.clone());
        }
        if let Some(existing) = self.store.find_function_by_name(&function.name).await? {
            return Ok(existing.id);
        }
        pending.push(function.clone());
        Ok(function.id.clone())
    }

    // ===== 工单 / AMDEC-来自维护记录 =====
    pub async fn import_work_orders(
        &mut self,
        headers: &HeaderSet,
        rows: &[DataRow<'_>],
        machine_filter: Option<&str>,
        derive_failure_modes: bool,
    ) -> ImportResult<FamilyOutcome> {
        let map = ColumnMap::resolve(headers, WORK_ORDER_FIELDS);
        let has_asset_column = map.contains(crate::importer::field_mapper::Field::AssetCode);
        let filter = machine_filter
            .map(|f| f.trim())
            .filter(|f| !f.is_empty());
        let filter_normalized = filter.map(normalize_header);

        let mut outcome = FamilyOutcome::default();
        let mut new_assets = Vec::new();
        let mut work_orders = Vec::new();
        let mut derivation_input: Vec<(String, WorkOrderRow)> = Vec::new();
        let imported_at = Utc::now();

        for row in rows {
            let mapped = self.mapper.map_work_order(row.cells, &map);

            // 设备编码: 单元格 > 过滤条件 > 占位编码（后两者仅当文件无设备列）
            let asset_code = match (&mapped.asset_code, filter) {
                (Some(code), _) => Some(code.clone()),
                (None, Some(f)) if !has_asset_column => Some(f.to_string()),
                (None, None) if !has_asset_column => Some(self.settings.unassigned_asset_code.clone()),
                (None, _) => None,
            };

            let Some(asset_code) = asset_code else {
                // 设备列为空的行不可能匹配过滤条件
                if filter.is_some() {
                    outcome.filtered_out += 1;
                    continue;
                }
                let reason = if mapped.start_at.is_none() {
                    "ligne sans équipement ni date"
                } else {
                    "code équipement manquant"
                };
                outcome.skip(row.row_number, reason);
                continue;
            };

            if let (Some(normalized), Some(_)) = (&filter_normalized, &mapped.asset_code) {
                if !normalize_header(&asset_code).contains(normalized.as_str()) {
                    outcome.filtered_out += 1;
                    continue;
                }
            }

            self.ensure_asset(&asset_code, &mut new_assets).await?;

            work_orders.push(WorkOrder {
                id: Uuid::new_v4().to_string(),
                asset_code: asset_code.clone(),
                wo_code: mapped.wo_code.clone(),
                start_at: mapped.start_at,
                end_at: mapped.end_at,
                failure_type: mapped.failure_type.clone(),
                component: mapped.component.clone(),
                cause: mapped.cause.clone(),
                technician: mapped.technician.clone(),
                description: mapped.description.clone(),
                downtime_hours: mapped.downtime_hours,
                material_cost: mapped.material_cost,
                total_cost: mapped.total_cost,
                source_file: Some(self.source_file.clone()),
                imported_at,
            });
            if derive_failure_modes {
                derivation_input.push((asset_code, mapped));
            }
        }

        outcome.record(Collection::Assets, self.store.insert_assets(new_assets).await?);
        outcome.record(
            Collection::WorkOrders,
            self.store.insert_work_orders(work_orders).await?,
        );

        if derive_failure_modes && !derivation_input.is_empty() {
            let derived = derive_amdec(&derivation_input);
            let mut new_functions = Vec::new();
            let mut id_remap: HashMap<String, String> = HashMap::new();
            for function in &derived.functions {
                let id = self.resolve_function(function, &mut new_functions).await?;
                id_remap.insert(function.id.clone(), id);
            }

            let modes: Vec<FailureMode> = derived
                .failure_modes
                .into_iter()
                .map(|mut mode| {
                    mode.function_id = mode
                        .function_id
                        .as_ref()
                        .and_then(|id| id_remap.get(id).cloned());
                    mode
                })
                .collect();

            outcome.record(Collection::Functions, self.store.insert_functions(new_functions).await?);
            outcome.record(Collection::FailureModes, self.store.insert_failure_modes(modes).await?);
        }

        info!(
            created = outcome.created.get(&Collection::WorkOrders).copied().unwrap_or(0),
            skipped = outcome.skipped.len(),
            filtered_out = outcome.filtered_out,
            "工单导入完成"
        );
        Ok(outcome)
    }

    // ===== AMDEC 表 =====
    pub async fn import_failure_modes(
        &mut self,
        headers: &HeaderSet,
        rows: &[DataRow<'_>],
    ) -> ImportResult<FamilyOutcome> {
        let map = ColumnMap::resolve(headers, FAILURE_MODE_FIELDS);
        let mut outcome = FamilyOutcome::default();
        let mut raw_rows = Vec::with_capacity(rows.len());
        let mut modes = Vec::new();

        for row in rows {
            // 原始行（表头 → 单元格）原样保存
            let values: BTreeMap<String, String> = headers
                .cells()
                .iter()
                .map(|h| {
                    let value = row.cells.get(h.column).cloned().unwrap_or_default();
                    (h.original.clone(), value)
                })
                .collect();
            raw_rows.push(AmdecRawRow {
                id: Uuid::new_v4().to_string(),
                source_file: Some(self.source_file.clone()),
                row_number: row.row_number,
                values,
            });

            match self.mapper.map_failure_mode(row.cells, &map) {
                Ok(mode) => modes.push(mode),
                Err(reason) => outcome.skip(row.row_number, reason),
            }
        }

        canonicalize_scores(&mut modes);

        let mut new_functions = Vec::new();
        for mode in modes.iter_mut() {
            if let Some(name) = mode.function_name.clone() {
                let function = FunctionRecord::new(name, mode.asset_code.clone());
                mode.function_id = Some(self.resolve_function(&function, &mut new_functions).await?);
            }
        }

        outcome.record(Collection::AmdecRows, self.store.insert_amdec_rows(raw_rows).await?);
        outcome.record(Collection::Functions, self.store.insert_functions(new_functions).await?);
        outcome.record(Collection::FailureModes, self.store.insert_failure_modes(modes).await?);
        Ok(outcome)
    }

    // ===== 备件 =====
    pub async fn import_parts(
        &mut self,
        headers: &HeaderSet,
        rows: &[DataRow<'_>],
    ) -> ImportResult<FamilyOutcome> {
        let map = ColumnMap::resolve(headers, PART_FIELDS);
        let mut outcome = FamilyOutcome::default();
        let mut parts = Vec::new();

        for row in rows {
            match self.mapper.map_part(row.cells, &map) {
                Ok(part) => parts.push(part),
                Err(reason) => outcome.skip(row.row_number, reason),
            }
        }

        outcome.record(Collection::Parts, self.store.insert_parts(parts).await?);
        Ok(outcome)
    }

    // ===== 备件消耗 =====
    pub async fn import_part_demand(
        &mut self,
        headers: &HeaderSet,
        rows: &[DataRow<'_>],
    ) -> ImportResult<FamilyOutcome> {
        let map = ColumnMap::resolve(headers, PART_DEMAND_FIELDS);
        let mut outcome = FamilyOutcome::default();
        let mut demand = Vec::new();

        for row in rows {
            match self.mapper.map_part_demand(row.cells, &map) {
                Ok(record) => demand.push(record),
                Err(reason) => outcome.skip(row.row_number, reason),
            }
        }

        outcome.record(Collection::PartDemand, self.store.insert_part_demand(demand).await?);
        Ok(outcome)
    }
}

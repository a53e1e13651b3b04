// ==========================================
// GMAO 维护数据核心 - 维护数据导入器实现
// ==========================================
// 职责: 整合导入流程, 从文件到本地存储
// 流程: 解析 → 选表/定位表头 → 分类 → 列映射 → 行映射 → 落库
// 红线: 文件级问题整体中止; 行级问题只跳过
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{ImportOutcome, ImportSummary};
use crate::domain::types::{Collection, FileFormat, RecordFamily};
use crate::importer::data_cleaner::DataCleanerImpl;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{RawGrid, UniversalFileParser};
use crate::importer::importer_trait::{FileParser, ImportOptions, MaintenanceImporter};
use crate::importer::record_importer::{DataRow, FamilyOutcome, RecordImporter};
use crate::importer::schema_classifier::{classify, HeaderSet};
use crate::importer::sheet_selector::select_sheet;
use crate::repository::MaintenanceStore;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

// ==========================================
// MaintenanceImporterImpl
// ==========================================
pub struct MaintenanceImporterImpl<S, C>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
{
    // 数据访问层
    store: Arc<S>,

    // 配置读取器
    config: Arc<C>,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    field_mapper: FieldMapper,
}

impl<S, C> MaintenanceImporterImpl<S, C>
where
    S: MaintenanceStore,
    C: ImportConfigReader,
{
    /// 使用默认解析器/清洗器创建
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self::with_components(
            store,
            config,
            Box::new(UniversalFileParser),
            FieldMapper::new(Box::new(DataCleanerImpl)),
        )
    }

    /// 注入自定义组件
    pub fn with_components(
        store: Arc<S>,
        config: Arc<C>,
        file_parser: Box<dyn FileParser>,
        field_mapper: FieldMapper,
    ) -> Self {
        Self {
            store,
            config,
            file_parser,
            field_mapper,
        }
    }

    /// 定位数据表与表头行
    ///
    /// 工作簿: 评分选表; CSV: 第一个非空行即表头
    fn locate_table(
        &self,
        file_name: &str,
        format: FileFormat,
        sheets: Vec<crate::importer::file_parser::SheetGrid>,
        settings: &crate::config::ImportSettings,
    ) -> ImportResult<(Option<String>, RawGrid, usize)> {
        match format {
            FileFormat::Spreadsheet => {
                let selection = select_sheet(&sheets, &settings.selector_settings())?;
                let grid = sheets
                    .into_iter()
                    .nth(selection.sheet_index)
                    .map(|s| s.grid)
                    .ok_or_else(|| {
                        ImportError::InternalError(format!(
                            "feuille sélectionnée introuvable: {}",
                            selection.sheet_name
                        ))
                    })?;
                Ok((Some(selection.sheet_name), grid, selection.header_row))
            }
            _ => {
                let grid = sheets
                    .into_iter()
                    .next()
                    .map(|s| s.grid)
                    .unwrap_or_else(|| RawGrid::new(Vec::new()));
                let header_row = grid
                    .non_empty_rows()
                    .map(|(idx, _)| idx)
                    .next()
                    .ok_or_else(|| ImportError::Parse {
                        file_name: file_name.to_string(),
                        message: "fichier vide".to_string(),
                    })?;
                Ok((None, grid, header_row))
            }
        }
    }

    /// 记录族的主集合（用于判断是否有可用记录）
    fn primary_collection(family: RecordFamily) -> Collection {
        match family {
            RecordFamily::AmdecFromWorkOrders | RecordFamily::WorkOrders => Collection::WorkOrders,
            RecordFamily::FailureModes => Collection::FailureModes,
            RecordFamily::Parts => Collection::Parts,
            RecordFamily::PartDemand => Collection::PartDemand,
        }
    }
}

#[async_trait]
impl<S, C> MaintenanceImporter for MaintenanceImporterImpl<S, C>
where
    S: MaintenanceStore + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, bytes, options), fields(file_name = %file_name, size = bytes.len()))]
    async fn import_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        options: &ImportOptions,
    ) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        info!("开始导入维护数据");

        let settings = self.config.get_import_settings().await?;

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        let format = match FileFormat::from_file_name(file_name) {
            Some(FileFormat::Json) | None => return Err(ImportError::UnsupportedFormat(extension)),
            Some(format) => format,
        };

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let sheets = self.file_parser.parse_grids(file_name, bytes)?;

        // === 步骤 2: 选表 + 表头 ===
        debug!("步骤 2: 定位表头");
        let (sheet_name, grid, header_row) =
            self.locate_table(file_name, format, sheets, &settings)?;
        let header_cells = grid.rows.get(header_row).ok_or_else(|| ImportError::Parse {
            file_name: file_name.to_string(),
            message: "aucune ligne d'en-tête exploitable".to_string(),
        })?;
        let headers = HeaderSet::from_row(header_cells);

        // === 步骤 3: 分类 ===
        let family = classify(&headers)?;
        info!(
            family = %family,
            sheet = sheet_name.as_deref().unwrap_or("-"),
            header_row = header_row + 1,
            "文件分类完成"
        );

        // === 步骤 4: 数据行 ===
        let rows: Vec<DataRow<'_>> = grid
            .rows
            .iter()
            .enumerate()
            .skip(header_row + 1)
            .filter(|(_, row)| !RawGrid::is_blank_row(row))
            .map(|(idx, row)| DataRow {
                row_number: idx + 1,
                cells: row.as_slice(),
            })
            .collect();
        let total_rows = rows.len();

        // === 步骤 5: 映射 + 落库 ===
        let mut importer =
            RecordImporter::new(self.store.as_ref(), &self.field_mapper, &settings, file_name);
        let outcome: FamilyOutcome = match family {
            RecordFamily::WorkOrders => {
                importer
                    .import_work_orders(&headers, &rows, options.machine_filter.as_deref(), false)
                    .await?
            }
            RecordFamily::AmdecFromWorkOrders => {
                importer
                    .import_work_orders(&headers, &rows, options.machine_filter.as_deref(), true)
                    .await?
            }
            RecordFamily::FailureModes => importer.import_failure_modes(&headers, &rows).await?,
            RecordFamily::Parts => importer.import_parts(&headers, &rows).await?,
            RecordFamily::PartDemand => importer.import_part_demand(&headers, &rows).await?,
        };

        let primary = outcome
            .created
            .get(&Self::primary_collection(family))
            .copied()
            .unwrap_or(0);
        let result = if primary == 0 {
            ImportOutcome::NoValidRecords
        } else {
            ImportOutcome::Imported
        };

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            family = %family,
            total = total_rows,
            created = primary,
            skipped = outcome.skipped.len(),
            filtered_out = outcome.filtered_out,
            elapsed_ms = elapsed_ms,
            "维护数据导入完成"
        );

        Ok(ImportSummary {
            file_name: file_name.to_string(),
            family,
            sheet_name,
            header_row: header_row + 1,
            total_rows,
            created: outcome.created,
            skipped: outcome.skipped,
            filtered_out: outcome.filtered_out,
            outcome: result,
            elapsed_ms,
        })
    }

    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        options: &ImportOptions,
    ) -> ImportResult<ImportSummary> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        self.import_bytes(&file_name, &bytes, options).await
    }
}

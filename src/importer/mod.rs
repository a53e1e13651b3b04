// ==========================================
// GMAO 维护数据核心 - 导入层
// ==========================================
// 职责: 外部维护数据导入, 生成本地记录
// 支持: Excel 工作簿, CSV
// 流程: 解析 → 选表 → 分类 → 列映射 → 行映射 → 落库
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod derivation;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod maintenance_importer;
pub mod record_importer;
pub mod schema_classifier;
pub mod sheet_selector;
pub mod vocabulary;

// 重导出核心类型
pub use data_cleaner::DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use maintenance_importer::MaintenanceImporterImpl;
pub use schema_classifier::classify;
pub use sheet_selector::select_sheet;

// 重导出 Trait 接口
pub use importer_trait::{DataCleaner, FileParser, ImportOptions, MaintenanceImporter};

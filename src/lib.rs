// ==========================================
// GMAO 维护数据核心 - 核心库
// ==========================================
// 职责: 维护数据导入（CSV/Excel）、可靠性 KPI、AMDEC 校验、备件监控
// 技术栈: Rust + SQLite
// 系统定位: 本地优先的数据采集核心（分析结果需人工确认）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "fr");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 本地存储
pub mod repository;

// 引擎层 - KPI 重算 / 库存监控
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 分析层 - AMDEC（LLM 结果校验）
pub mod analysis;

// 服务端 ETL 脚本调用
pub mod etl;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Collection, FileFormat, MetricType, RecordFamily};

// 领域实体
pub use domain::{
    AmdecRawRow, Asset, FailureMode, FunctionRecord, ImportOutcome, ImportSummary, KpiRecord,
    Part, PartDemand, PartialRowSkipped, StoreSnapshot, WorkOrder,
};

// 引擎
pub use engine::{KpiRecalculator, StockMonitor};

// 导入
pub use importer::{ImportError, MaintenanceImporter, MaintenanceImporterImpl};

// 分析
pub use analysis::{AmdecAnalysisService, ChatCompletionClient, GroqClient};

// 存储
pub use repository::{MaintenanceStore, SqliteMaintenanceStore};

// API
pub use api::{AnalysisApi, ApiError, DataApi, ErrorPayload, UploadApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "GMAO - données de maintenance";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

// ==========================================
// GMAO 维护数据核心 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑, 不含导入/引擎逻辑
// ==========================================

pub mod amdec;
pub mod import;
pub mod kpi;
pub mod maintenance;
pub mod part;
pub mod snapshot;
pub mod text;
pub mod types;

// 重导出核心类型
pub use amdec::{AmdecRawRow, FailureMode, FunctionRecord};
pub use import::{ImportOutcome, ImportSummary, PartialRowSkipped};
pub use kpi::KpiRecord;
pub use maintenance::{Asset, WorkOrder};
pub use part::{ConfidenceLevel, DemandStrategy, Part, PartDemand, StockStatus};
pub use snapshot::StoreSnapshot;
pub use types::{Collection, FileFormat, MetricType, RecordFamily};

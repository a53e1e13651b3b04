// ==========================================
// GMAO 维护数据核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供本地存储访问接口, 屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod maintenance_store;
pub mod maintenance_store_impl;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use maintenance_store::{KpiFilter, MaintenanceStore, WorkOrderFilter};
pub use maintenance_store_impl::SqliteMaintenanceStore;

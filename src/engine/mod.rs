// ==========================================
// GMAO 维护数据核心 - 引擎层
// ==========================================
// 职责: 实现可靠性/库存规则引擎, 不拼 SQL
// 红线: Engine 不拼 SQL, 判定规则必须输出 reason
// ==========================================

pub mod kpi_recalc;
pub mod stock_monitor;

// 重导出核心引擎
pub use kpi_recalc::{compute_kpis, KpiRecalcSummary, KpiRecalculator};
pub use stock_monitor::{MtbfForecast, MtbfStats, StockAlert, StockMonitor};

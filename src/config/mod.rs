// ==========================================
// GMAO 维护数据核心 - 配置层
// ==========================================
// 职责: 导入阈值 / LLM / ETL 配置读取
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{AnalysisSettings, EtlSettings, ImportConfigReader, ImportSettings};

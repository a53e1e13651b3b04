// ==========================================
// GMAO 维护数据核心 - 配置读取 Trait
// ==========================================
// 职责: 定义导入/分析/ETL 所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// 约定: 每次操作开始时读取一次有效配置快照
// ==========================================

use crate::importer::sheet_selector::SelectorSettings;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ==========================================
// ImportSettings - 导入阈值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub min_sheet_rows: usize,        // 工作表最少非空行数
    pub header_scan_rows: usize,      // 表头扫描行数
    pub score_threshold: i32,         // 选表评分阈值
    pub unassigned_asset_code: String, // 无设备列时的占位设备编码
    pub recalc_kpis_after_import: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        let selector = SelectorSettings::default();
        Self {
            min_sheet_rows: selector.min_sheet_rows,
            header_scan_rows: selector.header_scan_rows,
            score_threshold: selector.score_threshold,
            unassigned_asset_code: "NON_AFFECTE".to_string(),
            recalc_kpis_after_import: true,
        }
    }
}

impl ImportSettings {
    /// 选表阈值; 行数类阈值至少为 1, 空工作表永远不会被选中
    pub fn selector_settings(&self) -> SelectorSettings {
        SelectorSettings {
            min_sheet_rows: self.min_sheet_rows.max(1),
            header_scan_rows: self.header_scan_rows.max(1),
            score_threshold: self.score_threshold,
        }
    }
}

// ==========================================
// AnalysisSettings - AMDEC 分析（LLM）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub llm_endpoint: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,
    pub max_aggregates: usize, // 发送给模型的聚合条数上限（按次数降序截取）
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            llm_endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            llm_model: "llama-3.3-70b-versatile".to_string(),
            llm_temperature: 0.2,
            llm_timeout_secs: 60,
            max_aggregates: 40,
        }
    }
}

// ==========================================
// EtlSettings - 服务端 ETL 脚本
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlSettings {
    pub interpreter: String,
    pub script_path: String,
    pub timeout_secs: u64,
}

impl Default for EtlSettings {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            script_path: "scripts/import_maintenance.py".to_string(),
            timeout_secs: 300,
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 导入阈值（缺失/非法的键取默认值）
    async fn get_import_settings(&self) -> RepositoryResult<ImportSettings>;

    /// AMDEC 分析配置
    async fn get_analysis_settings(&self) -> RepositoryResult<AnalysisSettings>;

    /// ETL 脚本配置
    async fn get_etl_settings(&self) -> RepositoryResult<EtlSettings>;
}

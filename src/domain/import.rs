// ==========================================
// GMAO 维护数据核心 - 导入结果模型
// ==========================================
// 行级问题只记录, 不中断导入
// ==========================================

use crate::domain::types::{Collection, RecordFamily};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// PartialRowSkipped - 被跳过的行（非致命）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRowSkipped {
    pub row_number: usize, // 源表中的行号（1 起, 含表头偏移）
    pub reason: String,
}

// ==========================================
// ImportOutcome - 导入结论
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportOutcome {
    Imported,
    NoValidRecords, // 0 行可用, 非错误
}

// ==========================================
// ImportSummary - 单文件导入汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub file_name: String,
    pub family: RecordFamily,
    pub sheet_name: Option<String>,
    pub header_row: usize,
    pub total_rows: usize,
    pub created: BTreeMap<Collection, usize>,
    pub skipped: Vec<PartialRowSkipped>,
    pub filtered_out: usize, // 被机器过滤条件排除的行
    pub outcome: ImportOutcome,
    pub elapsed_ms: u64,
}

impl ImportSummary {
    pub fn created_in(&self, collection: Collection) -> usize {
        self.created.get(&collection).copied().unwrap_or(0)
    }

    pub fn total_created(&self) -> usize {
        self.created.values().sum()
    }
}

// ==========================================
// GMAO 维护数据核心 - 导入 Trait
// ==========================================
// 职责: 定义导入管道接口（不包含实现）
// 管道: 解析 → 选表 → 分类 → 映射 → 落库
// ==========================================

use crate::domain::import::ImportSummary;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::SheetGrid;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::path::Path;

// ==========================================
// ImportOptions - 单次导入选项
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// 目标设备过滤（仅保留设备编码包含该值的工单行）
    pub machine_filter: Option<String>,
}

impl ImportOptions {
    pub fn with_machine_filter(filter: impl Into<String>) -> Self {
        let filter = filter.into();
        Self {
            machine_filter: if filter.trim().is_empty() {
                None
            } else {
                Some(filter)
            },
        }
    }
}

// ==========================================
// MaintenanceImporter Trait
// ==========================================
// 用途: 导入主接口
// 实现者: MaintenanceImporterImpl
#[async_trait]
pub trait MaintenanceImporter: Send + Sync {
    /// 导入内存中的文件内容（上传入口使用）
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于推断格式与错误信息）
    /// - bytes: 文件内容
    /// - options: 导入选项
    ///
    /// # 返回
    /// - Ok(ImportSummary): 各集合新增数量 + 被跳过的行
    /// - Err: 文件级/分类级错误（整个导入中止）
    async fn import_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        options: &ImportOptions,
    ) -> ImportResult<ImportSummary>;

    /// 从磁盘文件导入
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        options: &ImportOptions,
    ) -> ImportResult<ImportSummary>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析为字符串网格（CSV 一个网格, 工作簿每个工作表一个网格）
    fn parse_grids(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Vec<SheetGrid>>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格值清洗（容错, 不报错）
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// 空字符串/空白/占位符 → None
    fn normalize_null(&self, value: Option<&str>) -> Option<String>;

    /// 数值解析（逗号小数、单位、货币符号）; 无法解析 → 0
    fn parse_number(&self, value: Option<&str>) -> f64;

    /// 日期解析（ISO / dd/mm/yyyy / Excel 序列号）; 无法解析 → None
    fn parse_datetime(&self, value: Option<&str>) -> Option<NaiveDateTime>;

    /// 期间标准化为 YYYY-MM
    fn normalize_period(&self, value: Option<&str>) -> Option<String>;

    /// AMDEC 评分（原始刻度, 1..=10）
    fn parse_score(&self, value: Option<&str>) -> Option<u8>;
}

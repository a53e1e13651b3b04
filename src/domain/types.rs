// ==========================================
// GMAO 维护数据核心 - 领域类型定义
// ==========================================
// 职责: 记录族 / 指标类型 / 集合名 / 文件格式
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 记录族 (Record Family)
// ==========================================
// 一个文件只路由到一个导入器（互斥分类）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordFamily {
    AmdecFromWorkOrders, // 带 organe + cause 的维护记录
    WorkOrders,          // 工单（interventions）
    FailureModes,        // AMDEC 失效模式表
    Parts,               // 备件库存（PDR）
    PartDemand,          // 备件消耗历史
}

impl RecordFamily {
    /// 支持的格式清单（用于错误提示）
    pub const ALL: [RecordFamily; 5] = [
        RecordFamily::AmdecFromWorkOrders,
        RecordFamily::WorkOrders,
        RecordFamily::FailureModes,
        RecordFamily::Parts,
        RecordFamily::PartDemand,
    ];

    /// 面向用户的格式名称
    pub fn label(&self) -> &'static str {
        match self {
            RecordFamily::AmdecFromWorkOrders => "AMDEC depuis historique de maintenance",
            RecordFamily::WorkOrders => "Historique d'interventions (ordres de travail)",
            RecordFamily::FailureModes => "Tableau AMDEC (modes de défaillance)",
            RecordFamily::Parts => "Stock de pièces de rechange (PDR)",
            RecordFamily::PartDemand => "Consommation de pièces par période",
        }
    }
}

impl fmt::Display for RecordFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFamily::AmdecFromWorkOrders => write!(f, "AMDEC_FROM_WORK_ORDERS"),
            RecordFamily::WorkOrders => write!(f, "WORK_ORDERS"),
            RecordFamily::FailureModes => write!(f, "FAILURE_MODES"),
            RecordFamily::Parts => write!(f, "PARTS"),
            RecordFamily::PartDemand => write!(f, "PART_DEMAND"),
        }
    }
}

// ==========================================
// KPI 指标类型 (Metric Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Availability, // 可用率（0..=1）
    Mtbf,         // 平均故障间隔（小时）
    Mttr,         // 平均修复时间（小时）
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Availability => "availability",
            MetricType::Mtbf => "mtbf",
            MetricType::Mttr => "mttr",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "availability" => Ok(MetricType::Availability),
            "mtbf" => Ok(MetricType::Mtbf),
            "mttr" => Ok(MetricType::Mttr),
            other => Err(format!("unknown metric type: {}", other)),
        }
    }
}

// ==========================================
// 本地存储集合 (Collection)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Assets,
    WorkOrders,
    Functions,
    FailureModes,
    AmdecRows,
    Parts,
    PartDemand,
    Kpis,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Assets,
        Collection::WorkOrders,
        Collection::Functions,
        Collection::FailureModes,
        Collection::AmdecRows,
        Collection::Parts,
        Collection::PartDemand,
        Collection::Kpis,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Assets => "assets",
            Collection::WorkOrders => "work_orders",
            Collection::Functions => "functions",
            Collection::FailureModes => "failure_modes",
            Collection::AmdecRows => "amdec_rows",
            Collection::Parts => "parts",
            Collection::PartDemand => "part_demand",
            Collection::Kpis => "kpis",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

// ==========================================
// 上传文件格式 (File Format)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Spreadsheet, // .xlsx / .xls / .xlsm / .ods
    Json,        // 本地存储快照
}

impl FileFormat {
    /// 根据扩展名推断格式（大小写不敏感）
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = file_name.rsplit_once('.')?.1.to_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(FileFormat::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(FileFormat::Spreadsheet),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_format_from_name() {
        assert_eq!(FileFormat::from_file_name("export.CSV"), Some(FileFormat::Csv));
        assert_eq!(
            FileFormat::from_file_name("GMAO 2024.xlsx"),
            Some(FileFormat::Spreadsheet)
        );
        assert_eq!(FileFormat::from_file_name("backup.json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_file_name("rapport.pdf"), None);
        assert_eq!(FileFormat::from_file_name("sans_extension"), None);
    }

    #[test]
    fn test_metric_type_round_trip() {
        for metric in [MetricType::Availability, MetricType::Mtbf, MetricType::Mttr] {
            assert_eq!(metric.as_str().parse::<MetricType>().unwrap(), metric);
        }
        assert!("oee".parse::<MetricType>().is_err());
    }
}

// ==========================================
// GMAO 维护数据核心 - 设备与工单模型
// ==========================================
// 用途: 导入层写入, KPI 重算与 AMDEC 分析只读
// ==========================================

use crate::domain::text::normalize_header;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Asset - 设备
// ==========================================
// 首次在工单中出现时自动创建, 从不自动删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub code: String,           // 设备编码/名称（Désignation）
    pub asset_type: String,     // 默认 "equipment"
    pub created_at: DateTime<Utc>,
}

impl Asset {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            code: code.into(),
            asset_type: "equipment".to_string(),
            created_at: Utc::now(),
        }
    }
}

// ==========================================
// WorkOrder - 工单（一次维护干预）
// ==========================================
// 重新导入只追加, 不合并
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub asset_code: String,

    pub wo_code: Option<String>,            // 工单号（可选）
    pub start_at: Option<NaiveDateTime>,    // 开始时间（无法解析则为 None）
    pub end_at: Option<NaiveDateTime>,      // 结束时间

    pub failure_type: Option<String>,       // Type de panne
    pub component: Option<String>,          // Organe
    pub cause: Option<String>,
    pub technician: Option<String>,
    pub description: Option<String>,        // Résumé intervention

    pub downtime_hours: f64,                // Durée arrêt (h)
    pub material_cost: f64,                 // Coût matériel
    pub total_cost: f64,                    // Coût total intervention

    pub source_file: Option<String>,
    pub imported_at: DateTime<Utc>,
}

impl WorkOrder {
    /// 干预成本: 优先总成本, 否则材料成本
    pub fn intervention_cost(&self) -> f64 {
        if self.total_cost > 0.0 {
            self.total_cost
        } else {
            self.material_cost
        }
    }

    /// 是否为预防性维护（不计入故障次数）
    pub fn is_preventive(&self) -> bool {
        self.failure_type
            .as_deref()
            .map(|t| {
                let folded = normalize_header(t);
                folded.contains("preventi") || folded.contains("systematique")
            })
            .unwrap_or(false)
    }

    /// 月度周期（YYYY-MM）
    pub fn period(&self) -> Option<String> {
        self.start_at.map(|d| d.format("%Y-%m").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> WorkOrder {
        WorkOrder {
            id: "wo-1".to_string(),
            asset_code: "COMP-A1".to_string(),
            wo_code: None,
            start_at: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(8, 0, 0),
            end_at: None,
            failure_type: Some("Mécanique".to_string()),
            component: None,
            cause: None,
            technician: None,
            description: None,
            downtime_hours: 2.0,
            material_cost: 150.0,
            total_cost: 0.0,
            source_file: None,
            imported_at: Utc::now(),
        }
    }

    #[test]
    fn test_intervention_cost_prefers_total() {
        let mut wo = sample();
        assert_eq!(wo.intervention_cost(), 150.0);
        wo.total_cost = 900.0;
        assert_eq!(wo.intervention_cost(), 900.0);
    }

    #[test]
    fn test_preventive_detection() {
        let mut wo = sample();
        assert!(!wo.is_preventive());
        wo.failure_type = Some("Maintenance PRÉVENTIVE".to_string());
        assert!(wo.is_preventive());
    }

    #[test]
    fn test_period() {
        assert_eq!(sample().period(), Some("2024-03".to_string()));
    }
}

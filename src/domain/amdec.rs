// ==========================================
// GMAO 维护数据核心 - AMDEC 领域模型
// ==========================================
// 评分统一口径: 1..=10（1..=5 来源乘 2 换算）
// RPN = S × O × D
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 统一评分上限
pub const SCORE_MAX: u8 = 10;

/// 将 1..=5 评分换算到 1..=10 口径
pub fn five_point_to_canonical(score: u8) -> u8 {
    (score.clamp(1, 5)) * 2
}

/// 将任意评分截断到 1..=10
pub fn clamp_canonical(score: u8) -> u8 {
    score.clamp(1, SCORE_MAX)
}

// ==========================================
// Function - 功能/系统
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub id: String,
    pub name: String,
    pub asset_code: Option<String>,
    pub description: Option<String>,
}

impl FunctionRecord {
    pub fn new(name: impl Into<String>, asset_code: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            asset_code,
            description: Some("Importé depuis l'historique de maintenance".to_string()),
        }
    }
}

// ==========================================
// FailureMode - 失效模式
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureMode {
    pub id: String,
    pub function_id: Option<String>,
    pub function_name: Option<String>,
    pub asset_code: Option<String>,

    pub component: String,                  // Organe / composant
    pub failure_type: String,               // Mode de défaillance / type de panne
    pub cause: Option<String>,
    pub effect: Option<String>,

    pub severity: Option<u8>,               // Gravité (1..=10)
    pub occurrence: Option<u8>,             // Occurrence (1..=10)
    pub detection: Option<u8>,              // Détection (1..=10)

    pub recommended_action: Option<String>,
    pub owner: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,

    pub occurrence_count: u32,              // 来源工单中的出现次数
    pub created_at: DateTime<Utc>,
}

impl FailureMode {
    pub fn new(component: impl Into<String>, failure_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            function_id: None,
            function_name: None,
            asset_code: None,
            component: component.into(),
            failure_type: failure_type.into(),
            cause: None,
            effect: None,
            severity: None,
            occurrence: None,
            detection: None,
            recommended_action: None,
            owner: None,
            due_date: None,
            status: None,
            occurrence_count: 0,
            created_at: Utc::now(),
        }
    }

    /// 风险优先数（三项评分齐全时才有值）
    pub fn rpn(&self) -> Option<u32> {
        match (self.severity, self.occurrence, self.detection) {
            (Some(s), Some(o), Some(d)) => Some(s as u32 * o as u32 * d as u32),
            _ => None,
        }
    }
}

// ==========================================
// AmdecRawRow - AMDEC 原始行
// ==========================================
// 表头 → 单元格原值, 原样保存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmdecRawRow {
    pub id: String,
    pub source_file: Option<String>,
    pub row_number: usize,
    pub values: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpn_requires_all_scores() {
        let mut fm = FailureMode::new("Roulements", "Usure");
        fm.severity = Some(8);
        fm.occurrence = Some(4);
        assert_eq!(fm.rpn(), None);

        fm.detection = Some(5);
        assert_eq!(fm.rpn(), Some(160));
    }

    #[test]
    fn test_scale_conversion() {
        assert_eq!(five_point_to_canonical(1), 2);
        assert_eq!(five_point_to_canonical(5), 10);
        assert_eq!(five_point_to_canonical(9), 10);
        assert_eq!(clamp_canonical(0), 1);
        assert_eq!(clamp_canonical(12), 10);
    }
}

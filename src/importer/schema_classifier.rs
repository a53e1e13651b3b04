// ==========================================
// GMAO 维护数据核心 - 表头分类器
// ==========================================
// 职责: 根据表头判定记录族（每个文件只属于一个族）
// 规则: 有序规则表, 首个命中者胜出; 大小写/变音符号不敏感的子串匹配
// ==========================================

use crate::domain::types::RecordFamily;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::vocabulary::{self as vocab, normalize_header, TermSet};
use tracing::debug;

/// 错误信息中列出的表头上限
const MAX_REPORTED_HEADERS: usize = 10;

// ==========================================
// HeaderSet - 表头集合
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub column: usize,       // 网格中的列号
    pub original: String,    // 原样（去首尾空白）
    pub normalized: String,  // 比较用
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderSet {
    cells: Vec<HeaderCell>,
}

impl HeaderSet {
    /// 从表头行构建（忽略空单元格, 保留列号）
    pub fn from_row(row: &[String]) -> Self {
        let cells = row
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.trim().is_empty())
            .map(|(column, cell)| HeaderCell {
                column,
                original: cell.trim().to_string(),
                normalized: normalize_header(cell),
            })
            .collect();
        Self { cells }
    }

    pub fn cells(&self) -> &[HeaderCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 任一表头命中该同义词组
    pub fn has(&self, terms: &TermSet) -> bool {
        self.cells.iter().any(|c| terms.matches(&c.normalized))
    }

    pub fn has_any(&self, sets: &[TermSet]) -> bool {
        sets.iter().any(|t| self.has(t))
    }

    pub fn originals(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.original.clone()).collect()
    }
}

// ==========================================
// 分类规则表（按优先级排列）
// ==========================================
pub struct ClassificationRule {
    pub family: RecordFamily,
    pub requirement: &'static str, // 错误信息中展示
    pub matches: fn(&HeaderSet) -> bool,
}

fn has_work_order_signature(headers: &HeaderSet) -> bool {
    headers.has_any(&vocab::WORK_ORDER_SIGNATURE)
}

fn is_amdec_from_maintenance(headers: &HeaderSet) -> bool {
    headers.has(&vocab::AMDEC_COMPONENT)
        && headers.has(&vocab::AMDEC_CAUSE)
        && has_work_order_signature(headers)
}

fn is_failure_mode_table(headers: &HeaderSet) -> bool {
    (headers.has(&vocab::FM_SEVERITY) && headers.has(&vocab::FM_OCCURRENCE))
        || (headers.has(&vocab::FM_MODE) && headers.has(&vocab::FM_FUNCTION))
}

fn is_parts_inventory(headers: &HeaderSet) -> bool {
    headers.has(&vocab::PART_SAFETY_STOCK)
        || headers.has(&vocab::PART_REORDER_POINT)
        || (headers.has(&vocab::PART_IDENTIFIER) && headers.has(&vocab::PART_STOCK))
}

fn is_part_demand(headers: &HeaderSet) -> bool {
    headers.has(&vocab::DEMAND_PERIOD) && headers.has(&vocab::DEMAND_USAGE)
}

pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        family: RecordFamily::AmdecFromWorkOrders,
        requirement: "organe + cause + colonnes d'intervention",
        matches: is_amdec_from_maintenance,
    },
    ClassificationRule {
        family: RecordFamily::WorkOrders,
        requirement: "date intervention / durée arrêt / type de panne / désignation équipement",
        matches: has_work_order_signature,
    },
    ClassificationRule {
        family: RecordFamily::FailureModes,
        requirement: "gravité + occurrence, ou mode de défaillance + fonction",
        matches: is_failure_mode_table,
    },
    ClassificationRule {
        family: RecordFamily::Parts,
        requirement: "stock de sécurité / point de commande, ou référence + stock",
        matches: is_parts_inventory,
    },
    ClassificationRule {
        family: RecordFamily::PartDemand,
        requirement: "période + consommation",
        matches: is_part_demand,
    },
];

/// 支持格式列表（错误信息用）
pub fn supported_formats() -> Vec<String> {
    CLASSIFICATION_RULES
        .iter()
        .map(|rule| format!("{} ({})", rule.family.label(), rule.requirement))
        .collect()
}

/// 分类（确定性: 同一表头集合总是得到同一结果）
pub fn classify(headers: &HeaderSet) -> ImportResult<RecordFamily> {
    if let Some(rule) = CLASSIFICATION_RULES.iter().find(|rule| (rule.matches)(headers)) {
        debug!(family = %rule.family, "表头分类命中");
        return Ok(rule.family);
    }

    // 兜底: 通用维护词汇 → 工单
    if headers.has(&vocab::GENERIC_MAINTENANCE) {
        debug!("表头分类兜底为工单");
        return Ok(RecordFamily::WorkOrders);
    }

    Err(ImportError::UnrecognizedSchema {
        headers: headers
            .originals()
            .into_iter()
            .take(MAX_REPORTED_HEADERS)
            .collect(),
        supported: supported_formats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cols: &[&str]) -> HeaderSet {
        let row: Vec<String> = cols.iter().map(|s| s.to_string()).collect();
        HeaderSet::from_row(&row)
    }

    #[test]
    fn test_work_orders() {
        let h = headers(&["Date intervention", "Désignation", "Type de panne", "Durée arrêt (h)"]);
        assert_eq!(classify(&h).unwrap(), RecordFamily::WorkOrders);
    }

    #[test]
    fn test_amdec_from_maintenance_takes_precedence() {
        let h = headers(&["Organe", "Cause", "Type de panne", "Durée arrêt (h)", "Date intervention"]);
        assert_eq!(classify(&h).unwrap(), RecordFamily::AmdecFromWorkOrders);
    }

    #[test]
    fn test_failure_modes() {
        let h = headers(&["Fonction", "Composant", "Mode de défaillance", "Cause", "Effet", "G", "O", "D"]);
        assert_eq!(classify(&h).unwrap(), RecordFamily::FailureModes);

        let h = headers(&["Élément", "Sévérité", "Probabilité"]);
        assert_eq!(classify(&h).unwrap(), RecordFamily::FailureModes);
    }

    #[test]
    fn test_parts_and_demand() {
        let h = headers(&["Référence", "Désignation", "Stock", "Stock de sécurité"]);
        assert_eq!(classify(&h).unwrap(), RecordFamily::Parts);

        let h = headers(&["Réf", "Qté en stock"]);
        assert_eq!(classify(&h).unwrap(), RecordFamily::Parts);

        let h = headers(&["Référence", "Période", "Consommation"]);
        assert_eq!(classify(&h).unwrap(), RecordFamily::PartDemand);
    }

    #[test]
    fn test_generic_fallback_to_work_orders() {
        let h = headers(&["Technicien", "Coût"]);
        assert_eq!(classify(&h).unwrap(), RecordFamily::WorkOrders);
    }

    #[test]
    fn test_unrecognized_lists_first_ten_headers() {
        let cols: Vec<String> = (1..=12).map(|i| format!("Colonne {}", i)).collect();
        let h = HeaderSet::from_row(&cols);
        match classify(&h).unwrap_err() {
            ImportError::UnrecognizedSchema { headers, supported } => {
                assert_eq!(headers.len(), 10);
                assert_eq!(headers[0], "Colonne 1");
                assert_eq!(supported.len(), CLASSIFICATION_RULES.len());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        let h = headers(&["Organe", "Cause", "Date intervention"]);
        let first = classify(&h).unwrap();
        for _ in 0..5 {
            assert_eq!(classify(&h).unwrap(), first);
        }
    }

    #[test]
    fn test_header_set_skips_blank_cells_keeps_columns() {
        let row: Vec<String> = vec!["".into(), " Désignation ".into(), "  ".into(), "Cause".into()];
        let h = HeaderSet::from_row(&row);
        assert_eq!(h.len(), 2);
        assert_eq!(h.cells()[0].column, 1);
        assert_eq!(h.cells()[0].original, "Désignation");
        assert_eq!(h.cells()[1].column, 3);
    }
}

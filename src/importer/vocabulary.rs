// ==========================================
// GMAO 维护数据核心 - 表头词汇表
// ==========================================
// 职责: 表头标准化 + 法语/英语同义词表
// 规则: 标准化形式（domain::text）之上的子串匹配
// ==========================================

pub use crate::domain::text::normalize_header;

// ==========================================
// TermSet - 一组同义词
// ==========================================
// 同义词可写带或不带重音的形式, 匹配前统一标准化
#[derive(Debug, Clone, Copy)]
pub struct TermSet {
    pub label: &'static str,
    pub terms: &'static [&'static str],
}

impl TermSet {
    /// 已标准化文本是否包含任一同义词
    pub fn matches(&self, normalized: &str) -> bool {
        self.terms
            .iter()
            .any(|term| normalized.contains(normalize_header(term).as_str()))
    }
}

// ===== 工单特征 =====
pub const WO_START_DATE: TermSet = TermSet {
    label: "date de début",
    terms: &["date début", "date debut", "date de début", "début", "start date", "start at", "begin"],
};
pub const WO_INTERVENTION_DATE: TermSet = TermSet {
    label: "date intervention",
    terms: &["date intervention", "date d'intervention", "date de l'intervention", "intervention date"],
};
pub const WO_DOWNTIME: TermSet = TermSet {
    label: "durée arrêt",
    terms: &["durée arrêt", "duree arret", "durée d'arrêt", "temps d'arrêt", "arrêt", "downtime", "stoppage"],
};
pub const WO_FAILURE_TYPE: TermSet = TermSet {
    label: "type de panne",
    terms: &["type de panne", "type panne", "catégorie de panne", "type de défaillance", "failure type"],
};
pub const WO_SUMMARY: TermSet = TermSet {
    label: "résumé intervention",
    terms: &["résumé intervention", "résumé", "compte rendu", "intervention summary", "summary"],
};
pub const WO_DESIGNATION: TermSet = TermSet {
    label: "désignation équipement",
    terms: &["désignation équipement", "désignation machine", "équipement", "equipment", "machine", "asset"],
};

/// 工单特征（任一命中即视为工单表）
pub const WORK_ORDER_SIGNATURE: [TermSet; 6] = [
    WO_START_DATE,
    WO_INTERVENTION_DATE,
    WO_DOWNTIME,
    WO_FAILURE_TYPE,
    WO_SUMMARY,
    WO_DESIGNATION,
];

// ===== AMDEC（来自维护记录）=====
pub const AMDEC_COMPONENT: TermSet = TermSet {
    label: "organe",
    terms: &["organe", "composant", "component"],
};
pub const AMDEC_CAUSE: TermSet = TermSet {
    label: "cause",
    terms: &["cause", "root cause"],
};

// ===== 失效模式表 =====
pub const FM_SEVERITY: TermSet = TermSet {
    label: "gravité",
    terms: &["gravité", "sévérité", "severity", "criticité", "criticality"],
};
pub const FM_OCCURRENCE: TermSet = TermSet {
    label: "occurrence",
    terms: &["occurrence", "probabilité", "probability", "fréquence", "frequency"],
};
pub const FM_MODE: TermSet = TermSet {
    label: "mode de défaillance",
    terms: &["mode de défaillance", "mode défaillance", "failure mode", "défaillance"],
};
pub const FM_FUNCTION: TermSet = TermSet {
    label: "fonction",
    terms: &["fonction", "function"],
};

// ===== 备件 =====
pub const PART_SAFETY_STOCK: TermSet = TermSet {
    label: "stock de sécurité",
    terms: &["stock de sécurité", "stock sécurité", "safety stock"],
};
pub const PART_REORDER_POINT: TermSet = TermSet {
    label: "point de commande",
    terms: &["point de commande", "seuil de réapprovisionnement", "point de réapprovisionnement", "reorder"],
};
pub const PART_IDENTIFIER: TermSet = TermSet {
    label: "référence",
    terms: &["référence", "ref", "sku", "code article", "article", "pièce", "part"],
};
pub const PART_STOCK: TermSet = TermSet {
    label: "stock",
    terms: &["stock", "quantité en stock", "on hand"],
};

// ===== 备件消耗 =====
pub const DEMAND_PERIOD: TermSet = TermSet {
    label: "période",
    terms: &["période", "period", "mois", "month", "année", "year"],
};
pub const DEMAND_USAGE: TermSet = TermSet {
    label: "consommation",
    terms: &["consommation", "utilisation", "usage", "demande", "demand", "sorties"],
};

// ===== 通用维护词汇（兜底）=====
pub const GENERIC_MAINTENANCE: TermSet = TermSet {
    label: "vocabulaire maintenance",
    terms: &[
        "panne", "défaillance", "failure", "intervention", "équipement", "equipment",
        "date", "technicien", "technician", "coût", "cost", "maintenance",
    ],
};

// ===== 月份 / 指标 =====
const MONTH_NAMES: &[&str] = &[
    "janvier", "fevrier", "mars", "avril", "mai", "juin", "juillet", "aout", "septembre",
    "octobre", "novembre", "decembre", "janv", "fevr", "fev", "avr", "juil", "sept", "oct",
    "nov", "dec", "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul",
    "aug", "sep",
];

const METRIC_LABELS: &[&str] = &[
    "mtbf", "mttr", "disponibilite", "availability", "taux", "fiabilite", "reliability", "kpi",
    "indicateur", "trs", "oee",
];

/// 单元格/工作表名是否为月份名（首个词, 允许 "Janvier 2024" / "janv." 形式）
pub fn is_month_name(value: &str) -> bool {
    let normalized = normalize_header(value);
    let first = normalized
        .split(|c: char| c.is_whitespace() || c == '-' || c == '.' || c == '/' || c.is_ascii_digit())
        .find(|w| !w.is_empty());
    match first {
        Some(word) => MONTH_NAMES.contains(&word),
        None => false,
    }
}

/// 单元格是否以 KPI 指标名开头（MTBF / Disponibilité ...）
pub fn is_metric_label(value: &str) -> bool {
    let normalized = normalize_header(value);
    METRIC_LABELS.iter().any(|m| normalized.starts_with(m))
}

/// 文本是否同时提到可用率与 MTBF/MTTR
pub fn mentions_availability_and_mtbf(normalized_text: &str) -> bool {
    let availability = normalized_text.contains("disponibilit") || normalized_text.contains("availability");
    let reliability = normalized_text.contains("mtbf") || normalized_text.contains("mttr");
    availability && reliability
}

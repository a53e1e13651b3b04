// ==========================================
// GMAO 维护数据核心 - 字段映射器
// ==========================================
// 阶段 1: 每个文件只解析一次"字段 → 列号", 之后逐行构造强类型记录
// 规则: 按优先级依次解析字段; 一列最多被一个字段占用
//       完全相等 +100, 否则取命中的最长同义词长度; ≤2 字符的同义词必须完全相等
// ==========================================

use crate::domain::amdec::FailureMode;
use crate::domain::part::{Part, PartDemand};
use crate::importer::importer_trait::DataCleaner;
use crate::importer::schema_classifier::HeaderSet;
use crate::importer::vocabulary::normalize_header;
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

const EXACT_MATCH_SCORE: usize = 100;
const SHORT_SYNONYM_LEN: usize = 2;

// ==========================================
// Field - 目标字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // 工单
    AssetCode,
    WoCode,
    StartDate,
    EndDate,
    FailureType,
    Component,
    Cause,
    Technician,
    Description,
    Downtime,
    MaterialCost,
    TotalCost,
    FunctionLabel,
    // AMDEC
    FailureModeLabel,
    Effect,
    Severity,
    Occurrence,
    Detection,
    RecommendedAction,
    Owner,
    DueDate,
    Status,
    // 备件
    PartReference,
    PartName,
    Stock,
    SafetyStock,
    ReorderPoint,
    UnitCost,
    LeadTime,
    // 消耗
    Period,
    Quantity,
}

impl Field {
    /// 同义词（任意写法, 比较前标准化）
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Field::AssetCode => &[
                "désignation équipement", "désignation machine", "désignation", "équipement",
                "equipment", "machine", "code machine", "code équipement", "asset", "matériel",
            ],
            Field::WoCode => &[
                "n° ot", "numéro ot", "ordre de travail", "bon de travail", "n° intervention",
                "numéro intervention", "work order", "ot", "wo",
            ],
            Field::StartDate => &[
                "date de début", "date début", "date intervention", "date d'intervention",
                "start date", "début", "start", "begin", "date",
            ],
            Field::EndDate => &["date de fin", "date fin", "date clôture", "end date", "fin", "end"],
            Field::FailureType => &[
                "type de panne", "type panne", "catégorie de panne", "type de défaillance",
                "type d'intervention", "type intervention", "failure type", "nature",
            ],
            Field::Component => &["organe", "composant", "sous-ensemble", "component"],
            Field::Cause => &["cause racine", "root cause", "cause", "origine"],
            Field::Technician => &["technicien", "intervenant", "technician", "opérateur"],
            Field::Description => &[
                "résumé intervention", "résumé", "description", "compte rendu", "commentaire",
                "observations", "travaux", "summary",
            ],
            Field::Downtime => &[
                "durée arrêt", "durée d'arrêt", "temps d'arrêt", "arrêt", "downtime", "durée",
                "duration",
            ],
            Field::MaterialCost => &[
                "coût matériel", "coût matière", "coût pièces", "material cost", "parts cost",
            ],
            Field::TotalCost => &[
                "coût total", "coût intervention", "total cost", "montant", "coût", "cost",
            ],
            Field::FunctionLabel => &["fonction", "function", "processus", "process"],
            Field::FailureModeLabel => &[
                "mode de défaillance", "mode défaillance", "failure mode", "défaillance", "mode",
            ],
            Field::Effect => &["effet", "effect", "conséquence"],
            Field::Severity => &["gravité", "sévérité", "severity", "g", "s"],
            Field::Occurrence => &["occurrence", "fréquence", "probabilité", "frequency", "o", "f"],
            Field::Detection => &["détection", "détectabilité", "detection", "detectability", "d"],
            Field::RecommendedAction => &[
                "action recommandée", "actions recommandées", "action corrective",
                "recommended action", "action",
            ],
            Field::Owner => &["responsable", "owner", "pilote"],
            Field::DueDate => &["échéance", "date limite", "due date", "délai"],
            Field::Status => &["statut", "status", "état"],
            Field::PartReference => &[
                "référence", "réf", "ref", "code article", "code pièce", "n° pièce",
                "part number", "article", "sku",
            ],
            Field::PartName => &["désignation", "libellé", "description", "name", "nom"],
            Field::Stock => &[
                "stock actuel", "quantité en stock", "qté en stock", "stock", "on hand",
                "quantité", "qty",
            ],
            Field::SafetyStock => &[
                "stock de sécurité", "stock sécurité", "safety stock", "stock mini", "stock minimum",
            ],
            Field::ReorderPoint => &[
                "point de commande", "point de réapprovisionnement", "seuil de réapprovisionnement",
                "reorder point", "reorder", "seuil",
            ],
            Field::UnitCost => &["prix unitaire", "coût unitaire", "unit cost", "prix", "pu"],
            Field::LeadTime => &[
                "délai d'approvisionnement", "délai de livraison", "lead time", "délai",
            ],
            Field::Period => &["période", "period", "mois", "month", "date", "année"],
            Field::Quantity => &[
                "quantité consommée", "consommation", "utilisation", "usage", "demande", "demand",
                "sorties", "quantité", "qty",
            ],
        }
    }

    /// 单列评分（0 = 不匹配）
    fn score(&self, normalized_header: &str) -> usize {
        let mut best = 0;
        for synonym in self.synonyms() {
            let pattern = normalize_header(synonym);
            if normalized_header == pattern {
                return EXACT_MATCH_SCORE + pattern.len();
            }
            if pattern.chars().count() <= SHORT_SYNONYM_LEN {
                continue;
            }
            if normalized_header.contains(&pattern) {
                best = best.max(pattern.len());
            }
        }
        best
    }
}

// ===== 各记录族的字段优先级 =====
// 结束日期先于开始日期（避免 "date" 抢占 "date de fin"）
// 物料成本先于总成本; 安全库存/再订货点先于库存
pub const WORK_ORDER_FIELDS: &[Field] = &[
    Field::AssetCode,
    Field::WoCode,
    Field::EndDate,
    Field::StartDate,
    Field::FailureType,
    Field::Component,
    Field::Cause,
    Field::Technician,
    Field::Downtime,
    Field::MaterialCost,
    Field::TotalCost,
    Field::Description,
    Field::FunctionLabel,
    Field::Severity,
    Field::Occurrence,
    Field::Detection,
];

pub const FAILURE_MODE_FIELDS: &[Field] = &[
    Field::FunctionLabel,
    Field::Component,
    Field::FailureModeLabel,
    Field::Cause,
    Field::Effect,
    Field::Severity,
    Field::Occurrence,
    Field::Detection,
    Field::RecommendedAction,
    Field::Owner,
    Field::DueDate,
    Field::Status,
    Field::AssetCode,
];

pub const PART_FIELDS: &[Field] = &[
    Field::SafetyStock,
    Field::ReorderPoint,
    Field::PartReference,
    Field::PartName,
    Field::Stock,
    Field::UnitCost,
    Field::LeadTime,
];

pub const PART_DEMAND_FIELDS: &[Field] = &[Field::PartReference, Field::Period, Field::Quantity];

// ==========================================
// ColumnMap - 字段 → 列号（每文件解析一次）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    indices: HashMap<Field, usize>,
}

impl ColumnMap {
    pub fn resolve(headers: &HeaderSet, fields: &[Field]) -> Self {
        let mut used: HashSet<usize> = HashSet::new();
        let mut indices = HashMap::new();

        for field in fields {
            let mut best: Option<(usize, usize)> = None; // (column, score)
            for cell in headers.cells() {
                if used.contains(&cell.column) {
                    continue;
                }
                let score = field.score(&cell.normalized);
                if score > 0 && best.map(|(_, s)| score > s).unwrap_or(true) {
                    best = Some((cell.column, score));
                }
            }
            if let Some((column, _)) = best {
                used.insert(column);
                indices.insert(*field, column);
            }
        }

        Self { indices }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.indices.contains_key(&field)
    }

    /// 行中该字段的原始单元格
    pub fn cell<'a>(&self, row: &'a [String], field: Field) -> Option<&'a str> {
        self.get(field)
            .and_then(|idx| row.get(idx))
            .map(|s| s.as_str())
    }
}

// ==========================================
// WorkOrderRow - 工单行（映射后的中间结构体）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrderRow {
    pub asset_code: Option<String>,
    pub wo_code: Option<String>,
    pub start_at: Option<NaiveDateTime>,
    pub end_at: Option<NaiveDateTime>,
    pub failure_type: Option<String>,
    pub component: Option<String>,
    pub cause: Option<String>,
    pub technician: Option<String>,
    pub description: Option<String>,
    pub downtime_hours: f64,
    pub material_cost: f64,
    pub total_cost: f64,
    pub function_label: Option<String>,
    pub severity: Option<u8>,
    pub occurrence: Option<u8>,
    pub detection: Option<u8>,
}

// ==========================================
// FieldMapper - 行 → 强类型记录
// ==========================================
pub struct FieldMapper {
    cleaner: Box<dyn DataCleaner>,
}

impl FieldMapper {
    pub fn new(cleaner: Box<dyn DataCleaner>) -> Self {
        Self { cleaner }
    }

    fn text(&self, row: &[String], map: &ColumnMap, field: Field) -> Option<String> {
        self.cleaner.normalize_null(map.cell(row, field))
    }

    pub fn map_work_order(&self, row: &[String], map: &ColumnMap) -> WorkOrderRow {
        let start_at = self.cleaner.parse_datetime(map.cell(row, Field::StartDate));
        let end_at = self.cleaner.parse_datetime(map.cell(row, Field::EndDate));

        // 无停机列时由 结束 − 开始 推算
        let downtime_hours = if map.contains(Field::Downtime) {
            self.cleaner.parse_number(map.cell(row, Field::Downtime)).max(0.0)
        } else {
            match (start_at, end_at) {
                (Some(start), Some(end)) if end > start => {
                    (end - start).num_seconds() as f64 / 3600.0
                }
                _ => 0.0,
            }
        };

        WorkOrderRow {
            asset_code: self.text(row, map, Field::AssetCode),
            wo_code: self.text(row, map, Field::WoCode),
            start_at,
            end_at,
            failure_type: self.text(row, map, Field::FailureType),
            component: self.text(row, map, Field::Component),
            cause: self.text(row, map, Field::Cause),
            technician: self.text(row, map, Field::Technician),
            description: self.text(row, map, Field::Description),
            downtime_hours,
            material_cost: self.cleaner.parse_number(map.cell(row, Field::MaterialCost)),
            total_cost: self.cleaner.parse_number(map.cell(row, Field::TotalCost)),
            function_label: self.text(row, map, Field::FunctionLabel),
            severity: self.cleaner.parse_score(map.cell(row, Field::Severity)),
            occurrence: self.cleaner.parse_score(map.cell(row, Field::Occurrence)),
            detection: self.cleaner.parse_score(map.cell(row, Field::Detection)),
        }
    }

    /// AMDEC 表行 → 失效模式（评分为原始刻度, 由调用方统一换算）
    pub fn map_failure_mode(&self, row: &[String], map: &ColumnMap) -> Result<FailureMode, String> {
        let component = self.text(row, map, Field::Component);
        let mode = self.text(row, map, Field::FailureModeLabel);
        if component.is_none() && mode.is_none() {
            return Err("ni composant ni mode de défaillance renseigné".to_string());
        }

        let mut fm = FailureMode::new(
            component.clone().unwrap_or_else(|| "Non spécifié".to_string()),
            mode.unwrap_or_else(|| "Non spécifié".to_string()),
        );
        fm.function_name = self.text(row, map, Field::FunctionLabel);
        fm.asset_code = self.text(row, map, Field::AssetCode);
        fm.cause = self.text(row, map, Field::Cause);
        fm.effect = self.text(row, map, Field::Effect);
        fm.severity = self.cleaner.parse_score(map.cell(row, Field::Severity));
        fm.occurrence = self.cleaner.parse_score(map.cell(row, Field::Occurrence));
        fm.detection = self.cleaner.parse_score(map.cell(row, Field::Detection));
        fm.recommended_action = self.text(row, map, Field::RecommendedAction);
        fm.owner = self.text(row, map, Field::Owner);
        fm.due_date = self
            .cleaner
            .parse_datetime(map.cell(row, Field::DueDate))
            .map(|dt| dt.date());
        fm.status = self.text(row, map, Field::Status);
        fm.occurrence_count = 1;
        Ok(fm)
    }

    pub fn map_part(&self, row: &[String], map: &ColumnMap) -> Result<Part, String> {
        let reference = self
            .text(row, map, Field::PartReference)
            .ok_or_else(|| "référence de pièce manquante".to_string())?;
        let name = self
            .text(row, map, Field::PartName)
            .unwrap_or_else(|| reference.clone());

        Ok(Part {
            id: Uuid::new_v4().to_string(),
            reference,
            name,
            stock_on_hand: self.cleaner.parse_number(map.cell(row, Field::Stock)),
            safety_stock: self.cleaner.parse_number(map.cell(row, Field::SafetyStock)),
            reorder_point: self.cleaner.parse_number(map.cell(row, Field::ReorderPoint)),
            unit_cost: self
                .text(row, map, Field::UnitCost)
                .map(|v| self.cleaner.parse_number(Some(v.as_str()))),
            lead_time_days: self
                .text(row, map, Field::LeadTime)
                .map(|v| self.cleaner.parse_number(Some(v.as_str())).round() as i64),
        })
    }

    pub fn map_part_demand(&self, row: &[String], map: &ColumnMap) -> Result<PartDemand, String> {
        let part_ref = self
            .text(row, map, Field::PartReference)
            .ok_or_else(|| "référence de pièce manquante".to_string())?;
        let period = self
            .cleaner
            .normalize_period(map.cell(row, Field::Period))
            .ok_or_else(|| "période illisible".to_string())?;

        Ok(PartDemand {
            id: Uuid::new_v4().to_string(),
            part_ref,
            period,
            quantity: self.cleaner.parse_number(map.cell(row, Field::Quantity)),
        })
    }
}

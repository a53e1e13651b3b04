// ==========================================
// GMAO 维护数据核心 - 工作表选择器
// ==========================================
// 职责: 多工作表工作簿中选出最像"工单历史"的表 + 真实表头行
// 规则: 评分表是数据（RubricEntry 列表）, 由单一评分函数执行
// ==========================================

use crate::importer::data_cleaner::{parse_datetime_opt, parse_number_opt};
use crate::importer::error::{ImportError, ImportResult, SheetRejection};
use crate::importer::file_parser::{RawGrid, SheetGrid};
use crate::importer::vocabulary::{
    is_metric_label, is_month_name, mentions_availability_and_mtbf, normalize_header,
};
use tracing::{debug, info};

// ==========================================
// 评分表
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct RubricEntry {
    pub label: &'static str,
    pub keywords: &'static [&'static str], // 已标准化形式
    pub points: i32,
}

pub const HEADER_RUBRIC: &[RubricEntry] = &[
    RubricEntry { label: "designation", keywords: &["designation", "equipement", "equipment", "machine"], points: 10 },
    RubricEntry { label: "date intervention", keywords: &["date intervention", "date d'intervention", "date de debut", "date debut", "start date"], points: 10 },
    RubricEntry { label: "type de panne", keywords: &["type de panne", "type panne", "failure type"], points: 10 },
    RubricEntry { label: "duree", keywords: &["duree", "duration"], points: 10 },
    RubricEntry { label: "arret", keywords: &["arret", "downtime"], points: 10 },
    RubricEntry { label: "resume", keywords: &["resume", "summary", "compte rendu"], points: 5 },
    RubricEntry { label: "technicien", keywords: &["technicien", "technician", "intervenant"], points: 5 },
    RubricEntry { label: "cause", keywords: &["cause"], points: 5 },
    RubricEntry { label: "organe", keywords: &["organe", "composant", "component"], points: 5 },
    RubricEntry { label: "piece", keywords: &["piece", "spare part"], points: 3 },
];

/// 元数据/图例工作表标记
pub const LEGEND_MARKERS: &[&str] = &[
    "legende", "legend", "metadata", "readme", "notice", "aide", "help", "parametres",
];

pub const MONTH_FIRST_CELL_PENALTY: i32 = -50;
pub const AVAILABILITY_MTBF_PENALTY: i32 = -30;

/// 月份命名工作表数量达到此值即判定为 KPI 跟踪文件
const KPI_FILE_MONTH_SHEETS: usize = 3;

// ==========================================
// SelectorSettings - 阈值（来自 ImportSettings）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorSettings {
    pub min_sheet_rows: usize,
    pub header_scan_rows: usize,
    pub score_threshold: i32,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            min_sheet_rows: 5,
            header_scan_rows: 10,
            score_threshold: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetSelection {
    pub sheet_index: usize,
    pub sheet_name: String,
    pub header_row: usize, // 网格中的绝对行号（0 起）
    pub score: i32,
}

// ==========================================
// 评分
// ==========================================

/// 单行评分: 每个评分项每行最多计一次
pub fn score_row(row: &[String]) -> i32 {
    let normalized: Vec<String> = row
        .iter()
        .filter(|c| !c.trim().is_empty())
        .map(|c| normalize_header(c))
        .collect();

    HEADER_RUBRIC
        .iter()
        .filter(|entry| {
            normalized
                .iter()
                .any(|cell| entry.keywords.iter().any(|k| cell.contains(k)))
        })
        .map(|entry| entry.points)
        .sum()
}

/// 工作表评分（扫描前 N 个非空行, 达到阈值即停止; 再叠加首行惩罚）
pub fn score_sheet(grid: &RawGrid, settings: &SelectorSettings) -> i32 {
    let mut score = 0;
    for (_, row) in grid.non_empty_rows().take(settings.header_scan_rows) {
        score += score_row(row);
        if score >= settings.score_threshold {
            break;
        }
    }

    if let Some((_, first)) = grid.non_empty_rows().next() {
        score += first_row_penalty(first);
    }
    score
}

fn first_row_penalty(row: &[String]) -> i32 {
    let mut penalty = 0;
    if row.first().map(|c| is_month_name(c)).unwrap_or(false) {
        penalty += MONTH_FIRST_CELL_PENALTY;
    }
    if mentions_availability_and_mtbf(&row_text(row)) {
        penalty += AVAILABILITY_MTBF_PENALTY;
    }
    penalty
}

fn row_text(row: &[String]) -> String {
    row.iter()
        .map(|c| normalize_header(c))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_legend_sheet(name: &str) -> bool {
    let normalized = normalize_header(name);
    LEGEND_MARKERS.iter().any(|m| normalized.contains(m))
}

/// 是否像可用率/KPI 跟踪文件（月份命名工作表 ≥3 或 ≥ 一半）
pub fn looks_like_kpi_tracking_file(sheet_names: &[String]) -> bool {
    let month_sheets = sheet_names.iter().filter(|n| is_month_name(n)).count();
    month_sheets >= KPI_FILE_MONTH_SHEETS
        || (!sheet_names.is_empty() && month_sheets * 2 >= sheet_names.len() && month_sheets > 0)
}

// ==========================================
// 选表
// ==========================================
pub fn select_sheet(sheets: &[SheetGrid], settings: &SelectorSettings) -> ImportResult<SheetSelection> {
    let names: Vec<String> = sheets.iter().map(|s| s.name.clone()).collect();
    let mut best: Option<(usize, i32)> = None;

    for (idx, sheet) in sheets.iter().enumerate() {
        if is_legend_sheet(&sheet.name) {
            debug!(sheet = %sheet.name, "跳过图例/元数据工作表");
            continue;
        }
        let rows = sheet.grid.non_empty_count();
        if rows < settings.min_sheet_rows {
            debug!(sheet = %sheet.name, rows = rows, "跳过行数不足的工作表");
            continue;
        }

        let score = score_sheet(&sheet.grid, settings);
        debug!(sheet = %sheet.name, score = score, "工作表评分");
        // 同分取先出现者
        if best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((idx, score));
        }
    }

    let (sheet_index, score) = match best {
        Some((idx, score)) if score >= settings.score_threshold => (idx, score),
        _ => {
            let reason = if looks_like_kpi_tracking_file(&names) {
                SheetRejection::KpiTrackingFile
            } else {
                SheetRejection::NoRecognizableData
            };
            return Err(ImportError::NoSuitableSheet { sheets: names, reason });
        }
    };

    let sheet = &sheets[sheet_index];
    let header_row = find_header_row(&sheet.grid, settings.header_scan_rows, &sheet.name)?;
    info!(sheet = %sheet.name, score = score, header_row = header_row, "选定工作表");

    Ok(SheetSelection {
        sheet_index,
        sheet_name: sheet.name.clone(),
        header_row,
        score,
    })
}

// ==========================================
// 表头行识别
// ==========================================

/// 在前 N 个非空行中找真实表头行
///
/// 跳过: 纯数值行、日期行、月份开头行、指标名开头行、全百分比行
/// 选中: ≥3 个非空单元格 且（≥5 个非空单元格 或 第二个单元格非数值）
/// 兜底: 第一个非空行（若该行是 KPI 汇总签名 → KpiSummaryDetected）
pub fn find_header_row(grid: &RawGrid, scan_rows: usize, sheet_name: &str) -> ImportResult<usize> {
    let mut first_row: Option<(usize, &Vec<String>)> = None;

    for (idx, row) in grid.non_empty_rows().take(scan_rows) {
        if first_row.is_none() {
            first_row = Some((idx, row));
        }
        if should_skip_header_candidate(row) {
            continue;
        }

        let filled = filled_cells(row);
        let second_is_text = row
            .get(1)
            .map(|c| !c.trim().is_empty() && parse_number_opt(c).is_none())
            .unwrap_or(false);

        if filled.len() >= 3 && (filled.len() >= 5 || second_is_text) {
            return Ok(idx);
        }
    }

    match first_row {
        Some((_, row)) if is_kpi_summary_row(row) => Err(ImportError::KpiSummaryDetected {
            sheet: sheet_name.to_string(),
        }),
        Some((idx, _)) => Ok(idx),
        None => Ok(0),
    }
}

fn filled_cells(row: &[String]) -> Vec<&str> {
    row.iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect()
}

fn should_skip_header_candidate(row: &[String]) -> bool {
    let filled = filled_cells(row);
    let Some(first) = filled.first() else {
        return true;
    };

    let all_numeric = filled.iter().all(|c| parse_number_opt(c).is_some());
    let all_dates = filled
        .iter()
        .all(|c| parse_datetime_opt(c).is_some() || parse_number_opt(c).is_some());
    let all_percent = filled.iter().all(|c| c.ends_with('%'));

    all_numeric
        || all_dates
        || all_percent
        || parse_datetime_opt(first).is_some()
        || is_month_name(first)
        || is_metric_label(first)
}

/// KPI 汇总表签名: 首格为月份/指标名, 或同时出现可用率与 MTBF
fn is_kpi_summary_row(row: &[String]) -> bool {
    let first = row.iter().map(|c| c.trim()).find(|c| !c.is_empty()).unwrap_or("");
    is_month_name(first) || is_metric_label(first) || mentions_availability_and_mtbf(&row_text(row))
}

// ==========================================
// GMAO 维护数据核心 - 数据清洗器实现
// ==========================================
// 职责: 单元格容错解析（数值 / 日期 / 期间 / 评分）
// 规则: 无法解析不报错 → 数值 0 / 日期 None
// ==========================================

use crate::importer::importer_trait::DataCleaner;
use crate::importer::vocabulary::normalize_header;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// 视为空值的占位符（标准化后比较）
const NULL_PLACEHOLDERS: &[&str] = &["-", "--", "n/a", "na", "nan", "null", "none", "#n/a", "/"];

/// Excel 序列号合理范围（约 1954 ~ 2119 年）
const EXCEL_SERIAL_MIN: f64 = 20_000.0;
const EXCEL_SERIAL_MAX: f64 = 80_000.0;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %Hh%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%d/%m/%y",
];

const MONTHS: &[(&str, u32)] = &[
    ("janvier", 1), ("janv", 1), ("january", 1), ("jan", 1),
    ("fevrier", 2), ("fevr", 2), ("fev", 2), ("february", 2), ("feb", 2),
    ("mars", 3), ("march", 3), ("mar", 3),
    ("avril", 4), ("avr", 4), ("april", 4), ("apr", 4),
    ("mai", 5), ("may", 5),
    ("juin", 6), ("june", 6), ("jun", 6),
    ("juillet", 7), ("juil", 7), ("july", 7), ("jul", 7),
    ("aout", 8), ("august", 8), ("aug", 8),
    ("septembre", 9), ("september", 9), ("sept", 9), ("sep", 9),
    ("octobre", 10), ("october", 10), ("oct", 10),
    ("novembre", 11), ("november", 11), ("nov", 11),
    ("decembre", 12), ("december", 12), ("dec", 12),
];

// ==========================================
// 自由函数（选表/表头识别也会使用）
// ==========================================

/// 严格数值解析: 允许货币前缀与短单位后缀, 不允许混入其它数字（如日期）
pub fn parse_number_opt(value: &str) -> Option<f64> {
    let compact: String = value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}' && *c != '\'')
        .collect();
    if compact.is_empty() {
        return None;
    }

    let start = compact.find(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | ','))?;
    let prefix = &compact[..start];
    if prefix.chars().any(|c| c.is_alphanumeric()) && !is_currency_word(prefix) {
        return None;
    }

    let rest = &compact[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | ',')))
        .unwrap_or(rest.len());
    let (numeric, suffix) = rest.split_at(end);

    // 单位后缀: 不含数字, 长度有限（h, min, €, EUR, %, DH ...）
    if suffix.chars().any(|c| c.is_ascii_digit()) || suffix.chars().count() > 5 {
        return None;
    }

    let normalized = normalize_separators(numeric)?;
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_currency_word(prefix: &str) -> bool {
    matches!(prefix.to_lowercase().as_str(), "eur" | "usd" | "mad" | "dh" | "€" | "$" | "£")
}

/// 千分位/小数点统一: 最后出现的 `.` 或 `,` 视为小数点
fn normalize_separators(numeric: &str) -> Option<String> {
    if numeric.is_empty() || !numeric.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if numeric[1..].contains(['-', '+']) {
        return None;
    }

    let last_dot = numeric.rfind('.');
    let last_comma = numeric.rfind(',');
    let decimal_at = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(d.max(c)),
        (None, Some(c)) => {
            // 单个逗号 → 小数点; 多个 → 千分位
            if numeric.matches(',').count() == 1 {
                Some(c)
            } else {
                None
            }
        }
        (Some(d), None) => {
            if numeric.matches('.').count() == 1 {
                Some(d)
            } else {
                None
            }
        }
        (None, None) => None,
    };

    let mut out = String::with_capacity(numeric.len());
    for (idx, c) in numeric.char_indices() {
        match c {
            '.' | ',' => {
                if Some(idx) == decimal_at {
                    out.push('.');
                }
            }
            other => out.push(other),
        }
    }
    Some(out)
}

/// 容错日期解析
pub fn parse_datetime_opt(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    // Excel 序列号（1899-12-30 起算）
    let serial = trimmed.replace(',', ".").parse::<f64>().ok()?;
    if (EXCEL_SERIAL_MIN..=EXCEL_SERIAL_MAX).contains(&serial) {
        let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
        let seconds = (serial * 86_400.0).round() as i64;
        return base.checked_add_signed(Duration::seconds(seconds));
    }
    None
}

/// 期间标准化为 YYYY-MM
pub fn normalize_period_opt(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(dt) = parse_datetime_opt(trimmed) {
        return Some(dt.format("%Y-%m").to_string());
    }

    let normalized = normalize_header(trimmed);
    let parts: Vec<&str> = normalized
        .split(|c: char| c == '-' || c == '/' || c == ' ' || c == '.' || c == '_')
        .filter(|p| !p.is_empty())
        .collect();

    let (year, month) = match parts.as_slice() {
        // 202403
        [single] if single.len() == 6 && single.chars().all(|c| c.is_ascii_digit()) => {
            (single[..4].parse().ok()?, single[4..].parse().ok()?)
        }
        [a, b] => {
            if let (Ok(first), Ok(second)) = (a.parse::<i32>(), b.parse::<u32>()) {
                if a.len() == 4 {
                    (first, second)
                } else if b.len() == 4 {
                    (second as i32, first as u32)
                } else {
                    return None;
                }
            } else {
                // "Janvier 2024" / "mars-24"
                let month = month_from_word(a)?;
                let year = b.parse::<i32>().ok()?;
                let year = if year < 100 { 2000 + year } else { year };
                (year, month)
            }
        }
        _ => return None,
    };

    if !(1..=12).contains(&month) || !(1900..=2200).contains(&year) {
        return None;
    }
    Some(format!("{:04}-{:02}", year, month))
}

fn month_from_word(word: &str) -> Option<u32> {
    MONTHS.iter().find(|(name, _)| *name == word).map(|(_, m)| *m)
}

// ==========================================
// DataCleanerImpl
// ==========================================
pub struct DataCleanerImpl;

impl DataCleaner for DataCleanerImpl {
    fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() || NULL_PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str()) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn parse_number(&self, value: Option<&str>) -> f64 {
        value.and_then(parse_number_opt).unwrap_or(0.0)
    }

    fn parse_datetime(&self, value: Option<&str>) -> Option<NaiveDateTime> {
        value.and_then(parse_datetime_opt)
    }

    fn normalize_period(&self, value: Option<&str>) -> Option<String> {
        value.and_then(normalize_period_opt)
    }

    fn parse_score(&self, value: Option<&str>) -> Option<u8> {
        let score = value.and_then(parse_number_opt)?.round();
        if score < 1.0 {
            None
        } else {
            Some(score.min(10.0) as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_tolerant() {
        let cleaner = DataCleanerImpl;
        assert_eq!(cleaner.parse_number(Some("2,5")), 2.5);
        assert_eq!(cleaner.parse_number(Some(" 1 250,75 € ")), 1250.75);
        assert_eq!(cleaner.parse_number(Some("1,250.75")), 1250.75);
        assert_eq!(cleaner.parse_number(Some("3 h")), 3.0);
        assert_eq!(cleaner.parse_number(Some("EUR 40")), 40.0);
        assert_eq!(cleaner.parse_number(Some("n/a")), 0.0);
        assert_eq!(cleaner.parse_number(Some("abc")), 0.0);
        assert_eq!(cleaner.parse_number(None), 0.0);
    }

    #[test]
    fn test_parse_number_rejects_dates_and_labels() {
        assert_eq!(parse_number_opt("12/03/2024"), None);
        assert_eq!(parse_number_opt("2024-03-05"), None);
        assert_eq!(parse_number_opt("Durée arrêt (h)"), None);
        assert_eq!(parse_number_opt("95%"), Some(95.0));
        assert_eq!(parse_number_opt("-4"), Some(-4.0));
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime_opt("2024-03-05 08:30:00"), Some(expected));
        assert_eq!(parse_datetime_opt("05/03/2024 08:30"), Some(expected));
        assert_eq!(parse_datetime_opt("2024-03-05T08:30:00Z"), Some(expected));

        let midnight = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime_opt("05/03/2024"), Some(midnight));
        // Excel 序列号 45356 = 2024-03-05
        assert_eq!(parse_datetime_opt("45356"), Some(midnight));
        assert_eq!(parse_datetime_opt("45356.5").map(|d| d.format("%H").to_string()), Some("12".to_string()));
    }

    #[test]
    fn test_parse_datetime_invalid_is_none() {
        assert_eq!(parse_datetime_opt("demain"), None);
        assert_eq!(parse_datetime_opt("32/13/2024"), None);
        assert_eq!(parse_datetime_opt("12"), None);
        assert_eq!(parse_datetime_opt(""), None);
    }

    #[test]
    fn test_normalize_period() {
        assert_eq!(normalize_period_opt("2024-03"), Some("2024-03".to_string()));
        assert_eq!(normalize_period_opt("03/2024"), Some("2024-03".to_string()));
        assert_eq!(normalize_period_opt("202403"), Some("2024-03".to_string()));
        assert_eq!(normalize_period_opt("Mars 2024"), Some("2024-03".to_string()));
        assert_eq!(normalize_period_opt("févr.-24"), Some("2024-02".to_string()));
        assert_eq!(normalize_period_opt("2024-03-17"), Some("2024-03".to_string()));
        assert_eq!(normalize_period_opt("2024-13"), None);
        assert_eq!(normalize_period_opt("bientôt"), None);
    }

    #[test]
    fn test_parse_score_and_null() {
        let cleaner = DataCleanerImpl;
        assert_eq!(cleaner.parse_score(Some("4")), Some(4));
        assert_eq!(cleaner.parse_score(Some("7,6")), Some(8));
        assert_eq!(cleaner.parse_score(Some("15")), Some(10));
        assert_eq!(cleaner.parse_score(Some("0")), None);
        assert_eq!(cleaner.parse_score(Some("")), None);
        assert_eq!(cleaner.normalize_null(Some("  N/A ")), None);
        assert_eq!(cleaner.normalize_null(Some(" Pompe ")), Some("Pompe".to_string()));
    }
}

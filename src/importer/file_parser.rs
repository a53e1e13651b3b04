// ==========================================
// GMAO 维护数据核心 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: CSV (.csv/.txt) / 工作簿 (.xlsx/.xls/.xlsm/.xlsb/.ods)
// 输出: 字符串网格, 不假设表头位置
// ==========================================

use crate::domain::types::FileFormat;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use std::io::Cursor;
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// UTF-8 文本被当作 Windows-1252 读取后的典型乱码片段
const MOJIBAKE_PATTERNS: &[&str] = &["Ã©", "Ã¨", "Ã\u{a0}", "Ã§", "Ã´", "Ã¢", "Ãª", "Ã‰"];

// ==========================================
// RawGrid - 字符串网格
// ==========================================
// 单元格原样保留; 空判断时才 trim
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    pub rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn is_blank_row(row: &[String]) -> bool {
        row.iter().all(|cell| cell.trim().is_empty())
    }

    /// 非空行（保留原始行号）
    pub fn non_empty_rows(&self) -> impl Iterator<Item = (usize, &Vec<String>)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !Self::is_blank_row(row))
    }

    pub fn non_empty_count(&self) -> usize {
        self.non_empty_rows().count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    pub grid: RawGrid,
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 分隔符推断: 首行 `;` 数量严格大于 `,` 才用 `;`
    pub fn detect_delimiter(text: &str) -> u8 {
        let first_line = text.lines().next().unwrap_or("");
        let semicolons = first_line.matches(';').count();
        let commas = first_line.matches(',').count();
        if semicolons > commas {
            b';'
        } else {
            b','
        }
    }

    /// 编码推断
    ///
    /// - 去除 UTF-8 BOM
    /// - 非法 UTF-8 或含 U+FFFD → 按 Windows-1252 重新解码原始字节
    /// - 合法 UTF-8 但含 "Ã©" 类乱码 → 先编码回 Windows-1252 再按 UTF-8 解码（修复双重编码）
    pub fn decode_text(bytes: &[u8]) -> String {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        match std::str::from_utf8(bytes) {
            Ok(text) if !text.contains('\u{FFFD}') => {
                if has_mojibake(text) {
                    repair_mojibake(text)
                } else {
                    text.to_string()
                }
            }
            _ => {
                debug!("UTF-8 解码失败, 回退 Windows-1252");
                let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
                decoded.into_owned()
            }
        }
    }

    fn parse_text(&self, file_name: &str, text: &str) -> ImportResult<RawGrid> {
        let delimiter = Self::detect_delimiter(text);
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| ImportError::Parse {
                file_name: file_name.to_string(),
                message: e.to_string(),
            })?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        Ok(RawGrid::new(rows))
    }
}

fn has_mojibake(text: &str) -> bool {
    MOJIBAKE_PATTERNS.iter().any(|p| text.contains(p))
}

fn repair_mojibake(text: &str) -> String {
    let (encoded, _, unmappable) = WINDOWS_1252.encode(text);
    if unmappable {
        return text.to_string();
    }
    match String::from_utf8(encoded.into_owned()) {
        Ok(repaired) => repaired,
        Err(_) => text.to_string(),
    }
}

impl FileParser for CsvParser {
    fn parse_grids(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Vec<SheetGrid>> {
        let text = Self::decode_text(bytes);
        let grid = self.parse_text(file_name, &text)?;
        Ok(vec![SheetGrid {
            name: file_name.to_string(),
            grid,
        }])
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 单元格 → 字符串（整数不带 ".0", 日期 YYYY-MM-DD HH:MM:SS）
    pub fn cell_to_string(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => format_float(*f),
            Data::Bool(b) => b.to_string(),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => format_float(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
            Data::Error(e) => format!("#{:?}", e),
        }
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl FileParser for ExcelParser {
    fn parse_grids(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Vec<SheetGrid>> {
        let parse_error = |message: String| ImportError::Parse {
            file_name: file_name.to_string(),
            message,
        };

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| parse_error(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(parse_error("classeur sans feuille".to_string()));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            match workbook.worksheet_range(&name) {
                Ok(range) => {
                    let rows = range
                        .rows()
                        .map(|row| row.iter().map(Self::cell_to_string).collect())
                        .collect();
                    sheets.push(SheetGrid {
                        name,
                        grid: RawGrid::new(rows),
                    });
                }
                Err(e) => {
                    // 图表页等无法读取的工作表按空表处理
                    warn!(sheet = %name, error = %e, "工作表读取失败, 按空表处理");
                    sheets.push(SheetGrid {
                        name,
                        grid: RawGrid::default(),
                    });
                }
            }
        }

        Ok(sheets)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_grids(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Vec<SheetGrid>> {
        match FileFormat::from_file_name(file_name) {
            Some(FileFormat::Csv) => CsvParser.parse_grids(file_name, bytes),
            Some(FileFormat::Spreadsheet) => ExcelParser.parse_grids(file_name, bytes),
            Some(FileFormat::Json) | None => Err(ImportError::UnsupportedFormat(
                file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or(file_name).to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(CsvParser::detect_delimiter("a;b;c\n1,5;2;3"), b';');
        assert_eq!(CsvParser::detect_delimiter("a,b,c\n1;2;3"), b',');
        // 数量相等时默认逗号
        assert_eq!(CsvParser::detect_delimiter("a;b,c"), b',');
        assert_eq!(CsvParser::detect_delimiter(""), b',');
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("Durée arrêt".as_bytes());
        assert_eq!(CsvParser::decode_text(&bytes), "Durée arrêt");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // "Durée" 以 Windows-1252 编码: é = 0xE9
        let bytes = b"Dur\xe9e;Co\xfbt";
        assert_eq!(CsvParser::decode_text(bytes), "Durée;Coût");
    }

    #[test]
    fn test_decode_repairs_mojibake() {
        assert_eq!(CsvParser::decode_text("DurÃ©e".as_bytes()), "Durée");
    }

    #[test]
    fn test_csv_grid_preserves_cells() {
        let text = "Date intervention;Désignation;Durée arrêt (h)\n05/03/2024;Compresseur A; 2,5 \n;;\n";
        let sheets = CsvParser.parse_grids("export.csv", text.as_bytes()).unwrap();
        assert_eq!(sheets.len(), 1);
        let grid = &sheets[0].grid;
        assert_eq!(grid.rows[0][1], "Désignation");
        assert_eq!(grid.rows[1][2], " 2,5 ");
        assert_eq!(grid.non_empty_count(), 2);
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(ExcelParser::cell_to_string(&Data::Float(12.0)), "12");
        assert_eq!(ExcelParser::cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(ExcelParser::cell_to_string(&Data::Int(7)), "7");
        assert_eq!(ExcelParser::cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let err = UniversalFileParser.parse_grids("rapport.pdf", b"%PDF").unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(ext) if ext == "pdf"));
    }

    #[test]
    fn test_invalid_workbook_is_parse_error() {
        let err = UniversalFileParser
            .parse_grids("casse.xlsx", b"not a zip archive")
            .unwrap_err();
        assert!(matches!(err, ImportError::Parse { file_name, .. } if file_name == "casse.xlsx"));
    }
}

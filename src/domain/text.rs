// ==========================================
// GMAO 维护数据核心 - 文本标准化
// ==========================================
// 职责: 比较用的文本标准化（导入词汇表 + 领域判定共用）
// 规则: 小写 + 去变音符号 + 空白折叠; 结果只用于比较, 不用于展示
// ==========================================

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 去除变音符号（é → e, ç → c）
pub fn fold_diacritics(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// 表头/单元格比较用的标准化形式
///
/// - 小写
/// - 去变音符号
/// - `_`、不换行空格 → 空格; 弯引号 → 直引号
/// - 连续空白折叠为单个空格
pub fn normalize_header(value: &str) -> String {
    let folded = fold_diacritics(&value.to_lowercase().replace('œ', "oe"));
    let replaced: String = folded
        .chars()
        .map(|c| match c {
            '_' | '\u{a0}' | '\u{202f}' | '\t' => ' ',
            '\u{2019}' | '\u{2018}' | '`' => '\'',
            other => other,
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

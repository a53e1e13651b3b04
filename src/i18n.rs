// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持法语（默认）和英语
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"fr" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use gmao_core::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use gmao_core::i18n::t_with_args;
/// let msg = t_with_args("upload.imported", &[("created", "12"), ("skipped", "1")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

// rust-i18n 的 locale 为全局状态, 且测试默认并行执行;
// i18n 相关测试通过该锁串行化。
#[cfg(test)]
static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    LOCALE_TEST_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_locale() {
        let _guard = test_lock();
        set_locale("fr");
        assert_eq!(current_locale(), "fr");

        set_locale("en");
        assert_eq!(current_locale(), "en");

        // 恢复默认语言
        set_locale("fr");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = test_lock();
        set_locale("fr");
        assert_eq!(t("common.success"), "Opération réussie");

        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");

        set_locale("fr");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = test_lock();
        set_locale("fr");
        let msg = t_with_args("upload.imported", &[("created", "12"), ("skipped", "3")]);
        assert!(msg.contains("12 enregistrement"));
        assert!(msg.contains("3 ligne"));

        set_locale("en");
        let msg = t_with_args("upload.imported", &[("created", "12"), ("skipped", "3")]);
        assert!(msg.contains("12 record"));

        set_locale("fr");
    }
}

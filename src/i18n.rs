// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
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
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use process_change_tracker::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use process_change_tracker::i18n::t_with_args;
/// let msg = t_with_args("notification.new_change_subject", &[("id", "7")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    replace_args(rust_i18n::t!(key).to_string(), args)
}

/// 按指定语言翻译（不修改全局语言）
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    replace_args(rust_i18n::t!(key, locale = locale).to_string(), args)
}

fn replace_args(mut result: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

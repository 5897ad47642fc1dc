use serde_json::Value;

/// Snapshot of every element: tag, split class tokens, resource URL.
/// Shapes match `quiesce_core::ElementInfo`.
pub const COLLECT_ELEMENTS: &str = r#"
() => Array.from(document.querySelectorAll('*')).map(el => ({
    tag: el.tagName.toLowerCase(),
    classes: (typeof el.className === 'string' && el.className.trim())
        ? el.className.trim().split(/\s+/)
        : [],
    src: el.src ? String(el.src) : null
}))
"#;

pub const COUNT_MATCHING: &str = r#"
(selector) => document.querySelectorAll(selector).length
"#;

pub fn build_js_call(func: &str, args: &[Value]) -> String {
    let args_str = args.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("({})({})", func, args_str)
}

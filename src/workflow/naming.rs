use crate::config::INTERNAL_NAME_SLUG_MAX;

/// Lowercase ASCII slug: alphanumerics kept, every other run collapsed to `_`.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_sep = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out.truncate(INTERNAL_NAME_SLUG_MAX);
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "product".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Short suffix shared by every name of one run.
pub fn run_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// `{slug}_{index}_{suffix}` for index 1..=count.
pub fn internal_names(title: &str, count: u32, suffix: &str) -> Vec<String> {
    let slug = slug(title);
    (1..=count).map(|i| format!("{slug}_{i}_{suffix}")).collect()
}

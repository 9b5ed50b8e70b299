//! DNS 名称处理
//!
//! Route 53 等后端返回带末尾点的完整域名，调用方通常不带；
//! 身份键比较前统一走 [`normalize_name`]。

/// Maximum length of a domain name in presentation form, without the trailing dot.
const MAX_NAME_LEN: usize = 253;
/// Maximum length of a single label.
const MAX_LABEL_LEN: usize = 63;

/// 去掉末尾的点并转为小写
pub fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// 补齐末尾的点（完整域名形式）
pub fn ensure_dot_suffix(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// 两个名称是否指向同一节点（忽略大小写与末尾点）
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Qualify a record name against its zone.
///
/// A name with a trailing dot is absolute and returned unchanged. `@`, the zone
/// name itself and names already under the zone are made absolute; any other
/// name is treated as relative and gets the zone appended.
pub fn qualify_name(name: &str, zone: &str) -> String {
    if name.ends_with('.') {
        return name.to_string();
    }
    let zone = zone.trim_end_matches('.');
    if name.is_empty() || name == "@" {
        return format!("{zone}.");
    }
    if names_match(name, zone) || is_under(name, zone) {
        return format!("{name}.");
    }
    format!("{name}.{zone}.")
}

/// `name` 是否为 `zone` 的子域（不含 zone 本身）
fn is_under(name: &str, zone: &str) -> bool {
    let (name, zone) = (name.trim_end_matches('.').as_bytes(), zone.as_bytes());
    name.len() > zone.len() + 1
        && name[name.len() - zone.len() - 1] == b'.'
        && name[name.len() - zone.len()..].eq_ignore_ascii_case(zone)
}

/// Check that `name` is a syntactically valid zone name.
///
/// Returns a human-readable reason on failure. A single trailing dot is accepted.
pub fn check_zone_name(name: &str) -> Result<(), String> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.is_empty() {
        return Err("zone name must not be empty".to_string());
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(format!(
            "zone name is {} bytes, limit is {MAX_NAME_LEN}",
            trimmed.len()
        ));
    }

    for label in trimmed.split('.') {
        if label.is_empty() {
            return Err(format!("zone name '{name}' contains an empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(format!(
                "label '{label}' is {} bytes, limit is {MAX_LABEL_LEN}",
                label.len()
            ));
        }
        let body = label.strip_prefix('_').unwrap_or(label);
        if !body.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(format!("label '{label}' contains invalid characters"));
        }
        if body.starts_with('-') || body.ends_with('-') {
            return Err(format!("label '{label}' must not start or end with '-'"));
        }
    }

    Ok(())
}

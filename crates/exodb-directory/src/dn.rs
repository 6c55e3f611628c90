//! Distinguished-name construction helpers.

/// Escape an attribute value for use inside a DN (RFC 4514).
///
/// DN escaping differs from filter escaping: `, + " \ < > ; =` always take
/// a backslash, NUL is hex-escaped, and space and `#` only need escaping
/// at the edges. Without this, a crafted username like
/// `admin,dc=evil,dc=com` would relocate the entry being created.
pub fn escape_value(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let mut result = String::with_capacity(value.len() * 2);
    let last = value.chars().count() - 1;

    for (i, ch) in value.chars().enumerate() {
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(ch);
            }
            '\0' => result.push_str("\\00"),
            ' ' if i == 0 || i == last => result.push_str("\\20"),
            '#' if i == 0 => result.push_str("\\23"),
            _ => result.push(ch),
        }
    }

    result
}

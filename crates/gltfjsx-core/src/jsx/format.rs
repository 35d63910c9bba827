//! Number and identifier formatting for generated code

/// Format a number with at most `precision` fractional digits, dropping
/// trailing zeros and negative zero.
pub fn number(value: f32, precision: usize) -> String {
    let mut text = format!("{value:.precision$}");
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// `[x, y, z]` array literal
pub fn vector(values: [f32; 3], precision: usize) -> String {
    format!(
        "[{}, {}, {}]",
        number(values[0], precision),
        number(values[1], precision),
        number(values[2], precision)
    )
}

/// Whether `name` can be written as a bare JavaScript identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Single-quoted JavaScript string literal
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Property access: `object.key` or `object['key']`
pub fn member(object: &str, key: &str) -> String {
    if is_identifier(key) {
        format!("{object}.{key}")
    } else {
        format!("{object}[{}]", string_literal(key))
    }
}

/// Key in an object type or literal: `key` or `'key'`
pub fn property_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        string_literal(key)
    }
}

/// Coerce a name into an identifier by replacing everything else with `_`
pub fn identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '$') {
        out.insert(0, '_');
    }
    out
}

/// `#rrggbb` from linear RGB components in `0..=1`
pub fn hex_color(color: [f32; 3]) -> String {
    let [r, g, b] = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Escape text for a double-quoted JSX attribute
pub fn attribute_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('"', "&quot;")
}

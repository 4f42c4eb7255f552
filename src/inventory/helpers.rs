//! Row Coercion Helpers
//!
//! Import rows arrive as untyped JSON. These helpers apply loose scalar
//! casts so that `"12"`, `12` and `12.0` all read as the integer 12.

use serde_json::{Number, Value};

/// Casts a JSON scalar to an integer.
///
/// * numbers are truncated toward zero
/// * strings use their leading integer prefix (`"12kg"` → 12, `"abc"` → 0)
/// * `true` → 1, `false` / `null` → 0
///
/// Arrays and objects have no integer reading and yield `None`.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => Some(leading_int(s)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Null => Some(0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Casts a JSON scalar to a string.
///
/// Numbers print as integers when whole (`1.0` → `"1"`), otherwise as
/// their JSON text. `true` → `"1"`, `false` / `null` → `""`.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) | Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whole-valued floats print without a fractional part (`1.0` → `"1"`),
/// matching how integers print.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

/// Parses the optional sign and leading digits of `s`, ignoring leading
/// whitespace. Saturates instead of overflowing.
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Human-readable rendering of a raw value for error messages.
pub fn display_value(value: &Value) -> String {
    coerce_string(value).unwrap_or_else(|| value.to_string())
}

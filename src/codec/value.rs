//! Logical values
//!
//! The closed set of value shapes a caller can hand to the store, decided at
//! the API boundary rather than by runtime type inspection.

use std::fmt;

use bytes::Bytes;

/// A logical key or value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Raw bytes, stored under the `B` tag
    Binary(Bytes),

    /// UTF-8 text, stored under the `S` tag
    Text(String),

    /// A number, stored under the `S` tag in its textual form.
    /// Decodes back as `Text`.
    ///
    /// The text follows JavaScript `String(n)`: `NaN`, `Infinity`, `0` for
    /// negative zero, and exponent form (`1e+21`, `1e-7`) outside
    /// `1e-7 <= |n| < 1e21`.
    Number(f64),

    /// Any JSON-shaped value, stored under the `J` tag
    Structured(serde_json::Value),
}

impl Value {
    /// Borrow the text payload, if this is a `Text` value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the byte payload, if this is a `Binary` value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow the structured payload, if this is a `Structured` value
    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// Byte view of any variant.
    ///
    /// Text and numbers give their UTF-8 form. Structured strings give their
    /// raw characters, arrays their comma-joined rendering (`[1,[2,null]]`
    /// gives `1,2,`) and every other structured value its JSON text.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Value::Binary(b) => b.clone(),
            Value::Text(s) => Bytes::copy_from_slice(s.as_bytes()),
            Value::Number(n) => Bytes::from(render_number(*n)),
            Value::Structured(serde_json::Value::String(s)) => {
                Bytes::copy_from_slice(s.as_bytes())
            }
            Value::Structured(serde_json::Value::Array(items)) => {
                let mut out = String::new();
                render_array(items, &mut out);
                Bytes::from(out)
            }
            Value::Structured(v) => Bytes::from(v.to_string()),
        }
    }

    /// True when the value would be stored as an empty payload.
    ///
    /// Structured values follow their string rendering: `[]`, `[null]`, `[[]]`
    /// and `""` all render empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Binary(b) => b.is_empty(),
            Value::Text(s) => s.is_empty(),
            Value::Number(_) => false,
            Value::Structured(v) => renders_empty(v),
        }
    }

    /// True for a structured `null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Structured(serde_json::Value::Null))
    }
}

fn renders_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(items) => {
            let mut out = String::new();
            render_array(items, &mut out);
            out.is_empty()
        }
        _ => false,
    }
}

// =============================================================================
// Script-style Rendering
// =============================================================================

/// Text form of a number, as JavaScript `String(n)` writes it
pub(crate) fn render_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if (1e-7..1e21).contains(&magnitude) {
        return n.to_string();
    }

    // `{:e}` gives the shortest mantissa; only the exponent sign differs.
    let exponent_form = format!("{:e}", n);
    match exponent_form.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => exponent_form,
    }
}

/// Comma-joined array rendering: nested arrays flatten, `null` renders empty
fn render_array(items: &[serde_json::Value], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match item {
            serde_json::Value::Null => {}
            serde_json::Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) if !(n.is_i64() || n.is_u64()) => out.push_str(&render_number(f)),
                _ => out.push_str(&n.to_string()),
            },
            serde_json::Value::String(s) => out.push_str(s),
            serde_json::Value::Array(nested) => render_array(nested, out),
            serde_json::Value::Object(_) => out.push_str("[object Object]"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Binary(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => f.write_str(&render_number(*n)),
            Value::Structured(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Binary(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(Bytes::from(b))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Binary(Bytes::copy_from_slice(b))
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(b: &[u8; N]) -> Self {
        Value::Binary(Bytes::copy_from_slice(b))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Structured(v)
    }
}

//! Codec Module
//!
//! Turns logical values into tagged, order-preserving text and back.
//!
//! ## Encoded Form
//! ```text
//! ┌─────────┬───────────────────────────────────────────┐
//! │ Tag (1) │ Payload                                   │
//! ├─────────┼───────────────────────────────────────────┤
//! │   'B'   │ sort-preserving base64 of the raw bytes   │
//! │   'J'   │ JSON text of a structured value           │
//! │   'S'   │ text, or the textual form of a number     │
//! └─────────┴───────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! The sorted key index compares encoded strings byte by byte, tag first.
//! Keys of different shapes therefore group by tag (`B` < `J` < `S`): every
//! binary key sorts before every structured key, which sorts before every
//! text or numeric key. Within one tag, binary and text keys keep their
//! natural byte order. Numbers sort by their text (`"10"` < `"9"`).

mod sortable64;
mod value;

pub use value::Value;

use crate::error::{LexiError, Result};

/// Tag for binary payloads
pub const BINARY_TAG: char = 'B';

/// Tag for structured (JSON) payloads
pub const JSON_TAG: char = 'J';

/// Tag for text and numeric payloads
pub const TEXT_TAG: char = 'S';

/// Encode a logical value into its tagged form
pub fn encode(value: &Value) -> String {
    match value {
        Value::Binary(bytes) => {
            let payload = sortable64::encode(bytes);
            let mut out = String::with_capacity(1 + payload.len());
            out.push(BINARY_TAG);
            out.push_str(&payload);
            out
        }
        Value::Text(text) => {
            let mut out = String::with_capacity(1 + text.len());
            out.push(TEXT_TAG);
            out.push_str(text);
            out
        }
        Value::Number(n) => format!("{}{}", TEXT_TAG, value::render_number(*n)),
        Value::Structured(v) => format!("{}{}", JSON_TAG, v),
    }
}

/// Decode a tagged string.
///
/// With `as_binary` set, text and structured payloads are coerced to
/// `Value::Binary` (see [`Value::to_bytes`]); binary payloads always decode
/// to `Value::Binary`.
pub fn decode(encoded: &str, as_binary: bool) -> Result<Value> {
    let mut chars = encoded.chars();
    let tag = chars
        .next()
        .ok_or_else(|| LexiError::Decode("empty encoded value".to_string()))?;
    let payload = chars.as_str();

    match tag {
        BINARY_TAG => Ok(Value::Binary(sortable64::decode(payload)?.into())),
        TEXT_TAG => {
            let text = Value::Text(payload.to_string());
            Ok(if as_binary {
                Value::Binary(text.to_bytes())
            } else {
                text
            })
        }
        JSON_TAG => {
            let parsed: serde_json::Value = serde_json::from_str(payload)
                .map_err(|e| LexiError::Decode(format!("invalid structured payload: {}", e)))?;
            let value = Value::Structured(parsed);
            Ok(if as_binary {
                Value::Binary(value.to_bytes())
            } else {
                value
            })
        }
        other => Err(LexiError::Decode(format!(
            "unknown type tag {:?} in {:?}",
            other, encoded
        ))),
    }
}

/// Check that a string carries a known tag and a well-formed payload
pub fn validate(encoded: &str) -> Result<()> {
    decode(encoded, false).map(|_| ())
}

//! Sort-preserving base64
//!
//! Standard base64 bit grouping over an alphabet listed in ascending ASCII
//! order, without padding. For any two byte strings `a < b` the encoded forms
//! compare `enc(a) < enc(b)`, so binary keys keep their byte order inside the
//! text-only index.

use base64::alphabet::Alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{LexiError, Result};

/// `.` < `0-9` < `A-Z` < `_` < `a-z`
const SORTED_ALPHABET: Alphabet =
    match Alphabet::new(".0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("sorted base64 alphabet is malformed"),
    };

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &SORTED_ALPHABET,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Encode raw bytes
pub fn encode(bytes: &[u8]) -> String {
    ENGINE.encode(bytes)
}

/// Decode text produced by [`encode`]
pub fn decode(text: &str) -> Result<Vec<u8>> {
    ENGINE
        .decode(text)
        .map_err(|e| LexiError::Decode(format!("invalid binary payload: {}", e)))
}

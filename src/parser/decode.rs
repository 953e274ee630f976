//! Percent-decoding of request targets.
//!
//! HTTP/1.x request lines are ISO-8859-1 text, so each decoded byte maps
//! straight to the `char` with the same code point. Nothing is interpreted as
//! UTF-8 before the target has been validated.

use crate::parser::error::Error;

/// Decode `%XX` escapes in `target`, mapping every resulting byte to its
/// ISO-8859-1 character.
///
/// `+` is left untouched; it only means a space in form bodies, not in paths.
pub fn percent_decode_latin1(target: &str) -> Result<String, Error> {
    if !target.contains('%') {
        return Ok(target.to_string());
    }

    let mut decoded = String::with_capacity(target.len());
    let mut chars = target.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            decoded.push(c);
            continue;
        }

        let hi = chars.next().and_then(|h| h.to_digit(16));
        let lo = chars.next().and_then(|l| l.to_digit(16));
        match (hi, lo) {
            (Some(hi), Some(lo)) => decoded.push(char::from((hi * 16 + lo) as u8)),
            _ => return Err(Error::InvalidPercentEncoding(target.to_string())),
        }
    }

    Ok(decoded)
}

/// Decode raw line bytes as ISO-8859-1.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

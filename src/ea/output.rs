//! Scraping the EA value out of the tool's console output.
//!
//! The tool prints free-form text in a legacy double-byte charset. Somewhere
//! in it is a line shaped like `... EA = <number> ...`; only the first such
//! line counts. Bytes the charset cannot decode are dropped, never fatal.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::Encoding;

use crate::error::AppError;

/// Substring that marks the result line.
pub const EA_MARKER: &str = "EA =";

/// Why no EA value could be read from otherwise successful output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Unavailable {
    MarkerNotFound,
    /// The marker line was found but its value token was not a finite number.
    MalformedValue(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::MarkerNotFound => write!(f, "no line contains '{EA_MARKER}'"),
            Unavailable::MalformedValue(tok) => write!(f, "malformed EA value '{tok}'"),
        }
    }
}

/// Resolves an encoding label such as `gbk` or `gb2312`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, AppError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| AppError::UnknownEncoding(label.to_string()))
}

/// Decodes `bytes`, discarding malformed sequences instead of substituting them.
pub fn decode_lossy<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Cow<'a, str> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        Cow::Owned(text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER).collect())
    } else {
        text
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Returns the first line containing [`EA_MARKER`], if any.
pub fn find_marker_line(text: &str) -> Option<&str> {
    text.split(is_line_break).find(|line| line.contains(EA_MARKER))
}

/// Reads the value of a marker line.
///
/// The value is the first whitespace-delimited token between the line's
/// first `=` and the following one (or the end of the line).
pub fn parse_marker_value(line: &str) -> Result<f64, Unavailable> {
    let field = line.split('=').nth(1).unwrap_or("");
    let token = field
        .split_whitespace()
        .next()
        .ok_or_else(|| Unavailable::MalformedValue(String::new()))?;
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Unavailable::MalformedValue(token.to_string())),
    }
}

/// Extracts the EA value from already decoded output.
pub fn extract_ea(text: &str) -> Result<f64, Unavailable> {
    let line = find_marker_line(text).ok_or(Unavailable::MarkerNotFound)?;
    parse_marker_value(line)
}

/// Decodes raw tool output and extracts the EA value.
pub fn extract_ea_from_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<f64, Unavailable> {
    extract_ea(&decode_lossy(bytes, encoding))
}

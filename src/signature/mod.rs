//! Content-type detection for uploaded bytes.
//!
//! Three detectors of falling confidence:
//!
//! - **Signature table**: ordered magic-byte rules, first match wins
//! - **Library sniff**: `infer` for formats the table does not list
//! - **Text heuristic**: share of printable ASCII in the leading bytes
//!
//! All of them only look at the first [`HEADER_INSPECT_LIMIT`] bytes.

pub mod table;

pub use table::{Category, SignatureRule, SIGNATURES};

use crate::extension::normalize;

/// Magic bytes live at the front of a file; nothing past this is read
pub const HEADER_INSPECT_LIMIT: usize = 64 * 1024;

/// Bytes sampled by the text heuristic
pub const TEXT_SAMPLE_SIZE: usize = 1024;

/// Share of text bytes above which a sample counts as text
pub const TEXT_THRESHOLD: f64 = 0.8;

/// The part of `buffer` any detector is allowed to look at
pub fn header(buffer: &[u8]) -> &[u8] {
    &buffer[..buffer.len().min(HEADER_INSPECT_LIMIT)]
}

/// First rule in table order whose pattern matches `buffer`.
pub fn detect(buffer: &[u8]) -> Option<&'static SignatureRule> {
    detect_in(SIGNATURES, buffer)
}

/// [`detect`] against an arbitrary rule list
pub fn detect_in<'a>(rules: &'a [SignatureRule], buffer: &[u8]) -> Option<&'a SignatureRule> {
    let buffer = header(buffer);
    rules.iter().find(|rule| rule.matches(buffer))
}

/// A type reported by the generic sniffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sniffed {
    pub extension: String,
    pub mime: &'static str,
}

/// Ask `infer` for a content type
pub fn sniff(buffer: &[u8]) -> Option<Sniffed> {
    infer::get(header(buffer)).map(|kind| Sniffed {
        extension: normalize(kind.extension()),
        mime: kind.mime_type(),
    })
}

/// True when more than 80% of the first 1024 bytes are printable ASCII or
/// tab/LF/CR. An empty buffer counts as text.
pub fn looks_like_text(buffer: &[u8]) -> bool {
    if buffer.is_empty() {
        return true;
    }
    let sample = &buffer[..buffer.len().min(TEXT_SAMPLE_SIZE)];
    let text_bytes = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == 9 || b == 10 || b == 13)
        .count();

    (text_bytes as f64 / sample.len() as f64) > TEXT_THRESHOLD
}

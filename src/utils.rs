//! Small parsing helpers for the text record header.
//!
//! Parsing is deliberately non-localized: header fields always use `.` as
//! the decimal separator regardless of the process locale.

/// Parses a whitespace-trimmed signed integer field
pub fn parse_i64_field(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// Parses a whitespace-trimmed unsigned integer field
pub fn parse_u64_field(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// Parses a whitespace-trimmed floating point field
pub fn parse_f64_field(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// Parses a floating point field that must be finite and strictly positive
pub fn parse_positive_field(s: &str) -> Option<f64> {
    parse_f64_field(s).filter(|v| v.is_finite() && *v > 0.0)
}

//! Common utilities for letter generation.
//!
//! Shared helpers for date formatting, filename building and XML escaping.

use chrono::NaiveDate;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_MIME: &str = "application/pdf";

/// Format a date the way it appears on the letter (e.g. "October 16, 2026").
pub fn format_letter_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Replace spaces and slashes with underscores. Everything else is kept as is.
pub fn sanitize_filename_component(value: &str) -> String {
    value.replace(' ', "_").replace('/', "_")
}

/// Base filename (without extension) for a student's letter.
pub fn letter_basename(student_name: &str, university: &str) -> String {
    format!(
        "{}_{}",
        sanitize_filename_component(student_name),
        sanitize_filename_component(university)
    )
}

/// Escape special characters for WordprocessingML text nodes.
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

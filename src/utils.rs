//! Utility functions for text shaping, file names and output directories.
//!
//! This module provides helper functions used throughout the application:
//! - Section key humanization for translatable headings
//! - HTML escaping for the rendered email
//! - String truncation for logging
//! - File name sanitization and output directory validation for dry runs

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::DigestError;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());

/// Turn a section key into display text.
///
/// Underscores become spaces, slashes become `" & "`, and the result is
/// title-cased.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(humanize_section_key("world_news"), "World News");
/// assert_eq!(humanize_section_key("us/politics"), "Us & Politics");
/// ```
pub fn humanize_section_key(key: &str) -> String {
    title_case(&key.replace('_', " ").replace('/', " & "))
}

/// Uppercase the first letter of every word and lowercase the rest.
///
/// A word starts at any letter that does not directly follow another letter,
/// so `"o'neil"` becomes `"O'Neil"` and `"3d"` becomes `"3D"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Build a file-system safe name from a recipient address.
///
/// ```ignore
/// assert_eq!(safe_file_stem("jane.doe@example.com"), "jane_doe_example_com");
/// ```
pub fn safe_file_stem(s: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(s, "_").into_owned()
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns [`DigestError::Io`] if the directory cannot be created or is not
/// writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), DigestError> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

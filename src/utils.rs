// ABOUTME: Utility functions for the quickdeck application
// ABOUTME: Provides text sanitization, truncation, and path helpers

use crate::errors::{DeckError, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static NON_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("invalid filename regex"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Sanitize a topic string for use as a file stem: strip everything outside
/// alphanumerics and spaces, then replace spaces with underscores.
pub fn sanitize_topic(topic: &str) -> String {
    topic
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// Clean a topic string into a download filename: drop punctuation, collapse
/// whitespace runs into underscores, cap at 60 characters.
pub fn clean_filename(text: &str) -> String {
    let text = NON_FILENAME.replace_all(text.trim(), "");
    let text = WHITESPACE_RUN.replace_all(&text, "_");
    let cleaned: String = text.chars().take(60).collect();
    if cleaned.is_empty() {
        "presentation".to_string()
    } else {
        cleaned
    }
}

/// Flatten bullet content into a single paragraph: bullet markers removed,
/// non-empty lines joined by spaces.
pub fn flatten_to_paragraph(content: &str) -> String {
    content
        .lines()
        .map(|line| line.replace('•', " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip leading bullet markers from a content line.
pub fn strip_bullet_marker(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| c == '•' || c == '-' || c == '*' || c == ' ')
        .trim()
}

/// Truncate text to at most `max_chars` characters, preferring to cut at the
/// last sentence boundary beyond `min_break`, else at the last word boundary,
/// with an ellipsis appended. Text within budget is returned unchanged.
pub fn truncate_at_boundary(text: &str, max_chars: usize, min_break: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let trimmed = &text[..cut];

    let end = match trimmed.rfind('.') {
        Some(period) if period > min_break => period,
        _ => trimmed.rfind(' ').unwrap_or(cut),
    };

    format!("{}...", &trimmed[..end])
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(DeckError::FileReadError)?;
    } else if !path.is_dir() {
        return Err(DeckError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory_exists(parent)?;
        }
    }
    Ok(())
}

/// Validate write permissions for a directory
pub fn validate_directory_writable(path: &Path) -> Result<()> {
    // First ensure it exists
    ensure_directory_exists(path)?;

    // Try to create a temporary file to test write permissions
    let test_file = path.join(format!("test_write_{}.tmp", uuid::Uuid::new_v4()));
    match std::fs::File::create(&test_file) {
        Ok(_) => {
            // Clean up the test file
            if let Err(e) = std::fs::remove_file(&test_file) {
                warn!("Failed to clean up test file {:?}: {}", test_file, e);
            }
            Ok(())
        }
        Err(e) => Err(DeckError::ValidationError(format!(
            "Directory is not writable: {:?} - {}",
            path, e
        ))),
    }
}

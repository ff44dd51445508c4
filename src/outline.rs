// ABOUTME: Outline parsing module for the quickdeck application
// ABOUTME: Extracts (title, content) slide pairs from raw model output

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Literal marker separating slide chunks in the model output.
pub const SLIDE_BREAK: &str = "[SLIDEBREAK]";

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[TITLE\](.*?)\[/TITLE\]").expect("invalid title regex"));
static CONTENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[CONTENT\](.*?)\[/CONTENT\]").expect("invalid content regex"));

/// One slide description extracted from the model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideOutline {
    pub title: String,
    pub content: String,
}

impl SlideOutline {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Parse raw model output into an ordered sequence of slide outlines.
///
/// Chunks are split on the literal slide-break marker. Within each chunk the
/// title and content substrings are matched non-greedily across lines; a
/// missing marker yields an empty field, not an error. Chunks with both
/// fields empty are skipped, and duplicate titles (lowercased, trimmed) keep
/// only their first occurrence.
pub fn parse_outline(raw: &str) -> Vec<SlideOutline> {
    let mut slides = Vec::new();
    let mut seen_titles: HashSet<String> = HashSet::new();

    for chunk in raw.split(SLIDE_BREAK) {
        let title = TITLE_RE
            .captures(chunk)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        let content = CONTENT_RE
            .captures(chunk)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        if title.is_empty() && content.is_empty() {
            continue;
        }

        let normalized = title.trim().to_lowercase();
        if seen_titles.contains(&normalized) {
            debug!("Dropping duplicate slide title: {}", title);
            continue;
        }
        seen_titles.insert(normalized);

        slides.push(SlideOutline { title, content });
    }

    debug!("Parsed {} slides from model output", slides.len());
    slides
}

/// Build the fixed outline prompt for a topic and slide count.
pub fn build_prompt(topic: &str, num_slides: u32) -> String {
    format!(
        r#"Create a professional PowerPoint outline with EXACTLY {num_slides} slides
about "{topic}", using this structure:

[TITLE]Slide Title[/TITLE]
[CONTENT]
• 3–5 expert-level bullet points.
• Business-professional explanation.
[/CONTENT]
[SLIDEBREAK]
"#
    )
}

use super::*;
use crate::deck::title_font_pt;
use crate::generate::{clamp_slide_count, image_query};
use crate::images::{ImageKind, prepare_asset};
use crate::server::parse_generate_request;
use crate::utils::{
    clean_filename, flatten_to_paragraph, sanitize_topic, strip_bullet_marker,
    truncate_at_boundary,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Outline parsing
// ---------------------------------------------------------------------------

fn chunk(title: &str, content: &str) -> String {
    format!("[TITLE]{}[/TITLE]\n[CONTENT]\n{}\n[/CONTENT]\n[SLIDEBREAK]\n", title, content)
}

#[test]
fn test_parse_outline_preserves_order() {
    let raw = format!(
        "{}{}{}",
        chunk("Intro", "• first point"),
        chunk("Middle", "• second point"),
        chunk("End", "• third point")
    );

    let slides = parse_outline(&raw);

    assert_eq!(slides.len(), 3);
    assert_eq!(slides[0].title, "Intro");
    assert_eq!(slides[1].title, "Middle");
    assert_eq!(slides[2].title, "End");
    assert_eq!(slides[0].content, "• first point");
}

#[test]
fn test_parse_outline_multiline_content() {
    let raw = chunk("Topic", "• one\n• two\n• three");
    let slides = parse_outline(&raw);

    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].content, "• one\n• two\n• three");
}

#[test]
fn test_parse_outline_drops_duplicate_titles() {
    let raw = format!(
        "{}{}{}",
        chunk("Overview", "• kept"),
        chunk("  overview ", "• dropped"),
        chunk("OVERVIEW", "• also dropped")
    );

    let slides = parse_outline(&raw);

    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].content, "• kept");
}

#[test]
fn test_parse_outline_skips_empty_chunks() {
    let raw = format!(
        "{}[TITLE][/TITLE]\n[CONTENT][/CONTENT]\n[SLIDEBREAK]\n{}",
        chunk("First", "• a"),
        chunk("Second", "• b")
    );

    let slides = parse_outline(&raw);

    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0].title, "First");
    assert_eq!(slides[1].title, "Second");
}

#[test]
fn test_parse_outline_missing_markers_yield_empty_fields() {
    let raw = "[TITLE]Only a title[/TITLE]\n[SLIDEBREAK]\n[CONTENT]• only content[/CONTENT]";
    let slides = parse_outline(raw);

    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0].title, "Only a title");
    assert_eq!(slides[0].content, "");
    assert_eq!(slides[1].title, "");
    assert_eq!(slides[1].content, "• only content");
}

#[test]
fn test_parse_outline_ignores_preamble_noise() {
    let raw = format!("Here is your outline:\n\n{}", chunk("Real Slide", "• point"));
    let slides = parse_outline(&raw);

    // The preamble has no markers, so the leading chunk contributes the
    // first slide's fields and nothing else leaks through.
    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0].title, "Real Slide");
}

#[test]
fn test_build_prompt_mentions_topic_and_count() {
    let prompt = build_prompt("Rust in Production", 9);
    assert!(prompt.contains("EXACTLY 9 slides"));
    assert!(prompt.contains("\"Rust in Production\""));
    assert!(prompt.contains("[SLIDEBREAK]"));
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

#[test]
fn test_sanitize_topic() {
    assert_eq!(sanitize_topic("Rust: The Basics!"), "Rust_The_Basics");
    assert_eq!(sanitize_topic("AI & ML 2024"), "AI__ML_2024");
    assert_eq!(sanitize_topic("plain"), "plain");
}

#[test]
fn test_clean_filename() {
    assert_eq!(clean_filename("  My Deck: Part 1!  "), "My_Deck_Part_1");
    assert_eq!(clean_filename("???"), "presentation");

    let long = "a".repeat(100);
    assert_eq!(clean_filename(&long).len(), 60);
}

#[test]
fn test_flatten_to_paragraph() {
    let content = "• First point\n\n• Second point\n  Third line  ";
    assert_eq!(
        flatten_to_paragraph(content),
        "First point Second point Third line"
    );
}

#[test]
fn test_strip_bullet_marker() {
    assert_eq!(strip_bullet_marker("• a point"), "a point");
    assert_eq!(strip_bullet_marker("- dashed"), "dashed");
    assert_eq!(strip_bullet_marker("  * starred  "), "starred");
    assert_eq!(strip_bullet_marker("bare"), "bare");
}

#[test]
fn test_truncate_within_budget_is_unchanged() {
    let text = "Short body text.";
    assert_eq!(truncate_at_boundary(text, 310, 120), text);
}

#[test]
fn test_truncate_prefers_sentence_boundary() {
    let sentence = "This is a sentence that fills space and keeps going on. ";
    let text = sentence.repeat(10);
    let result = truncate_at_boundary(&text, 310, 120);

    assert!(result.ends_with("..."));
    let body = result.trim_end_matches("...");
    assert!(body.chars().count() <= 310);
    // Cut lands on the end of a full sentence
    assert!(body.ends_with("going on"));
}

#[test]
fn test_truncate_falls_back_to_word_boundary() {
    let text = format!("{} tail words here", "word ".repeat(80)).replace('.', "");
    let result = truncate_at_boundary(&text, 310, 120);

    assert!(result.ends_with("..."));
    let body = result.trim_end_matches("...");
    assert!(body.chars().count() <= 310);
    assert!(!body.ends_with(' '));
}

// ---------------------------------------------------------------------------
// Layout heuristics
// ---------------------------------------------------------------------------

#[test]
fn test_title_font_steps_down_across_thresholds() {
    assert_eq!(title_font_pt(&"a".repeat(20)), 46);
    assert_eq!(title_font_pt(&"a".repeat(35)), 46);
    assert_eq!(title_font_pt(&"a".repeat(40)), 42);
    assert_eq!(title_font_pt(&"a".repeat(56)), 38);
    assert_eq!(title_font_pt(&"a".repeat(80)), 34);

    // Monotonically non-increasing as length grows
    let sizes: Vec<u32> = (1..100).map(|n| title_font_pt(&"a".repeat(n))).collect();
    assert!(sizes.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[test]
fn test_clamp_slide_count() {
    assert_eq!(clamp_slide_count(0), 1);
    assert_eq!(clamp_slide_count(1), 1);
    assert_eq!(clamp_slide_count(7), 7);
    assert_eq!(clamp_slide_count(15), 15);
    assert_eq!(clamp_slide_count(40), 15);
}

// ---------------------------------------------------------------------------
// Image slide selection
// ---------------------------------------------------------------------------

#[test]
fn test_select_image_slides_size_and_membership() {
    let middle: Vec<usize> = (1..=6).collect();
    let mut rng = StdRng::seed_from_u64(42);
    let selected = select_image_slides(&middle, &mut rng);

    assert_eq!(selected.len(), 3);
    assert!(selected.iter().all(|i| middle.contains(i)));
}

#[test]
fn test_select_image_slides_minimum_one() {
    let middle = vec![3];
    let mut rng = StdRng::seed_from_u64(7);
    let selected = select_image_slides(&middle, &mut rng);

    assert_eq!(selected.len(), 1);
    assert!(selected.contains(&3));
}

#[test]
fn test_select_image_slides_empty_middle() {
    let middle: Vec<usize> = Vec::new();
    let mut rng = StdRng::seed_from_u64(7);
    assert!(select_image_slides(&middle, &mut rng).is_empty());
}

#[test]
fn test_select_image_slides_deterministic_with_seed() {
    let middle: Vec<usize> = (1..=9).collect();
    let a = select_image_slides(&middle, &mut StdRng::seed_from_u64(11));
    let b = select_image_slides(&middle, &mut StdRng::seed_from_u64(11));
    assert_eq!(a, b);
}

#[test]
fn test_image_query_strips_punctuation() {
    assert_eq!(
        image_query("Rust: 2024!", "Memory & Safety"),
        "Rust 2024 Memory  Safety"
    );
}

// ---------------------------------------------------------------------------
// Image asset preparation
// ---------------------------------------------------------------------------

fn encode_sample(format: image::ImageOutputFormat) -> Vec<u8> {
    let img = image::ImageBuffer::from_fn(8, 4, |_, _| image::Rgb([10u8, 20u8, 30u8]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .expect("Failed to encode sample image");
    out.into_inner()
}

#[test]
fn test_prepare_asset_keeps_png() {
    let bytes = encode_sample(image::ImageOutputFormat::Png);
    let asset = prepare_asset(bytes.clone()).expect("PNG should be usable");
    assert_eq!(asset.kind, ImageKind::Png);
    assert_eq!(asset.bytes, bytes);
}

#[test]
fn test_prepare_asset_keeps_jpeg() {
    let bytes = encode_sample(image::ImageOutputFormat::Jpeg(90));
    let asset = prepare_asset(bytes).expect("JPEG should be usable");
    assert_eq!(asset.kind, ImageKind::Jpeg);
}

#[test]
fn test_prepare_asset_transcodes_other_formats_to_png() {
    let bytes = encode_sample(image::ImageOutputFormat::Bmp);
    let asset = prepare_asset(bytes).expect("BMP should transcode");
    assert_eq!(asset.kind, ImageKind::Png);
    assert_eq!(
        image::guess_format(&asset.bytes).expect("transcoded bytes should decode"),
        image::ImageFormat::Png
    );
}

#[test]
fn test_prepare_asset_rejects_garbage() {
    assert!(prepare_asset(vec![0, 1, 2, 3, 4]).is_none());
}

// ---------------------------------------------------------------------------
// Config store
// ---------------------------------------------------------------------------

#[test]
fn test_config_load_missing_file_creates_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");

    let config = Config::load(&path);

    assert_eq!(config, Config::default());
    assert!(path.exists(), "Default config file should be written");

    let raw = std::fs::read_to_string(&path).expect("Failed to read config file");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("Config should be JSON");
    let keys: Vec<&str> = value
        .as_object()
        .expect("Config should be a JSON object")
        .keys()
        .map(|k| k.as_str())
        .collect();
    assert_eq!(keys.len(), 4);
    for key in ["api_key", "groq_key", "serpapi_key", "save_location"] {
        assert!(keys.contains(&key), "Missing key {}", key);
    }
}

#[test]
fn test_config_load_corrupt_file_resets_to_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{not valid json").expect("Failed to write corrupt file");

    let config = Config::load(&path);

    assert_eq!(config, Config::default());
    let reloaded = Config::load(&path);
    assert_eq!(reloaded, Config::default());
}

#[test]
fn test_config_update_round_trip() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");

    Config::update(&path, "groq_key", "gsk_test").expect("Update should succeed");
    Config::update(&path, "save_location", "out").expect("Update should succeed");

    let config = Config::load(&path);
    assert_eq!(config.groq_key, "gsk_test");
    assert_eq!(config.save_location, "out");
    assert_eq!(config.api_key, "");
}

#[test]
fn test_config_update_unknown_key_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");

    let result = Config::update(&path, "nope", "value");
    assert!(matches!(result, Err(DeckError::ValidationError(_))));
}

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

#[test]
fn test_parse_generate_request_json() {
    let body = r#"{"topic":"Rust","groq_api_key":"gsk","serp_api_key":"sk","slides":12}"#;
    let params = parse_generate_request(Some("application/json"), body);

    assert_eq!(params.topic.as_deref(), Some("Rust"));
    assert_eq!(params.groq_api_key.as_deref(), Some("gsk"));
    assert_eq!(params.serp_api_key.as_deref(), Some("sk"));
    assert_eq!(params.slides, 12);
}

#[test]
fn test_parse_generate_request_form() {
    let body = "topic=Rust+Basics&groq_api_key=gsk&slides=3";
    let params = parse_generate_request(Some("application/x-www-form-urlencoded"), body);

    assert_eq!(params.topic.as_deref(), Some("Rust Basics"));
    assert_eq!(params.groq_api_key.as_deref(), Some("gsk"));
    assert_eq!(params.serp_api_key, None);
    assert_eq!(params.slides, 3);
}

#[test]
fn test_parse_generate_request_slides_default_and_clamp() {
    let missing = parse_generate_request(Some("application/json"), r#"{"topic":"t"}"#);
    assert_eq!(missing.slides, 7);

    let as_string =
        parse_generate_request(Some("application/json"), r#"{"topic":"t","slides":"9"}"#);
    assert_eq!(as_string.slides, 9);

    let too_big =
        parse_generate_request(Some("application/json"), r#"{"topic":"t","slides":99}"#);
    assert_eq!(too_big.slides, 15);

    let not_numeric =
        parse_generate_request(Some("application/json"), r#"{"topic":"t","slides":"lots"}"#);
    assert_eq!(not_numeric.slides, 7);
}

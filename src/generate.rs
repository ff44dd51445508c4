// ABOUTME: Orchestrator module for the quickdeck application
// ABOUTME: Drives prompt, outline, image selection, rendering, and save

use crate::config::Config;
use crate::deck::Deck;
use crate::errors::Result;
use crate::generation::TextGenerator;
use crate::images::{ImageProvider, fetch_with_fallback};
use crate::outline::{SlideOutline, build_prompt, parse_outline};
use crate::utils::{
    ensure_directory_exists, flatten_to_paragraph, sanitize_topic, validate_directory_writable,
};
use log::{info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Slide counts are clamped into this range before generation.
pub const MIN_SLIDES: u32 = 1;
pub const MAX_SLIDES: u32 = 15;

/// Options for one generation request.
pub struct GenerateOptions {
    pub topic: String,
    pub model: String,
    pub num_slides: u32,
}

/// Clamp a requested slide count into the supported range.
pub fn clamp_slide_count(requested: u32) -> u32 {
    requested.clamp(MIN_SLIDES, MAX_SLIDES)
}

/// Select which middle slides receive images: a random subset of size
/// `max(1, middle_count / 2)` without replacement. The generator is injected
/// so tests can assert exact slide sets with a seeded source.
pub fn select_image_slides<R: Rng + ?Sized>(
    middle_indices: &[usize],
    rng: &mut R,
) -> HashSet<usize> {
    if middle_indices.is_empty() {
        return HashSet::new();
    }
    let count = std::cmp::max(1, middle_indices.len() / 2);
    middle_indices
        .choose_multiple(rng, count)
        .copied()
        .collect()
}

/// Image search query: topic plus slide title, stripped to alphanumerics
/// and spaces.
pub fn image_query(topic: &str, title: &str) -> String {
    format!("{} {}", topic, title)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect()
}

/// Run the full pipeline for one topic and return the absolute path of the
/// saved presentation.
///
/// Slide 0 always renders as the title slide (title defaulting to the topic
/// when the model returned none); a synthetic closing slide is appended and
/// always renders as a content slide; middle slides are image-eligible.
pub fn generate_deck<R: Rng + ?Sized>(
    opts: &GenerateOptions,
    config: &Config,
    generator: &dyn TextGenerator,
    image_providers: &[&dyn ImageProvider],
    rng: &mut R,
) -> Result<PathBuf> {
    let num_slides = clamp_slide_count(opts.num_slides);
    info!(
        "Generating {}-slide deck for topic {:?}",
        num_slides, opts.topic
    );

    let prompt = build_prompt(&opts.topic, num_slides);
    let raw = generator.generate(&prompt)?;

    let mut slides = parse_outline(&raw);
    if let Some(first) = slides.first_mut() {
        if first.title.trim().is_empty() {
            first.title = opts.topic.clone();
        }
    }
    slides.push(SlideOutline::new("Thank You", ""));

    let middle_indices: Vec<usize> = (1..slides.len().saturating_sub(1)).collect();
    let with_images = select_image_slides(&middle_indices, rng);
    info!(
        "{} of {} middle slides selected for images",
        with_images.len(),
        middle_indices.len()
    );

    let mut deck = Deck::new(&opts.topic);
    let last_index = slides.len() - 1;

    for (i, slide) in slides.iter().enumerate() {
        if i == 0 {
            let subtitle = flatten_to_paragraph(&slide.content);
            deck.add_title_slide(&slide.title, &subtitle);
            continue;
        }

        if i == last_index {
            deck.add_content_slide(&slide.title, &slide.content, false);
            continue;
        }

        let first_content = i == 1;

        if with_images.contains(&i) {
            let query = image_query(&opts.topic, &slide.title);
            if let Some(asset) = fetch_with_fallback(image_providers, &query) {
                match deck.add_image_slide(&slide.title, &slide.content, &asset) {
                    Ok(()) => continue,
                    Err(e) => warn!("Image placement failed for slide {}: {}", i + 1, e),
                }
            } else {
                warn!("No image found for slide {} ({:?})", i + 1, query);
            }
        }

        deck.add_content_slide(&slide.title, &slide.content, first_content);
    }

    let save_dir = Path::new(&config.save_location);
    ensure_directory_exists(save_dir)?;
    validate_directory_writable(save_dir)?;

    let path = save_dir.join(format!("{}.pptx", sanitize_topic(&opts.topic)));
    deck.save(&path)?;

    let absolute = std::fs::canonicalize(&path).unwrap_or(path);
    info!("Deck saved at {:?}", absolute);
    Ok(absolute)
}

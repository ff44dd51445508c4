// ABOUTME: Library module for the quickdeck program.
// ABOUTME: Contains core functionality for generating slide decks from a topic.

// Reexport modules
pub mod config;
pub mod deck;
pub mod errors;
pub mod form;
pub mod generate;
pub mod generation;
pub mod images;
pub mod outline;
pub mod server;
pub mod utils;

// Reexport common types and functions
pub use config::Config;
pub use deck::Deck;
pub use errors::{DeckError, Result};
pub use generate::{GenerateOptions, generate_deck, select_image_slides};
pub use generation::{DEFAULT_MODEL, GroqClient, TextGenerator};
pub use images::{ImageAsset, ImageProvider, SerpApiImages, StubImages};
pub use outline::{SlideOutline, build_prompt, parse_outline};
pub use server::{AppState, run_server};

#[cfg(test)]
mod tests;

// ABOUTME: Interactive form front end for the quickdeck application
// ABOUTME: Collects generation fields and runs the pipeline on a worker thread

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::generate::{GenerateOptions, generate_deck};
use crate::generation::{DEFAULT_MODEL, GroqClient};
use crate::images::{ImageProvider, SerpApiImages, StubImages};
use log::info;
use parking_lot::Mutex;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const DEFAULT_FORM_SLIDES: &str = "10";

fn prompt(label: &str, default: &str) -> Result<String> {
    if default.is_empty() {
        print!("{}: ", label);
    } else {
        print!("{} [{}]: ", label, default);
    }
    io::stdout().flush().map_err(DeckError::FileReadError)?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(DeckError::FileReadError)?;

    let value = line.trim().to_string();
    if value.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(value)
    }
}

/// Run the interactive form: collect the fields, kick off generation on one
/// background worker thread, and print the final status. The only state
/// shared with the worker is the status slot, written once on completion.
pub fn run_form(config: &Config) -> Result<()> {
    let groq_key = prompt("Groq API key", &config.groq_key)?;
    let topic = prompt("Topic", "")?;
    let model = prompt("Model", DEFAULT_MODEL)?;
    let slides = prompt("Number of slides", DEFAULT_FORM_SLIDES)?;

    if topic.is_empty() || groq_key.is_empty() || slides.is_empty() {
        println!("Please fill all fields.");
        return Ok(());
    }

    let num_slides = match slides.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            println!("Number of slides must be an integer.");
            return Ok(());
        }
    };

    println!("Generating deck... please wait.");
    info!("Form generation started for topic {:?}", topic);

    let status: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
    let worker_status = Arc::clone(&status);
    let worker_config = config.clone();

    let handle = thread::spawn(move || {
        let opts = GenerateOptions {
            topic,
            model,
            num_slides,
        };
        let generator = GroqClient::new(groq_key, opts.model.clone());
        let primary = SerpApiImages::new(worker_config.serpapi_key.clone());
        let fallback = StubImages;
        let providers: [&dyn ImageProvider; 2] = [&primary, &fallback];

        let result = generate_deck(
            &opts,
            &worker_config,
            &generator,
            &providers,
            &mut rand::thread_rng(),
        );

        let mut slot = worker_status.lock();
        *slot = match result {
            Ok(path) => format!("Deck created successfully!\nSaved at: {}", path.display()),
            Err(e) => format!("Error: {}", e),
        };
    });

    // Keep the front thread responsive while the worker runs
    while !handle.is_finished() {
        print!(".");
        io::stdout().flush().map_err(DeckError::FileReadError)?;
        thread::sleep(Duration::from_millis(500));
    }
    println!();

    handle
        .join()
        .map_err(|_| DeckError::UnknownError("Generation thread panicked".to_string()))?;

    println!("{}", status.lock());
    Ok(())
}

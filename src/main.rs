// ABOUTME: Main entry point for the quickdeck program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use clap::{Args, Parser, Subcommand};
use quickdeck::config::{CONFIG_PATH, Config};
use quickdeck::errors::DeckError;
use quickdeck::generate::GenerateOptions;
use quickdeck::generation::{DEFAULT_MODEL, GroqClient};
use quickdeck::images::{ImageProvider, SerpApiImages, StubImages};
use quickdeck::server::AppState;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a presentation from a topic
    Generate(GenerateArgs),

    /// Run the HTTP server front end
    Serve(ServeArgs),

    /// Run the interactive form front end
    Form,

    /// Show or update the settings file
    Config(ConfigArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Topic to build the presentation around
    topic: String,

    /// Model name (empty uses the provider default)
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Number of slides (clamped to 1-15)
    #[arg(short, long, default_value_t = 10)]
    slides: u32,

    /// Groq API key (falls back to the configured groq_key)
    #[arg(long)]
    groq_key: Option<String>,

    /// SerpAPI key for slide images (falls back to the configured serpapi_key)
    #[arg(long)]
    serp_key: Option<String>,
}

#[derive(Args)]
struct ServeArgs {
    /// Port to listen on (PORT env var wins when set)
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Directory holding the prebuilt frontend bundle
    #[arg(long, default_value = "static_site")]
    static_dir: PathBuf,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings
    Show,
    /// Set one settings key
    Set { key: String, value: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config_path = Path::new(CONFIG_PATH);
    let config = Config::load(config_path);

    let result = match &cli.command {
        Some(Commands::Generate(args)) => {
            println!("Generating presentation about {:?}...", args.topic);

            let groq_key = args
                .groq_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(|| config.groq_key.clone());
            if groq_key.trim().is_empty() {
                Err(DeckError::ValidationError(
                    "No Groq API key given (use --groq-key or `config set groq_key <key>`)"
                        .to_string(),
                ))
            } else {
                let serp_key = args
                    .serp_key
                    .clone()
                    .filter(|k| !k.trim().is_empty())
                    .unwrap_or_else(|| config.serpapi_key.clone());

                let opts = GenerateOptions {
                    topic: args.topic.clone(),
                    model: args.model.clone(),
                    num_slides: args.slides,
                };
                let generator = GroqClient::new(groq_key, args.model.clone());
                let primary = SerpApiImages::new(serp_key);
                let fallback = StubImages;
                let providers: [&dyn ImageProvider; 2] = [&primary, &fallback];

                quickdeck::generate_deck(
                    &opts,
                    &config,
                    &generator,
                    &providers,
                    &mut rand::thread_rng(),
                )
                .map(|path| {
                    println!("Presentation saved at: {}", path.display());
                })
            }
        }
        Some(Commands::Serve(args)) => {
            let port = env::var("PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(args.port);
            let state = AppState {
                config: config.clone(),
                static_dir: args.static_dir.clone(),
            };
            quickdeck::run_server(&format!("0.0.0.0:{}", port), state)
        }
        Some(Commands::Form) => quickdeck::form::run_form(&config),
        Some(Commands::Config(args)) => match &args.action {
            ConfigAction::Show => {
                println!("{:#?}", config);
                Ok(())
            }
            ConfigAction::Set { key, value } => {
                Config::update(config_path, key, value).map(|_| {
                    println!("Updated {}", key);
                })
            }
        },
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

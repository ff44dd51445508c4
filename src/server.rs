// ABOUTME: HTTP front end for the quickdeck application
// ABOUTME: Serves /health, /generate, and the prebuilt frontend bundle

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::generate::{GenerateOptions, generate_deck};
use crate::generation::{DEFAULT_MODEL, GroqClient};
use crate::images::{ImageProvider, SerpApiImages, StubImages};
use crate::utils::clean_filename;
use log::{debug, error, info};
use std::fs;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use url::form_urlencoded;

const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Default number of slides when the request omits the field.
const DEFAULT_SLIDE_COUNT: u32 = 7;

/// Shared state for request handlers.
pub struct AppState {
    pub config: Config,
    pub static_dir: PathBuf,
}

/// Fields accepted by the generate endpoint (JSON or urlencoded form).
#[derive(Debug, PartialEq, Eq)]
pub struct GenerateParams {
    pub topic: Option<String>,
    pub groq_api_key: Option<String>,
    pub serp_api_key: Option<String>,
    pub slides: u32,
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .expect("Failed to create header")
}

fn with_cors(response: Response<Cursor<Vec<u8>>>) -> Response<Cursor<Vec<u8>>> {
    response.with_header(header("Access-Control-Allow-Origin", "*"))
}

fn json_response(status: u16, body: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", "application/json"))
}

fn error_response(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": message }).to_string();
    json_response(status, &body)
}

/// Bind and serve forever on the given address.
pub fn run_server(addr: &str, state: AppState) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| DeckError::ServerError(format!("Failed to start HTTP server: {}", e)))?;
    info!("HTTP server listening on {}", addr);
    println!("HTTP server listening on {}", addr);
    serve(server, Arc::new(state))
}

/// Accept loop: each request is dispatched to its own worker thread so a
/// slow generation does not block the health check.
pub fn serve(server: Server, state: Arc<AppState>) -> Result<()> {
    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        thread::spawn(move || handle_request(request, state));
    }
    Ok(())
}

fn handle_request(mut request: Request, state: Arc<AppState>) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("").to_string();
    debug!("{} {}", method, path);

    let response = match (&method, path.as_str()) {
        (Method::Options, _) => Response::from_string("")
            .with_status_code(StatusCode(204))
            .with_header(header(
                "Access-Control-Allow-Methods",
                "GET, POST, OPTIONS",
            ))
            .with_header(header("Access-Control-Allow-Headers", "Content-Type")),
        (Method::Get, "/health") => json_response(200, r#"{"status":"ok"}"#),
        (Method::Post, "/generate") | (Method::Post, "/api/generate") => {
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());

            let mut body = String::new();
            match request.as_reader().read_to_string(&mut body) {
                Ok(_) => {
                    let params = parse_generate_request(content_type.as_deref(), &body);
                    handle_generate(params, &state)
                }
                Err(e) => error_response(400, &format!("Failed to read request body: {}", e)),
            }
        }
        (Method::Get, _) => serve_static(&path, &state),
        _ => error_response(404, "Not found"),
    };

    if let Err(e) = request.respond(with_cors(response)) {
        error!("Failed to send response: {}", e);
    }
}

/// Parse the generate request fields from a JSON or urlencoded form body.
pub fn parse_generate_request(content_type: Option<&str>, body: &str) -> GenerateParams {
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);

    let (topic, groq_api_key, serp_api_key, slides_raw) = if is_json {
        let value: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
        let get = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };
        let slides_raw = value.get("slides").map(|v| match v {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        (
            get("topic"),
            get("groq_api_key"),
            get("serp_api_key"),
            slides_raw,
        )
    } else {
        let mut topic = None;
        let mut groq_api_key = None;
        let mut serp_api_key = None;
        let mut slides_raw = None;
        for (key, value) in form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "topic" => topic = Some(value.into_owned()),
                "groq_api_key" => groq_api_key = Some(value.into_owned()),
                "serp_api_key" => serp_api_key = Some(value.into_owned()),
                "slides" => slides_raw = Some(value.into_owned()),
                _ => {}
            }
        }
        (topic, groq_api_key, serp_api_key, slides_raw)
    };

    // Optional field: non-numeric input falls back to the default count
    let slides = slides_raw
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_SLIDE_COUNT)
        .clamp(crate::generate::MIN_SLIDES, crate::generate::MAX_SLIDES);

    GenerateParams {
        topic,
        groq_api_key,
        serp_api_key,
        slides,
    }
}

fn handle_generate(params: GenerateParams, state: &AppState) -> Response<Cursor<Vec<u8>>> {
    let topic = params.topic.filter(|t| !t.trim().is_empty());
    let groq_api_key = params.groq_api_key.filter(|k| !k.trim().is_empty());

    let (topic, groq_api_key) = match (topic, groq_api_key) {
        (Some(topic), Some(key)) => (topic, key),
        _ => return error_response(400, "Missing topic or API key"),
    };

    let opts = GenerateOptions {
        topic: topic.clone(),
        model: DEFAULT_MODEL.to_string(),
        num_slides: params.slides,
    };

    let generator = GroqClient::new(groq_api_key, DEFAULT_MODEL);

    // A key typed into the request overrides the configured one
    let serp_key = params
        .serp_api_key
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| state.config.serpapi_key.clone());
    let primary = SerpApiImages::new(serp_key);
    let fallback = StubImages;
    let providers: [&dyn ImageProvider; 2] = [&primary, &fallback];

    match generate_deck(
        &opts,
        &state.config,
        &generator,
        &providers,
        &mut rand::thread_rng(),
    ) {
        Ok(path) => match fs::read(&path) {
            Ok(bytes) => {
                let filename = format!("{}.pptx", clean_filename(&topic));
                Response::from_data(bytes)
                    .with_header(header("Content-Type", PPTX_MIME))
                    .with_header(header(
                        "Content-Disposition",
                        &format!("attachment; filename=\"{}\"", filename),
                    ))
            }
            Err(e) => {
                error!("Failed to read generated file {:?}: {}", path, e);
                error_response(500, &format!("Failed to read generated file: {}", e))
            }
        },
        Err(e) => {
            error!("Generation failed: {}", e);
            error_response(500, &e.to_string())
        }
    }
}

/// Serve the prebuilt frontend bundle: `/` maps to index.html, other paths
/// resolve under the static directory.
fn serve_static(path: &str, state: &AppState) -> Response<Cursor<Vec<u8>>> {
    let relative = if path == "/" {
        "index.html"
    } else {
        path.trim_start_matches('/')
    };

    // Reject traversal segments outright
    if relative.split('/').any(|segment| segment == "..") {
        return error_response(404, "Not found");
    }

    let file_path = state.static_dir.join(relative);
    if !file_path.is_file() {
        return error_response(404, "Not found");
    }

    match fs::read(&file_path) {
        Ok(content) => {
            let content_type = match file_path.extension().and_then(|e| e.to_str()) {
                Some("html") => "text/html",
                Some("css") => "text/css",
                Some("js") => "application/javascript",
                Some("json") => "application/json",
                Some("svg") => "image/svg+xml",
                Some("ico") => "image/x-icon",
                Some("png") => "image/png",
                Some("jpg") | Some("jpeg") => "image/jpeg",
                _ => "application/octet-stream",
            };
            Response::from_data(content).with_header(header("Content-Type", content_type))
        }
        Err(e) => {
            error!("Failed to read file {:?}: {}", file_path, e);
            error_response(500, &format!("Failed to read file: {}", e))
        }
    }
}

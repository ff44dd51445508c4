// ABOUTME: Image fetching module for the quickdeck application
// ABOUTME: Queries SerpAPI for one image per slide and normalizes the bytes

use image::ImageFormat;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;

const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

/// Browser-like identity for the image download.
const DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Raster formats we place into the deck without transcoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
        }
    }
}

/// A transient image buffer owned by the render step that places it.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

/// An image source. `None` is the explicit soft-failure variant: providers
/// log and swallow their own errors so a missing image never aborts the
/// request.
pub trait ImageProvider {
    fn fetch(&self, query: &str) -> Option<ImageAsset>;
}

/// Try providers in order and return the first usable asset.
pub fn fetch_with_fallback(providers: &[&dyn ImageProvider], query: &str) -> Option<ImageAsset> {
    for provider in providers {
        if let Some(asset) = provider.fetch(query) {
            return Some(asset);
        }
    }
    None
}

/// Primary provider: Google image search via SerpAPI.
pub struct SerpApiImages {
    api_key: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    images_results: Vec<ImageResult>,
}

#[derive(Deserialize)]
struct ImageResult {
    original: Option<String>,
}

impl SerpApiImages {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: SERPAPI_ENDPOINT.to_string(),
        }
    }

    /// Point the provider at a different search endpoint (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Ask the search API for the first matching image URL.
    fn search_image_url(&self, query: &str) -> Option<String> {
        let client = match Client::builder().timeout(SEARCH_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build search client: {}", e);
                return None;
            }
        };

        let response = client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("tbm", "isch"),
                ("api_key", &self.api_key),
                ("num", "1"),
            ])
            .send();

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Image search failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Image search returned HTTP {}", response.status());
            return None;
        }

        let parsed: SearchResponse = match response.json() {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Image search returned malformed JSON: {}", e);
                return None;
            }
        };

        parsed
            .images_results
            .into_iter()
            .next()
            .and_then(|result| result.original)
    }

    /// Download the image bytes with a browser-like client identity.
    fn download(&self, url: &str) -> Option<Vec<u8>> {
        let client = match Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(DOWNLOAD_USER_AGENT)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build download client: {}", e);
                return None;
            }
        };

        match client.get(url).send() {
            Ok(response) if response.status().is_success() => match response.bytes() {
                Ok(bytes) => Some(bytes.to_vec()),
                Err(e) => {
                    warn!("Failed to read image body: {}", e);
                    None
                }
            },
            Ok(response) => {
                warn!("Image download returned HTTP {}", response.status());
                None
            }
            Err(e) => {
                warn!("Image download failed: {}", e);
                None
            }
        }
    }
}

impl ImageProvider for SerpApiImages {
    fn fetch(&self, query: &str) -> Option<ImageAsset> {
        if self.api_key.trim().is_empty() {
            debug!("No SerpAPI key configured, skipping image fetch");
            return None;
        }

        let url = self.search_image_url(query)?;
        debug!("Downloading image for {:?}: {}", query, url);
        let bytes = self.download(&url)?;
        prepare_asset(bytes)
    }
}

/// Secondary provider slot. Permanently reports no image; exists so another
/// provider can be swapped in without touching the orchestrator.
pub struct StubImages;

impl ImageProvider for StubImages {
    fn fetch(&self, _query: &str) -> Option<ImageAsset> {
        None
    }
}

/// Verify the downloaded bytes decode, transcoding web-optimized formats to
/// PNG so the deck only ever embeds PNG or JPEG. Undecodable bytes are
/// reported as "no usable image".
pub fn prepare_asset(bytes: Vec<u8>) -> Option<ImageAsset> {
    let format = match image::guess_format(&bytes) {
        Ok(format) => format,
        Err(e) => {
            warn!("Unrecognized image format: {}", e);
            return None;
        }
    };

    // Verify the image actually decodes before it goes anywhere near the deck
    let decoded = match image::load_from_memory(&bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("Image failed to decode: {}", e);
            return None;
        }
    };

    match format {
        ImageFormat::Png => Some(ImageAsset {
            bytes,
            kind: ImageKind::Png,
        }),
        ImageFormat::Jpeg => Some(ImageAsset {
            bytes,
            kind: ImageKind::Jpeg,
        }),
        other => {
            debug!("Transcoding {:?} image to PNG", other);
            let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
            let mut out = Cursor::new(Vec::new());
            match rgb.write_to(&mut out, image::ImageOutputFormat::Png) {
                Ok(()) => Some(ImageAsset {
                    bytes: out.into_inner(),
                    kind: ImageKind::Png,
                }),
                Err(e) => {
                    warn!("Failed to transcode image to PNG: {}", e);
                    None
                }
            }
        }
    }
}

//! Google Translate backend over the keyless `client=gtx` endpoint

use super::Translator;
use crate::{Lang, LipiError, Result, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com";

/// The endpoint rejects queries much past this many characters
pub const MAX_CHUNK_CHARS: usize = 5000;

pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
    max_chunk_chars: usize,
}

impl GoogleTranslator {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Point the backend at another host, e.g. a proxy exposing the same API
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        url::Url::parse(&endpoint)?;

        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            max_chunk_chars: MAX_CHUNK_CHARS,
        })
    }

    async fn request(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let url = format!("{}/translate_a/single", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", source.as_str()),
                ("tl", target.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Google Translate error: {} - {}", status, body);
            return Err(LipiError::TranslationError(format!("HTTP {status}")));
        }

        let json: Value = response.json().await?;
        parse_segments(&json)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &'static str {
        "Google Translate"
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let chunks = chunk_lines(text, self.max_chunk_chars);
        debug!(
            "Translating {} chars in {} chunk(s) into {}",
            text.len(),
            chunks.len(),
            target
        );

        let mut translated = String::with_capacity(text.len());
        for chunk in &chunks {
            if chunk.text.trim().is_empty() {
                translated.push_str(&chunk.text);
            } else {
                translated.push_str(&self.request(&chunk.text, source, target).await?);
            }
            if chunk.line_break {
                translated.push('\n');
            }
        }
        Ok(translated)
    }
}

/// The translation is split into segments at `[0][*][0]`
fn parse_segments(json: &Value) -> Result<String> {
    let segments = json.get(0).and_then(Value::as_array).ok_or_else(|| {
        LipiError::TranslationError("response has no segment array".to_string())
    })?;

    let translation: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translation.is_empty() {
        return Err(LipiError::TranslationError(
            "empty translation received".to_string(),
        ));
    }
    Ok(translation)
}

/// One request's worth of input
#[derive(Debug, PartialEq, Eq)]
struct Chunk {
    text: String,
    /// A line break follows this chunk in the input
    line_break: bool,
}

/// Split on line boundaries into chunks of at most `max` characters. Lines
/// longer than `max` are cut on character boundaries, and only the last
/// piece of such a line is followed by a line break.
fn chunk_lines(text: &str, max: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // `current` holds at least one line, possibly empty
    let mut open = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if open { line_len + 1 } else { line_len };

        if open && current_len + needed > max {
            chunks.push(Chunk {
                text: std::mem::take(&mut current),
                line_break: true,
            });
            current_len = 0;
            open = false;
        }

        if line_len > max {
            let chars: Vec<char> = line.chars().collect();
            let mut pieces = chars.chunks(max).peekable();
            while let Some(piece) = pieces.next() {
                chunks.push(Chunk {
                    text: piece.iter().collect(),
                    line_break: pieces.peek().is_none(),
                });
            }
            continue;
        }

        if open {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
        open = true;
    }

    if open {
        chunks.push(Chunk {
            text: current,
            line_break: false,
        });
    } else if let Some(last) = chunks.last_mut() {
        last.line_break = false;
    }
    chunks
}

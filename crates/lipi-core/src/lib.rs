//! Lipi Core Library
//!
//! Core functionality for Lipi including:
//! - HTTP fetching with a browser-like identity
//! - Visible-text extraction
//! - Structure-preserving page translation
//! - Whole-text translation of scraped pages

pub mod extract;
pub mod fetch;
pub mod filter;
pub mod retry;
pub mod rewrite;
pub mod translate;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export key types
pub use extract::{extract_plain_text, extract_plain_text_with, extract_title, ExtractOptions};
pub use fetch::Fetcher;
pub use filter::{Script, TagSet, Visibility};
pub use retry::{fetch_with_retry, RetryPolicy};
pub use translate::{
    translate_plain_text, translate_structured, translate_text, Diagnostic, GoogleTranslator,
    Outcome, PlainText, TranslateOptions, Translator,
};

#[derive(Error, Debug)]
pub enum LipiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}{}", .reason.map(|r| format!(" {r}")).unwrap_or_default())]
    StatusError {
        url: String,
        status: u16,
        reason: Option<&'static str>,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Translation failed: {0}")]
    TranslationError(String),

    #[error("{backend} has no batch endpoint")]
    BatchUnsupported { backend: &'static str },

    #[error("batch translation returned {actual} entries for {expected} inputs")]
    BatchShape { expected: usize, actual: usize },

    #[error("{nodes} text nodes cannot be aligned with {translations} translations")]
    AlignmentMismatch { nodes: usize, translations: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LipiError {
    /// Whether repeating the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            LipiError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LipiError::Timeout { .. } => true,
            LipiError::StatusError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LipiError>;

/// Language code as understood by the translation backend ("en", "te", "zh-CN", "auto")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Backend auto-detection marker
    pub fn auto() -> Self {
        Self::new("auto")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary subtag, lowercased ("zh-CN" -> "zh")
    pub fn primary(&self) -> String {
        self.0
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    pub fn is_auto(&self) -> bool {
        self.0.eq_ignore_ascii_case("auto")
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Represents a fetched web page
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that was requested
    pub url: url::Url,
    /// The URL the response came from after redirects
    pub final_url: url::Url,
    /// The page title
    pub title: Option<String>,
    /// The raw HTML content
    pub html: String,
}

/// Configuration for fetching pages
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Desktop Chrome identity; some portals reject unknown agents outright.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_primary_subtag() {
        assert_eq!(Lang::new("zh-CN").primary(), "zh");
        assert_eq!(Lang::new("TE").primary(), "te");
        assert_eq!(Lang::new("pt_BR").primary(), "pt");
        assert!(Lang::auto().is_auto());
    }

    #[test]
    fn test_status_error_message_carries_reason() {
        let err = LipiError::StatusError {
            url: "https://example.org/".to_string(),
            status: 404,
            reason: Some("Not Found"),
        };
        assert_eq!(err.to_string(), "https://example.org/ returned HTTP 404 Not Found");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = LipiError::StatusError {
            url: "https://example.org/".to_string(),
            status: 503,
            reason: None,
        };
        assert!(err.is_transient());
        assert!(!LipiError::ConfigError("x".into()).is_transient());
    }
}

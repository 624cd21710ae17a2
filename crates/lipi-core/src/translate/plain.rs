//! Plain-text translation of a fetched page

use super::{bounded, Diagnostic, Outcome, TranslateOptions, Translator};
use crate::extract::{extract_plain_text_with, ExtractOptions};
use crate::fetch::Fetcher;
use crate::{Page, Result};
use serde::Serialize;
use tracing::{info, warn};

/// Visible text of a page, translated when possible
#[derive(Debug, Clone, Serialize)]
pub struct PlainText {
    /// The URL that was requested
    pub url: String,
    /// The URL the page was served from
    pub final_url: String,
    /// Contents of the page's `<title>`
    pub title: Option<String>,
    /// Target language
    pub language: String,
    /// Extracted (and possibly translated) text
    #[serde(rename = "plain_text")]
    pub text: String,
    /// Whether `text` is a translation
    pub translated: bool,
}

/// Fetch `url`, extract its visible text and translate it as one request.
///
/// Only the fetch may fail this call. If translation fails the extracted text
/// is returned untranslated with a diagnostic.
pub async fn translate_plain_text(
    fetcher: &Fetcher,
    url: &str,
    translator: &dyn Translator,
    options: &TranslateOptions,
) -> Result<Outcome<PlainText>> {
    let page = fetcher.fetch(url).await?;
    Ok(translate_page_text(&page, translator, options).await)
}

/// Extract and translate the text of an already fetched page
pub async fn translate_page_text(
    page: &Page,
    translator: &dyn Translator,
    options: &TranslateOptions,
) -> Outcome<PlainText> {
    let extract = ExtractOptions {
        visibility: options.visibility.clone(),
        ..Default::default()
    };
    let text = extract_plain_text_with(&page.html, &extract);
    info!("Extracted {} chars from {}", text.len(), page.final_url);

    let outcome = translate_text(&text, translator, options).await;
    let translated = outcome.is_clean() && !options.targets_default() && !text.is_empty();

    Outcome::new(
        PlainText {
            url: page.url.to_string(),
            final_url: page.final_url.to_string(),
            title: page.title.clone(),
            language: options.target.to_string(),
            text: outcome.value,
            translated,
        },
        outcome.diagnostics,
    )
}

/// Translate already-extracted text as a single request of length one.
///
/// Empty text and text already in the default language are returned as is.
pub async fn translate_text(
    text: &str,
    translator: &dyn Translator,
    options: &TranslateOptions,
) -> Outcome<String> {
    if text.is_empty() || options.targets_default() {
        return Outcome::new(text.to_string(), Vec::new());
    }

    let call = translator.translate(text, &options.source, &options.target);
    match bounded(options.call_timeout, call).await {
        Ok(translated) => Outcome::new(translated, Vec::new()),
        Err(e) => {
            warn!("Returning untranslated text: {}", e);
            Outcome::new(
                text.to_string(),
                vec![Diagnostic::TranslationSkipped {
                    reason: e.to_string(),
                }],
            )
        }
    }
}

//! Translation: backend trait, batch-with-fallback, and the two pipelines

mod google;
mod plain;
mod structured;

pub use google::{GoogleTranslator, DEFAULT_ENDPOINT, MAX_CHUNK_CHARS};
pub use plain::{translate_page_text, translate_plain_text, translate_text, PlainText};
pub use structured::{collect_targets, substitute, translate_structured, TextTarget};

use crate::filter::{Script, TagSet, Visibility};
use crate::{Lang, LipiError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Trait for translation backends
#[async_trait]
pub trait Translator: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &'static str;

    /// Translate one string
    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String>;

    /// Translate many strings in one call.
    ///
    /// The result must be positionally aligned with `texts`. Backends without
    /// a native batch endpoint keep this default, and callers translate item
    /// by item instead.
    async fn translate_batch(
        &self,
        texts: &[String],
        source: &Lang,
        target: &Lang,
    ) -> Result<Vec<String>> {
        let _ = (texts, source, target);
        Err(LipiError::BatchUnsupported {
            backend: self.name(),
        })
    }
}

/// A recoverable condition met while producing output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A URL attribute kept its original value
    AttributeUnresolved {
        attribute: String,
        value: String,
        reason: String,
    },
    /// The batch call failed or returned the wrong shape; items were translated one by one
    BatchFallback { reason: String },
    /// One item kept its original text
    ItemUntranslated { index: usize, reason: String },
    /// A text node could no longer be written to
    SubstitutionSkipped { index: usize },
    /// Whole-text translation failed; the untranslated text was returned
    TranslationSkipped { reason: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::AttributeUnresolved {
                attribute,
                value,
                reason,
            } => write!(f, "left {attribute}=\"{value}\" unresolved: {reason}"),
            Diagnostic::BatchFallback { reason } => {
                write!(f, "batch translation fell back to per-item calls: {reason}")
            }
            Diagnostic::ItemUntranslated { index, reason } => {
                write!(f, "text #{index} kept untranslated: {reason}")
            }
            Diagnostic::SubstitutionSkipped { index } => {
                write!(f, "text node #{index} is detached, substitution skipped")
            }
            Diagnostic::TranslationSkipped { reason } => {
                write!(f, "returned untranslated text: {reason}")
            }
        }
    }
}

/// Primary output plus everything that degraded along the way
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// True when nothing was skipped or degraded
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Per-call translation settings
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Source language, usually auto-detected by the backend
    pub source: Lang,
    /// Target language
    pub target: Lang,
    /// Language pages are assumed to be written in; whole-text translation
    /// into it is skipped
    pub default_lang: Lang,
    /// Which text counts as translatable
    pub visibility: Visibility,
    /// Parents whose text is never translated
    pub skip_parents: TagSet,
    /// Upper bound on each backend call
    pub call_timeout: Option<Duration>,
}

impl TranslateOptions {
    pub fn new(target: impl Into<Lang>) -> Self {
        let target = target.into();
        Self {
            source: Lang::auto(),
            visibility: Visibility::for_target(target.as_str()),
            target,
            default_lang: Lang::new("en"),
            skip_parents: TagSet::skip_parents(),
            call_timeout: Some(Duration::from_secs(60)),
        }
    }

    /// Set the source language. A known source also makes its scripts visible.
    pub fn with_source(mut self, source: impl Into<Lang>) -> Self {
        self.source = source.into();
        if !self.source.is_auto() {
            let scripts = Script::for_language(self.source.as_str()).iter().copied();
            self.visibility = self.visibility.with_scripts(scripts);
        }
        self
    }

    /// Whether whole-text translation would be a no-op
    pub fn targets_default(&self) -> bool {
        self.target.primary() == self.default_lang.primary()
    }
}

/// Run a backend call under the caller-side deadline
pub(crate) async fn bounded<T, F>(limit: Option<Duration>, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            LipiError::TranslationError(format!("backend call exceeded {:?}", limit))
        })?,
        None => call.await,
    }
}

/// Translate `texts` as one batch, falling back to per-item calls.
///
/// Each item is sent to the backend once on the per-item path, whether the
/// batch failed or the backend has none. The returned vector always has
/// exactly `texts.len()` entries: a failed item keeps its original text and
/// is reported in `diagnostics`.
pub async fn translate_texts(
    translator: &dyn Translator,
    texts: &[String],
    options: &TranslateOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<String> {
    let batch = bounded(
        options.call_timeout,
        translator.translate_batch(texts, &options.source, &options.target),
    )
    .await
    .and_then(|translated| {
        if translated.len() == texts.len() {
            Ok(translated)
        } else {
            Err(LipiError::BatchShape {
                expected: texts.len(),
                actual: translated.len(),
            })
        }
    });

    match batch {
        Ok(translated) => {
            debug!(
                "{} translated {} texts in one batch",
                translator.name(),
                texts.len()
            );
            return translated;
        }
        Err(LipiError::BatchUnsupported { backend }) => {
            debug!("{} has no batch endpoint, translating one by one", backend);
        }
        Err(e) => {
            let reason = e.to_string();
            warn!("Batch translation failed, translating one by one: {}", reason);
            diagnostics.push(Diagnostic::BatchFallback { reason });
        }
    }

    let mut translated = Vec::with_capacity(texts.len());
    for (index, text) in texts.iter().enumerate() {
        let call = translator.translate(text, &options.source, &options.target);
        match bounded(options.call_timeout, call).await {
            Ok(t) => translated.push(t),
            Err(e) => {
                warn!("Keeping text #{} untranslated: {}", index, e);
                diagnostics.push(Diagnostic::ItemUntranslated {
                    index,
                    reason: e.to_string(),
                });
                translated.push(text.clone());
            }
        }
    }
    translated
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Upper;

    #[async_trait]
    impl Translator for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        async fn translate(&self, text: &str, _: &Lang, _: &Lang) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    /// Batch drops the last entry; single calls fail on "boom"
    struct Lossy {
        single_calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for Lossy {
        fn name(&self) -> &'static str {
            "lossy"
        }

        async fn translate(&self, text: &str, _: &Lang, _: &Lang) -> Result<String> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            if text == "boom" {
                return Err(LipiError::TranslationError("backend refused".into()));
            }
            Ok(format!("<{}>", text))
        }

        async fn translate_batch(
            &self,
            texts: &[String],
            _: &Lang,
            _: &Lang,
        ) -> Result<Vec<String>> {
            Ok(texts.iter().skip(1).cloned().collect())
        }
    }

    struct Stalled;

    #[async_trait]
    impl Translator for Stalled {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn translate(&self, _: &str, _: &Lang, _: &Lang) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_backend_without_batch_goes_item_by_item() {
        let options = TranslateOptions::new("te");
        let mut diagnostics = Vec::new();
        let out = tokio_test::block_on(translate_texts(
            &Upper,
            &texts(&["a", "b"]),
            &options,
            &mut diagnostics,
        ));
        assert_eq!(out, vec!["A", "B"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_default_batch_reports_unsupported() {
        let err = tokio_test::block_on(Upper.translate_batch(
            &texts(&["a"]),
            &Lang::auto(),
            &Lang::new("te"),
        ))
        .unwrap_err();
        assert!(matches!(err, LipiError::BatchUnsupported { backend: "upper" }));
    }

    /// No batch endpoint; counts single calls and fails on "boom"
    #[derive(Default)]
    struct PerItem {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for PerItem {
        fn name(&self) -> &'static str {
            "per-item"
        }

        async fn translate(&self, text: &str, _: &Lang, _: &Lang) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "boom" {
                return Err(LipiError::TranslationError("backend refused".into()));
            }
            Ok(text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_items_are_sent_once_without_batch_endpoint() {
        let backend = PerItem::default();
        let mut diagnostics = Vec::new();

        let out = translate_texts(
            &backend,
            &texts(&["one", "boom", "three"]),
            &TranslateOptions::new("te"),
            &mut diagnostics,
        )
        .await;

        assert_eq!(out, vec!["ONE", "boom", "THREE"]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0],
            Diagnostic::ItemUntranslated { index: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_short_batch_falls_back_per_item() {
        let lossy = Lossy {
            single_calls: AtomicUsize::new(0),
        };
        let options = TranslateOptions::new("hi");
        let mut diagnostics = Vec::new();

        let out = translate_texts(&lossy, &texts(&["one", "boom", "three"]), &options, &mut diagnostics)
            .await;

        assert_eq!(out, vec!["<one>", "boom", "<three>"]);
        assert_eq!(lossy.single_calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            diagnostics[0],
            Diagnostic::BatchFallback {
                reason: "batch translation returned 2 entries for 3 inputs".into()
            }
        );
        assert!(matches!(
            diagnostics[1],
            Diagnostic::ItemUntranslated { index: 1, .. }
        ));
        assert_eq!(diagnostics.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_degrades_to_original_text() {
        let mut options = TranslateOptions::new("te");
        options.call_timeout = Some(Duration::from_secs(5));
        let mut diagnostics = Vec::new();

        let out = translate_texts(&Stalled, &texts(&["Hello"]), &options, &mut diagnostics).await;

        assert_eq!(out, vec!["Hello"]);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics[0],
            Diagnostic::ItemUntranslated { index: 0, reason } if reason.contains("exceeded")
        ));
    }

    #[test]
    fn test_options_follow_target_script() {
        let options = TranslateOptions::new("te");
        assert!(options.visibility.is_visible("తెలుగు"));
        assert!(!options.targets_default());
        assert!(TranslateOptions::new("EN").targets_default());
        assert!(TranslateOptions::new("en-GB").targets_default());
    }

    #[test]
    fn test_known_source_script_is_visible() {
        let auto = TranslateOptions::new("te").with_source("auto");
        assert!(!auto.visibility.is_visible("हिन्दी"));

        let hindi = TranslateOptions::new("te").with_source("hi");
        assert_eq!(hindi.source.as_str(), "hi");
        assert!(hindi.visibility.is_visible("हिन्दी"));
        assert!(hindi.visibility.is_visible("తెలుగు"));
    }
}

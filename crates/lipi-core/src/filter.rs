//! Visibility predicate and tag sets shared by extraction and translation

use crate::LipiError;
use regex::Regex;
use std::collections::BTreeSet;
use std::str::FromStr;

/// A Unicode script that counts as visible, translatable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Script {
    Latin,
    Devanagari,
    Telugu,
    Bengali,
    Gurmukhi,
    Gujarati,
    Oriya,
    Tamil,
    Kannada,
    Malayalam,
    Arabic,
    Hebrew,
    Cyrillic,
    Greek,
    Thai,
    Han,
    Hiragana,
    Katakana,
    Hangul,
}

impl Script {
    /// Name of the Unicode `Script` property value
    pub fn property(self) -> &'static str {
        match self {
            Script::Latin => "Latin",
            Script::Devanagari => "Devanagari",
            Script::Telugu => "Telugu",
            Script::Bengali => "Bengali",
            Script::Gurmukhi => "Gurmukhi",
            Script::Gujarati => "Gujarati",
            Script::Oriya => "Oriya",
            Script::Tamil => "Tamil",
            Script::Kannada => "Kannada",
            Script::Malayalam => "Malayalam",
            Script::Arabic => "Arabic",
            Script::Hebrew => "Hebrew",
            Script::Cyrillic => "Cyrillic",
            Script::Greek => "Greek",
            Script::Thai => "Thai",
            Script::Han => "Han",
            Script::Hiragana => "Hiragana",
            Script::Katakana => "Katakana",
            Script::Hangul => "Hangul",
        }
    }

    /// Scripts a language is written in, keyed by its primary subtag.
    /// Latin-script languages map to nothing since Latin is always allowed.
    pub fn for_language(code: &str) -> &'static [Script] {
        let primary = code
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "hi" | "mr" | "ne" | "sa" | "mai" | "kok" | "doi" => &[Script::Devanagari],
            "te" => &[Script::Telugu],
            "bn" | "as" | "mni" => &[Script::Bengali],
            "pa" => &[Script::Gurmukhi],
            "gu" => &[Script::Gujarati],
            "or" => &[Script::Oriya],
            "ta" => &[Script::Tamil],
            "kn" => &[Script::Kannada],
            "ml" => &[Script::Malayalam],
            "ar" | "fa" | "ur" | "ps" | "sd" | "ks" => &[Script::Arabic],
            "he" | "iw" | "yi" => &[Script::Hebrew],
            "ru" | "uk" | "be" | "bg" | "sr" | "mk" | "kk" | "ky" | "mn" | "tg" => {
                &[Script::Cyrillic]
            }
            "el" => &[Script::Greek],
            "th" => &[Script::Thai],
            "zh" => &[Script::Han],
            "ja" => &[Script::Han, Script::Hiragana, Script::Katakana],
            "ko" => &[Script::Hangul, Script::Han],
            _ => &[],
        }
    }
}

impl FromStr for Script {
    type Err = LipiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let all = [
            Script::Latin,
            Script::Devanagari,
            Script::Telugu,
            Script::Bengali,
            Script::Gurmukhi,
            Script::Gujarati,
            Script::Oriya,
            Script::Tamil,
            Script::Kannada,
            Script::Malayalam,
            Script::Arabic,
            Script::Hebrew,
            Script::Cyrillic,
            Script::Greek,
            Script::Thai,
            Script::Han,
            Script::Hiragana,
            Script::Katakana,
            Script::Hangul,
        ];
        all.into_iter()
            .find(|script| script.property().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LipiError::ConfigError(format!("Unknown script: {}", s)))
    }
}

impl std::fmt::Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.property())
    }
}

/// Decides whether a text fragment is visible content worth keeping or translating.
///
/// A fragment is visible iff it contains at least one character belonging to
/// one of the allowed scripts. Digits and punctuation belong to no script, so
/// "123" or "--" are never visible on their own.
#[derive(Debug, Clone)]
pub struct Visibility {
    scripts: BTreeSet<Script>,
    pattern: Option<Regex>,
}

impl Visibility {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        let scripts: BTreeSet<Script> = scripts.into_iter().collect();
        let pattern = if scripts.is_empty() {
            None
        } else {
            let class: String = scripts
                .iter()
                .map(|s| format!(r"\p{{{}}}", s.property()))
                .collect();
            // Every property name comes from the closed `Script` enum
            Some(Regex::new(&format!("[{}]", class)).expect("valid script class"))
        };
        Self { scripts, pattern }
    }

    /// Latin plus the scripts of the target language
    pub fn for_target(lang: &str) -> Self {
        Self::new(
            std::iter::once(Script::Latin).chain(Script::for_language(lang).iter().copied()),
        )
    }

    /// Extend the allow-list with more scripts
    pub fn with_scripts(self, extra: impl IntoIterator<Item = Script>) -> Self {
        Self::new(self.scripts.into_iter().chain(extra))
    }

    pub fn scripts(&self) -> impl Iterator<Item = Script> + '_ {
        self.scripts.iter().copied()
    }

    pub fn is_visible(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(text))
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new([Script::Latin])
    }
}

/// Case-insensitive set of element names
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tags.into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
        )
    }

    /// Elements removed wholesale before text extraction
    pub fn non_content() -> Self {
        Self::new(["script", "style", "noscript", "template", "svg", "canvas"])
    }

    /// Parents whose text children are never translated
    pub fn skip_parents() -> Self {
        Self::new(["script", "style", "noscript", "template"])
    }

    pub fn contains(&self, name: &str) -> bool {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.0.contains(&name.to_ascii_lowercase())
        } else {
            self.0.contains(name)
        }
    }

    pub fn insert(&mut self, name: &str) {
        self.0.insert(name.to_ascii_lowercase());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_are_not_visible() {
        let visibility = Visibility::default();
        assert!(!visibility.is_visible("123"));
        assert!(!visibility.is_visible("  -- | 42 "));
        assert!(!visibility.is_visible(""));
        assert!(visibility.is_visible("Page 2"));
    }

    #[test]
    fn test_target_script_is_visible() {
        let latin_only = Visibility::default();
        let telugu = Visibility::for_target("te");
        assert!(!latin_only.is_visible("తెలుగు"));
        assert!(telugu.is_visible("తెలుగు"));
        assert!(telugu.is_visible("Hello"));
        assert!(!telugu.is_visible("हिन्दी"));
    }

    #[test]
    fn test_language_mapping_uses_primary_subtag() {
        assert_eq!(Script::for_language("hi-IN"), &[Script::Devanagari]);
        assert!(Script::for_language("fr").is_empty());
        let japanese = Visibility::for_target("ja");
        assert!(japanese.is_visible("ひらがな"));
        assert!(japanese.is_visible("漢字"));
    }

    #[test]
    fn test_empty_allow_list_sees_nothing() {
        let visibility = Visibility::new(Vec::<Script>::new());
        assert!(!visibility.is_visible("Hello"));
    }

    #[test]
    fn test_extra_scripts() {
        let visibility = Visibility::default().with_scripts([Script::Cyrillic]);
        assert!(visibility.is_visible("Привет"));
        assert_eq!(
            visibility.scripts().collect::<Vec<_>>(),
            vec![Script::Latin, Script::Cyrillic]
        );
    }

    #[test]
    fn test_script_from_str() {
        assert_eq!("telugu".parse::<Script>().unwrap(), Script::Telugu);
        assert!("klingon".parse::<Script>().is_err());
    }

    #[test]
    fn test_tag_set_is_case_insensitive() {
        let tags = TagSet::non_content();
        assert!(tags.contains("SCRIPT"));
        assert!(tags.contains("svg"));
        assert!(!tags.contains("p"));
        assert!(!TagSet::skip_parents().contains("svg"));
    }
}

//! Configuration management

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use lipi_core::{FetchConfig, Script, TranslateOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fetch settings
    #[serde(default)]
    pub fetch: FetchSection,

    /// Translation settings
    #[serde(default)]
    pub translation: TranslationSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra attempts after a transient fetch failure
    #[serde(default)]
    pub retries: u32,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            retries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSection {
    /// Target language when none is given on the command line
    #[serde(default = "default_target")]
    pub target_lang: String,

    /// Language pages are assumed to be in; plain text is not translated into it
    #[serde(default = "default_lang")]
    pub default_lang: String,

    /// Source language passed to the backend
    #[serde(default = "default_source")]
    pub source_lang: String,

    /// Translation endpoint (Google-compatible)
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Per-call backend deadline in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Scripts treated as visible in addition to Latin and the target's own
    #[serde(default)]
    pub extra_scripts: Vec<String>,
}

impl Default for TranslationSection {
    fn default() -> Self {
        Self {
            target_lang: default_target(),
            default_lang: default_lang(),
            source_lang: default_source(),
            backend_url: default_backend_url(),
            call_timeout_secs: default_call_timeout(),
            extra_scripts: Vec::new(),
        }
    }
}

// Default value functions
fn default_timeout() -> u64 {
    FetchConfig::default().timeout_secs
}
fn default_user_agent() -> String {
    FetchConfig::default().user_agent
}
fn default_target() -> String {
    "te".to_string()
}
fn default_lang() -> String {
    "en".to_string()
}
fn default_source() -> String {
    "auto".to_string()
}
fn default_backend_url() -> String {
    lipi_core::translate::DEFAULT_ENDPOINT.to_string()
}
fn default_call_timeout() -> u64 {
    60
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let config: Config = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", path.display()))?;
                return Ok(config);
            }
        }
        Ok(Self::default())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(self)?;
            fs::write(path, content)?;
        }
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "lipi", "lipi").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.fetch.user_agent.clone(),
            timeout_secs: self.fetch.timeout_secs,
        }
    }

    /// Translation options for `target`, or the configured target
    pub fn translate_options(&self, target: Option<&str>) -> Result<TranslateOptions> {
        let target = target.unwrap_or(&self.translation.target_lang);
        let extra = self
            .translation
            .extra_scripts
            .iter()
            .map(|s| s.parse::<Script>())
            .collect::<lipi_core::Result<Vec<_>>>()?;

        let mut options =
            TranslateOptions::new(target).with_source(self.translation.source_lang.as_str());
        options.default_lang = self.translation.default_lang.as_str().into();
        options.visibility = options.visibility.with_scripts(extra);
        options.call_timeout = match self.translation.call_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Ok(options)
    }

    /// Set a configuration value without saving
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "timeout" | "timeout_secs" => {
                self.fetch.timeout_secs = value.parse().context("timeout must be seconds")?;
            }
            "user_agent" | "ua" => {
                self.fetch.user_agent = value.to_string();
            }
            "retries" => {
                self.fetch.retries = value.parse().context("retries must be a number")?;
            }
            "lang" | "target_lang" => {
                self.translation.target_lang = value.to_string();
            }
            "default_lang" => {
                self.translation.default_lang = value.to_string();
            }
            "source_lang" => {
                self.translation.source_lang = value.to_string();
            }
            "backend_url" => {
                url::Url::parse(value).context("backend_url must be a URL")?;
                self.translation.backend_url = value.to_string();
            }
            "call_timeout" | "call_timeout_secs" => {
                self.translation.call_timeout_secs =
                    value.parse().context("call_timeout must be seconds")?;
            }
            "extra_scripts" | "scripts" => {
                let scripts: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                for script in &scripts {
                    script.parse::<Script>()?;
                }
                self.translation.extra_scripts = scripts;
            }
            _ => bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Set a configuration value and persist it
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [translation]
            target_lang = "hi"
            "#,
        )
        .unwrap();

        assert_eq!(config.translation.target_lang, "hi");
        assert_eq!(config.translation.default_lang, "en");
        assert_eq!(config.fetch.timeout_secs, 20);
    }

    #[test]
    fn test_translate_options_include_extra_scripts() {
        let mut config = Config::default();
        config.apply("extra_scripts", "Cyrillic, Greek").unwrap();

        let options = config.translate_options(Some("te")).unwrap();
        assert!(options.visibility.is_visible("Привет"));
        assert!(options.visibility.is_visible("తెలుగు"));
        assert_eq!(options.target.as_str(), "te");
    }

    #[test]
    fn test_source_language_script_stays_visible() {
        let mut config = Config::default();
        config.apply("source_lang", "hi").unwrap();

        let options = config.translate_options(Some("te")).unwrap();
        assert_eq!(options.source.as_str(), "hi");
        assert!(options.visibility.is_visible("हिन्दी"));
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.apply("timeout", "soon").is_err());
        assert!(config.apply("scripts", "Klingon").is_err());
        assert!(config.apply("nope", "1").is_err());
        assert!(config.apply("backend_url", "not a url").is_err());
    }

    #[test]
    fn test_zero_call_timeout_disables_deadline() {
        let mut config = Config::default();
        config.apply("call_timeout", "0").unwrap();
        assert!(config.translate_options(None).unwrap().call_timeout.is_none());
    }
}

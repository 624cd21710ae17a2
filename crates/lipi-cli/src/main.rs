//! Lipi CLI - scrape and translate web pages
//!
//! Extracts the visible text of a page, optionally translated, or renders the
//! whole page translated with its markup and layout intact.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use futures::stream::{self, StreamExt};
use lipi_core::retry::fetch_with_retry;
use lipi_core::translate::translate_page_text;
use lipi_core::{
    extract_plain_text_with, translate_structured, Diagnostic, ExtractOptions, Fetcher,
    GoogleTranslator, Outcome, PlainText, RetryPolicy, TranslateOptions, Translator,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "lipi")]
#[command(author, version, about = "Scrape web pages and translate them in place", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch pages and print their visible text, translated unless the
    /// target is the default language
    Scrape {
        /// URLs to scrape
        #[arg(required = true)]
        urls: Vec<String>,

        /// Target language code
        #[arg(short, long)]
        lang: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Pages fetched at once
        #[arg(short = 'j', long, default_value_t = 4)]
        concurrency: usize,

        /// Extra attempts after a transient fetch failure
        #[arg(long)]
        retries: Option<u32>,
    },

    /// Fetch a page and write it translated, layout preserved
    View {
        /// URL to translate
        url: String,

        /// Target language code
        #[arg(short, long)]
        lang: Option<String>,

        /// Write the page here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extra attempts after a transient fetch failure
        #[arg(long)]
        retries: Option<u32>,
    },

    /// Read HTML from stdin and print its text or translated markup
    Render {
        /// Base URL for resolving relative links
        #[arg(short, long, default_value = "about:blank")]
        base_url: String,

        /// Translate into this language (prints HTML); omit for plain text
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file location
    Path,
    /// Set a value and save it
    Set { key: String, value: String },
}

#[derive(Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries page output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let mut config = Config::load()?;

    match cli.command {
        Commands::Scrape {
            urls,
            lang,
            format,
            concurrency,
            retries,
        } => {
            run_scrape(&config, urls, lang.as_deref(), format, concurrency, retries).await?;
        }
        Commands::View {
            url,
            lang,
            output,
            retries,
        } => {
            run_view(&config, &url, lang.as_deref(), output, retries).await?;
        }
        Commands::Render { base_url, lang } => {
            run_render(&config, &base_url, lang.as_deref()).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => print!("{}", toml::to_string_pretty(&config)?),
            ConfigAction::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("(no configuration directory on this platform)"),
            },
            ConfigAction::Set { key, value } => config.set(&key, &value)?,
        },
    }

    Ok(())
}

fn backend(config: &Config) -> Result<GoogleTranslator> {
    GoogleTranslator::with_endpoint(config.translation.backend_url.as_str())
        .context("creating translation backend")
}

fn retry_policy(config: &Config, retries: Option<u32>) -> RetryPolicy {
    RetryPolicy::with_retries(retries.unwrap_or(config.fetch.retries))
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!("{}", diagnostic);
    }
}

async fn run_scrape(
    config: &Config,
    urls: Vec<String>,
    lang: Option<&str>,
    format: OutputFormat,
    concurrency: usize,
    retries: Option<u32>,
) -> Result<()> {
    let fetcher = Fetcher::with_config(config.fetch_config())?;
    let translator = backend(config)?;
    let options = config.translate_options(lang)?;
    let policy = retry_policy(config, retries);

    // Each page is independent; `buffered` keeps results in input order
    let results: Vec<_> = stream::iter(urls.iter())
        .map(|url| scrape_one(&fetcher, url, &translator, &options, &policy))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut failures = 0;
    let mut json_pages = Vec::new();
    let multiple = urls.len() > 1;

    for (url, result) in urls.iter().zip(results) {
        match result {
            Ok(outcome) => {
                report(&outcome.diagnostics);
                match format {
                    OutputFormat::Text => {
                        if multiple {
                            println!("==> {} <==", url);
                        }
                        println!("{}", outcome.value.text);
                    }
                    OutputFormat::Json => json_pages.push(serde_json::to_value(&outcome.value)?),
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: {}", url, e);
            }
        }
    }

    if let OutputFormat::Json = format {
        let json = if multiple {
            serde_json::Value::Array(json_pages)
        } else {
            json_pages.pop().unwrap_or(serde_json::Value::Null)
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    }

    if failures == urls.len() {
        anyhow::bail!("no page could be scraped");
    }
    Ok(())
}

async fn scrape_one(
    fetcher: &Fetcher,
    url: &str,
    translator: &dyn Translator,
    options: &TranslateOptions,
    policy: &RetryPolicy,
) -> lipi_core::Result<Outcome<PlainText>> {
    let page = fetch_with_retry(fetcher, url, policy).await?;
    Ok(translate_page_text(&page, translator, options).await)
}

async fn run_view(
    config: &Config,
    url: &str,
    lang: Option<&str>,
    output: Option<PathBuf>,
    retries: Option<u32>,
) -> Result<()> {
    let fetcher = Fetcher::with_config(config.fetch_config())?;
    let translator = backend(config)?;
    let options = config.translate_options(lang)?;
    let policy = retry_policy(config, retries);

    let page = fetch_with_retry(&fetcher, url, &policy).await?;
    let outcome = translate_structured(&page.html, &page.final_url, &translator, &options).await?;
    report(&outcome.diagnostics);
    info!(
        "Translated {} into {} ({} diagnostics)",
        page.final_url,
        options.target,
        outcome.diagnostics.len()
    );

    write_output(output, &outcome.value)
}

async fn run_render(config: &Config, base_url: &str, lang: Option<&str>) -> Result<()> {
    let mut html = String::new();
    io::stdin()
        .read_to_string(&mut html)
        .context("reading HTML from stdin")?;

    match lang {
        None => {
            let options = config.translate_options(None)?;
            let extract = ExtractOptions {
                visibility: options.visibility,
                ..Default::default()
            };
            println!("{}", extract_plain_text_with(&html, &extract));
        }
        Some(lang) => {
            let base = url::Url::parse(base_url).context("invalid base URL")?;
            let translator = backend(config)?;
            let options = config.translate_options(Some(lang))?;
            let outcome = translate_structured(&html, &base, &translator, &options).await?;
            report(&outcome.diagnostics);
            write_output(None, &outcome.value)?;
        }
    }

    Ok(())
}

fn write_output(path: Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

mod echo;
mod report;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use pitchlens_core::analyzer::DEFAULT_MODEL;
use pitchlens_core::fetch::DEFAULT_USER_AGENT;
use pitchlens_core::gemini::DEFAULT_BASE_URL;
use pitchlens_core::{Analyzer, AnalyzerConfig, Extractor, FetchConfig, GeminiTransport, PageContent};
use tracing_subscriber::EnvFilter;

use crate::echo::{format_size, print_banner, print_info, print_step, print_success, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Score the marketing messaging of a web page
#[derive(Parser, Debug)]
#[command(name = "pitchlens")]
#[command(author = "Pitchlens Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Score the marketing messaging of a web page", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, value_name = "KEY")]
    api_key: Option<String>,

    /// Model to ask
    #[arg(long, default_value = DEFAULT_MODEL, value_name = "MODEL")]
    model: String,

    /// Gemini API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL, value_name = "URL")]
    base_url: String,

    /// HTTP timeout for fetching the page, in seconds
    #[arg(long, default_value = "15", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Total attempts for the model call
    #[arg(long, default_value = "5", value_name = "NUM")]
    max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[arg(long, default_value = "1000", value_name = "MS")]
    initial_delay_ms: u64,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// Print the extracted text without analyzing it
    #[arg(long)]
    extract_only: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Reads the input and extracts its copy.
async fn load_page(args: &Args, extractor: &Extractor, total: usize) -> anyhow::Result<PageContent> {
    if args.input == "-" {
        if args.verbose {
            print_step(1, total, "Reading from stdin");
        }
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        if args.verbose {
            eprintln!("  {} {}\n", "Size:".dimmed(), format_size(buffer.len()).bright_white());
        }
        extractor.extract_html(&buffer, "stdin").context("Failed to extract text")
    } else if args.input.starts_with("http://") || args.input.starts_with("https://") {
        if args.verbose {
            print_step(1, total, &format!("Fetching {}", args.input.bright_white().underline()));
        }
        extractor.extract(&args.input).await.context("Failed to fetch URL")
    } else {
        if args.verbose {
            print_step(1, total, &format!("Reading from file {}", args.input.bright_white()));
        }
        let html = fs::read_to_string(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?;
        if args.verbose {
            eprintln!("  {} {}\n", "Size:".dimmed(), format_size(html.len()).bright_white());
        }
        extractor.extract_html(&html, &args.input).context("Failed to extract text")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let api_key = if args.extract_only {
        None
    } else {
        let key = args
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context("No API key provided: pass --api-key or set GEMINI_API_KEY")?;
        Some(key)
    };

    let total = if args.extract_only { 2 } else { 3 };

    let fetch = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
    };
    let extractor = Extractor::with_config(fetch);

    let page = load_page(&args, &extractor, total).await?;
    tracing::debug!(source = page.url(), words = page.word_count(), "Loaded page");

    if args.verbose {
        if let Some(title) = page.title() {
            eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
        }
        eprintln!("  {} {}", "Words:".dimmed(), page.word_count().to_string().bright_white());
        eprintln!();
    }

    if page.is_empty() {
        print_warning("No readable text found on the page");
    }

    let output = match api_key {
        None => match args.format {
            OutputFormat::Text => format!("{}\n", page.text()),
            OutputFormat::Json => report::render_page_json(&page)?,
        },
        Some(api_key) => {
            if args.verbose {
                print_step(2, total, &format!("Analyzing with {}", args.model.bright_white()));
            }

            let transport = GeminiTransport::new(api_key)
                .context("Failed to set up the model client")?
                .base_url(&args.base_url);
            let config = AnalyzerConfig::builder()
                .model(&args.model)
                .max_attempts(args.max_attempts)
                .initial_delay(Duration::from_millis(args.initial_delay_ms))
                .build();

            let result = Analyzer::with_config(transport, config)
                .analyze_page(&page)
                .await
                .context("Failed to analyze page")?;

            if args.verbose {
                eprintln!(
                    "  {} {}",
                    "Hook score:".dimmed(),
                    format!("{}/100", result.hook_score()).bright_white()
                );
                eprintln!();
            }

            match args.format {
                OutputFormat::Text => report::render_text(&page, &result),
                OutputFormat::Json => report::render_json(&page, &result)?,
            }
        }
    };

    if args.verbose {
        print_step(total, total, "Writing output");
        eprintln!("  {} {}\n", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}

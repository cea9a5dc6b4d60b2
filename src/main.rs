//! # Awful Fact Check
//!
//! A fact-checking pipeline for news articles and free text. It extracts the
//! content, identifies the checkable factual claims in it, researches each claim
//! on the web, verifies it against what was found, and summarizes the result as a
//! credibility report with a final Real / Fake / Uncertain label.
//!
//! ## Usage
//!
//! ```sh
//! awful_fact_check --url https://www.bbc.co.uk/news/articles/c0ferry
//! awful_fact_check --text "The Tay Road Bridge opened in 1966."
//! ```
//!
//! ## Architecture
//!
//! 1. **Extracting**: hosted scraping API first, rules-based fallback scraper second
//! 2. **Identifying**: the language model picks out up to five factual claims
//! 3. **Researching**: several DuckDuckGo queries per claim, results tagged by source reliability
//! 4. **Verifying**: the language model assigns each claim a verdict
//! 5. **Summarizing**: verdicts are scored into a rating and label, the model writes the narrative

use awful_aj::{config as aj_config, config_dir, template};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod agents;
mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod sources;
mod stages;
mod utils;
mod validate;

use api::{AskFnWrapper, RetryAsk};
use cli::{Cli, CliInput};
use outputs::json;
use pipeline::{FactCheckInput, FactChecker};
use scrapers::duckduckgo::DuckDuckGoSearch;
use scrapers::extractor::ContentExtractor;
use scrapers::fetch::{build_http_client, HttpPageFetcher};
use scrapers::firecrawl::FirecrawlClient;
use utils::truncate_for_log;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("fact_check starting up");

    let args = Cli::parse();
    debug!(?args.url, ?args.text_file, ?args.settings, ?args.json_output_dir, "Parsed CLI arguments");

    let input = match args.input()? {
        CliInput::Url(url) => FactCheckInput::Url(url),
        CliInput::Text(text) => FactCheckInput::Text(text),
        CliInput::TextFile(path) => {
            let text = tokio::fs::read_to_string(&path).await?;
            info!(%path, chars = text.chars().count(), "Read input text file");
            FactCheckInput::Text(text)
        }
    };

    // Early check: the JSON output dir must be writable before any work is done
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = utils::ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    let settings = config::load_settings(args.settings.as_deref()).await?;

    // ---- Load template & config ----
    let template = template::load_template(&args.template).await?;
    info!(template = %args.template, "Loaded template");
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config_dir()?
            .join("config.yaml")
            .to_str()
            .ok_or("config path is not valid UTF-8")?
            .to_string(),
    };
    let llm_config = aj_config::load_config(&config_path)?;
    info!(%config_path, "Loaded configuration");

    let client = build_http_client(&settings)?;
    let primary = FirecrawlClient::new(client.clone(), &settings, args.firecrawl_api_key.clone());
    let extractor = ContentExtractor::new(primary, HttpPageFetcher::new(client.clone()), &settings);
    let search = DuckDuckGoSearch::new(client, &settings);
    let llm = RetryAsk::new(
        AskFnWrapper {
            config: &llm_config,
            template: &template,
        },
        settings.llm_max_retries,
        settings.llm_base_delay(),
    );

    let checker = FactChecker::new(llm, extractor, search, settings);
    let rendered = match &args.json_output_dir {
        None => match &input {
            FactCheckInput::Url(url) => checker.fact_check_url(url).await,
            FactCheckInput::Text(text) => checker.fact_check_text(text).await,
        },
        Some(dir) => {
            let run = checker.fact_check(input).await;
            match &run.outcome {
                Ok(report) => {
                    let path = json::write_report(report, dir).await?;
                    info!(%path, "Saved JSON report");
                }
                Err(e) => error!(
                    error = %e,
                    stage = %run.stage(),
                    history = ?run.history,
                    "Fact-check did not complete; no JSON written"
                ),
            }
            run.render()
        }
    };
    println!("{rendered}");

    info!(
        output_preview = %truncate_for_log(&rendered, 200),
        elapsed_ms = start_time.elapsed().as_millis(),
        "fact_check finished"
    );
    Ok(())
}

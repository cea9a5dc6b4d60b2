//! Command-line interface definitions.
//!
//! Exactly one input is required: a URL, inline text, or a text file. API keys can
//! come from the environment.

use clap::{ArgGroup, Parser};
use std::error::Error;

/// Command-line arguments for the fact checker.
///
/// # Examples
///
/// ```sh
/// # Check an article
/// awful_fact_check --url https://www.bbc.co.uk/news/articles/c0ferry
///
/// # Check a paragraph, keeping a JSON copy of the report
/// awful_fact_check --text "The bridge opened in 1966." -j ./reports
///
/// # Check a file with custom pipeline settings
/// awful_fact_check --text-file claims.txt --settings settings.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("input").required(true).args(["url", "text", "text_file"])))]
pub struct Cli {
    /// URL of the article to fact-check
    #[arg(short, long)]
    pub url: Option<String>,

    /// Text to fact-check
    #[arg(short, long)]
    pub text: Option<String>,

    /// File whose contents should be fact-checked
    #[arg(short = 'f', long)]
    pub text_file: Option<String>,

    /// Firecrawl API key for the primary content extractor
    #[arg(long, env = "FIRECRAWL_API_KEY", hide_env_values = true)]
    pub firecrawl_api_key: Option<String>,

    /// Optional path to the language-model config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Name of the chat template to use
    #[arg(long, default_value = "fact_checker")]
    pub template: String,

    /// Optional path to a pipeline settings YAML file
    #[arg(short, long)]
    pub settings: Option<String>,

    /// Output directory for JSON copies of reports
    #[arg(short, long)]
    pub json_output_dir: Option<String>,
}

/// The input selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliInput {
    Url(String),
    Text(String),
    TextFile(String),
}

impl Cli {
    pub fn input(&self) -> Result<CliInput, Box<dyn Error>> {
        match (&self.url, &self.text, &self.text_file) {
            (Some(url), None, None) => Ok(CliInput::Url(url.clone())),
            (None, Some(text), None) => Ok(CliInput::Text(text.clone())),
            (None, None, Some(path)) => Ok(CliInput::TextFile(path.clone())),
            _ => Err("exactly one of --url, --text or --text-file is required".into()),
        }
    }
}

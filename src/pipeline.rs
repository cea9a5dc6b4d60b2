//! The fact-checking pipeline.
//!
//! A run moves through a fixed sequence of stages:
//!
//! ```text
//! Extracting -> Identifying -> Researching -> Verifying -> Summarizing -> Done
//!      \             \              \             \             \
//!       `-------------`--------------`-------------`-------------`--> Failed
//! ```
//!
//! URL input starts at `Extracting`; text input starts at `Identifying`. When
//! extraction fails for a trusted outlet, the fallback scraper gets one dedicated
//! recovery attempt before the run is failed.
//!
//! [`FactChecker`] holds only immutable state, so one instance can serve
//! concurrent runs. Each run owns its [`PipelineContext`].

use crate::api::AskAsync;
use crate::config::Settings;
use crate::error::FactCheckError;
use crate::models::{CredibilityReport, ExtractionRequest, ExtractionResult};
use crate::outputs::report::render_report;
use crate::scrapers::extractor::ContentExtractor;
use crate::scrapers::{PageFetcher, PrimaryExtractor, SearchProvider};
use crate::sources::SourceClassifier;
use crate::stages::identify::{identify, ClaimIdentification};
use crate::stages::research::research;
use crate::stages::summarize::summarize;
use crate::stages::verify::verify;
use crate::stages::PipelineContext;
use crate::validate::validate_url;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Identifying,
    Researching,
    Verifying,
    Summarizing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What to fact-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactCheckInput {
    Url(String),
    Text(String),
}

/// The record of one run: every stage entered, and how it ended.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub history: Vec<Stage>,
    pub outcome: Result<CredibilityReport, FactCheckError>,
}

impl PipelineRun {
    fn finish(mut history: Vec<Stage>, outcome: Result<CredibilityReport, FactCheckError>) -> Self {
        let terminal = if outcome.is_ok() { Stage::Done } else { Stage::Failed };
        history.push(terminal);
        Self { history, outcome }
    }

    /// `Done` or `Failed`.
    pub fn stage(&self) -> Stage {
        self.history.last().copied().unwrap_or(Stage::Failed)
    }

    /// The text handed back to the caller: the rendered report, or the error message.
    pub fn render(&self) -> String {
        match &self.outcome {
            Ok(report) => render_report(report),
            Err(e) => e.to_string(),
        }
    }
}

fn enter(history: &mut Vec<Stage>, stage: Stage) {
    info!(%stage, "Entering stage");
    history.push(stage);
}

pub struct FactChecker<A, P, F, S> {
    llm: A,
    extractor: ContentExtractor<P, F>,
    search: S,
    classifier: SourceClassifier,
    settings: Settings,
}

impl<A, P, F, S> FactChecker<A, P, F, S>
where
    A: AskAsync<Response = String>,
    P: PrimaryExtractor,
    F: PageFetcher,
    S: SearchProvider,
{
    pub fn new(llm: A, extractor: ContentExtractor<P, F>, search: S, settings: Settings) -> Self {
        Self {
            llm,
            extractor,
            search,
            classifier: SourceClassifier::from_settings(&settings),
            settings,
        }
    }

    /// Fact-check a URL.
    ///
    /// # Arguments
    ///
    /// * `url` - Article address, `http://` or `https://`
    ///
    /// # Returns
    ///
    /// The rendered credibility report, a no-claims sentinel, or a message starting
    /// with `Error:`. Never panics.
    pub async fn fact_check_url(&self, url: &str) -> String {
        self.fact_check(FactCheckInput::Url(url.to_string())).await.render()
    }

    /// Fact-check raw text and return the rendered report or an `Error:` message.
    pub async fn fact_check_text(&self, text: &str) -> String {
        self.fact_check(FactCheckInput::Text(text.to_string())).await.render()
    }

    /// Run the pipeline, turning a panic anywhere inside it into a failed run.
    pub async fn fact_check(&self, input: FactCheckInput) -> PipelineRun {
        let run = match &input {
            FactCheckInput::Url(url) => AssertUnwindSafe(self.run_url(url)).catch_unwind().await,
            FactCheckInput::Text(text) => AssertUnwindSafe(self.run_text(text)).catch_unwind().await,
        };
        run.unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            error!(%message, "Pipeline panicked");
            PipelineRun::finish(
                Vec::new(),
                Err(FactCheckError::stage_fault("pipeline", message)),
            )
        })
    }

    #[instrument(level = "info", skip(self))]
    pub async fn run_url(&self, url: &str) -> PipelineRun {
        let mut history = Vec::new();
        let outcome = self.url_flow(url, &mut history).await;
        self.log_outcome(&outcome);
        PipelineRun::finish(history, outcome)
    }

    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    pub async fn run_text(&self, text: &str) -> PipelineRun {
        let mut history = Vec::new();
        let ctx = PipelineContext::new(None, false, text.to_string());
        let outcome = self.analyze(ctx, &mut history).await;
        self.log_outcome(&outcome);
        PipelineRun::finish(history, outcome)
    }

    async fn url_flow(
        &self,
        url: &str,
        history: &mut Vec<Stage>,
    ) -> Result<CredibilityReport, FactCheckError> {
        validate_url(url)?;
        let trusted = self.classifier.is_trusted(url);

        enter(history, Stage::Extracting);
        let extraction = self
            .extractor
            .extract(ExtractionRequest { url: url.to_string() })
            .await;

        let content = if !extraction.is_error {
            info!(source = ?extraction.source, "Extraction succeeded");
            extraction.content
        } else if trusted {
            warn!("Extraction failed for a trusted outlet; attempting recovery scrape");
            self.recover_trusted(url).await.ok_or_else(|| extraction_failure(url, extraction))?
        } else {
            return Err(extraction_failure(url, extraction));
        };

        let ctx = PipelineContext::new(Some(url.to_string()), trusted, content);
        self.analyze(ctx, history).await
    }

    /// One dedicated fallback scrape; the text must be longer than the recovery minimum.
    async fn recover_trusted(&self, url: &str) -> Option<String> {
        let recovered = self.extractor.fallback_scrape(url).await;
        let chars = recovered.content.chars().count();
        if !recovered.is_error && chars > self.settings.trusted_recovery_min_chars {
            info!(chars, "Recovered trusted-outlet content");
            Some(recovered.content)
        } else {
            warn!(
                chars,
                min = self.settings.trusted_recovery_min_chars,
                "Recovery scrape did not produce enough content"
            );
            None
        }
    }

    async fn analyze(
        &self,
        mut ctx: PipelineContext,
        history: &mut Vec<Stage>,
    ) -> Result<CredibilityReport, FactCheckError> {
        let agents = &self.settings.agents;

        enter(history, Stage::Identifying);
        ctx.claims = match identify(
            &self.llm,
            &agents.claim_identifier,
            &self.settings.placeholder_markers,
            &ctx,
        )
        .await?
        {
            ClaimIdentification::Claims(claims) => claims,
            ClaimIdentification::InvalidContent => return Err(FactCheckError::InvalidOrEmptyContent),
            ClaimIdentification::NoClaimsFound => return Err(FactCheckError::NoClaimsFound),
        };

        enter(history, Stage::Researching);
        let mut evidence = Vec::with_capacity(ctx.claims.len());
        for claim in &ctx.claims {
            evidence.push(research(&self.search, &self.classifier, claim).await);
        }
        ctx.evidence = evidence;

        enter(history, Stage::Verifying);
        let mut verdicts = Vec::with_capacity(ctx.evidence.len());
        for ev in &ctx.evidence {
            verdicts.push(verify(&self.llm, &agents.claim_verifier, &ctx, ev).await?);
        }
        ctx.verdicts = verdicts;

        enter(history, Stage::Summarizing);
        summarize(&self.llm, &agents.credibility_summarizer, &ctx).await
    }

    fn log_outcome(&self, outcome: &Result<CredibilityReport, FactCheckError>) {
        match outcome {
            Ok(report) => info!(
                rating = %report.overall_rating,
                label = %report.final_label,
                "Fact-check complete"
            ),
            Err(e) => warn!(error = %e, "Fact-check failed"),
        }
    }
}

fn extraction_failure(url: &str, extraction: ExtractionResult) -> FactCheckError {
    FactCheckError::ExtractionFailure {
        url: url.to_string(),
        detail: extraction.error_detail.unwrap_or(extraction.content),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}

//! Language-model access for the claim stages.
//!
//! Claim identification, verification and summarization all send one prompt and
//! read back one free-text answer through [`AskAsync`]. In production that is
//! [`AskFnWrapper`] over `awful_aj`'s `ask`, wrapped in [`RetryAsk`]; tests plug in
//! scripted responders.
//!
//! Only model calls are retried. Scrape, fetch and search calls fail fast and are
//! handled by their own fallbacks.

use crate::utils::{extract_json_object, looks_truncated, truncate_for_log};
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{rng, Rng};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Sends a prompt to a language model.
pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Upper bound on a single backoff sleep, before jitter.
const MAX_BACKOFF: StdDuration = StdDuration::from_secs(30);
const MAX_JITTER_MS: u64 = 250;

/// Exponential backoff schedule: `base * 2^(retry - 1)`, capped at [`MAX_BACKOFF`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: StdDuration,
    pub cap: StdDuration,
}

impl Backoff {
    pub fn new(base: StdDuration) -> Self {
        Self { base, cap: MAX_BACKOFF }
    }

    /// Sleep before retry number `retry` (1-based), without jitter.
    pub fn delay(&self, retry: u32) -> StdDuration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

/// Retries a model call up to `max_retries` extra times on error.
pub struct RetryAsk<T> {
    inner: T,
    max_retries: u32,
    backoff: Backoff,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: u32, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            backoff: Backoff::new(base_delay),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all, fields(prompt_chars = text.len()))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let started = Instant::now();
        let mut retry = 0u32;

        loop {
            let err = match self.inner.ask(text).await {
                Ok(answer) => {
                    if retry > 0 {
                        debug!(retries = retry, "Model call succeeded after retrying");
                    }
                    return Ok(answer);
                }
                Err(e) => e,
            };

            if retry >= self.max_retries {
                error!(
                    attempts = retry + 1,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "Model call failed; no retries left"
                );
                return Err(err);
            }

            retry += 1;
            let wait = self.backoff.delay(retry)
                + StdDuration::from_millis(rng().random_range(0..=MAX_JITTER_MS));
            warn!(
                retry,
                of = self.max_retries,
                ?wait,
                error = %err,
                "Model call failed; retrying"
            );
            sleep(wait).await;
        }
    }
}

/// [`AskAsync`] over `awful_aj::api::ask` with a fixed config and chat template.
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    pub config: &'a AwfulJadeConfig,
    pub template: &'a ChatTemplate,
}

impl<'a> AskAsync for AskFnWrapper<'a> {
    type Response = String;

    #[instrument(level = "debug", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let started = Instant::now();
        let answer = ask(self.config, text.to_string(), self.template, None, None).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &answer {
            Ok(reply) => debug!(elapsed_ms, reply_chars = reply.len(), "Model answered"),
            Err(e) => warn!(elapsed_ms, error = %e, "Model endpoint call failed"),
        }
        answer
    }
}

/// Outcome of asking for a JSON answer.
#[derive(Debug)]
pub enum JsonAnswer<T> {
    /// The response held a conforming JSON object.
    Parsed(T),
    /// The response did not parse; the raw text is kept for lenient fallbacks.
    Unparsed(String),
}

fn parse_json<T: DeserializeOwned>(response: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(extract_json_object(response).unwrap_or(response))
}

/// Ask for a JSON answer of type `T`.
///
/// If the first answer was cut off mid-object (EOF while parsing), the prompt is
/// re-asked once. Transport errors propagate; non-conforming answers come back as
/// [`JsonAnswer::Unparsed`].
#[instrument(level = "info", skip_all)]
pub async fn ask_for_json<A, T>(llm: &A, prompt: &str) -> Result<JsonAnswer<T>, Box<dyn Error>>
where
    A: AskAsync<Response = String>,
    T: DeserializeOwned,
{
    let response = llm.ask(prompt).await?;
    match parse_json::<T>(&response) {
        Ok(parsed) => Ok(JsonAnswer::Parsed(parsed)),
        Err(e) if looks_truncated(&e) => {
            warn!(error = %e, "EOF while parsing; re-asking once");
            let second = llm.ask(prompt).await?;
            match parse_json::<T>(&second) {
                Ok(parsed) => Ok(JsonAnswer::Parsed(parsed)),
                Err(e2) => {
                    warn!(
                        error = %e2,
                        response_preview = %truncate_for_log(&second, 300),
                        "Re-asked response still non-conforming"
                    );
                    Ok(JsonAnswer::Unparsed(second))
                }
            }
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&response, 300),
                "Model returned non-conforming JSON"
            );
            Ok(JsonAnswer::Unparsed(response))
        }
    }
}

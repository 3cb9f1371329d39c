// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound page fetches to the results site.
//!
//! All fetches in the process go through one [`RequestGate`], which enforces
//! a minimum gap between requests and picks a User-Agent for each one.
//! [`Fetcher`] adds the retry policy on top of an [`HttpTransport`].

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

use crate::error::AppError;

/// Used when no User-Agent file is configured or it has no usable lines.
const FALLBACK_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Lowercase body fragments of bot-challenge interstitials.
const CHALLENGE_MARKERS: &[&str] = &[
    "cf-challenge-running",
    "cf-browser-verification",
    "challenge-running",
    "challenge-form",
    "<title>just a moment",
];

// ─── Transport ───────────────────────────────────────────────────────

/// What came back from one GET, whatever the status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// URL after redirects
    pub final_url: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Network-level failure: no HTTP response at all.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// A single HTTP GET, with no retry or pacing of its own.
pub trait HttpTransport: Send + Sync {
    fn get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        user_agent: &str,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Transport backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(Self::browser_headers())
            .build()?;
        Ok(Self { client })
    }

    fn browser_headers() -> reqwest::header::HeaderMap {
        use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.5"));
        headers
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        user_agent: &str,
    ) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(RawResponse {
            status,
            final_url,
            body: body.to_vec(),
        })
    }
}

// ─── User-Agent Pool ─────────────────────────────────────────────────

/// User-Agent strings to rotate through. Never empty.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Read one agent per line. A missing, unreadable or empty file gives
    /// the fallback set.
    pub fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_list(contents.lines()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read User-Agent file, using fallback set");
                Self::fallback()
            }
        }
    }

    pub fn from_list<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let agents: Vec<String> = lines
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(String::from)
            .collect();
        if agents.is_empty() {
            Self::fallback()
        } else {
            Self { agents }
        }
    }

    pub fn fallback() -> Self {
        Self {
            agents: FALLBACK_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn pick(&self) -> &str {
        let index = rand::thread_rng().gen_range(0..self.agents.len());
        &self.agents[index]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

// ─── Request Gate ────────────────────────────────────────────────────

/// Process-wide pacing of requests to the results site.
///
/// The lock is held from the wait until the request completes, so
/// concurrent callers queue behind each other and the interval is measured
/// from the end of one request to the start of the next.
pub struct RequestGate {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
    agents: UserAgentPool,
}

/// Exclusive right to make one request. Dropping it stamps the end time.
pub struct GatePermit<'a> {
    last_request: MutexGuard<'a, Option<Instant>>,
    user_agent: &'a str,
}

impl GatePermit<'_> {
    pub fn user_agent(&self) -> &str {
        self.user_agent
    }
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        *self.last_request = Some(Instant::now());
    }
}

impl RequestGate {
    pub fn new(min_interval: Duration, agents: UserAgentPool) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
            agents,
        }
    }

    /// Wait for our turn and for the interval to pass.
    pub async fn acquire(&self) -> GatePermit<'_> {
        let last_request = self.last_request.lock().await;
        if let Some(last) = *last_request {
            let ready_at = last + self.min_interval;
            if ready_at > Instant::now() {
                tracing::debug!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Rate limiting request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        GatePermit {
            last_request,
            user_agent: self.agents.pick(),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

// ─── Retry Policy ────────────────────────────────────────────────────

/// Exponential backoff without jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

// ─── Fetcher ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// A status that retrying will not fix.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} failed after {attempts} attempts: {reason}")]
    Exhausted {
        url: String,
        attempts: u32,
        reason: String,
    },
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::Transport(err.to_string())
    }
}

/// Why one attempt is worth repeating.
enum Attempt {
    Done(RawResponse),
    Retry(String),
    Fatal(FetchError),
}

/// Paced, retrying page fetcher.
pub struct Fetcher<T> {
    transport: T,
    gate: Arc<RequestGate>,
    retry: RetryPolicy,
}

impl<T: HttpTransport> Fetcher<T> {
    pub fn new(transport: T, gate: Arc<RequestGate>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            gate,
            retry,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch a page and return its body as text.
    pub async fn fetch(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<String, FetchError> {
        let mut attempt = 1;
        loop {
            let outcome = {
                let permit = self.gate.acquire().await;
                tracing::info!(url, attempt, "Fetching page");
                let result = self.transport.get(url, query, permit.user_agent()).await;
                Self::judge(url, result)
            };

            let reason = match outcome {
                Attempt::Done(response) => return Ok(response.text()),
                Attempt::Fatal(err) => return Err(err),
                Attempt::Retry(reason) => reason,
            };

            if attempt >= self.retry.max_attempts {
                tracing::error!(url, attempts = attempt, reason = %reason, "Giving up on page");
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    reason,
                });
            }

            let delay = self.retry.delay_after(attempt);
            tracing::warn!(
                url,
                attempt,
                delay_secs = delay.as_secs(),
                reason = %reason,
                "Retrying page fetch"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn judge(url: &str, result: Result<RawResponse, TransportError>) -> Attempt {
        let response = match result {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(e.0),
        };

        match response.status {
            429 => return Attempt::Retry("HTTP 429".to_string()),
            500..=599 => return Attempt::Retry(format!("HTTP {}", response.status)),
            400..=499 => {
                return Attempt::Fatal(FetchError::Status {
                    url: url.to_string(),
                    status: response.status,
                })
            }
            _ => {}
        }

        if response.final_url.to_lowercase().contains("blocked") {
            return Attempt::Retry(format!("redirected to {}", response.final_url));
        }
        if looks_like_challenge(&response.body) {
            return Attempt::Retry("bot challenge page".to_string());
        }
        Attempt::Done(response)
    }
}

/// Heuristic check for bot-challenge interstitials.
pub fn looks_like_challenge(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body).to_lowercase();
    CHALLENGE_MARKERS.iter().any(|marker| text.contains(marker))
}

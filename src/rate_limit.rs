use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, warn};

use crate::error::{HarvestError, Result};

/// Remaining quota below this for search-class calls triggers a wait. The
/// search endpoints share a small per-minute budget.
pub const SEARCH_THRESHOLD: u32 = 5;
/// Blob/content-class calls draw from the much larger core budget.
pub const BLOB_THRESHOLD: u32 = 50;

const MAX_ATTEMPTS: u32 = 5;
const RETRY_COOLDOWN: Duration = Duration::from_secs(300);

/// Quota counters for one call class, refreshed from response headers after
/// every call. Starts unset: the first call is always allowed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaState {
    remaining: Option<u32>,
    reset_at: Option<i64>,
}

impl QuotaState {
    pub fn record(&mut self, remaining: u32, reset_at: i64) {
        self.remaining = Some(remaining);
        self.reset_at = Some(reset_at);
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// How long to wait before the next call may be issued, given the
    /// threshold for this call class. `None` means go ahead: quota is
    /// unknown, comfortably above the threshold, or the reset already passed.
    pub fn cooldown(&self, threshold: u32, now: i64) -> Option<Duration> {
        match (self.remaining, self.reset_at) {
            (Some(remaining), Some(reset_at)) if remaining < threshold && reset_at > now => {
                // One extra second so the reset has definitely happened.
                Some(Duration::from_secs((reset_at - now) as u64 + 1))
            }
            _ => None,
        }
    }
}

/// Sleep in 1-second increments so a long quota wait or retry cooldown stays
/// observable from the outside, with a liveness line every 30 seconds.
pub async fn sleep_in_increments(total: Duration) {
    const TICK: Duration = Duration::from_secs(1);
    let deadline = Instant::now() + total;
    let mut ticks: u64 = 0;
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let left = deadline - now;
        sleep(left.min(TICK)).await;
        ticks += 1;
        if ticks % 30 == 0 {
            debug!(
                "still sleeping, {}s left",
                deadline.saturating_duration_since(Instant::now()).as_secs()
            );
        }
    }
}

/// Wraps outbound calls for one call class: gates on the quota threshold,
/// refreshes quota state from every response, and retries transient failures
/// a bounded number of times before giving up.
pub struct RateLimitedClient {
    http: Client,
    quota: QuotaState,
    threshold: u32,
    max_attempts: u32,
    retry_cooldown: Duration,
}

impl RateLimitedClient {
    pub fn new(http: Client, threshold: u32) -> Self {
        RateLimitedClient {
            http,
            quota: QuotaState::default(),
            threshold,
            max_attempts: MAX_ATTEMPTS,
            retry_cooldown: RETRY_COOLDOWN,
        }
    }

    /// Override the retry policy; tests use a zero cooldown.
    pub fn with_retry_policy(mut self, max_attempts: u32, retry_cooldown: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_cooldown = retry_cooldown;
        self
    }

    /// Build a GET request against this caller's underlying client.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    /// Issue a request, honoring the quota gate and the retry policy.
    /// Returns the response only on a success status; transient failures
    /// (network errors, any non-success status) are retried with a fixed
    /// cooldown until the attempt budget is exhausted.
    pub async fn call(&mut self, request: RequestBuilder) -> Result<Response> {
        let mut last = String::new();

        for attempt in 1..=self.max_attempts {
            if let Some(wait) = self.quota.cooldown(self.threshold, Utc::now().timestamp()) {
                warn!(
                    "nearing the edge of the allowed rate ({:?} calls left), sleeping {}s until reset",
                    self.quota.remaining(),
                    wait.as_secs()
                );
                sleep_in_increments(wait).await;
            }

            let attempt_request = request
                .try_clone()
                .ok_or_else(|| HarvestError::Malformed("request cannot be replayed".into()))?;

            match attempt_request.send().await {
                Ok(response) => {
                    // Refresh even when the gate was skipped or the status is
                    // an error: whatever quota metadata came back is truth.
                    self.observe(response.headers());
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    last = format!("status {status}");
                    warn!(
                        "attempt {attempt}/{}: request failed with {status}",
                        self.max_attempts
                    );
                }
                Err(err) => {
                    last = err.to_string();
                    warn!("attempt {attempt}/{}: {err}", self.max_attempts);
                }
            }

            if attempt < self.max_attempts {
                warn!(
                    "cooling down {}s before retrying",
                    self.retry_cooldown.as_secs()
                );
                sleep_in_increments(self.retry_cooldown).await;
            }
        }

        Err(HarvestError::RetriesExhausted {
            attempts: self.max_attempts,
            last,
        })
    }

    fn observe(&mut self, headers: &HeaderMap) {
        let remaining = header_number::<u32>(headers, "x-ratelimit-remaining");
        let reset_at = header_number::<i64>(headers, "x-ratelimit-reset");
        if let (Some(remaining), Some(reset_at)) = (remaining, reset_at) {
            self.quota.record(remaining, reset_at);
            debug!(
                "rate limit: {remaining} calls remaining, resets in {}s",
                (reset_at - Utc::now().timestamp()).max(0)
            );
        }
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)?
        .to_str()
        .ok()
        .and_then(|value| value.parse().ok())
}

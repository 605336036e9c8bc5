//! News sources and the per-section fetcher.
//!
//! A [`StorySource`] performs exactly one request for one section and
//! classifies the outcome. The [`SectionFetcher`] wraps a source with the
//! rate-limit retry policy and the per-section cap.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | New York Times | [`nyt`] | Top Stories API | Requires API key |
//!
//! # Failure handling
//!
//! - HTTP 429 is retried with backoff; once the budget is spent the section
//!   is skipped (empty result) instead of failing the digest.
//! - Transport failures and any other error status are returned to the
//!   caller untouched.

pub mod nyt;

use crate::error::DigestError;
use crate::models::{Story, TopStoriesResponse};
use crate::retry::RetryPolicy;
use tracing::{debug, info, instrument, warn};

/// One request against a news source for one section.
pub trait StorySource {
    /// Fetch the ranked stories of `section`.
    ///
    /// Implementations must report HTTP 429 as [`DigestError::RateLimited`]
    /// so the fetcher can tell it apart from fatal failures.
    async fn top_stories(&self, section: &str) -> Result<TopStoriesResponse, DigestError>;
}

/// Fetches capped story lists, backing off on rate limits.
#[derive(Debug)]
pub struct SectionFetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: StorySource> SectionFetcher<S> {
    /// Wrap `source` with the default policy (3 attempts, 5 s doubling).
    pub fn new(source: S) -> Self {
        Self::with_policy(source, RetryPolicy::default())
    }

    pub fn with_policy(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Return at most `limit` stories for `section`, in source order.
    ///
    /// An empty vector means "nothing to show": the source had no results,
    /// reported a non-OK status, or kept rate limiting us.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, section: &str, limit: usize) -> Result<Vec<Story>, DigestError> {
        let res = self
            .policy
            .run(
                section,
                || self.source.top_stories(section),
                DigestError::is_rate_limited,
            )
            .await;

        match res {
            Ok(resp) if resp.is_ok() && !resp.results.is_empty() => {
                let available = resp.results.len();
                let reported = resp.num_results;
                let mut stories = resp.results;
                stories.truncate(limit);
                info!(
                    available,
                    ?reported,
                    kept = stories.len(),
                    "Fetched section"
                );
                Ok(stories)
            }
            Ok(resp) => {
                debug!(status = %resp.status, "Section returned no stories");
                Ok(Vec::new())
            }
            Err(DigestError::RateLimited { .. }) => {
                warn!(
                    attempts = self.policy.max_attempts,
                    "Max retries reached for section; skipping"
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

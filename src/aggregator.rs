//! Builds a [`Digest`] by walking the configured sections in order.
//!
//! Sections are fetched strictly one after another with a politeness delay
//! between requests. Sections that come back empty (including ones skipped
//! after rate limiting) never appear in the digest. Transport and upstream
//! errors abort the whole digest.

use crate::error::DigestError;
use crate::models::Digest;
use crate::sources::{SectionFetcher, StorySource};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Pause between two section requests.
pub const POLITENESS_DELAY: Duration = Duration::from_secs(7);

#[derive(Debug)]
pub struct DigestAggregator<S> {
    fetcher: SectionFetcher<S>,
    politeness_delay: Duration,
}

impl<S: StorySource> DigestAggregator<S> {
    pub fn new(fetcher: SectionFetcher<S>) -> Self {
        Self {
            fetcher,
            politeness_delay: POLITENESS_DELAY,
        }
    }

    pub fn fetcher(&self) -> &SectionFetcher<S> {
        &self.fetcher
    }

    /// Fetch every section in `sections`, in order, keeping at most
    /// `per_section_limit` stories each.
    ///
    /// The result may be empty; callers treat that as nothing to send.
    #[instrument(level = "info", skip_all, fields(sections = sections.len(), per_section_limit = per_section_limit))]
    pub async fn build_digest(
        &self,
        sections: &[String],
        per_section_limit: usize,
    ) -> Result<Digest, DigestError> {
        let mut digest = Digest::new();

        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                sleep(self.politeness_delay).await;
            }

            info!(%section, "Fetching section");
            let stories = self.fetcher.fetch(section, per_section_limit).await?;
            if stories.is_empty() {
                info!(%section, "No stories; leaving section out");
                continue;
            }
            digest.insert(section.clone(), stories);
        }

        info!(
            sections = ?digest.keys().collect::<Vec<_>>(),
            stories = digest.story_count(),
            "Digest assembled"
        );
        Ok(digest)
    }
}

//! Subscription pipeline: aggregate, translate, render, deliver.
//!
//! Subscriptions are processed one after another. A failure in one is
//! logged with its label and counted; the run moves on to the next.

use crate::aggregator::DigestAggregator;
use crate::config::Subscription;
use crate::error::DigestError;
use crate::outputs::email::EmailRenderer;
use crate::outputs::{Delivery, DeliveryReceipt};
use crate::sources::StorySource;
use crate::translate::{Translator, translate_digest};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use tracing::{error, info, instrument};

/// What happened to one subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum DigestOutcome {
    Delivered(DeliveryReceipt),
    /// No section produced any stories; nothing was translated or sent.
    Skipped,
}

/// Counts for a whole run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sent: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.sent + self.written + self.skipped + self.failed
    }
}

pub struct DigestPipeline<S, T, D> {
    aggregator: DigestAggregator<S>,
    translator: T,
    delivery: D,
    renderer: EmailRenderer,
}

impl<S, T, D> DigestPipeline<S, T, D>
where
    S: StorySource,
    T: Translator,
    D: Delivery,
{
    pub fn new(
        aggregator: DigestAggregator<S>,
        translator: T,
        delivery: D,
        renderer: EmailRenderer,
    ) -> Self {
        Self {
            aggregator,
            translator,
            delivery,
            renderer,
        }
    }

    #[cfg(test)]
    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    #[cfg(test)]
    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// Build and deliver the digest for one subscription.
    #[instrument(level = "info", skip(self, subscription, now), fields(language = %subscription.target_language))]
    pub async fn process<Tz>(
        &self,
        subscription: &Subscription,
        label: &str,
        now: &DateTime<Tz>,
    ) -> Result<DigestOutcome, DigestError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let digest = self
            .aggregator
            .build_digest(
                &subscription.api_sections,
                subscription.max_stories_per_section,
            )
            .await?;

        if digest.is_empty() {
            info!("No stories were fetched; not sending an empty digest");
            return Ok(DigestOutcome::Skipped);
        }

        let translated = translate_digest(
            &self.translator,
            &subscription.main_briefing_title,
            digest,
            &subscription.target_language,
        )
        .await?;

        let email = self.renderer.render_email(subscription, &translated, now)?;
        let receipt = self
            .delivery
            .deliver(&email, &subscription.recipients, label)
            .await?;
        Ok(DigestOutcome::Delivered(receipt))
    }

    /// Process every subscription in order, isolating failures.
    pub async fn run_all<Tz>(&self, subscriptions: &[Subscription], now: &DateTime<Tz>) -> RunSummary
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut summary = RunSummary::default();

        for (i, subscription) in subscriptions.iter().enumerate() {
            let label = subscription.label(i);
            info!(
                subscription = %label,
                position = i + 1,
                of = subscriptions.len(),
                "Processing subscription"
            );

            match self.process(subscription, &label, now).await {
                Ok(DigestOutcome::Delivered(DeliveryReceipt::Sent { recipients })) => {
                    info!(subscription = %label, recipients, "Digest sent");
                    summary.sent += 1;
                }
                Ok(DigestOutcome::Delivered(DeliveryReceipt::Written(path))) => {
                    info!(subscription = %label, path = %path.display(), "Digest written");
                    summary.written += 1;
                }
                Ok(DigestOutcome::Skipped) => {
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!(subscription = %label, error = %e, "Failed to process subscription");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

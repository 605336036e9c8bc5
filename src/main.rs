//! # Translated News Digest
//!
//! Fetches New York Times Top Stories for a list of sections, translates the
//! whole digest with a single batch request, and emails it as a localized
//! HTML page. Each subscription has its own sections, story limit, language,
//! date locale and subject line.
//!
//! ## Usage
//!
//! ```sh
//! # Send every configured digest
//! translated_news_digest -c config.json
//!
//! # Render to ./out/dry_run_*.html instead of sending
//! translated_news_digest --dry-run -o ./out
//! ```
//!
//! ## Architecture
//!
//! For each subscription, in order:
//! 1. **Aggregation**: fetch each section (7 s apart, with backoff on HTTP 429)
//! 2. **Translation**: flatten title, headings and stories into one batch
//! 3. **Rendering**: fill the Handlebars email template
//! 4. **Delivery**: send over SMTP/STARTTLS, or write a dry-run file
//!
//! A failure in one subscription is logged and the next one is processed.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod config;
mod error;
mod mailer;
mod models;
mod outputs;
mod pipeline;
mod retry;
mod sources;
mod translate;
mod utils;

#[cfg(test)]
mod test_utils;

use aggregator::{DigestAggregator, POLITENESS_DELAY};
use cli::Cli;
use config::Settings;
use error::DigestError;
use mailer::Mailer;
use outputs::Delivery;
use outputs::dry_run::DryRunWriter;
use outputs::email::EmailRenderer;
use pipeline::{DigestPipeline, RunSummary};
use sources::SectionFetcher;
use sources::nyt::NytClient;
use translate::google::GoogleTranslator;
use utils::ensure_writable_dir;

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
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("translated_news_digest starting up");

    if dotenvy::dotenv().is_ok() {
        debug!("Loaded .env file");
    }

    let args = Cli::parse();
    debug!(config = %args.config.display(), dry_run = args.dry_run, "Parsed CLI arguments");

    // Validate everything before touching the network.
    let settings = match Settings::from_cli(&args) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    if settings.subscriptions.is_empty() {
        info!("No subscriptions configured; nothing to do");
        return Ok(());
    }

    let renderer = match &args.template {
        Some(path) => EmailRenderer::from_file(path)?,
        None => EmailRenderer::new()?,
    };

    let summary = if args.dry_run {
        ensure_writable_dir(&args.output_dir).await?;
        let writer = DryRunWriter::new(&args.output_dir);
        info!(output_dir = %writer.output_dir().display(), "DRY RUN: emails will be written to files");
        run(&settings, renderer, writer).await?
    } else {
        let smtp = settings.smtp.clone().ok_or_else(|| {
            DigestError::Configuration("SMTP settings are required to send email".to_string())
        })?;
        run(&settings, renderer, Mailer::new(smtp)).await?
    };

    let elapsed = start_time.elapsed();
    info!(
        subscriptions = summary.total(),
        sent = summary.sent,
        written = summary.written,
        skipped = summary.skipped,
        failed = summary.failed,
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

async fn run<D: Delivery>(
    settings: &Settings,
    renderer: EmailRenderer,
    delivery: D,
) -> Result<RunSummary, DigestError> {
    let source = NytClient::new(settings.nyt_api_key.clone(), &settings.nyt_base_url)?;
    let translator =
        GoogleTranslator::new(settings.translate_api_key.clone(), &settings.translate_base_url)?;
    let aggregator = DigestAggregator::new(SectionFetcher::new(source));
    debug!(
        retry_delays = ?aggregator.fetcher().policy().schedule(),
        politeness_delay = ?POLITENESS_DELAY,
        "Fetch pacing"
    );
    let pipeline = DigestPipeline::new(aggregator, translator, delivery, renderer);

    info!(
        subscriptions = settings.subscriptions.len(),
        "Processing subscriptions"
    );
    Ok(pipeline.run_all(&settings.subscriptions, &Local::now()).await)
}

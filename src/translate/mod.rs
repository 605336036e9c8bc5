//! Batch translation of a whole digest in one request.
//!
//! # Architecture
//!
//! - [`Translator`]: one batch call, ordered strings in, ordered strings out
//! - [`google::GoogleTranslator`]: Google Cloud Translation v2 implementation
//! - [`index::TranslationIndex`]: flattens a digest and maps the answer back
//!
//! The translation call is never retried; any failure, including an answer
//! with the wrong number of items, fails the digest as a whole.

pub mod google;
pub mod index;

use crate::error::DigestError;
use crate::models::Digest;
use index::TranslationIndex;
use std::time::Instant;
use tracing::{info, instrument};

/// A batch translation backend.
pub trait Translator {
    /// Translate `texts` into `target_language`.
    ///
    /// Implementations must return one string per input, in input order.
    async fn translate(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, DigestError>;
}

/// A digest after translation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslatedDigest {
    /// The translated main title.
    pub title: String,
    /// Sections keyed by translated section title.
    pub digest: Digest,
}

/// Translate `main_title` and every section heading, story title and story
/// abstract of `digest` with a single call to `translator`.
///
/// An empty digest short-circuits to an empty result without contacting the
/// service.
#[instrument(level = "info", skip(translator, main_title, digest), fields(sections = digest.len()))]
pub async fn translate_digest<T: Translator>(
    translator: &T,
    main_title: &str,
    digest: Digest,
    target_language: &str,
) -> Result<TranslatedDigest, DigestError> {
    if digest.is_empty() {
        info!("Nothing to translate");
        return Ok(TranslatedDigest::default());
    }

    info!("Preparing stories for translation");
    let index = TranslationIndex::build(main_title, digest);

    info!(items = index.len(), "Translating text elements");
    let t0 = Instant::now();
    let translated = translator.translate(index.batch(), target_language).await?;

    let (title, digest) = index.reassemble(translated)?;
    info!(elapsed_ms = t0.elapsed().as_millis(), "Translation complete");
    Ok(TranslatedDigest { title, digest })
}

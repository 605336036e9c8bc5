//! Positional index between a [`Digest`] and its flat translation batch.
//!
//! The translation service only preserves order, so every text item's
//! position is the sole link back to where it came from. The layout is:
//!
//! ```text
//! [0]                      main title
//! [1 ..= N]                humanized section keys, in section order
//! [1 + N ..]               (story title, story abstract) pairs, section by
//!                          section, story by story
//! ```
//!
//! [`TranslationIndex::build`] is the only place where slots are assigned.
//! It records the slot of every element while it pushes the text, and
//! [`TranslationIndex::reassemble`] only ever reads those recorded slots, so
//! the two directions cannot drift apart.

use crate::error::DigestError;
use crate::models::Digest;
use crate::utils::humanize_section_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StorySlots {
    title: usize,
    abstract_text: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SectionSlots {
    heading: usize,
    stories: Vec<StorySlots>,
}

/// A digest together with its flattened batch and the slot of every item.
///
/// The index owns the digest it was built from, so reassembly always runs
/// against exactly the structure that produced the batch.
#[derive(Debug)]
pub struct TranslationIndex {
    digest: Digest,
    batch: Vec<String>,
    title: usize,
    sections: Vec<SectionSlots>,
}

impl TranslationIndex {
    /// Flatten `main_title` and `digest` into one batch, recording slots.
    pub fn build(main_title: &str, digest: Digest) -> Self {
        let mut batch = Vec::with_capacity(Self::expected_len(&digest));
        let mut push = |text: String| {
            batch.push(text);
            batch.len() - 1
        };

        let title = push(main_title.to_string());

        let headings: Vec<usize> = digest
            .sections()
            .iter()
            .map(|section| push(humanize_section_key(&section.key)))
            .collect();

        let mut sections = Vec::with_capacity(digest.len());
        for (section, heading) in digest.sections().iter().zip(headings) {
            let mut stories = Vec::with_capacity(section.stories.len());
            for story in &section.stories {
                let title = push(story.title.clone());
                let abstract_text = push(story.abstract_text.clone());
                stories.push(StorySlots {
                    title,
                    abstract_text,
                });
            }
            sections.push(SectionSlots { heading, stories });
        }

        Self {
            digest,
            batch,
            title,
            sections,
        }
    }

    /// Batch length for `digest`: `1 + sections + 2 * stories`.
    pub fn expected_len(digest: &Digest) -> usize {
        1 + digest.len() + 2 * digest.story_count()
    }

    /// The texts to submit, in slot order.
    pub fn batch(&self) -> &[String] {
        &self.batch
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Map a translated batch back onto the digest.
    ///
    /// Returns the translated main title and a digest keyed by translated
    /// section titles. Stories keep every field except `title` and
    /// `abstract`.
    ///
    /// # Errors
    ///
    /// [`DigestError::TranslationMismatch`] if `translated` does not have
    /// exactly one entry per batch item. Nothing is reassembled in that case.
    pub fn reassemble(self, translated: Vec<String>) -> Result<(String, Digest), DigestError> {
        if translated.len() != self.batch.len() {
            return Err(DigestError::TranslationMismatch {
                expected: self.batch.len(),
                actual: translated.len(),
            });
        }

        let mut slots: Vec<Option<String>> = translated.into_iter().map(Some).collect();
        let mut take = |slot: usize| -> Result<String, DigestError> {
            slots
                .get_mut(slot)
                .and_then(Option::take)
                .ok_or(DigestError::TranslationMismatch {
                    expected: self.batch.len(),
                    actual: slot,
                })
        };

        let title = take(self.title)?;

        let mut out = Digest::new();
        for (section, slot) in self.digest.sections().iter().zip(&self.sections) {
            let heading = take(slot.heading)?;
            let mut stories = Vec::with_capacity(section.stories.len());
            for (story, s) in section.stories.iter().zip(&slot.stories) {
                stories.push(story.with_text(take(s.title)?, take(s.abstract_text)?));
            }
            out.push(heading, stories);
        }

        Ok((title, out))
    }
}

//! Data models for stories, sections and digests.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Story`]: A single Top Stories entry, with untouched pass-through fields
//! - [`Section`]: A section key and its ranked stories
//! - [`Digest`]: The ordered sections of one run
//! - [`TopStoriesResponse`]: The raw body of a Top Stories API call
//!
//! Section order and story order are significant everywhere: they decide the
//! order of the email and the positions inside a translation batch.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single story as returned by the news source.
///
/// Only `title` and `abstract` are ever rewritten (by translation). Every
/// other field, including ones this crate does not know about, is carried
/// through unchanged in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Story {
    /// The headline.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// The teaser paragraph. Serialized as `abstract`.
    #[serde(rename = "abstract", default, deserialize_with = "null_as_empty")]
    pub abstract_text: String,
    /// Canonical article URL.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    /// Author line, e.g. "By Jane Doe".
    #[serde(default, deserialize_with = "null_as_empty")]
    pub byline: String,
    /// Fields the pipeline never touches (section, multimedia, dates, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Story {
    /// Copy of this story with new text, keeping everything else.
    pub fn with_text(&self, title: String, abstract_text: String) -> Self {
        Self {
            title,
            abstract_text,
            ..self.clone()
        }
    }
}

/// The Top Stories API sometimes sends `null` instead of omitting a field.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One section of a digest.
///
/// Before translation `key` is the machine name ("world", "us/politics");
/// afterwards it is the translated display title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub key: String,
    pub stories: Vec<Story>,
}

/// The ordered sections of a single digest.
///
/// Behaves like an insertion-ordered map keyed by section name. Translated
/// digests are built with [`Digest::push`] because two section titles may
/// translate to the same text and neither may be lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Digest {
    sections: Vec<Section>,
}

impl Digest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a section. A replaced section keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, stories: Vec<Story>) {
        let key = key.into();
        match self.sections.iter_mut().find(|s| s.key == key) {
            Some(existing) => existing.stories = stories,
            None => self.sections.push(Section { key, stories }),
        }
    }

    /// Append a section without checking for an existing key.
    pub fn push(&mut self, key: impl Into<String>, stories: Vec<Story>) {
        self.sections.push(Section {
            key: key.into(),
            stories,
        });
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&[Story]> {
        self.sections
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.stories.as_slice())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of stories across all sections.
    pub fn story_count(&self) -> usize {
        self.sections.iter().map(|s| s.stories.len()).sum()
    }
}

/// Body of `GET /svc/topstories/v2/{section}.json`.
#[derive(Debug, Deserialize)]
pub struct TopStoriesResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub num_results: Option<u64>,
    #[serde(default)]
    pub results: Vec<Story>,
}

impl TopStoriesResponse {
    /// `true` when the API reported success.
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

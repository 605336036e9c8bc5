//! Shared fixtures for unit tests: canned stories, a scripted story source,
//! stub translators and a recording delivery target.

use crate::error::DigestError;
use crate::models::{Story, TopStoriesResponse};
use crate::outputs::{Delivery, DeliveryReceipt, RenderedEmail};
use crate::sources::StorySource;
use crate::translate::Translator;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant;

pub fn story(title: &str, abstract_text: &str) -> Story {
    Story {
        title: title.to_string(),
        abstract_text: abstract_text.to_string(),
        url: format!("https://www.nytimes.com/{}.html", title.replace(' ', "-")),
        byline: "By Test Reporter".to_string(),
        ..Story::default()
    }
}

/// An "OK" response with `n` stories titled `"{section} 1"`, `"{section} 2"`, ...
pub fn ok_response(section: &str, n: usize) -> TopStoriesResponse {
    TopStoriesResponse {
        status: "OK".to_string(),
        num_results: Some(n as u64),
        results: (1..=n)
            .map(|i| story(&format!("{section} {i}"), &format!("{section} abstract {i}")))
            .collect(),
    }
}

pub fn rate_limited(section: &str) -> DigestError {
    DigestError::RateLimited {
        section: section.to_string(),
    }
}

/// A real [`DigestError::Transport`], produced by connecting to a port that
/// was just closed.
pub async fn transport_error() -> DigestError {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = reqwest::get(format!("http://{addr}/")).await.unwrap_err();
    DigestError::Transport {
        service: "test",
        source,
    }
}

type Scripted = Result<TopStoriesResponse, DigestError>;

/// Replays queued responses per section and records every call with the
/// (tokio) time it happened. Sections with nothing queued answer "OK" with
/// no results.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, section: &str, response: Scripted) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(section.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_sections(&self) -> Vec<String> {
        self.calls().into_iter().map(|(s, _)| s).collect()
    }
}

impl StorySource for ScriptedSource {
    async fn top_stories(&self, section: &str) -> Result<TopStoriesResponse, DigestError> {
        self.calls
            .lock()
            .unwrap()
            .push((section.to_string(), Instant::now()));
        self.responses
            .lock()
            .unwrap()
            .get_mut(section)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(ok_response(section, 0)))
    }
}

/// Translator that returns its input, recording every batch it saw.
#[derive(Debug, Default)]
pub struct IdentityTranslator {
    batches: Mutex<Vec<(Vec<String>, String)>>,
}

impl IdentityTranslator {
    pub fn batches(&self) -> Vec<(Vec<String>, String)> {
        self.batches.lock().unwrap().clone()
    }
}

impl Translator for IdentityTranslator {
    async fn translate(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, DigestError> {
        self.batches
            .lock()
            .unwrap()
            .push((texts.to_vec(), target_language.to_string()));
        Ok(texts.to_vec())
    }
}

/// Translator that tags every item with the target language: `"[de] text"`.
#[derive(Debug, Default)]
pub struct TaggingTranslator;

impl Translator for TaggingTranslator {
    async fn translate(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, DigestError> {
        Ok(texts
            .iter()
            .map(|t| format!("[{target_language}] {t}"))
            .collect())
    }
}

/// Translator that drops the last item of every batch.
#[derive(Debug, Default)]
pub struct ShortTranslator;

impl Translator for ShortTranslator {
    async fn translate(&self, texts: &[String], _: &str) -> Result<Vec<String>, DigestError> {
        let mut out = texts.to_vec();
        out.pop();
        Ok(out)
    }
}

/// Delivery target that keeps every email in memory, optionally failing
/// for one recipient.
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    pub fail_for: Option<String>,
    sent: Mutex<Vec<(RenderedEmail, Vec<String>)>>,
}

impl RecordingDelivery {
    pub fn failing_for(recipient: &str) -> Self {
        Self {
            fail_for: Some(recipient.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(RenderedEmail, Vec<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Delivery for RecordingDelivery {
    async fn deliver(
        &self,
        email: &RenderedEmail,
        recipients: &[String],
        _label: &str,
    ) -> Result<DeliveryReceipt, DigestError> {
        if let Some(bad) = &self.fail_for {
            if recipients.iter().any(|r| r == bad) {
                return Err(DigestError::Delivery(format!("rejected {bad}")));
            }
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.clone(), recipients.to_vec()));
        Ok(DeliveryReceipt::Sent {
            recipients: recipients.len(),
        })
    }
}

//! New York Times Top Stories API client.
//!
//! Each section is a separate endpoint:
//! `GET https://api.nytimes.com/svc/topstories/v2/{section}.json?api-key=...`.
//! The response carries a `status` string and a ranked `results` array.
//!
//! This client makes exactly one request per call and maps the outcome onto
//! [`DigestError`]; retrying is the fetcher's job.

use crate::error::DigestError;
use crate::models::TopStoriesResponse;
use crate::sources::StorySource;
use crate::utils::truncate_for_log;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.nytimes.com";

const SERVICE: &str = "NYT Top Stories";

/// Thin client for the Top Stories endpoints.
#[derive(Debug, Clone)]
pub struct NytClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl NytClient {
    /// Client against `base_url` (use [`DEFAULT_BASE_URL`] in production).
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Configuration`] if `base_url` is not a valid URL
    /// or the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, DigestError> {
        let base_url = parse_base_url(base_url)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DigestError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn section_url(&self, section: &str) -> Result<Url, DigestError> {
        self.base_url
            .join(&format!("svc/topstories/v2/{section}.json"))
            .map_err(|e| DigestError::Configuration(format!("bad section '{section}': {e}")))
    }
}

/// Parse a base URL so that relative joins append to its path.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, DigestError> {
    let with_slash = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    Url::parse(&with_slash)
        .map_err(|e| DigestError::Configuration(format!("invalid base URL '{base_url}': {e}")))
}

impl StorySource for NytClient {
    #[instrument(level = "info", skip(self))]
    async fn top_stories(&self, section: &str) -> Result<TopStoriesResponse, DigestError> {
        let url = self.section_url(section)?;
        debug!(%url, "Requesting top stories");

        let resp = self
            .http
            .get(url)
            .query(&[("api-key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| DigestError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DigestError::RateLimited {
                section: section.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DigestError::upstream(
                SERVICE,
                format!(
                    "HTTP {status} for section '{section}': {}",
                    truncate_for_log(&body, 200)
                ),
            ));
        }

        let body = resp.text().await.map_err(|source| DigestError::Transport {
            service: SERVICE,
            source,
        })?;
        serde_json::from_str::<TopStoriesResponse>(&body).map_err(|e| {
            DigestError::upstream(
                SERVICE,
                format!(
                    "unreadable body for section '{section}': {e}; body: {}",
                    truncate_for_log(&body, 200)
                ),
            )
        })
    }
}

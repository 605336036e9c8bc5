//! Google Cloud Translation (v2, "Basic") REST client.
//!
//! One `POST /language/translate/v2?key=...` carries the whole batch:
//!
//! ```json
//! {"q": ["...", "..."], "target": "de", "format": "text"}
//! ```
//!
//! and the answer lists one `translatedText` per `q` entry, in order.

use crate::error::DigestError;
use crate::sources::nyt::parse_base_url;
use crate::translate::Translator;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com";

const SERVICE: &str = "Google Translate";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize)]
struct Translation {
    translatedText: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl GoogleTranslator {
    /// # Errors
    ///
    /// Returns [`DigestError::Configuration`] if `base_url` is not a valid URL
    /// or the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, DigestError> {
        let endpoint = parse_base_url(base_url)?
            .join("language/translate/v2")
            .map_err(|e| DigestError::Configuration(format!("translate endpoint: {e}")))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| DigestError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            api_key: api_key.into(),
        })
    }
}

impl Translator for GoogleTranslator {
    #[instrument(level = "info", skip(self, texts), fields(items = texts.len()))]
    async fn translate(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, DigestError> {
        let request = TranslateRequest {
            q: texts,
            target: target_language,
            format: "text",
        };

        let resp = self
            .http
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|source| DigestError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|source| DigestError::Transport {
            service: SERVICE,
            source,
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate_for_log(&body, 200));
            warn!(%status, %detail, "Translation request rejected");
            return Err(DigestError::upstream(SERVICE, format!("HTTP {status}: {detail}")));
        }

        let parsed: TranslateResponse = serde_json::from_str(&body).map_err(|e| {
            DigestError::upstream(
                SERVICE,
                format!("unreadable body: {e}; body: {}", truncate_for_log(&body, 200)),
            )
        })?;

        debug!(returned = parsed.data.translations.len(), "Translation response parsed");
        Ok(parsed
            .data
            .translations
            .into_iter()
            .map(|t| t.translatedText)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_translate_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/language/translate/v2"))
            .and(query_param("key", "gkey"))
            .and(body_json(json!({
                "q": ["Daily Brief", "World", "A", "B"],
                "target": "de",
                "format": "text"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"translations": [
                    {"translatedText": "Tagesüberblick", "detectedSourceLanguage": "en"},
                    {"translatedText": "Welt", "detectedSourceLanguage": "en"},
                    {"translatedText": "A", "detectedSourceLanguage": "en"},
                    {"translatedText": "B", "detectedSourceLanguage": "en"}
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let translator = GoogleTranslator::new("gkey", &server.uri()).unwrap();
        let out = translator
            .translate(&texts(&["Daily Brief", "World", "A", "B"]), "de")
            .await
            .unwrap();

        assert_eq!(out, ["Tagesüberblick", "Welt", "A", "B"]);
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "Invalid Value", "errors": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let translator = GoogleTranslator::new("gkey", &server.uri()).unwrap();
        let err = translator.translate(&texts(&["x"]), "zz").await.unwrap_err();

        match err {
            DigestError::Upstream { message, .. } => assert!(message.contains("Invalid Value")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let translator = GoogleTranslator::new("gkey", &server.uri()).unwrap();
        let err = translator.translate(&texts(&["x"]), "de").await.unwrap_err();

        assert!(matches!(err, DigestError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"data\": 5}"))
            .mount(&server)
            .await;

        let translator = GoogleTranslator::new("gkey", &server.uri()).unwrap();
        let err = translator.translate(&texts(&["x"]), "de").await.unwrap_err();

        assert!(matches!(err, DigestError::Upstream { .. }));
    }
}

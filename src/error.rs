//! Error taxonomy for the digest pipeline.
//!
//! Every stage returns [`DigestError`]. The variants map onto how far a
//! failure is allowed to travel:
//!
//! | Variant | Scope |
//! |---------|-------|
//! | [`DigestError::RateLimited`] | retried by the fetcher, then the section is skipped |
//! | [`DigestError::Transport`] | aborts the current digest |
//! | [`DigestError::Upstream`] | aborts the current digest |
//! | [`DigestError::TranslationMismatch`] | aborts the current digest |
//! | [`DigestError::Render`] / [`DigestError::Io`] | aborts the current digest |
//! | [`DigestError::Delivery`] | reported, the run continues |
//! | [`DigestError::Configuration`] | aborts the whole run before any network call |

use thiserror::Error;

/// Errors produced while building, translating, rendering or delivering a digest.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The news source answered with HTTP 429.
    #[error("rate limited while fetching section '{section}'")]
    RateLimited { section: String },

    /// Connection refused, timeout, DNS failure and similar.
    #[error("network error contacting {service}: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// A non-rate-limit error status or an unreadable body.
    #[error("{service} returned an error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// The translation service answered with the wrong number of items.
    #[error("translation returned {actual} items for a batch of {expected}")]
    TranslationMismatch { expected: usize, actual: usize },

    /// Missing or invalid settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The rendered email could not be delivered.
    #[error("email delivery failed: {0}")]
    Delivery(String),

    /// The email template could not be compiled or rendered.
    #[error("template error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DigestError {
    /// Whether the fetcher should back off and try again.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DigestError::RateLimited { .. })
    }

    pub(crate) fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        DigestError::Upstream {
            service,
            message: message.into(),
        }
    }
}

impl From<handlebars::RenderError> for DigestError {
    fn from(e: handlebars::RenderError) -> Self {
        DigestError::Render(e.to_string())
    }
}

impl From<handlebars::TemplateError> for DigestError {
    fn from(e: handlebars::TemplateError) -> Self {
        DigestError::Render(e.to_string())
    }
}

impl From<lettre::error::Error> for DigestError {
    fn from(e: lettre::error::Error) -> Self {
        DigestError::Delivery(e.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for DigestError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        DigestError::Delivery(e.to_string())
    }
}

impl From<lettre::address::AddressError> for DigestError {
    fn from(e: lettre::address::AddressError) -> Self {
        DigestError::Delivery(format!("invalid address: {e}"))
    }
}

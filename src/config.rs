//! Subscription file loading and startup validation.
//!
//! The subscriptions file is either a list
//!
//! ```json
//! {"subscriptions": [{"recipient_email": "a@example.com", "api_sections": ["world"], ...}]}
//! ```
//!
//! or a single subscription object (recognized by its `api_sections` key)
//! at the top level. A file with neither, or with `"subscriptions": null`,
//! yields no subscriptions.
//! YAML is accepted when the file ends in `.yaml` or `.yml`.
//!
//! Secrets never live in the file: they come from CLI flags or the
//! environment (see [`crate::cli::Cli`]) and are checked here, before any
//! network activity, so that a missing key stops the run immediately.

use crate::cli::Cli;
use crate::error::DigestError;
use crate::mailer::SmtpSettings;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;
use tracing::{info, instrument};

fn default_max_stories() -> usize {
    5
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_subject() -> String {
    "Your Daily News Digest - {date}".to_string()
}

fn default_title() -> String {
    "Daily Briefing".to_string()
}

/// One recipient group with its own sections, limits and language.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subscription {
    /// A single address or a list of addresses.
    #[serde(default, alias = "recipient_email", deserialize_with = "one_or_many")]
    pub recipients: Vec<String>,
    /// Top Stories sections, fetched and shown in this order.
    pub api_sections: Vec<String>,
    #[serde(default = "default_max_stories")]
    pub max_stories_per_section: usize,
    /// Target language code, e.g. `"de"`.
    pub target_language: String,
    /// Display name of the target language, e.g. `"Deutsch"`.
    pub target_language_name: String,
    /// Locale for the long date in the body, e.g. `"de_DE"`.
    #[serde(default = "default_locale")]
    pub email_locale: String,
    /// Subject line; `{date}` is replaced with `DD.MM.YYYY`.
    #[serde(default = "default_subject")]
    pub email_subject_template: String,
    /// Main title, translated along with the stories.
    #[serde(default = "default_title")]
    pub main_briefing_title: String,
    /// Fixed, already localized title shown instead of the translated one.
    #[serde(default)]
    pub main_briefing_title_localized: Option<String>,
}

impl Subscription {
    /// Name used in logs and dry-run file names.
    pub fn label(&self, position: usize) -> String {
        match self.recipients.first() {
            Some(first) => first.clone(),
            None => format!("Subscription_{}", position + 1),
        }
    }

    fn validate(&self, position: usize, require_recipients: bool) -> Result<(), DigestError> {
        let which = || format!("subscription {}", position + 1);
        if self.api_sections.is_empty() {
            return Err(DigestError::Configuration(format!(
                "{} has no api_sections",
                which()
            )));
        }
        if let Some(blank) = self.api_sections.iter().position(|s| s.trim().is_empty()) {
            return Err(DigestError::Configuration(format!(
                "{} has an empty section name at position {}",
                which(),
                blank + 1
            )));
        }
        if self.target_language.trim().is_empty() {
            return Err(DigestError::Configuration(format!(
                "{} has an empty target_language",
                which()
            )));
        }
        if require_recipients && self.recipients.is_empty() {
            return Err(DigestError::Configuration(format!(
                "{} has no recipients",
                which()
            )));
        }
        Ok(())
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Parse a subscriptions document. `yaml` selects the YAML parser.
pub fn parse_subscriptions(text: &str, yaml: bool) -> Result<Vec<Subscription>, DigestError> {
    let doc: Value = if yaml {
        serde_yaml::from_str(text)
            .map_err(|e| DigestError::Configuration(format!("invalid YAML: {e}")))?
    } else {
        serde_json::from_str(text)
            .map_err(|e| DigestError::Configuration(format!("invalid JSON: {e}")))?
    };

    let invalid = |e: serde_json::Error| DigestError::Configuration(format!("invalid subscription: {e}"));
    let Value::Object(mut map) = doc else {
        return Err(DigestError::Configuration(
            "subscriptions file must contain an object".to_string(),
        ));
    };

    if map.contains_key("api_sections") {
        return Ok(vec![
            serde_json::from_value(Value::Object(map)).map_err(invalid)?,
        ]);
    }

    // A missing or null list means there is nothing to send.
    match map.remove("subscriptions") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => serde_json::from_value(list).map_err(invalid),
    }
}

/// Read and parse the subscriptions file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_subscriptions(path: &Path) -> Result<Vec<Subscription>, DigestError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DigestError::Configuration(format!("cannot read {}: {e}", path.display()))
    })?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let subscriptions = parse_subscriptions(&text, yaml)?;
    info!(count = subscriptions.len(), "Loaded subscriptions");
    Ok(subscriptions)
}

/// Everything a run needs, validated up front.
#[derive(Debug, Clone)]
pub struct Settings {
    pub subscriptions: Vec<Subscription>,
    pub nyt_api_key: String,
    pub nyt_base_url: String,
    pub translate_api_key: String,
    pub translate_base_url: String,
    /// `None` in dry-run mode, where no mail is sent.
    pub smtp: Option<SmtpSettings>,
}

impl Settings {
    /// Combine the subscriptions file with secrets from the CLI/environment.
    ///
    /// # Errors
    ///
    /// [`DigestError::Configuration`] if the file is unreadable or invalid, a
    /// subscription fails validation, or a required secret is missing. Email
    /// credentials are only required when not in dry-run mode.
    pub fn from_cli(cli: &Cli) -> Result<Self, DigestError> {
        let subscriptions = load_subscriptions(&cli.config)?;
        Self::assemble(cli, subscriptions)
    }

    fn assemble(cli: &Cli, subscriptions: Vec<Subscription>) -> Result<Self, DigestError> {
        for (i, sub) in subscriptions.iter().enumerate() {
            sub.validate(i, !cli.dry_run)?;
        }

        let nyt_api_key = required(cli.nyt_api_key.as_deref(), "NYT_API_KEY")?;
        let translate_api_key =
            required(cli.translate_api_key.as_deref(), "GOOGLE_TRANSLATE_API_KEY")?;

        let smtp = if cli.dry_run {
            None
        } else {
            Some(SmtpSettings {
                host: cli.smtp_host.clone(),
                port: cli.smtp_port,
                username: required(cli.email_user.as_deref(), "EMAIL_HOST_USER")?,
                password: required(cli.email_password.as_deref(), "EMAIL_HOST_PASSWORD")?,
            })
        };

        Ok(Self {
            subscriptions,
            nyt_api_key,
            nyt_base_url: cli.nyt_base_url.clone(),
            translate_api_key,
            translate_base_url: cli.translate_base_url.clone(),
            smtp,
        })
    }
}

fn required(value: Option<&str>, name: &str) -> Result<String, DigestError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DigestError::Configuration(format!(
            "missing required setting '{name}'"
        ))),
    }
}

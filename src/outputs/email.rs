//! HTML email rendering.
//!
//! The page is a Handlebars template with four placeholders:
//!
//! | Placeholder | Content |
//! |-------------|---------|
//! | `{{briefing_title}}` | localized briefing title |
//! | `{{date}}` | long date in the subscription's locale |
//! | `{{{stories_html}}}` | the rendered sections (inserted unescaped) |
//! | `{{language_name}}` | display name of the target language |
//!
//! A built-in template is used unless a template file is supplied.

use crate::config::Subscription;
use crate::error::DigestError;
use crate::models::Digest;
use crate::outputs::RenderedEmail;
use crate::translate::TranslatedDigest;
use crate::utils::html_escape;
use chrono::{DateTime, Locale, TimeZone};
use handlebars::Handlebars;
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;
use tracing::{info, instrument, warn};

const TEMPLATE_NAME: &str = "email";
const DEFAULT_TEMPLATE: &str = include_str!("../../templates/email_template.html");

/// Values substituted into the page template.
#[derive(Debug, Serialize)]
pub struct EmailContext<'a> {
    pub briefing_title: &'a str,
    pub date: &'a str,
    pub stories_html: &'a str,
    pub language_name: &'a str,
}

/// Renders translated digests into emails.
#[derive(Debug)]
pub struct EmailRenderer {
    handlebars: Handlebars<'static>,
}

impl EmailRenderer {
    /// Renderer using the built-in template.
    pub fn new() -> Result<Self, DigestError> {
        Self::from_source(DEFAULT_TEMPLATE)
    }

    /// Renderer using the template stored at `path`.
    pub fn from_file(path: &Path) -> Result<Self, DigestError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            DigestError::Configuration(format!("cannot read template {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), "Loaded email template");
        Self::from_source(&source)
    }

    pub fn from_source(source: &str) -> Result<Self, DigestError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_template_string(TEMPLATE_NAME, source)?;
        Ok(Self { handlebars })
    }

    pub fn render_body(&self, ctx: &EmailContext<'_>) -> Result<String, DigestError> {
        Ok(self.handlebars.render(TEMPLATE_NAME, ctx)?)
    }

    /// Build the subject and body for one subscription.
    #[instrument(level = "info", skip_all, fields(language = %subscription.target_language))]
    pub fn render_email<Tz>(
        &self,
        subscription: &Subscription,
        translated: &TranslatedDigest,
        now: &DateTime<Tz>,
    ) -> Result<RenderedEmail, DigestError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let date = format_long_date(now, &subscription.email_locale);
        let stories_html = stories_html(&translated.digest);
        let briefing_title = subscription
            .main_briefing_title_localized
            .as_deref()
            .unwrap_or(&translated.title);

        let html = self.render_body(&EmailContext {
            briefing_title,
            date: &date,
            stories_html: &stories_html,
            language_name: &subscription.target_language_name,
        })?;
        let subject = render_subject(&subscription.email_subject_template, now);

        info!(%subject, bytes = html.len(), "Rendered email");
        Ok(RenderedEmail { subject, html })
    }
}

/// Render every section as an `<h2>` followed by its stories.
pub fn stories_html(digest: &Digest) -> String {
    let mut html = String::new();
    for section in digest.sections() {
        html.push_str(&format!("<h2>{}</h2>", html_escape(&section.key)));
        for story in &section.stories {
            html.push_str(&format!(
                r#"
            <div class="story">
                <div class="story-title"><a href="{url}">{title}</a></div>
                <div class="story-abstract">{abstract_text}</div>
                <div class="story-byline">{byline}</div>
            </div>
            "#,
                url = html_escape(&story.url),
                title = html_escape(&story.title),
                abstract_text = html_escape(&story.abstract_text),
                byline = html_escape(&story.byline),
            ));
        }
    }
    html
}

/// Long date such as "October 19, 2026", with month names in `locale`.
///
/// `locale` may carry an encoding or modifier suffix (`de_DE.UTF-8`,
/// `ca_ES@valencia`); only the language/territory part is used. Unknown
/// locales fall back to ISO `YYYY-MM-DD`.
pub fn format_long_date<Tz>(when: &DateTime<Tz>, locale: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let name = locale.split(['.', '@']).next().unwrap_or(locale);
    match Locale::try_from(name) {
        Ok(loc) => when.format_localized("%B %d, %Y", loc).to_string(),
        Err(_) => {
            warn!(%locale, "Locale not found; falling back to default date format");
            when.format("%Y-%m-%d").to_string()
        }
    }
}

/// Fill the `{date}` placeholder of a subject template (`DD.MM.YYYY`).
pub fn render_subject<Tz>(template: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    template.replace("{date}", &now.format("%d.%m.%Y").to_string())
}

//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets can be provided via command-line flags or environment variables
//! (a `.env` file in the working directory is loaded first).

use clap::Parser;
use std::path::PathBuf;

use crate::mailer::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT};
use crate::sources::nyt;
use crate::translate::google;

/// Command-line arguments for the digest service.
///
/// # Examples
///
/// ```sh
/// # Send every configured digest
/// translated_news_digest --config config.json
///
/// # Render into ./out without sending anything
/// translated_news_digest --dry-run -o ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Write each rendered email to a local HTML file instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Path to the subscriptions file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Optional path to a Handlebars email template
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Directory for dry-run output files
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// New York Times API key
    #[arg(long, env = "NYT_API_KEY", hide_env_values = true)]
    pub nyt_api_key: Option<String>,

    /// Google Cloud Translation API key
    #[arg(long, env = "GOOGLE_TRANSLATE_API_KEY", hide_env_values = true)]
    pub translate_api_key: Option<String>,

    /// SMTP login, also used as the sender address
    #[arg(long, env = "EMAIL_HOST_USER")]
    pub email_user: Option<String>,

    /// SMTP password (for Gmail, an app password)
    #[arg(long, env = "EMAIL_HOST_PASSWORD", hide_env_values = true)]
    pub email_password: Option<String>,

    /// SMTP relay host
    #[arg(long, env = "SMTP_HOST", default_value = DEFAULT_SMTP_HOST)]
    pub smtp_host: String,

    /// SMTP relay port (STARTTLS)
    #[arg(long, env = "SMTP_PORT", default_value_t = DEFAULT_SMTP_PORT)]
    pub smtp_port: u16,

    /// Base URL of the Top Stories API
    #[arg(long, env = "NYT_API_BASE_URL", default_value = nyt::DEFAULT_BASE_URL)]
    pub nyt_base_url: String,

    /// Base URL of the translation API
    #[arg(long, env = "TRANSLATE_API_BASE_URL", default_value = google::DEFAULT_BASE_URL)]
    pub translate_base_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["translated_news_digest"]);

        assert!(!cli.dry_run);
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert!(cli.template.is_none());
    }

    #[test]
    fn test_cli_dry_run_and_short_flags() {
        let cli = Cli::parse_from([
            "translated_news_digest",
            "--dry-run",
            "-c",
            "/etc/digest/subs.yaml",
            "-t",
            "tpl.html",
            "-o",
            "/tmp/out",
        ]);

        assert!(cli.dry_run);
        assert_eq!(cli.config, PathBuf::from("/etc/digest/subs.yaml"));
        assert_eq!(cli.template, Some(PathBuf::from("tpl.html")));
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_cli_secret_flags() {
        let cli = Cli::parse_from([
            "translated_news_digest",
            "--nyt-api-key",
            "n",
            "--translate-api-key",
            "g",
            "--smtp-port",
            "2525",
        ]);

        assert_eq!(cli.nyt_api_key.as_deref(), Some("n"));
        assert_eq!(cli.translate_api_key.as_deref(), Some("g"));
        assert_eq!(cli.smtp_port, 2525);
    }
}

//! Dry-run delivery: save the rendered body instead of emailing it.

use crate::error::DigestError;
use crate::outputs::{Delivery, DeliveryReceipt, RenderedEmail};
use crate::utils::safe_file_stem;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Writes each digest to `{output_dir}/dry_run_{label}.html`.
#[derive(Debug, Clone)]
pub struct DryRunWriter {
    output_dir: PathBuf,
}

impl DryRunWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Where the body for `label` ends up.
    pub fn path_for(&self, label: &str) -> PathBuf {
        self.output_dir
            .join(format!("dry_run_{}.html", safe_file_stem(label)))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl Delivery for DryRunWriter {
    #[instrument(level = "info", skip(self, email), fields(subject = %email.subject))]
    async fn deliver(
        &self,
        email: &RenderedEmail,
        recipients: &[String],
        label: &str,
    ) -> Result<DeliveryReceipt, DigestError> {
        let path = self.path_for(label);
        fs::write(&path, &email.html).await?;
        info!(path = %path.display(), "DRY RUN: email content saved");
        Ok(DeliveryReceipt::Written(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_writes_sanitized_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DryRunWriter::new(dir.path());
        let email = RenderedEmail {
            subject: "Digest 19.10.2026".to_string(),
            html: "<p>hello</p>".to_string(),
        };

        let receipt = writer
            .deliver(&email, &["jane.doe@example.com".to_string()], "jane.doe@example.com")
            .await
            .unwrap();

        let expected = dir.path().join("dry_run_jane_doe_example_com.html");
        assert_eq!(receipt, DeliveryReceipt::Written(expected.clone()));
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "<p>hello</p>");
    }

    #[tokio::test]
    async fn test_dry_run_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DryRunWriter::new(dir.path().join("missing"));
        let email = RenderedEmail {
            subject: String::new(),
            html: String::new(),
        };

        let err = writer.deliver(&email, &[], "x").await.unwrap_err();
        assert!(matches!(err, DigestError::Io(_)));
    }
}

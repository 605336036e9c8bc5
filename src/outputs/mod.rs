//! Rendering and delivery of finished digests.
//!
//! # Submodules
//!
//! - [`email`]: Renders a translated digest into a subject line and HTML body
//! - [`dry_run`]: Writes rendered bodies to local files instead of mailing them
//!
//! SMTP delivery lives in [`crate::mailer`]; both it and
//! [`dry_run::DryRunWriter`] implement [`Delivery`], so the pipeline does not
//! care which one it was given.
//!
//! # Output Structure (dry run)
//!
//! ```text
//! output_dir/
//! ├── dry_run_jane_doe_example_com.html
//! └── dry_run_Subscription_2.html
//! ```

pub mod dry_run;
pub mod email;

use crate::error::DigestError;
use std::path::PathBuf;

/// A fully rendered email, ready to be sent or saved.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// What a [`Delivery`] did with an email.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryReceipt {
    /// Handed to the mail server for this many recipients.
    Sent { recipients: usize },
    /// Written to a local file.
    Written(PathBuf),
}

/// Final destination of a rendered digest.
pub trait Delivery {
    /// Deliver `email` to `recipients`. `label` names the subscription in
    /// logs and file names.
    async fn deliver(
        &self,
        email: &RenderedEmail,
        recipients: &[String],
        label: &str,
    ) -> Result<DeliveryReceipt, DigestError>;
}

//! Email delivery over SMTP with STARTTLS.

use crate::error::DigestError;
use crate::outputs::{Delivery, DeliveryReceipt, RenderedEmail};
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

/// Default Gmail SMTP host.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP connection and login settings.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Login name, also used as the sender address.
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sends rendered digests through an SMTP relay.
#[derive(Debug, Clone)]
pub struct Mailer {
    settings: SmtpSettings,
}

impl Mailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// Build a multipart/alternative HTML message addressed to every recipient.
    pub fn build_message(
        &self,
        email: &RenderedEmail,
        recipients: &[String],
    ) -> Result<Message, DigestError> {
        if recipients.is_empty() {
            return Err(DigestError::Delivery("no recipients".to_string()));
        }

        let from: Mailbox = self.settings.username.parse()?;
        let mut builder = Message::builder().from(from).subject(email.subject.as_str());
        for recipient in recipients {
            let to: Mailbox = recipient.parse()?;
            builder = builder.to(to);
        }

        let message = builder.multipart(
            MultiPart::alternative().singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(email.html.clone()),
            ),
        )?;
        Ok(message)
    }
}

impl Delivery for Mailer {
    #[instrument(level = "info", skip(self, email), fields(subject = %email.subject))]
    async fn deliver(
        &self,
        email: &RenderedEmail,
        recipients: &[String],
        label: &str,
    ) -> Result<DeliveryReceipt, DigestError> {
        let message = self.build_message(email, recipients)?;

        let creds = Credentials::new(
            self.settings.username.clone(),
            self.settings.password.clone(),
        );
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.host)?
                .port(self.settings.port)
                .credentials(creds)
                .build();

        info!(host = %self.settings.host, port = self.settings.port, "Sending email");
        mailer.send(message).await?;

        info!(recipients = recipients.len(), "Email sent successfully");
        Ok(DeliveryReceipt::Sent {
            recipients: recipients.len(),
        })
    }
}

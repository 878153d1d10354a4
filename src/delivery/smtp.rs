//! Delivery through a direct SMTP session.

use std::str::FromStr;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{
    pick_recipient, render_body, render_subject, Artifact, DeliveryChannel, DeliveryError,
    DeliveryReport, Notice,
};
use crate::letter::common::DOCX_MIME;
use crate::letter::{LetterContext, SavedLetter, Submission};

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (usually port 587).
    StartTls,
    /// Implicit TLS (usually port 465).
    Tls,
    /// No encryption. Local relays and tests only.
    None,
}

impl FromStr for SmtpSecurity {
    type Err = DeliveryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" | "ssl" => Ok(Self::Tls),
            "none" | "plain" => Ok(Self::None),
            other => Err(DeliveryError::Config(format!(
                "unknown SMTP_TLS value '{}' (expected starttls, tls or none)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security: SmtpSecurity,
    pub from: String,
    pub default_to: Option<String>,
    pub subject: String,
}

pub struct SmtpChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl SmtpChannel {
    pub fn new(config: SmtpConfig) -> Result<Self, DeliveryError> {
        let builder = match config.security {
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| DeliveryError::Smtp(e.to_string()))?
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| DeliveryError::Smtp(e.to_string()))?,
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
        };

        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        // Sender must parse up front so a bad EMAIL_FROM fails at startup.
        parse_mailbox(&config.from)?;

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }

    /// Multipart message: a short text body plus the Word document.
    pub fn build_message(
        &self,
        to: &str,
        filename: &str,
        docx: Vec<u8>,
        context: &LetterContext,
    ) -> Result<Message, DeliveryError> {
        let content_type =
            ContentType::parse(DOCX_MIME).map_err(|e| DeliveryError::Message(e.to_string()))?;

        Message::builder()
            .from(parse_mailbox(&self.config.from)?)
            .to(parse_mailbox(to)?)
            .subject(render_subject(&self.config.subject, context))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(render_body(context)))
                    .singlepart(Attachment::new(filename.to_string()).body(docx, content_type)),
            )
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }

    async fn send(
        &self,
        letter: &SavedLetter,
        submission: &Submission,
        context: &LetterContext,
    ) -> Result<String, DeliveryError> {
        let to = pick_recipient(submission, self.config.default_to.as_deref())?;
        let docx = tokio::fs::read(&letter.docx_path).await?;
        let message = self.build_message(&to, &letter.docx_filename(), docx, context)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        Ok(to)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse::<Mailbox>()
        .map_err(|_| DeliveryError::Address(address.to_string()))
}

#[async_trait]
impl DeliveryChannel for SmtpChannel {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn deliver(
        &self,
        letter: &SavedLetter,
        submission: &Submission,
        context: &LetterContext,
    ) -> DeliveryReport {
        let report = DeliveryReport::new().artifact(Artifact::docx(letter));

        match self.send(letter, submission, context).await {
            Ok(to) => {
                log::info!("Emailed {} to {} via SMTP", letter.docx_filename(), to);
                report.notice(Notice::success(format!("Letter emailed to {}.", to)))
            }
            Err(e) => {
                log::error!("SMTP delivery failed for {}: {}", letter.docx_filename(), e);
                report.notice(Notice::error(format!("Failed to send email: {}", e)))
            }
        }
    }
}

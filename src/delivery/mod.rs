//! Delivery channels: how a rendered letter reaches the user.
//!
//! Every channel offers the Word document for download. On top of that a
//! channel may convert it to PDF or send it by email. Failures of those extra
//! steps never abort the request; they are turned into notices.

pub mod artifact;
pub mod download;
pub mod email_api;
pub mod smtp;

pub use artifact::{Artifact, FileKind};
pub use download::DownloadChannel;
pub use email_api::{EmailApiChannel, EmailApiConfig};
pub use smtp::{SmtpChannel, SmtpConfig, SmtpSecurity};

use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::letter::{LetterContext, SavedLetter, Submission};

/// Errors raised while transmitting a letter.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid delivery configuration: {0}")]
    Config(String),
    #[error("no recipient email address was provided")]
    MissingRecipient,
    #[error("invalid email address '{0}'")]
    Address(String),
    #[error("failed to read letter: {0}")]
    Io(#[from] std::io::Error),
    #[error("email API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("email API rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("failed to build email: {0}")]
    Message(String),
    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A status message shown next to the result.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Outcome of one delivery: what can be downloaded plus what to tell the user.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub artifacts: Vec<Artifact>,
    pub notices: Vec<Notice>,
}

impl DeliveryReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }

    pub fn has_pdf(&self) -> bool {
        self.artifacts.iter().any(Artifact::is_pdf)
    }
}

/// A strategy for handing a saved letter to its recipient.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver the letter. Never fails: problems become notices in the report.
    async fn deliver(
        &self,
        letter: &SavedLetter,
        submission: &Submission,
        context: &LetterContext,
    ) -> DeliveryReport;
}

/// Which delivery channel the server runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Offer the Word document only.
    Download,
    /// Convert to PDF and offer both files.
    Pdf,
    /// Send through a transactional email HTTP API.
    EmailApi,
    /// Send through an SMTP server.
    Smtp,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Pdf => "pdf",
            Self::EmailApi => "email-api",
            Self::Smtp => "smtp",
        }
    }
}

impl FromStr for DeliveryMode {
    type Err = DeliveryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "download" | "docx" => Ok(Self::Download),
            "pdf" | "convert" => Ok(Self::Pdf),
            "email-api" | "email_api" | "api" => Ok(Self::EmailApi),
            "smtp" => Ok(Self::Smtp),
            other => Err(DeliveryError::Config(format!(
                "unknown delivery mode '{}' (expected download, pdf, email-api or smtp)",
                other
            ))),
        }
    }
}

/// Subject line with `{name}` replaced by the student's name.
pub(crate) fn render_subject(template: &str, context: &LetterContext) -> String {
    template.replace("{name}", &context.name)
}

/// Plain-text body used when the relay has no template of its own.
pub(crate) fn render_body(context: &LetterContext) -> String {
    format!(
        "Please find attached the recommendation letter for {} ({}), dated {}.",
        context.name, context.university, context.date
    )
}

/// The explicit recipient from the form, else the configured default.
pub(crate) fn pick_recipient(
    submission: &Submission,
    default_to: Option<&str>,
) -> Result<String, DeliveryError> {
    submission
        .recipient_email
        .clone()
        .or_else(|| default_to.map(str::to_string))
        .ok_or(DeliveryError::MissingRecipient)
}

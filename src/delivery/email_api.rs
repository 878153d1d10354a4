//! Delivery through a transactional email HTTP API.
//!
//! The request follows the SendGrid v3 `mail/send` shape: bearer API key,
//! base64 attachment, and either a dynamic template fed with the letter
//! context or a plain-text body.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use super::{
    pick_recipient, render_body, render_subject, Artifact, DeliveryChannel, DeliveryError,
    DeliveryReport, Notice,
};
use crate::letter::common::DOCX_MIME;
use crate::letter::{LetterContext, SavedLetter, Submission};

pub const DEFAULT_EMAIL_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Clone)]
pub struct EmailApiConfig {
    pub url: String,
    pub api_key: String,
    pub from: String,
    pub default_to: Option<String>,
    pub subject: String,
    pub template_id: Option<String>,
    pub timeout: Duration,
}

pub struct EmailApiChannel {
    client: reqwest::Client,
    config: EmailApiConfig,
}

impl EmailApiChannel {
    pub fn new(config: EmailApiConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// JSON body for one message carrying the letter as an attachment.
    pub fn build_payload(
        &self,
        to: &str,
        filename: &str,
        docx: &[u8],
        context: &LetterContext,
    ) -> Value {
        let mut personalization = json!({ "to": [{ "email": to }] });
        let mut payload = json!({
            "from": { "email": self.config.from },
            "subject": render_subject(&self.config.subject, context),
            "attachments": [{
                "content": BASE64.encode(docx),
                "filename": filename,
                "type": DOCX_MIME,
                "disposition": "attachment",
            }],
        });

        match &self.config.template_id {
            Some(template_id) => {
                personalization["dynamic_template_data"] = json!(context);
                payload["template_id"] = json!(template_id);
            }
            None => {
                payload["content"] = json!([{ "type": "text/plain", "value": render_body(context) }]);
            }
        }

        payload["personalizations"] = json!([personalization]);
        payload
    }

    async fn send(
        &self,
        letter: &SavedLetter,
        submission: &Submission,
        context: &LetterContext,
    ) -> Result<String, DeliveryError> {
        let to = pick_recipient(submission, self.config.default_to.as_deref())?;
        let docx = tokio::fs::read(&letter.docx_path).await?;
        let payload = self.build_payload(&to, &letter.docx_filename(), &docx, context);

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(to)
    }
}

#[async_trait]
impl DeliveryChannel for EmailApiChannel {
    fn name(&self) -> &'static str {
        "email-api"
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
                log::info!("Emailed {} to {} via API", letter.docx_filename(), to);
                report.notice(Notice::success(format!("Letter emailed to {}.", to)))
            }
            Err(e) => {
                log::error!("Email API delivery failed for {}: {}", letter.docx_filename(), e);
                report.notice(Notice::error(format!("Failed to send email: {}", e)))
            }
        }
    }
}

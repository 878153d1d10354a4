//! Environment-based configuration.
//!
//! Values are read from the process environment after loading `.env` (if any).
//! Credentials are treated as opaque strings and handed to the relay as is.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::delivery::email_api::DEFAULT_EMAIL_API_URL;
use crate::delivery::{
    DeliveryChannel, DeliveryError, DeliveryMode, DownloadChannel, EmailApiChannel,
    EmailApiConfig, SmtpChannel, SmtpConfig, SmtpSecurity,
};
use crate::letter::{DocumentConverter, LibreOfficeConverter, PandocConverter, TemplateStore};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Which external tool converts DOCX to PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    Pandoc,
    LibreOffice,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub template_dir: PathBuf,
    pub male_template: String,
    pub female_template: String,
    pub scratch_dir: Option<PathBuf>,
    pub delivery_mode: DeliveryMode,
    pub converter: ConverterKind,
    pub pandoc_path: String,
    pub pdf_engine: String,
    pub soffice_path: String,
    pub download_ttl: Duration,
    pub allowed_origins: Vec<String>,
    pub email_from: Option<String>,
    pub email_to: Option<String>,
    pub email_subject: String,
    pub email_timeout: Duration,
    pub email_api_url: String,
    pub email_api_key: Option<String>,
    pub email_api_template_id: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_security: SmtpSecurity,
}

impl AppConfig {
    /// Load `.env` and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from explicit key/value pairs, ignoring the process environment.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let delivery_mode = get_or("DELIVERY_MODE", "pdf").parse::<DeliveryMode>()?;
        let converter = match get_or("PDF_CONVERTER", "pandoc").to_lowercase().as_str() {
            "pandoc" => ConverterKind::Pandoc,
            "libreoffice" | "soffice" => ConverterKind::LibreOffice,
            other => {
                return Err(ConfigError::Invalid {
                    name: "PDF_CONVERTER",
                    value: other.to_string(),
                })
            }
        };

        let config = Self {
            host: get_or("HOST", "0.0.0.0"),
            port: parse_number(&get, "PORT", 8080)?,
            template_dir: PathBuf::from(get_or("TEMPLATE_DIR", "./templates")),
            male_template: get_or("MALE_TEMPLATE", "Male.docx"),
            female_template: get_or("FEMALE_TEMPLATE", "Female.docx"),
            scratch_dir: get("LETTER_TMP_DIR").map(PathBuf::from),
            delivery_mode,
            converter,
            pandoc_path: get_or("PANDOC_PATH", "pandoc"),
            pdf_engine: get_or("PDF_ENGINE", "xelatex"),
            soffice_path: get_or("SOFFICE_PATH", "soffice"),
            download_ttl: Duration::from_secs(parse_number(&get, "DOWNLOAD_TTL_SECS", 3600)?),
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            email_from: get("EMAIL_FROM"),
            email_to: get("EMAIL_TO"),
            email_subject: get_or("EMAIL_SUBJECT", "Recommendation Letter for {name}"),
            email_timeout: Duration::from_secs(parse_number(&get, "EMAIL_TIMEOUT_SECS", 30)?),
            email_api_url: get_or("EMAIL_API_URL", DEFAULT_EMAIL_API_URL),
            email_api_key: get("EMAIL_API_KEY"),
            email_api_template_id: get("EMAIL_API_TEMPLATE_ID"),
            smtp_host: get("SMTP_HOST"),
            smtp_port: parse_number(&get, "SMTP_PORT", 587)?,
            smtp_user: get("SMTP_USER"),
            smtp_password: get("SMTP_PASSWORD"),
            smtp_security: get_or("SMTP_TLS", "starttls").parse::<SmtpSecurity>()?,
        };

        config.check_delivery_settings()?;
        Ok(config)
    }

    fn check_delivery_settings(&self) -> Result<(), ConfigError> {
        match self.delivery_mode {
            DeliveryMode::EmailApi => {
                self.email_api_key.as_ref().ok_or(ConfigError::Missing("EMAIL_API_KEY"))?;
                self.email_from.as_ref().ok_or(ConfigError::Missing("EMAIL_FROM"))?;
            }
            DeliveryMode::Smtp => {
                self.smtp_host.as_ref().ok_or(ConfigError::Missing("SMTP_HOST"))?;
                self.email_from.as_ref().ok_or(ConfigError::Missing("EMAIL_FROM"))?;
            }
            DeliveryMode::Download | DeliveryMode::Pdf => {}
        }
        Ok(())
    }

    pub fn template_store(&self) -> TemplateStore {
        TemplateStore::new(
            self.template_dir.clone(),
            self.male_template.clone(),
            self.female_template.clone(),
        )
    }

    pub fn converter(&self) -> Arc<dyn DocumentConverter> {
        match self.converter {
            ConverterKind::Pandoc => {
                Arc::new(PandocConverter::new(&self.pandoc_path, &self.pdf_engine))
            }
            ConverterKind::LibreOffice => Arc::new(LibreOfficeConverter::new(&self.soffice_path)),
        }
    }

    /// Build the delivery channel selected by `DELIVERY_MODE`.
    pub fn delivery_channel(&self) -> Result<Arc<dyn DeliveryChannel>, ConfigError> {
        let channel: Arc<dyn DeliveryChannel> = match self.delivery_mode {
            DeliveryMode::Download => Arc::new(DownloadChannel::plain()),
            DeliveryMode::Pdf => Arc::new(DownloadChannel::with_converter(self.converter())),
            DeliveryMode::EmailApi => Arc::new(EmailApiChannel::new(EmailApiConfig {
                url: self.email_api_url.clone(),
                api_key: self
                    .email_api_key
                    .clone()
                    .ok_or(ConfigError::Missing("EMAIL_API_KEY"))?,
                from: self.email_from.clone().ok_or(ConfigError::Missing("EMAIL_FROM"))?,
                default_to: self.email_to.clone(),
                subject: self.email_subject.clone(),
                template_id: self.email_api_template_id.clone(),
                timeout: self.email_timeout,
            })?),
            DeliveryMode::Smtp => Arc::new(SmtpChannel::new(SmtpConfig {
                host: self.smtp_host.clone().ok_or(ConfigError::Missing("SMTP_HOST"))?,
                port: self.smtp_port,
                username: self.smtp_user.clone(),
                password: self.smtp_password.clone(),
                security: self.smtp_security,
                from: self.email_from.clone().ok_or(ConfigError::Missing("EMAIL_FROM"))?,
                default_to: self.email_to.clone(),
                subject: self.email_subject.clone(),
            })?),
        };
        Ok(channel)
    }
}

fn parse_number<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

//! Shared application state.

use std::sync::Arc;

use crate::config::{AppConfig, ConfigError};
use crate::delivery::DeliveryMode;
use crate::downloads::DownloadRegistry;
use crate::letter::{LetterRenderEngine, LetterService};

#[derive(Clone)]
pub struct AppState {
    pub letters: Arc<LetterService>,
    pub downloads: DownloadRegistry,
    /// Whether the form should ask for a recipient address.
    pub collects_recipient: bool,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let channel = config.delivery_channel()?;
        let service = LetterService::new(
            config.template_store(),
            LetterRenderEngine::new(config.scratch_dir.clone()),
            channel,
        );

        let collects_recipient = matches!(
            config.delivery_mode,
            DeliveryMode::EmailApi | DeliveryMode::Smtp
        );

        Ok(Self::with_service(
            service,
            DownloadRegistry::new(config.download_ttl),
            collects_recipient,
        ))
    }

    pub fn with_service(
        service: LetterService,
        downloads: DownloadRegistry,
        collects_recipient: bool,
    ) -> Self {
        Self {
            letters: Arc::new(service),
            downloads,
            collects_recipient,
        }
    }
}

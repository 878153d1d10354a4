//! Direct download, optionally with a converted PDF alongside the Word file.

use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;

use super::{Artifact, DeliveryChannel, DeliveryReport, Notice};
use crate::letter::{DocumentConverter, LetterContext, SavedLetter, Submission};

pub struct DownloadChannel {
    converter: Option<Arc<dyn DocumentConverter>>,
}

impl DownloadChannel {
    /// Offer the Word document only.
    pub fn plain() -> Self {
        Self { converter: None }
    }

    /// Offer the Word document plus a PDF made by `converter`, when it succeeds.
    pub fn with_converter(converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            converter: Some(converter),
        }
    }

    async fn convert(
        converter: Arc<dyn DocumentConverter>,
        letter: &SavedLetter,
    ) -> Result<Artifact, String> {
        let docx = letter.docx_path.clone();
        let pdf = letter.pdf_path();
        let target = pdf.clone();

        web::block(move || converter.convert_to_pdf(&docx, &target))
            .await
            .map_err(|e| e.to_string())?
            .map_err(|e| e.to_string())?;

        Artifact::from_path(&pdf).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl DeliveryChannel for DownloadChannel {
    fn name(&self) -> &'static str {
        if self.converter.is_some() {
            "pdf"
        } else {
            "download"
        }
    }

    async fn deliver(
        &self,
        letter: &SavedLetter,
        _submission: &Submission,
        _context: &LetterContext,
    ) -> DeliveryReport {
        let report = DeliveryReport::new().artifact(Artifact::docx(letter));

        let converter = match &self.converter {
            Some(converter) => converter.clone(),
            None => return report,
        };

        log::info!(
            "Converting {} to PDF with {}",
            letter.docx_filename(),
            converter.name()
        );

        match Self::convert(converter, letter).await {
            Ok(pdf) => {
                log::info!("PDF ready: {} ({} bytes)", pdf.filename, pdf.size_bytes);
                report.artifact(pdf)
            }
            Err(e) => {
                log::warn!("PDF conversion failed for {}: {}", letter.docx_filename(), e);
                report
                    .notice(Notice::warning(format!("PDF conversion failed: {}", e)))
                    .notice(Notice::info(
                        "The Word document has been generated successfully.",
                    ))
            }
        }
    }
}

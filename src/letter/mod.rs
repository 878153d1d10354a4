//! Letter module - business logic for turning a form submission into a filled document.
//!
//! The pipeline is split into small pieces:
//! - `validation` - non-empty checks with user-facing messages
//! - `submission` - the transient submission and its substitution context
//! - `template` - DOCX placeholder substitution
//! - `engine` - writing the rendered document into a fresh temporary directory
//! - `converter` - external DOCX to PDF converters
//! - `service` - the linear pipeline tying everything to a delivery channel

pub mod common;
pub mod converter;
pub mod engine;
pub mod service;
pub mod submission;
pub mod template;
pub mod traits;
pub mod validation;

pub use converter::{ConversionError, DocumentConverter, LibreOfficeConverter, PandocConverter};
pub use engine::{LetterRenderEngine, SavedLetter};
pub use service::{GeneratedLetter, LetterService};
pub use submission::{LetterContext, LetterForm, Submission, TemplateKind};
pub use template::{DocxTemplate, TemplateStore};
pub use traits::Validator;
pub use validation::{ValidationError, ValidationErrors};

use thiserror::Error;

/// Errors that can occur while producing a letter.
#[derive(Debug, Error)]
pub enum LetterError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("Template file '{0}' not found. Please upload or place it in the template directory.")]
    TemplateNotFound(String),
    #[error("failed to read template: {0}")]
    TemplateIo(#[source] std::io::Error),
    #[error("template is not a valid DOCX archive: {0}")]
    TemplateArchive(#[from] zip::result::ZipError),
    #[error("template part '{0}' is not valid UTF-8")]
    TemplateEncoding(String),
    #[error("template part '{part}' is not well-formed XML: {source}")]
    TemplateXml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write document: {0}")]
    WriteDocument(#[source] std::io::Error),
    #[error("background task failed: {0}")]
    Blocking(String),
}

impl From<ValidationErrors> for LetterError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

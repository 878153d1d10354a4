//! Files produced for a submission and their MIME types.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::letter::common::{DOCX_MIME, PDF_MIME};
use crate::letter::SavedLetter;

/// Kinds of file the service hands out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileKind {
    Docx,
    Pdf,
    Unknown,
}

impl FileKind {
    /// Get MIME type for this kind.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Docx => DOCX_MIME,
            Self::Pdf => PDF_MIME,
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Parse from filename.
    pub fn from_filename(filename: &str) -> Self {
        match Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("docx") => Self::Docx,
            Some("pdf") => Self::Pdf,
            _ => Self::Unknown,
        }
    }
}

/// A file offered to the user.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub filename: String,
    pub mime_type: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Creation timestamp in ISO8601 format
    pub created_at: String,
}

impl Artifact {
    /// Describe an existing file; the MIME type follows its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let size_bytes = std::fs::metadata(path)?.len();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            mime_type: FileKind::from_filename(&filename).mime_type().to_string(),
            filename,
            path: path.to_path_buf(),
            size_bytes,
            created_at: Utc::now().to_rfc3339(),
        })
    }

    /// The Word document of a saved letter.
    pub fn docx(letter: &SavedLetter) -> Self {
        Self {
            filename: letter.docx_filename(),
            mime_type: DOCX_MIME.to_string(),
            path: letter.docx_path.clone(),
            size_bytes: letter.size_bytes as u64,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME
    }
}

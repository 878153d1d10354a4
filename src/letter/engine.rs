//! Document output engine.
//!
//! Handles writing a rendered letter into a freshly generated temporary
//! directory. The directory is never removed by this crate; download links
//! read from it for as long as the process runs.

use std::fs;
use std::path::PathBuf;

use super::common::letter_basename;
use super::LetterError;

/// A rendered letter that has been written to disk.
#[derive(Debug, Clone)]
pub struct SavedLetter {
    pub dir: PathBuf,
    pub basename: String,
    pub docx_path: PathBuf,
    pub size_bytes: usize,
}

impl SavedLetter {
    pub fn docx_filename(&self) -> String {
        format!("{}.docx", self.basename)
    }

    pub fn pdf_filename(&self) -> String {
        format!("{}.pdf", self.basename)
    }

    /// Sibling path where a converted PDF is expected.
    pub fn pdf_path(&self) -> PathBuf {
        self.dir.join(self.pdf_filename())
    }
}

/// Writes rendered documents under a scratch root (system temp dir by default).
#[derive(Debug, Clone, Default)]
pub struct LetterRenderEngine {
    root: Option<PathBuf>,
}

impl LetterRenderEngine {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Save DOCX bytes as `{student}_{university}.docx` in a new temp directory.
    pub fn save(
        &self,
        docx: &[u8],
        student_name: &str,
        university: &str,
    ) -> Result<SavedLetter, LetterError> {
        let dir = self.create_dir()?;
        let basename = letter_basename(student_name, university);
        let docx_path = dir.join(format!("{}.docx", basename));

        fs::write(&docx_path, docx).map_err(LetterError::WriteDocument)?;
        log::debug!("Saved letter to {}", docx_path.display());

        Ok(SavedLetter {
            dir,
            basename,
            docx_path,
            size_bytes: docx.len(),
        })
    }

    fn create_dir(&self) -> Result<PathBuf, LetterError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("letter-");

        let temp_dir = match self.root.as_deref() {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(LetterError::TempDir)?;

        Ok(temp_dir.keep())
    }
}

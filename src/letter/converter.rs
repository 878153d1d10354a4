//! External DOCX to PDF converters.
//!
//! Both converters shell out to a command-line tool and block until it exits,
//! so callers run them on the blocking pool.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

/// Errors raised by a conversion attempt.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("could not launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with status {code}: {stderr}")]
    Exit {
        program: String,
        code: i32,
        stderr: String,
    },
    #[error("{program} finished but produced no output at {}", path.display())]
    MissingOutput { program: String, path: PathBuf },
}

/// A tool that turns a DOCX file into a PDF file.
pub trait DocumentConverter: Send + Sync {
    /// Short name used in logs and messages.
    fn name(&self) -> &'static str;

    /// Convert `docx` into `pdf`. The PDF must exist when this returns `Ok`.
    fn convert_to_pdf(&self, docx: &Path, pdf: &Path) -> Result<(), ConversionError>;

    /// Whether the underlying tool can be launched at all.
    fn is_available(&self) -> bool;
}

/// Converter backed by pandoc and a LaTeX PDF engine.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: String,
    pdf_engine: String,
}

impl PandocConverter {
    pub fn new(program: impl Into<String>, pdf_engine: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            pdf_engine: pdf_engine.into(),
        }
    }

    fn args(&self, docx: &Path, pdf: &Path) -> Vec<String> {
        vec![
            docx.display().to_string(),
            "-o".to_string(),
            pdf.display().to_string(),
            "--standalone".to_string(),
            format!("--pdf-engine={}", self.pdf_engine),
        ]
    }
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new("pandoc", "xelatex")
    }
}

impl DocumentConverter for PandocConverter {
    fn name(&self) -> &'static str {
        "pandoc"
    }

    fn convert_to_pdf(&self, docx: &Path, pdf: &Path) -> Result<(), ConversionError> {
        let mut command = Command::new(&self.program);
        command.args(self.args(docx, pdf));
        run(&self.program, command)?;
        expect_output(&self.program, pdf)
    }

    fn is_available(&self) -> bool {
        probe(&self.program)
    }
}

/// Converter backed by a headless LibreOffice (`soffice`).
///
/// LibreOffice always names its output after the input file, so the target
/// must be the DOCX's sibling with a `.pdf` extension.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    program: String,
}

impl LibreOfficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for LibreOfficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl DocumentConverter for LibreOfficeConverter {
    fn name(&self) -> &'static str {
        "libreoffice"
    }

    fn convert_to_pdf(&self, docx: &Path, pdf: &Path) -> Result<(), ConversionError> {
        let outdir = pdf.parent().unwrap_or_else(|| Path::new("."));

        let mut command = Command::new(&self.program);
        command
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(outdir)
            .arg(docx);
        run(&self.program, command)?;
        expect_output(&self.program, pdf)
    }

    fn is_available(&self) -> bool {
        probe(&self.program)
    }
}

fn run(program: &str, mut command: Command) -> Result<(), ConversionError> {
    log::debug!("Running converter: {:?}", command);

    let output = command
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ConversionError::Launch {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ConversionError::Exit {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

fn expect_output(program: &str, pdf: &Path) -> Result<(), ConversionError> {
    if pdf.is_file() {
        Ok(())
    } else {
        Err(ConversionError::MissingOutput {
            program: program.to_string(),
            path: pdf.to_path_buf(),
        })
    }
}

fn probe(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

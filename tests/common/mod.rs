#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use recommendation_letter_server::delivery::{DeliveryChannel, DownloadChannel};
use recommendation_letter_server::downloads::DownloadRegistry;
use recommendation_letter_server::letter::{
    ConversionError, DocumentConverter, LetterForm, LetterRenderEngine, LetterService,
    TemplateStore,
};
use recommendation_letter_server::AppState;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const LETTER_BODY: &str = "<w:p><w:r><w:t>Dear Admissions Committee of {{ University_Applying_To }},</w:t></w:r></w:p>\
<w:p><w:r><w:t>{{ Date }}</w:t></w:r></w:p>\
<w:p><w:r><w:t>RE: {{ Name_Upper }}</w:t></w:r></w:p>\
<w:p><w:r><w:t>I have taught {{ Name }} since {{ Year }}. PRONOUN completed a project on {{ Project_Topic }} \
and graduated with {{ Graduating_Class }} (CWA {{ CWA }}).</w:t></w:r></w:p>";

/// Minimal Word document whose body is `body`.
pub fn build_docx(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

pub fn document_text(docx_path: &Path) -> String {
    let bytes = std::fs::read(docx_path).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name("word/document.xml").unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

/// A template directory holding `Male.docx` ("He") and `Female.docx` ("She").
pub fn template_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Male.docx"),
        build_docx(&LETTER_BODY.replace("PRONOUN", "He")),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("Female.docx"),
        build_docx(&LETTER_BODY.replace("PRONOUN", "She")),
    )
    .unwrap();
    dir
}

pub fn form() -> LetterForm {
    LetterForm {
        full_name: "Jane Doe".to_string(),
        gender: "Female".to_string(),
        university: "Stanford University".to_string(),
        project_topic: "AI in Renewable Energy".to_string(),
        graduating_class: "First Class Honours".to_string(),
        cwa: "78.5".to_string(),
        year: "2021".to_string(),
        recipient_email: None,
    }
}

/// Converter that writes a fake PDF, or fails when `works` is false.
pub struct FakeConverter {
    pub works: bool,
}

impl DocumentConverter for FakeConverter {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn convert_to_pdf(&self, _docx: &Path, pdf: &Path) -> Result<(), ConversionError> {
        if self.works {
            std::fs::write(pdf, b"%PDF-1.4 fake").map_err(|source| ConversionError::Launch {
                program: "fake".to_string(),
                source,
            })
        } else {
            Err(ConversionError::Exit {
                program: "fake".to_string(),
                code: 1,
                stderr: "xelatex not found".to_string(),
            })
        }
    }

    fn is_available(&self) -> bool {
        self.works
    }
}

pub struct Fixture {
    pub templates: TempDir,
    pub output: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            templates: template_dir(),
            output: tempfile::tempdir().unwrap(),
        }
    }

    pub fn output_root(&self) -> PathBuf {
        self.output.path().to_path_buf()
    }

    pub fn service(&self, channel: Arc<dyn DeliveryChannel>) -> LetterService {
        LetterService::new(
            TemplateStore::new(self.templates.path(), "Male.docx", "Female.docx"),
            LetterRenderEngine::new(Some(self.output_root())),
            channel,
        )
    }

    pub fn pdf_service(&self, works: bool) -> LetterService {
        self.service(Arc::new(DownloadChannel::with_converter(Arc::new(
            FakeConverter { works },
        ))))
    }

    pub fn state(&self, works: bool) -> AppState {
        AppState::with_service(
            self.pdf_service(works),
            DownloadRegistry::new(Duration::from_secs(60)),
            false,
        )
    }
}

//! DOCX template handling.
//!
//! A template is an ordinary Word document whose text contains Jinja-style
//! placeholders such as `{{ Name }}`. Word frequently splits such a placeholder
//! over several runs (`<w:r>`), so substitution works on the visible text of
//! each XML part rather than on raw markup. Markup between the characters of a
//! placeholder is kept; the escaped value lands where the placeholder started.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::common::escape_xml;
use super::submission::{LetterContext, TemplateKind};
use super::LetterError;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex");
    static ref TEMPLATED_PART: Regex =
        Regex::new(r"^word/(document|header\d*|footer\d*)\.xml$").expect("part regex");
}

/// Location of the two fixed letter templates.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
    male: String,
    female: String,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>, male: impl Into<String>, female: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            male: male.into(),
            female: female.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template filename for a kind (e.g. "Male.docx").
    pub fn filename(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::Male => &self.male,
            TemplateKind::Female => &self.female,
        }
    }

    pub fn path(&self, kind: TemplateKind) -> PathBuf {
        self.dir.join(self.filename(kind))
    }

    /// Path of an existing template, or `TemplateNotFound` naming the file.
    pub fn resolve(&self, kind: TemplateKind) -> Result<PathBuf, LetterError> {
        let path = self.path(kind);
        if path.is_file() {
            Ok(path)
        } else {
            Err(LetterError::TemplateNotFound(self.filename(kind).to_string()))
        }
    }

    /// Filenames of templates that are not present on disk.
    pub fn missing(&self) -> Vec<&str> {
        [TemplateKind::Male, TemplateKind::Female]
            .into_iter()
            .filter(|kind| !self.path(*kind).is_file())
            .map(|kind| self.filename(kind))
            .collect()
    }
}

/// An in-memory DOCX template.
pub struct DocxTemplate {
    bytes: Vec<u8>,
}

impl DocxTemplate {
    pub fn open(path: &Path) -> Result<Self, LetterError> {
        let bytes = fs::read(path).map_err(LetterError::TemplateIo)?;
        Self::from_bytes(bytes)
    }

    /// Wrap raw DOCX bytes, checking that they form a readable archive.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, LetterError> {
        ZipArchive::new(Cursor::new(bytes.as_slice()))?;
        Ok(Self { bytes })
    }

    /// Placeholder names used by the template, in order of first appearance.
    pub fn placeholders(&self) -> Result<Vec<String>, LetterError> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))?;
        let mut names: Vec<String> = Vec::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            if !TEMPLATED_PART.is_match(&name) {
                continue;
            }
            let xml = read_part(&name, &mut file)?;
            let text = TextView::new(&xml).map_err(|source| LetterError::TemplateXml {
                part: name.clone(),
                source,
            })?;
            for caps in PLACEHOLDER.captures_iter(&text.flat) {
                let name = caps[1].to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        Ok(names)
    }

    /// Produce a new DOCX with every placeholder replaced by its context value.
    pub fn render(&self, context: &LetterContext) -> Result<Vec<u8>, LetterError> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let templated = {
                let file = archive.by_index_raw(i)?;
                TEMPLATED_PART.is_match(file.name())
            };

            if templated {
                let mut file = archive.by_index(i)?;
                let name = file.name().to_string();
                let xml = read_part(&name, &mut file)?;
                let rendered = substitute_placeholders(&xml, context).map_err(|source| {
                    LetterError::TemplateXml {
                        part: name.clone(),
                        source,
                    }
                })?;
                log::debug!("Rendered template part {}", name);

                writer.start_file(name, options)?;
                writer
                    .write_all(rendered.as_bytes())
                    .map_err(LetterError::WriteDocument)?;
            } else {
                let file = archive.by_index_raw(i)?;
                writer.raw_copy_file(file)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

fn read_part(name: &str, reader: &mut impl Read) -> Result<String, LetterError> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).map_err(LetterError::TemplateIo)?;
    String::from_utf8(raw).map_err(|_| LetterError::TemplateEncoding(name.to_string()))
}

/// Character data of an XML document, with the byte offset of each character.
///
/// Only text nodes count. Tags, attribute values, comments, CDATA and
/// processing instructions are skipped. Entity references stay in their
/// escaped form.
struct TextView {
    chars: Vec<(usize, char)>,
    flat: String,
    flat_starts: Vec<usize>,
}

impl TextView {
    fn new(xml: &str) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_str(xml);
        let mut chars = Vec::new();

        loop {
            let start = reader.buffer_position() as usize;
            match reader.read_event()? {
                Event::Eof => break,
                Event::Text(text) => {
                    let end = start + text.len();
                    if let Some(raw) = xml.get(start..end) {
                        chars.extend(raw.char_indices().map(|(idx, ch)| (start + idx, ch)));
                    }
                }
                _ => {}
            }
        }

        let flat: String = chars.iter().map(|(_, ch)| *ch).collect();
        let flat_starts = flat.char_indices().map(|(idx, _)| idx).collect();

        Ok(Self {
            chars,
            flat,
            flat_starts,
        })
    }

    /// Index into `chars` of the character starting at `offset` in `flat`.
    fn char_index(&self, offset: usize) -> usize {
        self.flat_starts
            .binary_search(&offset)
            .unwrap_or_else(|insert_at| insert_at)
    }
}

/// Replace `{{ Key }}` placeholders in one XML part.
///
/// Unknown keys render as an empty string. A placeholder whose characters
/// straddle a paragraph boundary is left untouched. Fails when the part is
/// not well-formed XML.
pub fn substitute_placeholders(
    xml: &str,
    context: &LetterContext,
) -> Result<String, quick_xml::Error> {
    let text = TextView::new(xml)?;
    let mut out = String::with_capacity(xml.len());
    let mut cursor = 0;

    for caps in PLACEHOLDER.captures_iter(&text.flat) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let first = text.char_index(whole.start());
        let last = text.char_index(whole.end()) - 1;
        let (start_byte, _) = text.chars[first];
        let (end_byte, _) = text.chars[last];

        if xml[start_byte..end_byte].contains("</w:p>") {
            log::warn!("Placeholder '{}' spans paragraphs, leaving it as is", whole.as_str());
            continue;
        }

        let key = &caps[1];
        let value = match context.get(key) {
            Some(value) => escape_xml(value),
            None => {
                log::debug!("Template placeholder '{}' has no value", key);
                String::new()
            }
        };

        for (k, &(idx, ch)) in text.chars[first..=last].iter().enumerate() {
            out.push_str(&xml[cursor..idx]);
            if k == 0 {
                out.push_str(&value);
            }
            cursor = idx + ch.len_utf8();
        }
    }

    out.push_str(&xml[cursor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::letter::submission::{LetterForm, Submission};
    use chrono::NaiveDate;

    fn wrap_body(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.start_file("word/styles.xml", options).unwrap();
        writer.write_all(b"<w:styles>{{ Name }}</w:styles>").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn read_entry(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    fn context() -> LetterContext {
        let submission = Submission::from_form(LetterForm {
            full_name: "Ama Owusu".to_string(),
            gender: "Female".to_string(),
            university: "R&D Institute".to_string(),
            project_topic: "Microgrids".to_string(),
            graduating_class: "First Class".to_string(),
            cwa: "80.1".to_string(),
            year: "2019".to_string(),
            recipient_email: None,
        })
        .unwrap();
        LetterContext::new(&submission, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap())
    }

    #[test]
    fn test_simple_substitution() {
        let xml = "<w:p><w:r><w:t>Dear {{ Name }} ({{Name_Upper}})</w:t></w:r></w:p>";
        let out = substitute_placeholders(xml, &context()).unwrap();
        assert_eq!(out, "<w:p><w:r><w:t>Dear Ama Owusu (AMA OWUSU)</w:t></w:r></w:p>");
    }

    #[test]
    fn test_split_runs_are_merged() {
        let xml = "<w:p><w:r><w:t>{{ Na</w:t></w:r><w:r><w:t>me }} on {</w:t></w:r><w:r><w:t>{Date}}</w:t></w:r></w:p>";
        let out = substitute_placeholders(xml, &context()).unwrap();
        assert_eq!(
            out,
            "<w:p><w:r><w:t>Ama Owusu</w:t></w:r><w:r><w:t> on January 02, 2026</w:t></w:r><w:r><w:t></w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_values_are_escaped() {
        let xml = "<w:t>{{ University_Applying_To }}</w:t>";
        let out = substitute_placeholders(xml, &context()).unwrap();
        assert_eq!(out, "<w:t>R&amp;D Institute</w:t>");
    }

    #[test]
    fn test_unknown_placeholder_is_blank() {
        let xml = "<w:t>[{{ Signature }}]</w:t>";
        assert_eq!(substitute_placeholders(xml, &context()).unwrap(), "<w:t>[]</w:t>");
    }

    #[test]
    fn test_placeholder_across_paragraphs_is_kept() {
        let xml = "<w:p><w:t>{{ Na</w:t></w:p><w:p><w:t>me }}</w:t></w:p>";
        assert_eq!(substitute_placeholders(xml, &context()).unwrap(), xml);
    }

    #[test]
    fn test_comments_and_attributes_are_not_text() {
        let xml = "<w:p><!-- {{ Name }} > note --><w:r w:rsidR=\"a>b\"><w:t>{{ Na</w:t></w:r><w:r><w:t>me }}</w:t></w:r></w:p>";
        let out = substitute_placeholders(xml, &context()).unwrap();
        assert_eq!(
            out,
            "<w:p><!-- {{ Name }} > note --><w:r w:rsidR=\"a>b\"><w:t>Ama Owusu</w:t></w:r><w:r><w:t></w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_placeholders_ignore_comments() {
        let body = "<!-- {{ Signature }} --><w:p><w:r><w:t>{{ Name }}</w:t></w:r></w:p>";
        let template = DocxTemplate::from_bytes(build_docx(&wrap_body(body))).unwrap();
        assert_eq!(template.placeholders().unwrap(), vec!["Name".to_string()]);
    }

    #[test]
    fn test_malformed_part_is_reported() {
        let template = DocxTemplate::from_bytes(build_docx("<w:document><w:body></w:document>")).unwrap();
        match template.render(&context()) {
            Err(LetterError::TemplateXml { part, .. }) => assert_eq!(part, "word/document.xml"),
            other => panic!("unexpected result: {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_render_docx() {
        let body = "<w:p><w:r><w:t>{{ Name }} applied to {{ University_Applying_To }}</w:t></w:r></w:p>";
        let template = DocxTemplate::from_bytes(build_docx(&wrap_body(body))).unwrap();

        assert_eq!(
            template.placeholders().unwrap(),
            vec!["Name".to_string(), "University_Applying_To".to_string()]
        );

        let rendered = template.render(&context()).unwrap();
        let document = read_entry(&rendered, "word/document.xml");
        assert!(document.contains("Ama Owusu applied to R&amp;D Institute"));
        assert!(!document.contains("{{"));

        // parts outside document/header/footer are copied verbatim
        assert_eq!(read_entry(&rendered, "word/styles.xml"), "<w:styles>{{ Name }}</w:styles>");
    }

    #[test]
    fn test_from_bytes_rejects_non_zip() {
        let result = DocxTemplate::from_bytes(b"not a docx".to_vec());
        assert!(matches!(result, Err(LetterError::TemplateArchive(_))));
    }

    #[test]
    fn test_store_reports_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Male.docx"), build_docx(&wrap_body(""))).unwrap();
        let store = TemplateStore::new(dir.path(), "Male.docx", "Female.docx");

        assert!(store.resolve(TemplateKind::Male).is_ok());
        match store.resolve(TemplateKind::Female) {
            Err(LetterError::TemplateNotFound(name)) => assert_eq!(name, "Female.docx"),
            other => panic!("unexpected result: {:?}", other.map(|p| p.display().to_string())),
        }
        assert_eq!(store.missing(), vec!["Female.docx"]);
    }
}

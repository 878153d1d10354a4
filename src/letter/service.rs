//! The letter pipeline: validate, render, save, deliver.

use std::sync::Arc;

use actix_web::web;
use chrono::{Local, NaiveDate};

use super::engine::LetterRenderEngine;
use super::submission::{LetterContext, LetterForm, Submission};
use super::template::{DocxTemplate, TemplateStore};
use super::LetterError;
use crate::delivery::{Artifact, DeliveryChannel, Notice};

pub const SUCCESS_MESSAGE: &str = "Letter generated successfully!";

/// Result of a successful run of the pipeline.
#[derive(Debug, Clone)]
pub struct GeneratedLetter {
    pub student_name: String,
    pub artifacts: Vec<Artifact>,
    pub notices: Vec<Notice>,
}

pub struct LetterService {
    templates: TemplateStore,
    engine: LetterRenderEngine,
    channel: Arc<dyn DeliveryChannel>,
}

impl LetterService {
    pub fn new(
        templates: TemplateStore,
        engine: LetterRenderEngine,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self {
            templates,
            engine,
            channel,
        }
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn channel_name(&self) -> &'static str {
        self.channel.name()
    }

    /// Run the whole pipeline for one form submission, dated today.
    pub async fn process(&self, form: LetterForm) -> Result<GeneratedLetter, LetterError> {
        self.process_on(form, Local::now().date_naive()).await
    }

    /// Run the pipeline with an explicit letter date.
    pub async fn process_on(
        &self,
        form: LetterForm,
        today: NaiveDate,
    ) -> Result<GeneratedLetter, LetterError> {
        let submission = Submission::from_form(form)?;
        let context = LetterContext::new(&submission, today);

        let kind = submission.template_kind();
        let template_path = self.templates.resolve(kind)?;
        log::info!(
            "Generating letter for {} with template {}",
            submission.full_name,
            self.templates.filename(kind)
        );

        let engine = self.engine.clone();
        let render_context = context.clone();
        let student = submission.full_name.clone();
        let university = submission.university.clone();
        let saved = web::block(move || {
            let docx = DocxTemplate::open(&template_path)?.render(&render_context)?;
            engine.save(&docx, &student, &university)
        })
        .await
        .map_err(|e| LetterError::Blocking(e.to_string()))??;

        let report = self.channel.deliver(&saved, &submission, &context).await;

        log::info!(
            "Letter {} ready with {} file(s) via {} (pdf: {})",
            saved.basename,
            report.artifacts.len(),
            self.channel.name(),
            report.has_pdf()
        );

        // Delivery warnings come first, the success notice closes the list.
        let mut notices = report.notices;
        notices.push(Notice::success(SUCCESS_MESSAGE));

        Ok(GeneratedLetter {
            student_name: submission.full_name,
            artifacts: report.artifacts,
            notices,
        })
    }
}

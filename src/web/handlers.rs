use actix_web::http::header::{
    Charset, ContentDisposition, ContentType, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{web, HttpResponse, Responder};
use sanitize_filename::sanitize;
use uuid::Uuid;

use super::models::{FileLink, HealthResponse, LetterResponse};
use super::pages;
use crate::delivery::Notice;
use crate::letter::{GeneratedLetter, LetterError, LetterForm};
use crate::{AppState, ErrorResponse};

/// User-facing text for a failed submission.
fn failure_message(error: &LetterError) -> String {
    match error {
        LetterError::Validation(errors) => errors.to_message(),
        LetterError::TemplateNotFound(_) => error.to_string(),
        other => format!("An unexpected error occurred: {}", other),
    }
}

fn error_response(error: &LetterError) -> HttpResponse {
    let message = failure_message(error);
    match error {
        LetterError::Validation(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::validation(&message))
        }
        LetterError::TemplateNotFound(_) => {
            HttpResponse::InternalServerError().json(ErrorResponse::template_not_found(&message))
        }
        _ => HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&message)),
    }
}

/// Attachment header carrying the UTF-8 name plus an ASCII fallback.
fn attachment(filename: &str) -> ContentDisposition {
    let name = sanitize(filename);
    let fallback: String = name
        .chars()
        .map(|ch| if ch.is_ascii() { ch } else { '_' })
        .collect();

    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![
            DispositionParam::FilenameExt(ExtendedValue {
                charset: Charset::Ext("UTF-8".to_string()),
                language_tag: None,
                value: name.into_bytes(),
            }),
            DispositionParam::Filename(fallback),
        ],
    }
}

async fn register(state: &AppState, letter: &GeneratedLetter) -> Uuid {
    state.downloads.register(letter.artifacts.clone()).await
}

pub async fn index(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(pages::form_page(state.collects_recipient))
}

pub async fn submit_form(
    state: web::Data<AppState>,
    form: web::Form<LetterForm>,
) -> impl Responder {
    let form = form.into_inner();

    match state.letters.process(form.clone()).await {
        Ok(letter) => {
            let id = register(&state, &letter).await;
            HttpResponse::Ok()
                .content_type(ContentType::html())
                .body(pages::result_page(&id, &letter.artifacts, &letter.notices))
        }
        Err(LetterError::Validation(errors)) => {
            log::debug!("Rejected form submission: {:?}", errors.fields());
            HttpResponse::BadRequest()
                .content_type(ContentType::html())
                .body(pages::form_with_notices(
                    &form,
                    &[Notice::warning(errors.to_message())],
                    state.collects_recipient,
                ))
        }
        Err(e) => {
            log::error!("Letter generation failed: {}", e);
            HttpResponse::InternalServerError()
                .content_type(ContentType::html())
                .body(pages::error_page(&failure_message(&e)))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/letters",
    tag = "Letters",
    request_body = LetterForm,
    responses(
        (status = 201, description = "Letter generated", body = LetterResponse),
        (status = 400, description = "One or more fields are empty", body = ErrorResponse),
        (status = 500, description = "Template missing or generation failed", body = ErrorResponse)
    )
)]
pub async fn create_letter(
    state: web::Data<AppState>,
    form: web::Json<LetterForm>,
) -> impl Responder {
    match state.letters.process(form.into_inner()).await {
        Ok(letter) => {
            let id = register(&state, &letter).await;
            let files = letter
                .artifacts
                .iter()
                .map(|artifact| FileLink::new(&id, artifact))
                .collect();
            let message = letter
                .notices
                .first()
                .map(|notice| notice.message.clone())
                .unwrap_or_default();

            HttpResponse::Created().json(LetterResponse {
                id,
                message,
                files,
                notices: letter.notices,
            })
        }
        Err(e) => {
            if !matches!(e, LetterError::Validation(_)) {
                log::error!("Letter generation failed: {}", e);
            }
            error_response(&e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/downloads/{id}/{filename}",
    tag = "Letters",
    params(
        ("id" = String, Path, description = "Submission id returned with the letter"),
        ("filename" = String, Path, description = "Name of the produced file")
    ),
    responses(
        (status = 200, description = "The file as an attachment"),
        (status = 404, description = "Unknown or expired download", body = ErrorResponse)
    )
)]
pub async fn download(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (id, filename) = path.into_inner();

    let Ok(id) = Uuid::parse_str(&id) else {
        return HttpResponse::NotFound().json(ErrorResponse::not_found("Download not found"));
    };
    let Some(artifact) = state.downloads.find(&id, &filename).await else {
        return HttpResponse::NotFound()
            .json(ErrorResponse::not_found("Download not found or expired"));
    };

    match tokio::fs::read(&artifact.path).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(artifact.mime_type.as_str())
            .insert_header(attachment(&artifact.filename))
            .body(bytes),
        Err(e) => {
            log::warn!("Download {} is no longer readable: {}", artifact.path.display(), e);
            HttpResponse::NotFound().json(ErrorResponse::not_found("File is no longer available"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Letters",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    )
)]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let missing_templates = state
        .letters
        .templates()
        .missing()
        .into_iter()
        .map(str::to_string)
        .collect();

    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        delivery: state.letters.channel_name().to_string(),
        missing_templates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_keeps_unicode_name() {
        let header = attachment("Zoë_MIT.pdf").to_string();
        assert!(header.starts_with("attachment"));
        assert!(header.contains("filename*=UTF-8''Zo%C3%AB_MIT.pdf"));
        assert!(header.contains("filename=\"Zo__MIT.pdf\""));
    }

    #[test]
    fn test_attachment_ascii_name() {
        let disposition = attachment("Jane_Doe_MIT.docx");
        assert_eq!(disposition.get_filename(), Some("Jane_Doe_MIT.docx"));
        assert_eq!(
            disposition.get_filename_ext().map(|ext| ext.value.as_slice()),
            Some("Jane_Doe_MIT.docx".as_bytes())
        );
    }
}

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::{document_text, form, Fixture};
use recommendation_letter_server::delivery::{DownloadChannel, NoticeLevel};
use recommendation_letter_server::letter::service::SUCCESS_MESSAGE;
use recommendation_letter_server::letter::LetterError;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn files_under(root: &std::path::Path) -> usize {
    std::fs::read_dir(root).unwrap().count()
}

#[actix_web::test]
async fn test_female_letter_with_pdf() {
    let fixture = Fixture::new();
    let service = fixture.pdf_service(true);

    let letter = service.process_on(form(), date()).await.unwrap();

    let names: Vec<&str> = letter.artifacts.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(
        names,
        vec!["Jane_Doe_Stanford_University.docx", "Jane_Doe_Stanford_University.pdf"]
    );
    assert_eq!(letter.notices.len(), 1);
    assert_eq!(letter.notices[0].level, NoticeLevel::Success);
    assert_eq!(letter.notices[0].message, SUCCESS_MESSAGE);

    let text = document_text(&letter.artifacts[0].path);
    assert!(text.contains("Dear Admissions Committee of Stanford University,"));
    assert!(text.contains("October 16, 2026"));
    assert!(text.contains("RE: JANE DOE"));
    assert!(text.contains("She completed a project on AI in Renewable Energy"));
    assert!(text.contains("First Class Honours (CWA 78.5)"));
    assert!(!text.contains("{{"));
}

#[actix_web::test]
async fn test_only_exact_male_selects_male_template() {
    let fixture = Fixture::new();
    let service = fixture.pdf_service(true);

    let mut male = form();
    male.gender = "Male".to_string();
    let letter = service.process_on(male, date()).await.unwrap();
    assert!(document_text(&letter.artifacts[0].path).contains("He completed"));

    for gender in ["male", "Other", "MALE "] {
        let mut other = form();
        other.gender = gender.to_string();
        let letter = service.process_on(other, date()).await.unwrap();
        assert!(
            document_text(&letter.artifacts[0].path).contains("She completed"),
            "gender {:?} should use the female template",
            gender
        );
    }
}

#[actix_web::test]
async fn test_filename_replaces_spaces_and_slashes() {
    let fixture = Fixture::new();
    let service = fixture.service(Arc::new(DownloadChannel::plain()));

    let mut input = form();
    input.full_name = "Kofi  Mensah".to_string();
    input.university = "ETH Zurich/D-INFK".to_string();
    let letter = service.process_on(input, date()).await.unwrap();

    assert_eq!(letter.artifacts.len(), 1);
    assert_eq!(letter.artifacts[0].filename, "Kofi__Mensah_ETH_Zurich_D-INFK.docx");
    assert!(letter.artifacts[0].path.exists());
}

#[actix_web::test]
async fn test_name_upper_uses_unicode_uppercase() {
    let fixture = Fixture::new();
    let service = fixture.pdf_service(true);

    let mut input = form();
    input.full_name = "Zoë Ångström".to_string();
    let letter = service.process_on(input, date()).await.unwrap();

    assert!(document_text(&letter.artifacts[0].path).contains("RE: ZOË ÅNGSTRÖM"));
}

#[actix_web::test]
async fn test_empty_field_produces_nothing() {
    let fixture = Fixture::new();
    let service = fixture.pdf_service(true);

    let mut input = form();
    input.cwa = String::new();
    input.year = String::new();
    let err = service.process_on(input, date()).await.unwrap_err();

    match err {
        LetterError::Validation(errors) => {
            assert_eq!(errors.fields(), vec!["cwa", "year"]);
            assert!(errors
                .to_message()
                .starts_with("Please fill in all fields before generating the letter."));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(files_under(fixture.output.path()), 0);
}

#[actix_web::test]
async fn test_whitespace_only_field_is_accepted() {
    let fixture = Fixture::new();
    let service = fixture.pdf_service(true);

    let mut input = form();
    input.cwa = "   ".to_string();
    let letter = service.process_on(input, date()).await.unwrap();

    assert_eq!(letter.artifacts.len(), 2);
    assert!(document_text(&letter.artifacts[0].path).contains("(CWA    )"));
}

#[actix_web::test]
async fn test_conversion_failure_keeps_docx() {
    let fixture = Fixture::new();
    let service = fixture.pdf_service(false);

    let letter = service.process_on(form(), date()).await.unwrap();

    assert_eq!(letter.artifacts.len(), 1);
    assert!(letter.artifacts[0].filename.ends_with(".docx"));
    let levels: Vec<NoticeLevel> = letter.notices.iter().map(|n| n.level).collect();
    assert_eq!(
        levels,
        vec![NoticeLevel::Warning, NoticeLevel::Info, NoticeLevel::Success]
    );
    assert!(letter.notices[0].message.starts_with("PDF conversion failed:"));
    assert_eq!(letter.notices[2].message, SUCCESS_MESSAGE);
}

#[actix_web::test]
async fn test_missing_template_is_named() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.templates.path().join("Female.docx")).unwrap();
    let service = fixture.pdf_service(true);

    let err = service.process_on(form(), date()).await.unwrap_err();

    assert!(matches!(err, LetterError::TemplateNotFound(ref name) if name == "Female.docx"));
    assert!(err.to_string().contains("'Female.docx'"));
    assert_eq!(files_under(fixture.output.path()), 0);

    let mut male = form();
    male.gender = "Male".to_string();
    assert!(service.process_on(male, date()).await.is_ok());
}

#[actix_web::test]
async fn test_each_submission_gets_its_own_directory() {
    let fixture = Fixture::new();
    let service = fixture.pdf_service(true);

    let first = service.process_on(form(), date()).await.unwrap();
    let second = service.process_on(form(), date()).await.unwrap();

    let first_dir = first.artifacts[0].path.parent().unwrap().to_path_buf();
    let second_dir = second.artifacts[0].path.parent().unwrap().to_path_buf();
    assert_ne!(first_dir, second_dir);
    assert!(first.artifacts[0].path.exists());
    assert_eq!(files_under(fixture.output.path()), 2);
}

#[actix_web::test]
async fn test_bundled_templates_fill_every_placeholder() {
    use recommendation_letter_server::letter::{
        DocxTemplate, LetterContext, Submission, TemplateKind, TemplateStore,
    };

    let store = TemplateStore::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"),
        "Male.docx",
        "Female.docx",
    );
    assert!(store.missing().is_empty());

    let submission = Submission::from_form(form()).unwrap();
    let context = LetterContext::new(&submission, date());

    for kind in [TemplateKind::Male, TemplateKind::Female] {
        let template = DocxTemplate::open(&store.resolve(kind).unwrap()).unwrap();
        let mut found = template.placeholders().unwrap();
        found.sort();
        found.dedup();
        assert_eq!(
            found,
            vec!["CWA", "Date", "Graduating_Class", "Name", "Name_Upper", "Project_Topic", "University_Applying_To", "Year"]
        );

        let rendered = DocxTemplate::from_bytes(template.render(&context).unwrap()).unwrap();
        assert!(rendered.placeholders().unwrap().is_empty());
    }
}

//! Server-rendered HTML for the browser form.

use uuid::Uuid;

use crate::delivery::{Artifact, Notice, NoticeLevel};
use crate::downloads::download_url;
use crate::letter::common::escape_xml as escape_html;
use crate::letter::LetterForm;

const TITLE: &str = "Graduate Recommendation Letter Generator";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #222; }
form .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem 2rem; }
label { display: block; font-weight: 600; margin-bottom: .25rem; }
input, select { width: 100%; padding: .5rem; box-sizing: border-box; }
button { margin-top: 1.5rem; padding: .6rem 1.4rem; font-size: 1rem; }
.notice { padding: .75rem 1rem; border-radius: 4px; margin: .5rem 0; white-space: pre-line; }
.success { background: #e6f4ea; }
.info { background: #e8f0fe; }
.warning { background: #fef7e0; }
.error { background: #fce8e6; }
"#;

struct Field {
    name: &'static str,
    label: &'static str,
    placeholder: &'static str,
}

const LEFT: [Field; 2] = [
    Field {
        name: "full_name",
        label: "Full Name of Student",
        placeholder: "e.g., Jane Doe",
    },
    Field {
        name: "university",
        label: "University Applying To",
        placeholder: "e.g., Stanford University",
    },
];

const RIGHT: [Field; 4] = [
    Field {
        name: "project_topic",
        label: "Final Year Project Topic",
        placeholder: "e.g., AI in Renewable Energy",
    },
    Field {
        name: "graduating_class",
        label: "Graduating Class",
        placeholder: "e.g., First Class Honours",
    },
    Field {
        name: "cwa",
        label: "Cumulative Weighted Average (CWA)",
        placeholder: "e.g., 78.5",
    },
    Field {
        name: "year",
        label: "Year You Began Teaching the Student",
        placeholder: "e.g., 2021",
    },
];

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = TITLE,
        style = STYLE,
        body = body
    )
}

fn text_input(field: &Field, value: &str) -> String {
    format!(
        "<div><label for=\"{name}\">{label}</label>\
         <input id=\"{name}\" name=\"{name}\" type=\"text\" placeholder=\"{placeholder}\" value=\"{value}\"></div>",
        name = field.name,
        label = field.label,
        placeholder = field.placeholder,
        value = escape_html(value)
    )
}

fn gender_select(selected: &str) -> String {
    let options: String = ["Male", "Female"]
        .iter()
        .map(|option| {
            let mark = if *option == selected { " selected" } else { "" };
            format!("<option value=\"{0}\"{1}>{0}</option>", option, mark)
        })
        .collect();
    format!(
        "<div><label for=\"gender\">Gender</label><select id=\"gender\" name=\"gender\">{}</select></div>",
        options
    )
}

fn notice_block(notice: &Notice) -> String {
    let class = match notice.level {
        NoticeLevel::Success => "success",
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    format!(
        "<div class=\"notice {}\">{}</div>",
        class,
        escape_html(&notice.message)
    )
}

fn form_markup(form: &LetterForm, collects_recipient: bool) -> String {
    let mut left = text_input(&LEFT[0], &form.full_name);
    left.push_str(&gender_select(&form.gender));
    left.push_str(&text_input(&LEFT[1], &form.university));

    let values = [&form.project_topic, &form.graduating_class, &form.cwa, &form.year];
    let right: String = RIGHT
        .iter()
        .zip(values)
        .map(|(field, value)| text_input(field, value))
        .collect();

    let recipient = if collects_recipient {
        text_input(
            &Field {
                name: "recipient_email",
                label: "Recipient Email",
                placeholder: "e.g., admissions@stanford.edu",
            },
            form.recipient_email.as_deref().unwrap_or_default(),
        )
    } else {
        String::new()
    };

    format!(
        "<h2>Student Details</h2>\n<form method=\"post\" action=\"/letters\">\
         <div class=\"grid\"><div>{}</div><div>{}</div></div>{}\
         <button type=\"submit\">Generate Letter</button></form>",
        left, right, recipient
    )
}

/// The empty entry form.
pub fn form_page(collects_recipient: bool) -> String {
    let form = LetterForm {
        gender: "Male".to_string(),
        ..LetterForm::default()
    };
    layout(&form_markup(&form, collects_recipient))
}

/// The form again, prefilled, with notices above it.
pub fn form_with_notices(form: &LetterForm, notices: &[Notice], collects_recipient: bool) -> String {
    let mut body: String = notices.iter().map(notice_block).collect();
    body.push_str(&form_markup(form, collects_recipient));
    layout(&body)
}

/// Notices plus links to every produced file.
pub fn result_page(id: &Uuid, artifacts: &[Artifact], notices: &[Notice]) -> String {
    let mut body: String = notices.iter().map(notice_block).collect();

    if !artifacts.is_empty() {
        body.push_str("<h2>Downloads</h2><ul>");
        for artifact in artifacts {
            let label = if artifact.is_pdf() {
                "Download PDF"
            } else {
                "Download Word Document"
            };
            body.push_str(&format!(
                "<li><a href=\"{}\" download>{}</a> ({})</li>",
                escape_html(&download_url(id, &artifact.filename)),
                label,
                escape_html(&artifact.filename)
            ));
        }
        body.push_str("</ul>");
    }

    body.push_str("<p><a href=\"/\">Generate another letter</a></p>");
    layout(&body)
}

/// A single error notice with a link back to the form.
pub fn error_page(message: &str) -> String {
    let body = format!(
        "{}<p><a href=\"/\">Back to the form</a></p>",
        notice_block(&Notice::error(message))
    );
    layout(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_form_page_lists_fields() {
        let html = form_page(false);
        for name in ["full_name", "gender", "university", "project_topic", "graduating_class", "cwa", "year"] {
            assert!(html.contains(&format!("name=\"{}\"", name)), "missing {}", name);
        }
        assert!(!html.contains("recipient_email"));
        assert!(form_page(true).contains("recipient_email"));
    }

    #[test]
    fn test_values_are_escaped() {
        let form = LetterForm {
            full_name: "<script>alert(1)</script>".to_string(),
            gender: "Female".to_string(),
            ..LetterForm::default()
        };
        let html = form_with_notices(&form, &[Notice::warning("x")], false);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<option value=\"Female\" selected>"));
    }

    #[test]
    fn test_result_page_links() {
        let artifact = Artifact {
            filename: "Jane_Doe_MIT.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            path: PathBuf::from("/tmp/Jane_Doe_MIT.pdf"),
            size_bytes: 10,
            created_at: String::new(),
        };
        let html = result_page(&Uuid::nil(), &[artifact], &[Notice::success("done")]);
        assert!(html.contains("Download PDF"));
        assert!(html.contains("/downloads/00000000-0000-0000-0000-000000000000/Jane_Doe_MIT.pdf"));
        assert!(html.contains("notice success"));
    }
}

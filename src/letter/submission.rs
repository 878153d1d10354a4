//! Submission model: the seven form fields plus the values derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::format_letter_date;
use super::traits::Validator;
use super::validation::{validate_required, ValidationErrors};

/// Raw form input, as posted by the HTML form or the JSON API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LetterForm {
    #[serde(default)]
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[serde(default)]
    #[schema(example = "Female")]
    pub gender: String,
    #[serde(default)]
    #[schema(example = "Stanford University")]
    pub university: String,
    #[serde(default)]
    #[schema(example = "AI in Renewable Energy")]
    pub project_topic: String,
    #[serde(default)]
    #[schema(example = "First Class Honours")]
    pub graduating_class: String,
    #[serde(default)]
    #[schema(example = "78.5")]
    pub cwa: String,
    #[serde(default)]
    #[schema(example = "2021")]
    pub year: String,
    /// Only used by the email delivery channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "admissions@stanford.edu")]
    pub recipient_email: Option<String>,
}

impl Validator for LetterForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_required(&self.full_name, "full_name", "Full Name of Student", &mut errors);
        validate_required(&self.gender, "gender", "Gender", &mut errors);
        validate_required(&self.university, "university", "University Applying To", &mut errors);
        validate_required(
            &self.project_topic,
            "project_topic",
            "Final Year Project Topic",
            &mut errors,
        );
        validate_required(
            &self.graduating_class,
            "graduating_class",
            "Graduating Class",
            &mut errors,
        );
        validate_required(&self.cwa, "cwa", "Cumulative Weighted Average (CWA)", &mut errors);
        validate_required(&self.year, "year", "Year Teaching Began", &mut errors);

        errors.into_result()
    }
}

/// Which of the two fixed templates a submission uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Male,
    Female,
}

impl TemplateKind {
    /// `"Male"` selects the male template; any other value selects the female one.
    pub fn for_gender(gender: &str) -> Self {
        if gender == "Male" {
            Self::Male
        } else {
            Self::Female
        }
    }
}

/// A validated submission. Lives for the duration of one request.
#[derive(Debug, Clone)]
pub struct Submission {
    pub full_name: String,
    pub gender: String,
    pub university: String,
    pub project_topic: String,
    pub graduating_class: String,
    pub cwa: String,
    pub year: String,
    pub recipient_email: Option<String>,
}

impl Submission {
    /// Validate the form and take ownership of its values.
    pub fn from_form(form: LetterForm) -> Result<Self, ValidationErrors> {
        form.validate()?;

        let recipient_email = form
            .recipient_email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        Ok(Self {
            full_name: form.full_name,
            gender: form.gender,
            university: form.university,
            project_topic: form.project_topic,
            graduating_class: form.graduating_class,
            cwa: form.cwa,
            year: form.year,
            recipient_email,
        })
    }

    pub fn template_kind(&self) -> TemplateKind {
        TemplateKind::for_gender(&self.gender)
    }
}

/// The eight values substituted into a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterContext {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Name_Upper")]
    pub name_upper: String,
    #[serde(rename = "University_Applying_To")]
    pub university: String,
    #[serde(rename = "Project_Topic")]
    pub project_topic: String,
    #[serde(rename = "Graduating_Class")]
    pub graduating_class: String,
    #[serde(rename = "CWA")]
    pub cwa: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Date")]
    pub date: String,
}

impl LetterContext {
    pub fn new(submission: &Submission, today: NaiveDate) -> Self {
        Self {
            name: submission.full_name.clone(),
            // str::to_uppercase follows Unicode default casing, with no locale tailoring
            name_upper: submission.full_name.to_uppercase(),
            university: submission.university.clone(),
            project_topic: submission.project_topic.clone(),
            graduating_class: submission.graduating_class.clone(),
            cwa: submission.cwa.clone(),
            year: submission.year.clone(),
            date: format_letter_date(today),
        }
    }

    /// Placeholder name / value pairs.
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("Name", self.name.as_str()),
            ("Name_Upper", self.name_upper.as_str()),
            ("University_Applying_To", self.university.as_str()),
            ("Project_Topic", self.project_topic.as_str()),
            ("Graduating_Class", self.graduating_class.as_str()),
            ("CWA", self.cwa.as_str()),
            ("Year", self.year.as_str()),
            ("Date", self.date.as_str()),
        ]
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries()
            .into_iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }
}

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::delivery::{Artifact, Notice};
use crate::downloads::download_url;

/// A produced file and where to fetch it.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileLink {
    #[schema(example = "Jane_Doe_Stanford_University.docx")]
    pub filename: String,
    #[schema(example = "application/vnd.openxmlformats-officedocument.wordprocessingml.document")]
    pub mime_type: String,
    pub size_bytes: u64,
    #[schema(example = "/downloads/3f2b0c8e-1d5a-4c36-9a7e-6f0d2b9c1e44/Jane_Doe_Stanford_University.docx")]
    pub download_url: String,
}

impl FileLink {
    pub fn new(id: &Uuid, artifact: &Artifact) -> Self {
        Self {
            filename: artifact.filename.clone(),
            mime_type: artifact.mime_type.clone(),
            size_bytes: artifact.size_bytes,
            download_url: download_url(id, &artifact.filename),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LetterResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    /// First notice: a delivery warning when there is one, else the success message.
    #[schema(example = "Letter generated successfully!")]
    pub message: String,
    pub files: Vec<FileLink>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "pdf")]
    pub delivery: String,
    /// Template files that are configured but absent.
    pub missing_templates: Vec<String>,
}

//! Short-lived registry of files offered for download.
//!
//! Each successful submission gets a random id. Links expire with the cache
//! entry; the files themselves stay in their temporary directory.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::delivery::Artifact;

const MAX_SUBMISSIONS: u64 = 10_000;

#[derive(Clone)]
pub struct DownloadRegistry {
    cache: Cache<Uuid, Arc<Vec<Artifact>>>,
}

impl DownloadRegistry {
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(MAX_SUBMISSIONS)
            .build();
        Self { cache }
    }

    /// Remember the artifacts of one submission and return its id.
    pub async fn register(&self, artifacts: Vec<Artifact>) -> Uuid {
        let id = Uuid::new_v4();
        self.cache.insert(id, Arc::new(artifacts)).await;
        log::debug!("Registered downloads under {}", id);
        id
    }

    /// Look up one file of a submission by name.
    pub async fn find(&self, id: &Uuid, filename: &str) -> Option<Artifact> {
        let artifacts = self.cache.get(id).await?;
        artifacts
            .iter()
            .find(|artifact| artifact.filename == filename)
            .cloned()
    }
}

/// Relative URL under which an artifact is served.
pub fn download_url(id: &Uuid, filename: &str) -> String {
    format!("/downloads/{}/{}", id, urlencoding::encode(filename))
}

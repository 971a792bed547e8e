//! Task model for the tally list.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Backing-service metadata, kept alongside tasks that came from the remote
/// service so we can round-trip fields the app itself doesn't care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMeta {
    pub project_id: String,
    pub url: Option<String>,
    pub created_at: Option<String>,
}

/// A single todo item.
///
/// `id` is unique within a list. Locally minted tasks use a millisecond
/// timestamp rendered as a string; remote tasks carry the service-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteMeta>,
}

impl Task {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
            remote: None,
        }
    }

    /// A task that exists only locally, with a timestamp-derived id.
    pub fn local(text: impl Into<String>) -> Self {
        Self::new(Utc::now().timestamp_millis().to_string(), text)
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn with_remote(mut self, remote: RemoteMeta) -> Self {
        self.remote = Some(remote);
        self
    }
}

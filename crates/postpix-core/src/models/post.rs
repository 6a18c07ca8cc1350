use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display record synthesized for a processed image.
///
/// `created_at` stays `None` until the record has been persisted; the timestamp is
/// assigned by the database, never by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub image_url: String,
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PostRecord {
    /// Tags in draw order, joined the way they are stored.
    pub fn tags_csv(&self) -> String {
        self.tags.join(",")
    }
}

/// Row identity returned by the store after an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedPost {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

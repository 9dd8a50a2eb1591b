//! Notification records and feed pages
//!
//! A feed is an ordered collection of notification records for one recipient,
//! partitioned into two mutually exclusive classifications:
//! - **Normal**: notifications from channels the recipient opted into
//! - **Spam**: everything else addressed to the recipient
//!
//! Records arrive already ordered by the feed source (most recent first) and
//! are not deduplicated here; dedup is the source's responsibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which partition of a recipient's feed to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    Normal,
    Spam,
}

impl Classification {
    /// Value of the `spam` query flag the feed source expects
    pub fn spam_flag(&self) -> bool {
        matches!(self, Classification::Spam)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Normal => write!(f, "normal"),
            Classification::Spam => write!(f, "spam"),
        }
    }
}

/// The embedded real title/body carried by secret notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretPayload {
    pub title: String,
    pub body: String,
}

/// One entry in a recipient's feed, normalized from the source's wire shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Outer title; a decoy placeholder when `secret` is set
    pub title: String,
    /// Outer body; a decoy placeholder when `secret` is set
    pub body: String,
    /// Call-to-action link
    pub cta: Option<String>,
    /// Name of the application (channel) that sent the notification
    pub app: String,
    /// Channel icon
    pub icon: String,
    /// Attached media
    pub image: Option<String>,
    /// Click-through URL for the whole record
    pub url: Option<String>,
    /// Origin chain identifier as reported by the source
    pub blockchain: String,
    /// Whether the real content lives in `payload` instead of the outer fields
    pub secret: bool,
    /// Real title/body; present whenever `secret` is true
    pub payload: Option<SecretPayload>,
    /// Delivery timestamp, when the source reports one
    pub epoch: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// Title to display: the embedded one for secret records, the outer one otherwise
    pub fn display_title(&self) -> &str {
        match (&self.payload, self.secret) {
            (Some(payload), true) => &payload.title,
            _ => &self.title,
        }
    }

    /// Body to display: the embedded one for secret records, the outer one otherwise
    pub fn display_body(&self) -> &str {
        match (&self.payload, self.secret) {
            (Some(payload), true) => &payload.body,
            _ => &self.body,
        }
    }
}

/// One fetched page of a recipient's feed, in source order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub classification: Classification,
    pub records: Vec<NotificationRecord>,
    /// When this page was fetched from the source
    pub fetched_at: DateTime<Utc>,
}

impl FeedPage {
    /// Create a page stamped with the current time
    pub fn new(classification: Classification, records: Vec<NotificationRecord>) -> Self {
        Self {
            classification,
            records,
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

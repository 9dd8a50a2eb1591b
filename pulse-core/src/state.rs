//! Feed state snapshots
//!
//! `FeedState` is the single piece of mutable state the controller owns. It
//! is created empty, mutated only at fetch completion boundaries, and handed
//! to consumers as a cloned snapshot. A fetch either fully replaces `page` or
//! records an error and leaves `page` untouched.

use serde::{Deserialize, Serialize};

use crate::{Classification, FeedPage};

/// Classified cause of a failed feed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchCause {
    Network,
    Auth,
    MalformedResponse,
    Timeout,
}

impl std::fmt::Display for FetchCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchCause::Network => write!(f, "network"),
            FetchCause::Auth => write!(f, "auth"),
            FetchCause::MalformedResponse => write!(f, "malformed-response"),
            FetchCause::Timeout => write!(f, "timeout"),
        }
    }
}

/// Lifecycle phase of the feed controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedPhase {
    /// No identity resolved yet; nothing to fetch
    Idle,
    /// A fetch is in flight
    Loading,
    /// Last fetch succeeded and `page` is populated
    Loaded,
    /// Last fetch failed; any previously loaded page is retained
    Failed,
}

/// Snapshot of the controller's view state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedState {
    pub classification: Classification,
    pub is_loading: bool,
    pub page: Option<FeedPage>,
    pub last_error: Option<FetchCause>,
}

impl FeedState {
    /// Empty state for a freshly mounted controller
    pub fn new(classification: Classification) -> Self {
        Self {
            classification,
            is_loading: false,
            page: None,
            last_error: None,
        }
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(Classification::Normal)
    }
}

//! Subscribed-channel listing

use serde::{Deserialize, Serialize};

/// One channel the recipient has opted into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Channel address in the feed source's namespace
    pub channel: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubscriptionsEnvelope {
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

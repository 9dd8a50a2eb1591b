//! The `FeedSource` abstraction and its HTTP implementation
//!
//! The controller only ever talks to a `FeedSource`, so tests can substitute
//! a scripted one and the HTTP details stay contained here.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};

use pulse_core::{Classification, FeedPage, Identity};

use crate::subscriptions::SubscriptionsEnvelope;
use crate::wire::{normalize_feeds, FeedsEnvelope};
use crate::{create_feed_client, ClientConfig, FetchError, Subscription};

/// Read operations against the external notification service
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch one bounded page of a recipient's feed
    async fn fetch_feed(
        &self,
        identity: &Identity,
        classification: Classification,
        limit: usize,
    ) -> Result<FeedPage, FetchError>;

    /// List the channels a recipient subscribes to
    async fn fetch_subscriptions(&self, identity: &Identity)
        -> Result<Vec<Subscription>, FetchError>;
}

/// Thread-safe reference to a feed source
pub type SharedFeedSource = Arc<dyn FeedSource>;

/// `FeedSource` backed by the notification service REST API
pub struct HttpFeedSource {
    client: Client,
    config: ClientConfig,
}

impl HttpFeedSource {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let client = create_feed_client(&config)?;
        Ok(Self { client, config })
    }

    /// Create a shared source for use by a feed session
    pub fn shared(config: ClientConfig) -> Result<SharedFeedSource, FetchError> {
        Ok(Arc::new(Self::new(config)?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_request(url, e, self.config.timeout_secs))?;

        let status = response.status();
        // The service answers 404 for recipients it has never seen; that is
        // an empty feed, not a failure.
        if status.as_u16() == 404 {
            debug!("feed source has no data at {url}");
            return Ok(None);
        }
        if !status.is_success() {
            warn!("feed source returned {status} for {url}");
            return Err(FetchError::from_status(url, status));
        }

        let value = response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(Some(value))
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_feed(
        &self,
        identity: &Identity,
        classification: Classification,
        limit: usize,
    ) -> Result<FeedPage, FetchError> {
        let url = format!(
            "{}/apis/v1/users/{}/feeds?page=1&limit={}&spam={}",
            self.config.api_base(),
            identity,
            limit,
            classification.spam_flag(),
        );

        debug!("fetching {classification} feed for {identity}");
        let envelope: FeedsEnvelope = match self.get_json(&url).await? {
            Some(envelope) => envelope,
            None => FeedsEnvelope { feeds: Vec::new() },
        };

        let page = normalize_feeds(envelope, classification, limit)?;
        debug!("fetched {} {classification} records for {identity}", page.len());
        Ok(page)
    }

    async fn fetch_subscriptions(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Subscription>, FetchError> {
        let url = format!(
            "{}/apis/v1/users/{}/subscriptions",
            self.config.api_base(),
            identity,
        );

        let envelope: SubscriptionsEnvelope = match self.get_json(&url).await? {
            Some(envelope) => envelope,
            None => SubscriptionsEnvelope::default(),
        };
        Ok(envelope.subscriptions)
    }
}

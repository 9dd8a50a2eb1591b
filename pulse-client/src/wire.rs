//! Feed source wire types and normalization
//!
//! The feed endpoint nests the interesting fields two levels deep and uses
//! abbreviated names (`asub`, `amsg`, `acta`, `aimg`). Everything is renamed
//! and defaulted here so the rest of the system only handles
//! `NotificationRecord`. Fields beyond the consumed set are ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use pulse_core::{Classification, FeedPage, NotificationRecord, SecretPayload};

use crate::FetchError;

#[derive(Debug, Deserialize)]
pub(crate) struct FeedsEnvelope {
    #[serde(default)]
    pub feeds: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedItem {
    #[serde(default)]
    pub payload_id: i64,
    /// Origin chain tag, e.g. `ETH_MAINNET`
    #[serde(default)]
    pub source: String,
    pub payload: Payload,
    /// Delivery timestamp in RFC 3339
    #[serde(default)]
    pub epoch: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Payload {
    pub data: PayloadData,
    /// Alert-text pair; carries the real content for secret records
    #[serde(default)]
    pub notification: Option<NotificationText>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationText {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PayloadData {
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Outer title
    #[serde(default)]
    pub asub: String,
    /// Outer body
    #[serde(default)]
    pub amsg: String,
    /// Call-to-action link
    #[serde(default)]
    pub acta: Option<String>,
    /// Attached media
    #[serde(default)]
    pub aimg: Option<String>,
    /// Non-empty when the record is secret
    #[serde(default)]
    pub sectype: Option<String>,
}

fn empty_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Normalize one wire item into a domain record
///
/// Rejects records that claim to be secret without carrying the embedded
/// payload; the outer title/body are decoys in that case and there would be
/// nothing to display.
pub(crate) fn normalize_item(item: FeedItem) -> Result<NotificationRecord, FetchError> {
    let secret = item
        .payload
        .data
        .sectype
        .as_deref()
        .is_some_and(|s| !s.is_empty());

    let payload = if secret {
        let text = item.payload.notification.ok_or_else(|| {
            FetchError::Malformed(format!(
                "secret record {} is missing its embedded payload",
                item.payload_id
            ))
        })?;
        Some(SecretPayload {
            title: text.title,
            body: text.body,
        })
    } else {
        None
    };

    let epoch = item
        .epoch
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let data = item.payload.data;
    Ok(NotificationRecord {
        title: data.asub,
        body: data.amsg,
        cta: empty_to_none(data.acta),
        app: data.app,
        icon: data.icon,
        image: empty_to_none(data.aimg),
        url: empty_to_none(data.url),
        blockchain: item.source,
        secret,
        payload,
        epoch,
    })
}

/// Normalize a whole response into a feed page, capped at `limit` records
pub(crate) fn normalize_feeds(
    envelope: FeedsEnvelope,
    classification: Classification,
    limit: usize,
) -> Result<FeedPage, FetchError> {
    let records = envelope
        .feeds
        .into_iter()
        .take(limit)
        .map(normalize_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeedPage::new(classification, records))
}

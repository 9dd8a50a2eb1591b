//! Outbound notification submission
//!
//! Sending is a channel-owner action, not part of the feed read path. The
//! wallet's signing capability is consumed as an opaque `PayloadSigner`; the
//! proof scheme itself belongs to the wallet collaborator.

use serde::Serialize;
use tracing::info;

use pulse_core::Environment;

use crate::{FetchError, HttpFeedSource};

/// Opaque signing capability supplied by the wallet collaborator
pub trait PayloadSigner: Send + Sync {
    /// Address of the channel account the proof is made with
    fn address(&self) -> String;

    /// Produce a verification proof over the serialized payload
    fn sign(&self, message: &str) -> String;
}

/// A notification to deliver to one recipient
#[derive(Debug, Clone)]
pub struct OutboundNotification {
    /// Alert title shown by push transports
    pub alert_title: String,
    /// Alert body shown by push transports
    pub alert_body: String,
    /// Detail title shown in the feed
    pub title: String,
    /// Detail body shown in the feed
    pub body: String,
    pub cta: Option<String>,
    pub image: Option<String>,
    /// Recipient address (chain-qualified)
    pub recipient: String,
}

/// Direct-payload identity kind understood by the service
const IDENTITY_KIND_DIRECT: u8 = 2;

/// Targeted (single recipient) notification type
const NOTIFICATION_TYPE_TARGETED: u8 = 3;

#[derive(Debug, Serialize)]
struct SendPayloadWire {
    #[serde(rename = "verificationProof")]
    verification_proof: String,
    identity: String,
    sender: String,
    recipient: String,
    source: String,
}

/// Chain tag the service expects in the `source` field per deployment stage
fn chain_source_tag(environment: Environment) -> &'static str {
    match environment {
        Environment::Prod => "ETH_MAINNET",
        Environment::Staging => "ETH_TEST_SEPOLIA",
        Environment::Dev => "ETH_TEST_GOERLI",
    }
}

/// Serialize the payload into the `<kind>+<json>` identity string the
/// service verifies proofs against
fn build_identity(outbound: &OutboundNotification) -> String {
    let payload = serde_json::json!({
        "notification": {
            "title": outbound.alert_title,
            "body": outbound.alert_body,
        },
        "data": {
            "asub": outbound.title,
            "amsg": outbound.body,
            "acta": outbound.cta.as_deref().unwrap_or(""),
            "aimg": outbound.image.as_deref().unwrap_or(""),
            "type": NOTIFICATION_TYPE_TARGETED,
        },
    });
    format!("{IDENTITY_KIND_DIRECT}+{payload}")
}

impl HttpFeedSource {
    /// Submit a notification to the service
    pub async fn send_notification(
        &self,
        signer: &dyn PayloadSigner,
        outbound: &OutboundNotification,
    ) -> Result<(), FetchError> {
        let identity = build_identity(outbound);
        let wire = SendPayloadWire {
            verification_proof: signer.sign(&identity),
            identity,
            sender: signer.address(),
            recipient: outbound.recipient.clone(),
            source: chain_source_tag(self.config().environment).to_string(),
        };

        let url = format!("{}/apis/v1/payloads/", self.config().api_base());
        let response = self
            .client()
            .post(&url)
            .json(&wire)
            .send()
            .await
            .map_err(|e| FetchError::from_request(&url, e, self.config().timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(&url, status));
        }

        info!(
            "submitted notification from {} to {}",
            signer.address(),
            outbound.recipient
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubSigner;

    impl PayloadSigner for StubSigner {
        fn address(&self) -> String {
            "0x51908F598A5e0d8F1A3bAbFa6DF76F9704daD072".to_string()
        }

        fn sign(&self, message: &str) -> String {
            format!("eip712v2:{:x}", message.len())
        }
    }

    fn sample_outbound() -> OutboundNotification {
        OutboundNotification {
            alert_title: "alert".to_string(),
            alert_body: "alert body".to_string(),
            title: "detail title".to_string(),
            body: "detail body".to_string(),
            cta: None,
            image: None,
            recipient: "eip155:11155111:0x51908F598A5e0d8F1A3bAbFa6DF76F9704daD072".to_string(),
        }
    }

    #[test]
    fn test_build_identity_kind_and_fields() {
        let identity = build_identity(&sample_outbound());
        let (kind, json) = identity.split_once('+').unwrap();
        assert_eq!(kind, "2");

        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["notification"]["title"], "alert");
        assert_eq!(value["data"]["asub"], "detail title");
        assert_eq!(value["data"]["amsg"], "detail body");
        assert_eq!(value["data"]["acta"], "");
        assert_eq!(value["data"]["type"], 3);
    }

    #[test]
    fn test_wire_serialization_uses_service_field_names() {
        let outbound = sample_outbound();
        let identity = build_identity(&outbound);
        let wire = SendPayloadWire {
            verification_proof: StubSigner.sign(&identity),
            identity,
            sender: StubSigner.address(),
            recipient: outbound.recipient.clone(),
            source: chain_source_tag(Environment::Staging).to_string(),
        };

        let value = serde_json::to_value(&wire).unwrap();
        assert!(value["verificationProof"]
            .as_str()
            .unwrap()
            .starts_with("eip712v2:"));
        assert_eq!(value["source"], "ETH_TEST_SEPOLIA");
        assert!(value.get("verification_proof").is_none());
    }

    #[test]
    fn test_chain_source_tags() {
        assert_eq!(chain_source_tag(Environment::Prod), "ETH_MAINNET");
        assert_eq!(chain_source_tag(Environment::Dev), "ETH_TEST_GOERLI");
    }
}

//! Pulse Client - HTTP layer for the external notification feed source
//!
//! Everything that talks to the feed service lives here:
//! - **http**: client construction, per-environment base URLs, error taxonomy
//! - **source**: the `FeedSource` trait and its HTTP implementation
//! - **subscriptions**: subscribed-channel listing
//! - **send**: outbound notification submission behind an opaque signer
//!
//! Wire-shape normalization happens in this crate; consumers only ever see
//! the `pulse-core` domain types.

pub mod http;
pub mod send;
pub mod source;
pub mod subscriptions;

mod wire;

pub use http::*;
pub use send::*;
pub use source::*;
pub use subscriptions::*;

//! Pulse Core - domain model for wallet-linked notification feeds
//!
//! This crate provides the foundational primitives:
//! - Notification records with secret-payload unwrapping
//! - Feed pages under Normal/Spam classification
//! - Recipient identity resolution (raw or CAIP-qualified)
//! - Feed state snapshots consumed by the controller and presentation layers

pub mod config;
pub mod identity;
pub mod record;
pub mod state;

pub use config::*;
pub use identity::*;
pub use record::*;
pub use state::*;

/// Default maximum number of records per feed request
pub const DEFAULT_FEED_LIMIT: usize = 30;

/// Default feed source request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Chain namespace for EVM recipient identities
pub const EVM_NAMESPACE: &str = "eip155";

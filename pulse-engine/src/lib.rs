//! Pulse Engine - feed controller and session runtime
//!
//! Two layers:
//! - [`controller`]: the pure feed state machine. Input changes map to
//!   explicit transitions that may issue a [`FetchRequest`]; completions are
//!   matched against the latest issued request by sequence number, and
//!   out-of-order stragglers are discarded.
//! - [`session`]: a tokio task that owns a controller, runs fetches against a
//!   [`pulse_client::FeedSource`], and serves snapshots over a command
//!   channel.

pub mod controller;
pub mod session;

pub use controller::*;
pub use session::*;

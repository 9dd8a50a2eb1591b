//! Feed controller state machine
//!
//! The controller is deliberately free of IO. Input operations return an
//! `Option<FetchRequest>` the caller must execute; the matching completion is
//! fed back through [`FeedController::apply_completion`]. Each issued request
//! gets a sequence number from a monotonically increasing counter, and only
//! the latest issued sequence is "current": completions for anything older
//! are reported as [`Applied::Stale`] and change no state. That rule, not
//! cancellation, is what keeps a late response for a superseded
//! identity/classification from clobbering the feed.

use tracing::debug;

use pulse_core::{
    resolve_identity, Classification, EnvConfig, FeedPage, FeedPhase, FeedState, FetchCause,
    Identity, IdentityError, WalletContext, DEFAULT_FEED_LIMIT,
};

/// Controller construction parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerConfig {
    /// Environment context (deployment stage + CAIP identity mode)
    pub env: EnvConfig,
    /// Maximum records requested per fetch
    pub limit: usize,
}

impl ControllerConfig {
    pub fn new(env: EnvConfig) -> Self {
        Self {
            env,
            limit: DEFAULT_FEED_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A fetch the caller must run against the feed source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Sequence number; completions are matched on this
    pub seq: u64,
    pub identity: Identity,
    pub classification: Classification,
    pub limit: usize,
}

/// Outcome of applying a fetch completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Page replaced, error cleared
    Loaded,
    /// Error recorded, page untouched
    Failed(FetchCause),
    /// Completion of a superseded request; dropped silently
    Stale,
}

/// Long-lived owner of one recipient's feed view state
pub struct FeedController {
    config: ControllerConfig,
    identity: Option<Identity>,
    state: FeedState,
    next_seq: u64,
    current_seq: Option<u64>,
}

impl FeedController {
    pub fn new(config: ControllerConfig) -> Self {
        let limit = if config.limit == 0 {
            DEFAULT_FEED_LIMIT
        } else {
            config.limit
        };
        Self {
            config: ControllerConfig { limit, ..config },
            identity: None,
            state: FeedState::new(Classification::Normal),
            next_seq: 0,
            current_seq: None,
        }
    }

    /// Currently resolved recipient identity, if any
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Cloned view-state snapshot
    pub fn snapshot(&self) -> FeedState {
        self.state.clone()
    }

    /// Lifecycle phase derived from identity and state
    pub fn phase(&self) -> FeedPhase {
        if self.identity.is_none() {
            FeedPhase::Idle
        } else if self.state.is_loading {
            FeedPhase::Loading
        } else if self.state.last_error.is_some() {
            FeedPhase::Failed
        } else if self.state.page.is_some() {
            FeedPhase::Loaded
        } else {
            FeedPhase::Idle
        }
    }

    /// Update the wallet context, re-resolving the identity
    ///
    /// A changed identity triggers a fetch. A wallet that is absent or fails
    /// to resolve returns the controller to `Idle` with an empty state; the
    /// error is handed back so the embedding layer can surface "no identity".
    pub fn set_wallet(
        &mut self,
        wallet: Option<&WalletContext>,
    ) -> Result<Option<FetchRequest>, IdentityError> {
        let resolved = match wallet {
            Some(wallet) => resolve_identity(wallet, self.config.env.caip),
            None => Err(IdentityError::MissingAccount),
        };

        match resolved {
            Ok(identity) => {
                if self.identity.as_ref() == Some(&identity) {
                    return Ok(None);
                }
                debug!("feed identity changed to {identity}");
                self.identity = Some(identity);
                Ok(self.issue())
            }
            Err(err) => {
                if self.identity.take().is_some() {
                    debug!("feed identity cleared");
                    self.state = FeedState::new(self.state.classification);
                    self.current_seq = None;
                }
                Err(err)
            }
        }
    }

    /// Switch between the Normal and Spam partitions
    ///
    /// Idempotent: re-selecting the current classification does not re-fetch.
    pub fn set_classification(&mut self, classification: Classification) -> Option<FetchRequest> {
        if self.state.classification == classification {
            return None;
        }
        self.state.classification = classification;
        if self.identity.is_some() {
            self.issue()
        } else {
            None
        }
    }

    /// Explicitly re-fetch the current identity/classification
    pub fn refresh(&mut self) -> Option<FetchRequest> {
        self.identity.as_ref()?;
        self.issue()
    }

    /// Feed a fetch completion back into the state machine
    pub fn apply_completion(
        &mut self,
        seq: u64,
        result: Result<FeedPage, FetchCause>,
    ) -> Applied {
        if self.current_seq != Some(seq) {
            debug!("discarding completion for superseded request {seq}");
            return Applied::Stale;
        }
        self.current_seq = None;
        self.state.is_loading = false;

        match result {
            Ok(page) => {
                self.state.page = Some(page);
                self.state.last_error = None;
                Applied::Loaded
            }
            Err(cause) => {
                self.state.last_error = Some(cause);
                Applied::Failed(cause)
            }
        }
    }

    fn issue(&mut self) -> Option<FetchRequest> {
        let identity = self.identity.clone()?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.current_seq = Some(seq);
        self.state.is_loading = true;

        Some(FetchRequest {
            seq,
            identity,
            classification: self.state.classification,
            limit: self.config.limit,
        })
    }
}

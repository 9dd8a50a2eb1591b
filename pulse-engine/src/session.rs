//! Tokio-driven feed session
//!
//! One task owns the controller; everything else talks to it through a
//! command channel and reads cloned snapshots back. Fetches run as futures on
//! an unordered in-flight set, so a slow fetch never blocks commands and a
//! superseded fetch simply completes into the controller's stale-discard
//! path. Nothing is cancelled; correctness never depends on cancellation.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use pulse_client::SharedFeedSource;
use pulse_core::{Classification, FeedPage, FeedState, FetchCause, WalletContext};

use crate::{Applied, ControllerConfig, FeedController, FetchRequest};

/// Errors from talking to a session task
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("feed session terminated")]
    Closed,
}

enum SessionCommand {
    SetWallet(Option<WalletContext>),
    SetClassification(Classification),
    Refresh,
    Snapshot(oneshot::Sender<FeedState>),
    Shutdown,
}

/// Handle to a running feed session task
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Update the wallet context (account/chain switch or disconnect)
    pub async fn set_wallet(&self, wallet: Option<WalletContext>) -> Result<(), SessionError> {
        self.send(SessionCommand::SetWallet(wallet)).await
    }

    /// Switch between the Normal and Spam feed partitions
    pub async fn set_classification(
        &self,
        classification: Classification,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::SetClassification(classification))
            .await
    }

    /// Re-fetch the current identity/classification
    pub async fn refresh(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Refresh).await
    }

    /// Read the current view-state snapshot
    pub async fn snapshot(&self) -> Result<FeedState, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Stop the session task
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown).await
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// Spawns and owns the session task
pub struct FeedSession;

impl FeedSession {
    /// Start a session against a feed source
    pub fn spawn(source: SharedFeedSource, config: ControllerConfig) -> SessionHandle {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(run_session(source, config, rx));
        SessionHandle { tx }
    }
}

type InFlightFetch = BoxFuture<'static, (u64, Result<FeedPage, FetchCause>)>;

fn start_fetch(source: &SharedFeedSource, request: FetchRequest) -> InFlightFetch {
    let source = source.clone();
    Box::pin(async move {
        let result = source
            .fetch_feed(&request.identity, request.classification, request.limit)
            .await
            .map_err(|err| {
                warn!("feed fetch failed: {err}");
                err.cause()
            });
        (request.seq, result)
    })
}

async fn run_session(
    source: SharedFeedSource,
    config: ControllerConfig,
    mut rx: mpsc::Receiver<SessionCommand>,
) {
    let mut controller = FeedController::new(config);
    let mut in_flight: FuturesUnordered<InFlightFetch> = FuturesUnordered::new();

    info!("feed session started");
    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else { break };
                let request = match command {
                    SessionCommand::SetWallet(wallet) => {
                        match controller.set_wallet(wallet.as_ref()) {
                            Ok(request) => request,
                            Err(err) => {
                                debug!("no feed identity: {err}");
                                None
                            }
                        }
                    }
                    SessionCommand::SetClassification(classification) => {
                        controller.set_classification(classification)
                    }
                    SessionCommand::Refresh => controller.refresh(),
                    SessionCommand::Snapshot(reply) => {
                        let _ = reply.send(controller.snapshot());
                        None
                    }
                    SessionCommand::Shutdown => break,
                };
                if let Some(request) = request {
                    debug!(
                        "issuing fetch {} for {} ({})",
                        request.seq, request.identity, request.classification
                    );
                    in_flight.push(start_fetch(&source, request));
                }
            }
            Some((seq, result)) = in_flight.next() => {
                match controller.apply_completion(seq, result) {
                    Applied::Loaded => debug!("fetch {seq} loaded"),
                    Applied::Failed(cause) => warn!("fetch {seq} failed: {cause}"),
                    Applied::Stale => debug!("fetch {seq} superseded; result dropped"),
                }
            }
        }
    }
    info!("feed session stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use pulse_client::{FeedSource, FetchError, Subscription};
    use pulse_core::{EnvConfig, Identity, NotificationRecord};

    const ADDRESS: &str = "0x51908F598A5e0d8F1A3bAbFa6DF76F9704daD072";

    fn record(title: &str) -> NotificationRecord {
        NotificationRecord {
            title: title.to_string(),
            body: format!("{title} body"),
            cta: None,
            app: "TestChannel".to_string(),
            icon: String::new(),
            image: None,
            url: None,
            blockchain: "ETH_TEST_SEPOLIA".to_string(),
            secret: false,
            payload: None,
            epoch: None,
        }
    }

    /// Scripted source: per-classification latency, optional failure on the
    /// nth call.
    struct ScriptedSource {
        normal_delay: Duration,
        spam_delay: Duration,
        fail_on_call: Option<(usize, FetchCause)>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(normal_delay: Duration, spam_delay: Duration) -> Self {
            Self {
                normal_delay,
                spam_delay,
                fail_on_call: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(mut self, call: usize, cause: FetchCause) -> Self {
            self.fail_on_call = Some((call, cause));
            self
        }
    }

    #[async_trait]
    impl FeedSource for ScriptedSource {
        async fn fetch_feed(
            &self,
            _identity: &Identity,
            classification: Classification,
            _limit: usize,
        ) -> Result<FeedPage, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = match classification {
                Classification::Normal => self.normal_delay,
                Classification::Spam => self.spam_delay,
            };
            tokio::time::sleep(delay).await;

            if let Some((fail_call, cause)) = self.fail_on_call {
                if call == fail_call {
                    return Err(match cause {
                        FetchCause::Timeout => FetchError::Timeout {
                            url: "scripted".to_string(),
                            timeout_secs: 30,
                        },
                        _ => FetchError::Status {
                            status: 503,
                            url: "scripted".to_string(),
                        },
                    });
                }
            }

            let titles = match classification {
                Classification::Normal => vec!["n1", "n2", "n3"],
                Classification::Spam => vec!["s1"],
            };
            Ok(FeedPage::new(
                classification,
                titles.into_iter().map(record).collect(),
            ))
        }

        async fn fetch_subscriptions(
            &self,
            _identity: &Identity,
        ) -> Result<Vec<Subscription>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn spawn_session(source: ScriptedSource) -> SessionHandle {
        FeedSession::spawn(
            Arc::new(source),
            ControllerConfig::new(EnvConfig::default()),
        )
    }

    async fn settle(handle: &SessionHandle) -> FeedState {
        loop {
            let state = handle.snapshot().await.unwrap();
            if !state.is_loading {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_arrival_loads_feed() {
        let source = ScriptedSource::new(Duration::from_millis(10), Duration::from_millis(10));
        let handle = spawn_session(source);

        handle
            .set_wallet(Some(WalletContext::connected(ADDRESS, 1)))
            .await
            .unwrap();

        let state = settle(&handle).await;
        assert_eq!(state.page.as_ref().unwrap().len(), 3);
        assert!(state.last_error.is_none());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wallet_stays_idle() {
        let source = ScriptedSource::new(Duration::from_millis(10), Duration::from_millis(10));
        let handle = spawn_session(source);

        handle.set_wallet(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let state = handle.snapshot().await.unwrap();
        assert!(!state.is_loading);
        assert!(state.page.is_none());
        assert!(state.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_normal_result_does_not_clobber_spam() {
        // Normal is slow, Spam is fast: the Spam page lands first and the
        // straggling Normal completion must be dropped.
        let source = ScriptedSource::new(Duration::from_millis(200), Duration::from_millis(10));
        let handle = spawn_session(source);

        handle
            .set_wallet(Some(WalletContext::connected(ADDRESS, 1)))
            .await
            .unwrap();
        handle
            .set_classification(Classification::Spam)
            .await
            .unwrap();

        // Let both fetches complete, in either order.
        tokio::time::sleep(Duration::from_millis(500)).await;

        let state = settle(&handle).await;
        let page = state.page.unwrap();
        assert_eq!(page.classification, Classification::Spam);
        assert_eq!(page.records[0].title, "s1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_page() {
        let source = ScriptedSource::new(Duration::from_millis(10), Duration::from_millis(10))
            .failing_on(1, FetchCause::Network);
        let handle = spawn_session(source);

        handle
            .set_wallet(Some(WalletContext::connected(ADDRESS, 1)))
            .await
            .unwrap();
        let loaded = settle(&handle).await;
        assert_eq!(loaded.page.as_ref().unwrap().len(), 3);

        handle.refresh().await.unwrap();
        let state = settle(&handle).await;
        assert_eq!(state.last_error, Some(FetchCause::Network));
        assert_eq!(state.page.as_ref().unwrap().len(), 3, "page retained");
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reports_loading_while_in_flight() {
        let source = ScriptedSource::new(Duration::from_secs(5), Duration::from_secs(5));
        let handle = spawn_session(source);

        handle
            .set_wallet(Some(WalletContext::connected(ADDRESS, 1)))
            .await
            .unwrap();

        let state = handle.snapshot().await.unwrap();
        assert!(state.is_loading);
        assert!(state.page.is_none());
    }
}

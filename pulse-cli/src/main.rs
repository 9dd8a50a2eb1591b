//! Pulse CLI
//!
//! Wallet-linked notification feeds from the command line.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use pulse_client::{
    ClientConfig, FeedSource, HttpFeedSource, OutboundNotification, PayloadSigner,
    SharedFeedSource,
};
use pulse_core::{
    resolve_identity, Classification, EnvConfig, Environment, FeedPage, Identity,
    NotificationRecord, WalletContext, DEFAULT_FEED_LIMIT,
};
use pulse_engine::{ControllerConfig, FeedSession, SessionHandle};

#[derive(Parser)]
#[command(name = "pulse")]
#[command(author, version, about = "Pulse: wallet-linked notification feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(clap::Args)]
struct RecipientArgs {
    /// Recipient wallet address
    #[arg(short, long)]
    address: String,

    /// Chain the wallet is on
    #[arg(long, default_value = "1")]
    chain_id: u64,

    /// Use chain-qualified (CAIP) identities
    #[arg(long)]
    caip: bool,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Deployment stage of the feed source (prod|staging|dev)
    #[arg(short, long, default_value = "staging")]
    env: Environment,

    /// Base URL override for self-hosted deployments
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of a recipient's feed
    Feed {
        #[command(flatten)]
        recipient: RecipientArgs,

        #[command(flatten)]
        source: SourceArgs,

        /// Read the spam partition instead of the normal one
        #[arg(long)]
        spam: bool,

        /// Maximum records to fetch
        #[arg(short, long, default_value_t = DEFAULT_FEED_LIMIT)]
        limit: usize,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the channels a recipient subscribes to
    Subscriptions {
        #[command(flatten)]
        recipient: RecipientArgs,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Submit a sample notification from a channel
    Send {
        #[command(flatten)]
        source: SourceArgs,

        /// Sending channel address (chain-qualified)
        #[arg(long)]
        channel: String,

        /// Recipient address (chain-qualified)
        #[arg(long)]
        recipient: String,

        /// Detail title shown in the feed
        #[arg(long, default_value = "[sdk-test] payload title")]
        title: String,

        /// Detail body shown in the feed
        #[arg(long, default_value = "sample msg body")]
        body: String,

        /// Pre-computed verification proof for the payload
        #[arg(long, env = "PULSE_VERIFICATION_PROOF")]
        proof: String,
    },

    /// Poll a recipient's feed and print changes
    Watch {
        #[command(flatten)]
        recipient: RecipientArgs,

        #[command(flatten)]
        source: SourceArgs,

        /// Read the spam partition instead of the normal one
        #[arg(long)]
        spam: bool,

        /// Seconds between refreshes
        #[arg(short, long, default_value = "30")]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Feed {
            recipient,
            source,
            spam,
            limit,
            json,
        } => run_feed(recipient, source, spam, limit, json).await?,
        Commands::Subscriptions { recipient, source } => {
            run_subscriptions(recipient, source).await?
        }
        Commands::Send {
            source,
            channel,
            recipient,
            title,
            body,
            proof,
        } => run_send(source, channel, recipient, title, body, proof).await?,
        Commands::Watch {
            recipient,
            source,
            spam,
            interval,
        } => run_watch(recipient, source, spam, interval).await?,
    }

    Ok(())
}

fn client_config(source: &SourceArgs) -> ClientConfig {
    let mut config = ClientConfig::new(source.env);
    if let Some(base_url) = &source.base_url {
        config = config.with_base_url(base_url);
    }
    config
}

fn recipient_identity(recipient: &RecipientArgs) -> Result<Identity> {
    let wallet = WalletContext::connected(&recipient.address, recipient.chain_id);
    Ok(resolve_identity(&wallet, recipient.caip)?)
}

async fn run_feed(
    recipient: RecipientArgs,
    source: SourceArgs,
    spam: bool,
    limit: usize,
    json: bool,
) -> Result<()> {
    let identity = recipient_identity(&recipient)?;
    let classification = if spam {
        Classification::Spam
    } else {
        Classification::Normal
    };

    let feed_source = HttpFeedSource::new(client_config(&source))?;
    let page = feed_source.fetch_feed(&identity, classification, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    println!("🔔 {} feed for {}\n", classification, identity);
    if page.is_empty() {
        println!("   (no records)");
        return Ok(());
    }
    for (i, record) in page.records.iter().enumerate() {
        print_record(i + 1, record);
    }
    Ok(())
}

fn print_record(index: usize, record: &NotificationRecord) {
    println!(
        "[{index}] {} · {} ({})",
        record.display_title(),
        record.app,
        record.blockchain
    );
    println!("    {}", record.display_body());
    if let Some(cta) = &record.cta {
        println!("    ↗ {cta}");
    }
    if let Some(epoch) = &record.epoch {
        println!("    at {}", epoch.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

async fn run_subscriptions(recipient: RecipientArgs, source: SourceArgs) -> Result<()> {
    let identity = recipient_identity(&recipient)?;
    let feed_source = HttpFeedSource::new(client_config(&source))?;
    let subscriptions = feed_source.fetch_subscriptions(&identity).await?;

    println!("📡 {} subscribes to {} channel(s)\n", identity, subscriptions.len());
    for subscription in &subscriptions {
        println!("   {}", subscription.channel);
    }
    Ok(())
}

/// Signer that replays an externally produced proof; proof generation belongs
/// to the wallet, not this binary.
struct ProvidedProof {
    channel: String,
    proof: String,
}

impl PayloadSigner for ProvidedProof {
    fn address(&self) -> String {
        self.channel.clone()
    }

    fn sign(&self, _message: &str) -> String {
        self.proof.clone()
    }
}

async fn run_send(
    source: SourceArgs,
    channel: String,
    recipient: String,
    title: String,
    body: String,
    proof: String,
) -> Result<()> {
    let feed_source = HttpFeedSource::new(client_config(&source))?;
    let signer = ProvidedProof { channel, proof };
    let outbound = OutboundNotification {
        alert_title: format!("[SDK-TEST] notification TITLE: {title}"),
        alert_body: format!("[sdk-test] notification BODY: {body}"),
        title,
        body,
        cta: None,
        image: None,
        recipient,
    };

    feed_source.send_notification(&signer, &outbound).await?;
    println!("✅ notification submitted");
    Ok(())
}

async fn run_watch(
    recipient: RecipientArgs,
    source: SourceArgs,
    spam: bool,
    interval: u64,
) -> Result<()> {
    let wallet = WalletContext::connected(&recipient.address, recipient.chain_id);
    let env = EnvConfig::new(source.env, recipient.caip);

    let shared: SharedFeedSource = HttpFeedSource::shared(client_config(&source))?;
    let handle = FeedSession::spawn(shared, ControllerConfig::new(env));

    handle.set_wallet(Some(wallet)).await?;
    if spam {
        handle.set_classification(Classification::Spam).await?;
    }

    println!("👀 watching feed (refresh every {interval}s, Ctrl-C to stop)\n");

    let mut last_fetched: Option<DateTime<Utc>> = None;
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                handle.refresh().await?;
                let state = settle(&handle).await?;
                if let Some(cause) = state.last_error {
                    println!("⚠️  refresh failed: {cause}");
                    continue;
                }
                if let Some(page) = &state.page {
                    if last_fetched != Some(page.fetched_at) {
                        last_fetched = Some(page.fetched_at);
                        print_page_summary(page);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await?;
    Ok(())
}

fn print_page_summary(page: &FeedPage) {
    println!(
        "refreshed: {} records at {}",
        page.len(),
        page.fetched_at.format("%H:%M:%S")
    );
    for record in page.records.iter().take(5) {
        println!("   {} · {}", record.display_title(), record.app);
    }
}

async fn settle(handle: &SessionHandle) -> Result<pulse_core::FeedState> {
    loop {
        let state = handle.snapshot().await?;
        if !state.is_loading {
            return Ok(state);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

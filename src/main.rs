use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loyalty_actors::actors::{LocalHost, RunOutcome};
use loyalty_actors::config::LoyaltyConfig;
use loyalty_actors::domain::loyalty::{CustomerRecord, TierTable};
use loyalty_actors::notification::LogNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,loyalty_actors=debug"))
        )
        .init();

    tracing::info!("🚀 Starting customer loyalty demo");

    // === 1. Load configuration ===
    let config = LoyaltyConfig::from_env()?;
    tracing::info!(
        history_threshold = config.history_threshold,
        notification_attempts = config.notification_retry.max_attempts,
        canceled_signals = ?config.canceled_signal_policy,
        "Configuration loaded"
    );

    // === 2. Start the actor host ===
    let host = LocalHost::new(config, Arc::new(LogNotifier))?;
    tracing::info!("📊 Metrics registry created with {} metrics", host.metrics().registry().gather().len());

    // === 3. Start a customer and earn points ===
    let alice = host.start(CustomerRecord::new("alice").with_name("Alice")).await?;
    alice.add_points(600).await?;
    alice.add_points(1_500).await?;
    alice.settle().await?;
    tracing::info!(report = ?alice.get_status_report(), "✅ Alice after purchases");

    // === 4. A customer who already has an account ===
    let bob = host.start(CustomerRecord::new("bob").with_name("Bob").with_points(120)).await?;

    // === 5. Alice invites a new guest and an existing customer ===
    alice.invite_guest(CustomerRecord::new("carol").with_name("Carol")).await?;
    alice.invite_guest(CustomerRecord::new("bob").with_name("Bob")).await?;
    alice.settle().await?;

    let carol = host.handle(&"carol".into()).await?;
    carol.settle().await?;
    bob.settle().await?;
    tracing::info!(
        guests = alice.get_guests().len(),
        carol = %carol.get_status(),
        bob = %bob.get_status(),
        floor = %TierTable::previous(alice.get_status()),
        "✅ Guests invited"
    );

    // === 6. Alice leaves ===
    alice.cancel_account().await?;
    let outcome = alice.wait_for_completion().await?;
    debug_assert_eq!(outcome, RunOutcome::Done);
    tracing::info!(report = ?alice.get_status_report(), run = ?alice.get_run_info(), "✅ Alice's run is done");

    host.shutdown().await;
    tracing::info!("🎉 Demo complete!");

    Ok(())
}

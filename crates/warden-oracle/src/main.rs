use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_chain::{agent_id_from_topic, ChainClient, IndexerClient};
use warden_db::{StateStore, StoreConfig};
use warden_llm::{DiagnosticEngine, HttpChatTransport};
use warden_oracle::{Orchestrator, Scheduler};
use warden_types::OracleConfig;

/// Autonomous monitoring and trust-assessment oracle for on-chain
/// registered agents.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the periodic monitoring loop (the default).
    Run {
        /// Run a single monitoring cycle and exit.
        #[arg(long)]
        once: bool,
    },
    /// Deliver a MonitoringEnabled notification from the onboarding
    /// endpoint: creates the agent row ahead of the next cycle.
    NotifyRegistered {
        /// Second indexed topic of the log, the agent id as a uint256.
        #[arg(long)]
        topic: String,
        /// Declared health endpoint, when the notifier forwards it.
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Deliver an unregistration notification: cascades the delete across
    /// every collection holding the agent's data.
    NotifyUnregistered { agent_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,warden_oracle=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // A missing mandatory variable is fatal here, before anything connects.
    let config = OracleConfig::from_env()?;

    let store = Arc::new(
        StateStore::open(
            StoreConfig::new(&config.state_store_uri).with_cache_ttl(config.cache_ttl),
        )
        .await
        .context("failed to open state store")?,
    );

    // First launch mints the instance token; it survives restarts in the
    // store's config collection.
    if store.get_config("instance_token").await?.is_none() {
        store
            .set_config("instance_token", &uuid::Uuid::new_v4().to_string())
            .await?;
        info!("Minted instance token on first launch");
    }

    let chain = Arc::new(ChainClient::new(
        &config.rpc_url,
        &config.private_key,
        &config.health_monitor,
        &config.identity_registry,
        &config.reputation_registry,
    )?);
    let indexer = Arc::new(IndexerClient::new(&config.indexer_url)?);
    let transport = Arc::new(HttpChatTransport::new(
        &config.llm_api_url,
        &config.llm_api_key,
    )?);
    let engine = DiagnosticEngine::new(transport, store.clone(), &config.llm_model);

    let orchestrator = Arc::new(Orchestrator::new(
        chain,
        indexer,
        engine,
        store.clone(),
        &config.metadata_gateway,
    ));

    match cli.command.unwrap_or(Command::Run { once: false }) {
        Command::Run { once: true } => {
            info!("--- Warden Oracle: single cycle ---");
            orchestrator.run_cycle().await;
        }
        Command::Run { once: false } => {
            info!("--- Warden Oracle ---");
            info!(
                "cycle interval {}s, cache ttl {}s",
                config.cycle_interval.as_secs(),
                config.cache_ttl.as_secs()
            );

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                wait_for_signal().await;
                info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            });

            Scheduler::new(orchestrator, config.cycle_interval)
                .run(shutdown_rx)
                .await;
            info!("--- Warden Oracle stopped ---");
        }
        Command::NotifyRegistered { topic, endpoint } => {
            let agent_id = agent_id_from_topic(&topic)?;
            orchestrator
                .notify_registered(&agent_id.to_string(), endpoint)
                .await?;
            info!("Agent {agent_id} registered for monitoring");
        }
        Command::NotifyUnregistered { agent_id } => {
            let touched = orchestrator.notify_unregistered(&agent_id).await?;
            info!(
                "Removed agent {agent_id} data from {} collection(s): {touched:?}",
                touched.len()
            );
        }
    }

    store.close().await?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

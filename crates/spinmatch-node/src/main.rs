//! SpinMatch node.
//!
//! Runs the round engine over an in-memory ledger with simulated bettors and
//! prints every engine event to stdout as one JSON object per line. Logs go
//! to stderr.
//!
//! Wiring sequence:
//! 1. Load `spinmatch.toml` (or the path given as the first argument)
//! 2. Init tracing (JSON structured logging)
//! 3. Seed the ledger with the simulated accounts
//! 4. Spawn the engine, connect the accounts, spawn the bettors
//! 5. Print events until the configured round count or Ctrl-C
//! 6. Shut down and report final balances

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use spinmatch_engine::{EngineHandle, EventKind, FixedDraw, OutcomeSource, UniformDraw};
use spinmatch_ledger::{InMemoryLedger, InMemoryRoundStore, Ledger};
use spinmatch_types::{AccountId, RoundPhase, constants};
use tokio::signal;
use tracing::{error, info};

mod config;
mod simulation;

use config::NodeConfig;
use simulation::{BettorProfile, spawn_bettor};

const DEFAULT_CONFIG_PATH: &str = "spinmatch.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, loaded) = NodeConfig::load(&path).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        config = %path.display(),
        from_file = loaded,
        accounts = config.simulation.accounts.len(),
        "starting node"
    );

    let ledger = InMemoryLedger::new();
    let accounts: Vec<AccountId> = config
        .simulation
        .accounts
        .iter()
        .map(AccountId::new)
        .collect();
    for account in &accounts {
        ledger
            .deposit(account, config.simulation.starting_balance)
            .await
            .with_context(|| format!("Failed to fund {account}"))?;
    }

    let seed = config.simulation.seed;
    let draw: Box<dyn OutcomeSource> = if !config.simulation.outcomes.is_empty() {
        Box::new(FixedDraw::new(config.simulation.outcomes.clone()))
    } else if let Some(seed) = seed {
        Box::new(UniformDraw::seeded(seed))
    } else {
        Box::new(UniformDraw::from_entropy())
    };

    let (engine, engine_task) = EngineHandle::spawn(
        config.engine.clone(),
        Arc::new(ledger.clone()),
        Arc::new(InMemoryRoundStore::new()),
        draw,
    )
    .context("Failed to start engine")?;

    let mut events = engine.subscribe().await.context("Engine stopped early")?;
    for account in &accounts {
        engine.connect(account.clone()).await?;
    }

    let profile = BettorProfile {
        min_bet: config.engine.min_bet,
        max_bet: config.engine.max_bet,
        stake_probability: config.simulation.stake_probability,
    };
    let base_seed = seed.unwrap_or_else(rand::random);
    let bettors: Vec<_> = accounts
        .iter()
        .zip(0u64..)
        .map(|(account, i)| {
            spawn_bettor(
                engine.clone(),
                account.clone(),
                profile,
                base_seed.wrapping_add(i),
            )
        })
        .collect();

    let rounds = config.simulation.rounds;
    let printer = tokio::spawn(async move {
        let mut finished = 0u64;
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => error!(error = %e, "event not serializable"),
            }
            if let EventKind::GameState(state) = &event.kind {
                if state.phase == RoundPhase::Cleanup {
                    finished += 1;
                    if rounds.is_some_and(|limit| finished >= limit) {
                        info!(rounds = finished, "round limit reached");
                        return;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => info!("SIGINT received, shutting down"),
        _ = printer => {}
    }

    engine.shutdown().await.ok();
    engine_task.await.context("Engine task panicked")?;
    for bettor in bettors {
        bettor.abort();
    }

    for account in &accounts {
        let balance = ledger.balance(account).await?;
        info!(%account, balance, "final balance");
    }
    info!(supply = %ledger.total_supply().await, "node stopped");
    Ok(())
}

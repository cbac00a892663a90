//! Node configuration file.
//!
//! ```toml
//! log_level = "info"
//!
//! [engine]
//! min_players = 2
//! betting_window_secs = 10
//! settlement_fee = "0.025"
//!
//! [simulation]
//! accounts = ["alice", "bob", "carol"]
//! starting_balance = 5000
//! rounds = 3
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use spinmatch_types::{Amount, EngineConfig};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Used when `RUST_LOG` is unset.
    pub log_level: String,
    pub engine: EngineConfig,
    pub simulation: SimulationConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            engine: EngineConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Simulated bettors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub accounts: Vec<String>,
    pub starting_balance: Amount,
    /// Chance that a bettor stakes in a given round.
    pub stake_probability: f64,
    /// Stop after this many finished rounds. Runs until Ctrl-C when unset.
    pub rounds: Option<u64>,
    /// Seed for both the wheel and the bettors. Entropy when unset.
    pub seed: Option<u64>,
    /// Replay these numbers instead of drawing.
    pub outcomes: Vec<u8>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            accounts: ["alice", "bob", "carol", "dave"].map(String::from).to_vec(),
            starting_balance: 5_000,
            stake_probability: 0.8,
            rounds: None,
            seed: None,
            outcomes: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Load `path`, or the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<(Self, bool)> {
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok((config, true))
    }

    fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .context("Invalid [engine] section")?;
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.simulation.stake_probability),
            "stake_probability must be within [0, 1]"
        );
        anyhow::ensure!(
            self.simulation.outcomes.iter().all(|n| (1..=36).contains(n)),
            "outcomes must be numbers from 1 to 36"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: NodeConfig = toml::from_str(
            r#"
            [engine]
            betting_window_secs = 10
            settlement_fee = "0.05"

            [simulation]
            accounts = ["x", "y"]
            rounds = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.betting_window_secs, 10);
        assert_eq!(config.engine.settlement_fee.to_string(), "0.05");
        assert_eq!(config.engine.min_players, 2);
        assert_eq!(config.simulation.accounts, vec!["x", "y"]);
        assert_eq!(config.simulation.rounds, Some(2));
        assert_eq!(config.simulation.starting_balance, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back() {
        let (config, loaded) = NodeConfig::load(Path::new("does-not-exist.toml")).unwrap();
        assert!(!loaded);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn bad_replay_rejected() {
        let mut config = NodeConfig::default();
        config.simulation.outcomes = vec![0];
        assert!(config.validate().is_err());
    }
}

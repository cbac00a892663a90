//! Simulated bettors.
//!
//! Each bettor watches the event stream and, once per round, may stake a
//! random amount on a random side as soon as betting opens.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spinmatch_engine::{EngineHandle, EventKind};
use spinmatch_types::{AccountId, Amount, RoundId, RoundPhase, Side};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Stake limits and behaviour shared by every bettor.
#[derive(Debug, Clone, Copy)]
pub struct BettorProfile {
    pub min_bet: Amount,
    pub max_bet: Amount,
    pub stake_probability: f64,
}

/// Spawn a bettor that runs until the engine stops.
pub fn spawn_bettor(
    engine: EngineHandle,
    account: AccountId,
    profile: BettorProfile,
    seed: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(seed);
        let Ok(mut events) = engine.subscribe().await else {
            return;
        };
        let mut last_round: Option<RoundId> = None;

        while let Some(event) = events.recv().await {
            let EventKind::GameState(state) = event.kind else {
                continue;
            };
            if state.phase != RoundPhase::BettingOpen || last_round == Some(state.round_id) {
                continue;
            }
            last_round = Some(state.round_id);
            if !rng.gen_bool(profile.stake_probability) {
                debug!(%account, round = %state.round_id, "sitting out");
                continue;
            }

            let side = if rng.gen_bool(0.5) { Side::Red } else { Side::Black };
            let amount = rng.gen_range(profile.min_bet..=profile.max_bet);
            match engine.place_bet(account.clone(), side, amount).await {
                Ok(bet) => info!(
                    %account,
                    round = %state.round_id,
                    %side,
                    amount,
                    matched = bet.matched,
                    "stake placed"
                ),
                Err(e) if e.is_rejection() => {
                    info!(%account, round = %state.round_id, reason = %e.user_message(), "stake refused");
                }
                Err(e) => {
                    warn!(%account, error = %e, "bettor stopping");
                    return;
                }
            }
        }
    })
}

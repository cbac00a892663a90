//! # spinmatch-engine
//!
//! **The SpinMatch round engine.**
//!
//! One task owns the round lifecycle: it takes stakes while betting is
//! open, matches them peer-to-peer, draws and reveals the outcome, settles
//! through the ledger and starts the next round. Failures land the round
//! in ERROR, void it and recover.
//!
//! ```text
//!   EngineHandle ──commands──▶ driver ──effects──▶ Ledger / RoundStore
//!                                │
//!                                ├── machine    (pure transitions)
//!                                ├── scheduler  (phase timers)
//!                                └── publisher  ──events──▶ observers
//! ```
//!
//! Stakes, timer expiries and connection changes are handled one at a time
//! in arrival order, so a stake never observes a half-finished transition.

mod driver;
pub mod draw;
pub mod engine;
pub mod history;
pub mod machine;
pub mod placement;
pub mod publisher;
pub mod scheduler;

pub use draw::{FixedDraw, OutcomeSource, UniformDraw};
pub use engine::EngineHandle;
pub use history::OutcomeHistory;
pub use machine::{Effect, Gate, Transition, Trigger};
pub use publisher::{EngineEvent, EventKind, MatchBatch};
pub use scheduler::TimerKind;

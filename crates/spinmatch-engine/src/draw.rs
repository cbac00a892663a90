//! Outcome draw sources.
//!
//! The engine draws one outcome per round on entering SPINNING. Production
//! uses a uniform draw over 1-36; tests script the sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spinmatch_types::{Outcome, Result, constants};

/// Produces the winning number for a round.
pub trait OutcomeSource: Send + Sync + 'static {
    /// # Errors
    /// `OutcomeOutOfRange` if the source yields a number outside 1-36.
    fn draw(&mut self) -> Result<Outcome>;
}

/// Uniform draw over the wheel.
#[derive(Debug)]
pub struct UniformDraw {
    rng: StdRng,
}

impl UniformDraw {
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for simulations.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl OutcomeSource for UniformDraw {
    fn draw(&mut self) -> Result<Outcome> {
        Outcome::new(
            self.rng
                .gen_range(constants::MIN_OUTCOME..=constants::MAX_OUTCOME),
        )
    }
}

/// Scripted numbers, repeated from the start once exhausted.
///
/// Used by tests and for replaying a recorded sequence of spins.
#[derive(Debug, Clone)]
pub struct FixedDraw {
    numbers: Vec<u8>,
    next: usize,
}

impl FixedDraw {
    #[must_use]
    pub fn new(numbers: impl Into<Vec<u8>>) -> Self {
        Self {
            numbers: numbers.into(),
            next: 0,
        }
    }

    /// Always the same number.
    #[must_use]
    pub fn always(number: u8) -> Self {
        Self::new(vec![number])
    }
}

impl OutcomeSource for FixedDraw {
    fn draw(&mut self) -> Result<Outcome> {
        let Some(&number) = self.numbers.get(self.next % self.numbers.len().max(1)) else {
            return Err(spinmatch_types::SpinmatchError::Internal(
                "FixedDraw has no numbers".into(),
            ));
        };
        self.next += 1;
        Outcome::new(number)
    }
}

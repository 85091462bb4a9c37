//! Die sampling.
//!
//! The engine never rolls on its own; the host samples a value here and
//! passes it to [`GameSession::roll`](super::session::GameSession::roll).
//! A fixed seed replays the same sequence.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::board::DIE_FACES;

/// Seedable six-sided die.
#[derive(Clone, Debug)]
pub struct Dice {
    inner: ChaCha8Rng,
    seed: u64,
}

impl Dice {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A value in `1..=6`.
    pub fn roll(&mut self) -> u8 {
        self.inner.gen_range(1..=DIE_FACES)
    }
}

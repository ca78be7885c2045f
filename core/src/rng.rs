//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SimRng instances derived from the
//! master seed of the generation run.
//!
//! Each component gets its own RNG stream, seeded deterministically
//! from (master_seed XOR slot). Adding a new slot never changes the
//! streams of existing ones.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single simulation component.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform draw in [0, n). Callers guarantee n > 0.
    pub fn next_below(&mut self, n: u64) -> u64 {
        use rand::Rng;
        debug_assert!(n > 0, "next_below called with n = 0");
        self.inner.gen_range(0..n)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// `amount` distinct values drawn uniformly from [0, length),
    /// returned in ascending order. Callers guarantee amount <= length.
    pub fn sample_distinct(&mut self, length: usize, amount: usize) -> Vec<usize> {
        let mut picked = rand::seq::index::sample(&mut self.inner, length, amount).into_vec();
        picked.sort_unstable();
        picked
    }
}

/// All component RNGs for a single generation run.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_slot(&self, slot: RngSlot) -> SimRng {
        SimRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries. Append only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    Compromise = 0,
    Transaction = 1,
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compromise  => "compromise",
            Self::Transaction => "transaction",
        }
    }
}

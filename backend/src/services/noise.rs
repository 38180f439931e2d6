//! Injectable noise source for simulated values
//!
//! Every random perturbation in the pipeline draws from one of these, so a
//! seeded instance makes simulated snapshots and series reproducible.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct NoiseSource {
    rng: Mutex<StdRng>,
}

impl NoiseSource {
    /// Deterministic sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeded when `seed` is set, entropy otherwise
    pub fn from_config(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    fn draw<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned lock only means another draw panicked; the generator state is still usable
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut rng)
    }

    /// Uniform value in `[-amplitude, amplitude]`
    pub fn jitter(&self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        self.draw(|rng| rng.gen_range(-amplitude..=amplitude))
    }

    /// True with probability `p`
    pub fn chance(&self, p: f64) -> bool {
        let p = p.clamp(0.0, 1.0);
        self.draw(|rng| rng.gen_bool(p))
    }

    /// Multiplicative factor `1 ± spread`, clamped to `[min, max]`
    pub fn factor(&self, spread: f64, min: f64, max: f64) -> f64 {
        (1.0 + self.jitter(spread)).clamp(min, max)
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

//! Random source construction.
//!
//! Every probabilistic operation in the simulation draws from a generator
//! passed in by the caller. This module builds that generator in one of
//! two modes: replayable (seeded) or live (seeded from the OS).

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

/// Build the simulation's random source.
///
/// `Some(seed)` gives a replayable run: the same seed and inputs produce
/// the same turns. `None` seeds from the operating system.
pub fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            debug!(seed, "Using replayable random source");
            StdRng::seed_from_u64(seed)
        }
        None => {
            info!("Using live random source");
            StdRng::from_os_rng()
        }
    }
}

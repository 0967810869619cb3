use rand::SeedableRng;
use rand::rngs::StdRng;

/// Round RNG: deterministic when a seed is configured, entropy otherwise.
pub fn round_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

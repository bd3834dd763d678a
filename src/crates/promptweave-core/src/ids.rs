//! Stable identifier generation.

use crate::random::RandomSource;
use uuid::Builder;

/// Generate a new unique id, rendered as a plain hyphenated string.
///
/// Individuals, requests, and context handles all use this so ids read the
/// same way across the crate regardless of which subsystem minted them.
///
/// The bytes are drawn from the injected `RandomSource`, not from a global
/// UUID generator, so a whole run reseeded identically mints identical ids
/// in identical order — required for `evolve()` to be bit-for-bit
/// reproducible across two runs with the same seed.
pub fn new_id(random: &dyn RandomSource) -> String {
    let mut bytes = [0u8; 16];
    for byte in bytes.iter_mut() {
        *byte = random.gen_below(256) as u8;
    }
    Builder::from_random_bytes(bytes).into_uuid().to_string()
}

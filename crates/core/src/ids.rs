//! Emergency id generation.
//!
//! Ids follow the `EMG-{epoch_ms}-{SUFFIX}` wire format of the upstream
//! dispatch feed: the millisecond timestamp orders ids roughly by creation
//! time and the random base36 suffix disambiguates concurrent creations.
//! Uniqueness is ultimately enforced at insert time by the emergency store,
//! which rejects duplicates so callers can regenerate.

use rand::Rng;

const SUFFIX_LEN: usize = 5;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a new emergency id for a record created at `now_ms`.
pub fn new_emergency_id(now_ms: u64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("EMG-{}-{}", now_ms, suffix)
}

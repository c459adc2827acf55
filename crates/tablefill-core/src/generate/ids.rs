//! Identifier generators shared by the string and number catalogs.

use rand::Rng;

/// Crockford base32 alphabet used by ULIDs.
const CROCKFORD: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Milliseconds since the Unix epoch.
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Snowflake-style id: the epoch milliseconds shifted left by 10 bits with a
/// random value in `0..1023` in the low bits.
pub fn snowflake_id() -> i64 {
    let random: i64 = rand::rng().random_range(0..1023);
    (epoch_millis() << 10) | random
}

/// A 26-character ULID: 48 bits of epoch milliseconds followed by 80 random
/// bits, Crockford base32 encoded. Lexicographically sortable by time.
pub fn ulid() -> String {
    ulid_from_parts(epoch_millis() as u64, rand::rng().random())
}

fn ulid_from_parts(millis: u64, random: u128) -> String {
    let time = (millis as u128) & ((1u128 << 48) - 1);
    let random = random & ((1u128 << 80) - 1);
    let mut bits = (time << 80) | random;

    let mut out = [0u8; 26];
    for slot in out.iter_mut().rev() {
        *slot = CROCKFORD[(bits & 0x1f) as usize];
        bits >>= 5;
    }
    out.iter().map(|&b| b as char).collect()
}

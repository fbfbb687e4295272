//! Session token generation

use rand::{rngs::OsRng, RngCore};

/// Random bytes per token; rendered as twice as many hex digits
pub const TOKEN_BYTES: usize = 24;

/// Generate an unguessable bearer token as uppercase hex.
///
/// # Panics
///
/// Panics if the operating system entropy source fails. A degraded token
/// must never be handed out, so there is nothing sensible to return.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    if let Err(e) = OsRng.try_fill_bytes(&mut bytes) {
        panic!("system entropy source failed: {}", e);
    }
    hex::encode_upper(bytes)
}

/// Short, non-secret prefix of a token for log lines
pub fn token_prefix(token: &str) -> &str {
    token.get(..6).unwrap_or(token)
}

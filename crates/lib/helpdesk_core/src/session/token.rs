//! Session id and nonce generation.

use rand::distr::Alphanumeric;
use rand::{Rng, rng};

use crate::models::session::{NONCE_LEN, SESSION_ID_LEN};

/// Generate an opaque session id (64 alphanumeric chars).
pub fn session_id() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Generate a nonce binding a pending session to the identity-provider flow.
pub fn nonce() -> Vec<u8> {
    let mut bytes = vec![0u8; NONCE_LEN];
    rng().fill(bytes.as_mut_slice());
    bytes
}

//! Opaque bearer token generation and hashing.
//!
//! Tokens are 32 bytes of OS randomness, handed to the client once in
//! URL-safe base64. Only the SHA-256 digest of a token is ever stored,
//! so a leaked session table does not yield usable credentials.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD as B64, URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

const TOKEN_LEN: usize = 32;

/// Generates a fresh session token.
#[must_use]
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest of a token as stored in the session table.
#[must_use]
pub fn hash(token: &str) -> String {
    B64.encode(Sha256::digest(token.as_bytes()))
}

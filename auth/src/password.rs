//! Password hashing with PBKDF2-HMAC-SHA256.
//!
//! Stored records are self-describing:
//! `pbkdf2$<iterations>$<salt_b64>$<hash_b64>`. Verification honours the
//! iteration count recorded alongside the hash, so the default can be
//! raised later without invalidating existing credentials.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use constant_time_eq::constant_time_eq;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2";

/// PBKDF2 iteration count applied to newly hashed passwords.
pub const ITERATIONS: u32 = 200_000;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Hashes `password` with a fresh random salt.
///
/// Returns the storable record, never the raw digest.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = derive_key(password, &salt, ITERATIONS);
    format!(
        "{SCHEME}${ITERATIONS}${}${}",
        B64.encode(salt),
        B64.encode(key)
    )
}

/// Checks `password` against a stored record.
///
/// Malformed records verify as `false` rather than erroring, so a
/// corrupted row behaves like a wrong password instead of taking the
/// login endpoint down.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some(record) = parse_record(stored) else {
        return false;
    };
    let key = derive_key(password, &record.salt, record.iterations);
    constant_time_eq(&key, &record.hash)
}

struct Record {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

fn parse_record(stored: &str) -> Option<Record> {
    let mut parts = stored.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = parts.next()?.parse().ok().filter(|&n| n > 0)?;
    let salt = B64.decode(parts.next()?).ok()?;
    let hash = B64.decode(parts.next()?).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Record {
        iterations,
        salt,
        hash,
    })
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

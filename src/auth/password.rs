//! Password Hashing
//! Mission: One-way salted hashing with adaptive cost

use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};

/// Hash a plaintext password with bcrypt (salt embedded in the output).
pub fn hash_password(plaintext: &str) -> Result<String> {
    hash(plaintext, DEFAULT_COST).context("Failed to hash password")
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// A malformed or unrecognized hash value is a verification failure,
/// never a panic.
pub fn verify_password(plaintext: &str, password_hash: &str) -> bool {
    verify(plaintext, password_hash).unwrap_or(false)
}

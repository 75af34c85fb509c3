use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use crate::error::{AppError, AppResult};

// Argon2id work factor.
const MEMORY_KIB: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

fn hasher() -> AppResult<Argon2<'static>> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, None)
        .map_err(|e| AppError::Internal(format!("argon2 params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Salted hash of `plain`. An absent or empty password yields no hash,
/// which marks the account as passwordless (social login).
pub fn hash_password(plain: Option<&str>) -> AppResult<Option<String>> {
    let Some(plain) = plain.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("argon2 hash_password: {e}")))?
        .to_string();
    Ok(Some(hash))
}

/// `false` when there is no stored hash or the password does not match.
/// A stored hash that cannot be parsed is an error.
pub fn verify_password(plain: &str, hash: Option<&str>) -> AppResult<bool> {
    let Some(hash) = hash else {
        return Ok(false);
    };
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("argon2 parse hash: {e}")))?;
    Ok(hasher()?
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

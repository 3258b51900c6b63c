use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{self, SaltString, rand_core::OsRng},
};

use crate::error::ApiError;

/// Argon2id password hashing with configurable cost.
#[derive(Clone)]
pub struct Hasher {
    params: Params,
    /// Hash of a random throwaway password, checked against when the user
    /// does not exist so both login failures cost the same.
    decoy_hash: String,
}

impl Hasher {
    pub fn new(params: Params) -> anyhow::Result<Self> {
        let decoy = SaltString::generate(&mut OsRng);
        let decoy_hash = hash_with(&params, decoy.as_str())
            .map_err(|e| anyhow::anyhow!("Argon2 self-check failed: {}", e))?;
        Ok(Self { params, decoy_hash })
    }

    /// Build from raw cost settings: memory in KiB, iteration count, lanes.
    pub fn with_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> anyhow::Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 parameters: {}", e))?;
        Self::new(params)
    }

    fn argon2(&self) -> Argon2<'static> {
        argon2_with(&self.params)
    }

    /// Hash `password` with a fresh random salt, returning a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, ApiError> {
        hash_with(&self.params, password)
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Spend one verification on the decoy hash. Always `Ok(false)`.
    pub fn verify_unknown_user(&self, password: &str) -> Result<bool, ApiError> {
        self.verify(password, &self.decoy_hash).map(|_| false)
    }

    /// Check `password` against a stored PHC string. A mismatch is `Ok(false)`;
    /// only an unreadable hash or a hasher failure is an error.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, ApiError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| ApiError::Internal(format!("Corrupt password hash: {}", e)))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ApiError::Internal(format!("Password verification failed: {}", e))),
        }
    }
}

fn argon2_with(params: &Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
}

fn hash_with(params: &Params, password: &str) -> password_hash::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2_with(params).hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> Hasher {
    Hasher::with_cost(64, 1, 1).unwrap()
}

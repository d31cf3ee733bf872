use crate::types::{AppError, Result};
use crate::utils::toml_config::PasswordConfig;
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Argon2id password hashing.
///
/// Holds a hash of a throwaway password so that checking credentials for an
/// account that does not exist costs the same as checking a real one.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Invalid Argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"recuperajud-timing-equalizer", &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        Ok(Self { argon2, dummy_hash })
    }

    /// Hashes a password. Returns a PHC-formatted string.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Verifies a password against a stored PHC hash.
    ///
    /// Cost parameters are read from the stored hash, so digests made under
    /// older settings still verify.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(digest)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(self
            .argon2
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Like [`verify`](Self::verify), but a missing digest still burns one
    /// verification and answers `false`.
    pub fn verify_or_dummy(&self, plaintext: &str, digest: Option<&str>) -> Result<bool> {
        match digest {
            Some(digest) => self.verify(plaintext, digest),
            None => {
                let _ = self.verify(plaintext, &self.dummy_hash)?;
                Ok(false)
            }
        }
    }
}

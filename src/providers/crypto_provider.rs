use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;

use crate::errors::InternalError;

/// Credential primitive consumed by the services
///
/// `hash` produces an opaque digest; `compare` reports whether a plaintext
/// matches a digest. A mismatch is `Ok(false)`, never an error.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, InternalError>;

    fn compare(&self, digest: &str, plaintext: &str) -> Result<bool, InternalError>;
}

/// Argon2id hasher keyed with a secret pepper
pub struct Argon2Hasher {
    pepper: String,
}

impl Argon2Hasher {
    /// # Arguments
    /// * `pepper` - Secret parameter mixed into every hash (from Settings)
    pub fn new(pepper: String) -> Self {
        Self { pepper }
    }

    fn argon2(&self) -> Result<Argon2<'_>, InternalError> {
        Argon2::new_with_secret(
            self.pepper.as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| InternalError::crypto("argon2_init", e.to_string()))
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, InternalError> {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        let digest = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| InternalError::crypto("argon2_hash", e.to_string()))?
            .to_string();
        Ok(digest)
    }

    fn compare(&self, digest: &str, plaintext: &str) -> Result<bool, InternalError> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| InternalError::crypto("parse_password_hash", e.to_string()))?;

        match self.argon2()?.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(InternalError::crypto("argon2_verify", e.to_string())),
        }
    }
}

/// Generate a cryptographically secure random password
///
/// 20 characters drawn from upper and lower case letters, digits and symbols.
pub fn generate_secure_password() -> String {
    const PASSWORD_LENGTH: usize = 20;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                             abcdefghijklmnopqrstuvwxyz\
                             0123456789\
                             !@#$%^&*()_+-=[]{}|;:,.<>?";

    let mut rng = rand::rng();
    (0..PASSWORD_LENGTH)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use password_hash::Error as PasswordHashError;
use rand::{TryRngCore, rngs::OsRng};
use thiserror::Error;
use zeroize::Zeroizing;

/// Argon2id password hashing with a server-side pepper.
///
/// The pepper is appended to the password before hashing so stolen database
/// rows cannot be attacked offline without the application secret. Parameter
/// choices live here so every call site hashes identically.
pub struct PasswordCrypto {
    argon2: Argon2<'static>,
    pepper: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for PasswordCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCrypto").finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("password pepper must not be empty")]
    EmptyPepper,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl From<PasswordHashError> for CryptoError {
    fn from(err: PasswordHashError) -> Self {
        CryptoError::PasswordHash(err.to_string())
    }
}

impl PasswordCrypto {
    /// Defaults target ~64 MiB memory and 3 iterations, a solid server-side
    /// baseline without dedicated tuning.
    const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
    const DEFAULT_ITERATIONS: u32 = 3;
    const DEFAULT_PARALLELISM: u32 = 1;
    const SALT_LENGTH: usize = password_hash::Salt::RECOMMENDED_LENGTH;

    /// Build a hasher with the default Argon2id parameters.
    pub fn new(pepper: impl AsRef<[u8]>) -> Result<Self, CryptoError> {
        Self::with_params(
            pepper,
            ParamsBuilder::new()
                .m_cost(Self::DEFAULT_MEMORY_KIB)
                .t_cost(Self::DEFAULT_ITERATIONS)
                .p_cost(Self::DEFAULT_PARALLELISM)
                .output_len(32)
                .build()
                .map_err(|err| CryptoError::InvalidParams(err.to_string()))?,
        )
    }

    /// Build a hasher with caller-specified parameters (integration tests,
    /// constrained environments).
    pub fn with_params(pepper: impl AsRef<[u8]>, params: Params) -> Result<Self, CryptoError> {
        let pepper = pepper.as_ref();
        if pepper.is_empty() {
            return Err(CryptoError::EmptyPepper);
        }

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::default(), params);

        Ok(Self {
            argon2,
            pepper: Zeroizing::new(pepper.to_vec()),
        })
    }

    /// Hash a password with a random salt and the shared pepper. The
    /// resulting PHC string is suitable for storage.
    pub fn hash_password(&self, password: &str) -> Result<String, CryptoError> {
        let material = self.peppered(password);

        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| CryptoError::PasswordHash(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(CryptoError::from)?;

        let hash = self.argon2.hash_password(&material, &salt)?.to_string();
        Ok(hash)
    }

    /// Verify a password against a stored hash, applying the shared pepper.
    pub fn verify_password(&self, password: &str, stored: &str) -> Result<bool, CryptoError> {
        let parsed = PasswordHash::new(stored)?;
        let material = self.peppered(password);

        Ok(self.argon2.verify_password(&material, &parsed).is_ok())
    }

    fn peppered(&self, password: &str) -> Zeroizing<Vec<u8>> {
        let mut material = Zeroizing::new(Vec::with_capacity(password.len() + self.pepper.len()));
        material.extend_from_slice(password.as_bytes());
        material.extend_from_slice(&self.pepper);
        material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters keep the test suite fast; production uses the
    /// defaults above.
    pub(crate) fn test_crypto() -> PasswordCrypto {
        let params = ParamsBuilder::new()
            .m_cost(1024)
            .t_cost(1)
            .p_cost(1)
            .output_len(32)
            .build()
            .expect("test params");
        PasswordCrypto::with_params("pepper", params).expect("crypto")
    }

    #[test]
    fn hashes_passwords_and_verifies() {
        let crypto = test_crypto();
        let hash = crypto.hash_password("correct horse").expect("hash");
        assert!(crypto.verify_password("correct horse", &hash).expect("verify"));
        assert!(!crypto.verify_password("battery staple", &hash).expect("verify"));
    }

    #[test]
    fn pepper_participates_in_the_digest() {
        let first = test_crypto();
        let hash = first.hash_password("hunter2").expect("hash");

        let params = ParamsBuilder::new()
            .m_cost(1024)
            .t_cost(1)
            .p_cost(1)
            .output_len(32)
            .build()
            .expect("test params");
        let other = PasswordCrypto::with_params("different-pepper", params).expect("crypto");
        assert!(!other.verify_password("hunter2", &hash).expect("verify"));
    }

    #[test]
    fn rejects_empty_pepper() {
        assert!(matches!(
            PasswordCrypto::new(""),
            Err(CryptoError::EmptyPepper)
        ));
    }

    #[test]
    fn garbage_stored_hash_is_an_error_not_a_mismatch() {
        let crypto = test_crypto();
        assert!(crypto.verify_password("pw", "not-a-phc-string").is_err());
    }
}

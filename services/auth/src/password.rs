//! Password hashing and temporary password generation

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::Rng;
use rand::rngs::OsRng;

use crate::error::AuthError;

/// Length of generated temporary passwords
pub const TEMPORARY_PASSWORD_LENGTH: usize = 12;

const TEMPORARY_PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz\
ABCDEFGHIJKLMNOPQRSTUVWXYZ\
0123456789\
!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Input hashed once per hasher to produce [`PasswordHasher::dummy_hash`]
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-users";

/// Argon2id password hasher
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    dummy_hash: String,
}

impl Default for PasswordHasher {
    /// 19 MiB memory, 2 passes, 1 lane: a verification costs tens of
    /// milliseconds on server hardware.
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl PasswordHasher {
    /// Create a hasher with explicit Argon2 cost parameters
    pub fn with_params(params: Params) -> Self {
        let mut hasher = Self {
            params,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash(DUMMY_PASSWORD).unwrap_or_else(|e| {
            tracing::warn!("Failed to precompute dummy password hash: {}", e);
            String::new()
        });
        hasher
    }

    /// Hash with the same cost parameters as real ones, verified in place of
    /// a stored hash when a login names no known user
    pub fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Check a password against a stored hash
    ///
    /// A malformed stored hash verifies as `false`.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash could not be parsed: {}", e);
                false
            }
        }
    }
}

/// Generate a random temporary password from letters, digits and punctuation
pub fn generate_temporary_password() -> String {
    let mut rng = OsRng;
    (0..TEMPORARY_PASSWORD_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..TEMPORARY_PASSWORD_ALPHABET.len());
            TEMPORARY_PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_params(Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("password123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("password123", &hash));
        assert!(!hasher.verify("password124", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = fast_hasher();
        let a = hasher.hash("same-password").unwrap();
        let b = hasher.hash("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_hash_uses_configured_params() {
        let hasher = fast_hasher();
        assert!(hasher.dummy_hash().starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert!(!hasher.verify("password123", hasher.dummy_hash()));

        let default = PasswordHasher::default();
        let parsed = PasswordHash::new(default.dummy_hash()).unwrap();
        let params = Params::try_from(&parsed).unwrap();
        assert_eq!(params.m_cost(), Params::default().m_cost());
        assert_eq!(params.t_cost(), Params::default().t_cost());
        assert_eq!(params.p_cost(), Params::default().p_cost());
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        assert!(!fast_hasher().verify("password123", "not-a-phc-string"));
    }

    #[test]
    fn test_temporary_password_shape() {
        let password = generate_temporary_password();
        assert_eq!(password.chars().count(), TEMPORARY_PASSWORD_LENGTH);
        assert!(
            password
                .bytes()
                .all(|b| TEMPORARY_PASSWORD_ALPHABET.contains(&b))
        );
    }

    #[test]
    fn test_temporary_passwords_differ() {
        let first = generate_temporary_password();
        let differs = (0..8).any(|_| generate_temporary_password() != first);
        assert!(differs);
    }

    #[test]
    fn test_alphabet_covers_letters_digits_and_punctuation() {
        assert!(TEMPORARY_PASSWORD_ALPHABET.iter().any(u8::is_ascii_lowercase));
        assert!(TEMPORARY_PASSWORD_ALPHABET.iter().any(u8::is_ascii_uppercase));
        assert!(TEMPORARY_PASSWORD_ALPHABET.iter().any(u8::is_ascii_digit));
        assert!(TEMPORARY_PASSWORD_ALPHABET.iter().any(u8::is_ascii_punctuation));
        assert_eq!(TEMPORARY_PASSWORD_ALPHABET.len(), 26 + 26 + 10 + 32);
    }
}

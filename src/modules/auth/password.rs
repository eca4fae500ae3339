use pbkdf2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use pbkdf2::{Params, Pbkdf2};
use rand::Rng;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Iteration count used for new hashes in production
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Salted PBKDF2-HMAC-SHA256 password hashing.
///
/// Hashes are PHC strings (`$pbkdf2-sha256$i=<iterations>,l=32$<salt>$<hash>`),
/// so raising the iteration count never invalidates stored credentials.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::b64_encode(&generate_random_salt())?;
        let params = Params {
            rounds: self.iterations,
            output_length: HASH_LEN,
        };
        let hash =
            Pbkdf2.hash_password_customized(password.as_bytes(), None, None, params, &salt)?;
        Ok(hash.to_string())
    }

    /// Check a candidate against a stored hash. Malformed hashes never verify.
    pub fn verify(&self, candidate: &str, stored: &str) -> bool {
        PasswordHash::new(stored)
            .map(|parsed| Pbkdf2.verify_password(candidate.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    }
}

fn generate_random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill(&mut salt[..]);
    salt
}

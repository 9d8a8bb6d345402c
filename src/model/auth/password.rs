use argon2::{Config, Error as Argon2Error};
use log::error;
use rand::{distributions::Alphanumeric, Rng};
use rocket::tokio::task;

use crate::error::{Error, Result};

/// Salted, cost-parameterised one-way password hashing shared by every
/// principal kind.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a hasher that runs `cost` argon2 iterations for new hashes.
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password with a fresh random salt. The salt and cost are
    /// embedded in the output, so hashing the same password twice gives two
    /// different strings.
    pub fn hash(&self, password: &str) -> std::result::Result<String, Argon2Error> {
        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let config = Config {
            time_cost: self.cost,
            ..Config::default()
        };
        argon2::hash_encoded(password.as_bytes(), &salt, &config)
    }

    /// Check a password against a stored hash. A wrong password is `Ok(false)`;
    /// only a malformed hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> std::result::Result<bool, Argon2Error> {
        argon2::verify_encoded(hash, password.as_bytes())
    }

    /// A hash of a random password nobody knows, at this hasher's cost.
    pub fn decoy(&self) -> String {
        let password: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        self.hash(&password).unwrap_or_else(|e| {
            error!("Failed to create decoy password hash: {e}");
            String::new()
        })
    }

    /// [`Self::hash`] on the blocking thread pool.
    pub async fn hash_blocking(&self, password: String) -> Result<String> {
        let hasher = *self;
        let hash = task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Internal(format!("Password hashing task failed: {e}")))??;
        Ok(hash)
    }

    /// [`Self::verify`] on the blocking thread pool.
    pub async fn verify_blocking(&self, password: String, hash: String) -> Result<bool> {
        let hasher = *self;
        task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| Error::Internal(format!("Password check task failed: {e}")))?
            .map_err(|e| {
                error!("Stored password hash is malformed: {e}");
                Error::Unauthorized("stored credential is unusable".to_string())
            })
    }
}

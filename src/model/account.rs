use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::principal::{PrincipalId, PrincipalKind};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A principal record as held by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account<K> {
    #[serde(rename = "_id")]
    pub id: PrincipalId,
    pub email: String,
    pub password_hash: String,
    #[serde(flatten)]
    pub details: K,
}

impl<K> Account<K>
where
    K: PrincipalKind,
{
    /// The view of this account that may leave the service, without the hash.
    pub fn public(&self) -> PublicAccount<K> {
        PublicAccount {
            id: self.id,
            email: self.email.clone(),
            details: self.details.clone(),
        }
    }
}

/// An account not yet assigned an ID.
#[derive(Debug, Clone)]
pub struct NewAccount<K> {
    pub email: String,
    pub password_hash: String,
    pub details: K,
}

impl<K> NewAccount<K> {
    pub fn with_id(self, id: PrincipalId) -> Account<K> {
        Account {
            id,
            email: self.email,
            password_hash: self.password_hash,
            details: self.details,
        }
    }
}

/// An account as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAccount<K> {
    pub id: PrincipalId,
    pub email: String,
    #[serde(flatten)]
    pub details: K,
}

/// A registration request. The password is plaintext and is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration<K> {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub details: K,
}

impl<K> Registration<K> {
    /// Check the email and password are acceptable.
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// A partial change to an account. Absent fields are left as they are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUpdate<K> {
    pub email: Option<String>,
    pub password: Option<String>,
    pub details: Option<K>,
}

impl<K> Default for AccountUpdate<K> {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            details: None,
        }
    }
}

pub fn validate_email(email: &str) -> Result<()> {
    let well_formed = email
        .split_once('@')
        .map_or(false, |(local, domain)| !local.is_empty() && !domain.is_empty());
    if well_formed && !email.chars().any(char::is_whitespace) {
        Ok(())
    } else {
        Err(Error::BadRequest(format!("Invalid email address: {email:?}")))
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        Err(Error::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )))
    } else {
        Ok(())
    }
}

use std::sync::Arc;

use log::{info, warn};
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::error::{CredentialFailure, Error, Result};
use crate::model::{
    account::{
        validate_email, validate_password, AccountUpdate, NewAccount, PublicAccount, Registration,
    },
    principal::{PrincipalId, PrincipalKind},
    store::CredentialStore,
};

use super::{
    password::PasswordHasher,
    token::{Claims, TokenIssuer},
};

/// Authentication and account management for one principal kind.
///
/// Every kind runs the same logic; only the store partition and the role
/// claim differ.
pub struct AccountService<K> {
    store: Arc<dyn CredentialStore<K>>,
    tokens: Arc<TokenIssuer>,
    hasher: PasswordHasher,
    /// Checked against when a login names no principal, so that path costs
    /// the same hashing work as a wrong password.
    decoy_hash: String,
}

/// A successful login: the bearer token and the principal's public profile.
#[derive(Debug)]
pub struct LoginResponse<K> {
    pub access_token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub account: PublicAccount<K>,
}

impl<K> Serialize for LoginResponse<K>
where
    K: PrincipalKind,
{
    /// The profile is keyed by role name, e.g. `"voter": {...}`.
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("access_token", &self.access_token)?;
        map.serialize_entry("expires_in", &self.expires_in)?;
        map.serialize_entry(K::ROLE.as_str(), &self.account)?;
        map.end()
    }
}

impl<K> AccountService<K>
where
    K: PrincipalKind,
{
    pub fn new(
        store: Arc<dyn CredentialStore<K>>,
        tokens: Arc<TokenIssuer>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            tokens,
            decoy_hash: hasher.decoy(),
            hasher,
        }
    }

    /// Exchange an email and password for a token.
    ///
    /// Unknown emails, wrong passwords and disabled accounts all fail with
    /// the same [`Error::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse<K>> {
        let role = K::ROLE;
        let result = self.check_credentials(email, password).await;
        let account = match result {
            Ok(account) => account,
            Err(Error::InvalidCredentials(reason)) => {
                warn!("Refused {role} login for {email:?}: {reason}");
                return Err(Error::InvalidCredentials(reason));
            }
            Err(e) => return Err(e),
        };

        let access_token = self.tokens.issue(account.id, &account.email, role);
        info!("{role} {} logged in", account.id);
        Ok(LoginResponse {
            access_token,
            expires_in: self.tokens.ttl().num_seconds(),
            account,
        })
    }

    async fn check_credentials(&self, email: &str, password: &str) -> Result<PublicAccount<K>> {
        let Some(account) = self.store.find_by_email(email).await? else {
            let _ = self
                .hasher
                .verify_blocking(password.to_string(), self.decoy_hash.clone())
                .await;
            return Err(Error::InvalidCredentials(CredentialFailure::UnknownEmail));
        };
        let matches = match self
            .hasher
            .verify_blocking(password.to_string(), account.password_hash.clone())
            .await
        {
            Ok(matches) => matches,
            Err(Error::Unauthorized(_)) => {
                return Err(Error::InvalidCredentials(CredentialFailure::UnusableHash));
            }
            Err(e) => return Err(e),
        };
        if !matches {
            return Err(Error::InvalidCredentials(CredentialFailure::WrongPassword));
        }
        if !account.details.in_good_standing() {
            return Err(Error::InvalidCredentials(CredentialFailure::Disabled));
        }
        Ok(account.public())
    }

    /// Check a token's signature and expiry.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        self.tokens
            .verify(token)
            .map_err(|e| Error::Unauthorized(e.to_string()))
    }

    /// Check whether `password` is the current password of principal `id`.
    pub async fn validate_password(&self, id: PrincipalId, password: &str) -> Result<bool> {
        let account = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("{} {id}", K::ROLE)))?;
        self.hasher
            .verify_blocking(password.to_string(), account.password_hash)
            .await
    }

    /// Resolve a bearer token to the principal it names, failing closed:
    /// the token must be valid, carry this kind's role, and name a principal
    /// that still exists and is in good standing.
    pub async fn resolve(&self, token: &str) -> Result<(Claims, PublicAccount<K>)> {
        let claims = self.validate_token(token)?;
        if claims.role != K::ROLE {
            return Err(Error::Unauthorized(format!(
                "{} token presented where {} required",
                claims.role,
                K::ROLE
            )));
        }
        let account = self
            .store
            .find_by_id(claims.subject)
            .await?
            .ok_or_else(|| {
                Error::Unauthorized(format!("{} {} no longer exists", K::ROLE, claims.subject))
            })?;
        if !account.details.in_good_standing() {
            return Err(Error::Unauthorized(format!(
                "{} {} is disabled",
                K::ROLE,
                claims.subject
            )));
        }
        Ok((claims, account.public()))
    }

    /// Create a new principal of this kind.
    pub async fn register(&self, registration: Registration<K>) -> Result<PublicAccount<K>> {
        registration.validate()?;
        let Registration {
            email,
            password,
            mut details,
        } = registration;
        details.on_register();
        let password_hash = self.hasher.hash_blocking(password).await?;
        let account = self
            .store
            .insert(NewAccount {
                email,
                password_hash,
                details,
            })
            .await?;
        info!("Registered {} {}", K::ROLE, account.id);
        Ok(account.public())
    }

    /// Register `registration` unless this kind has no principals at all.
    /// Returns whether a principal was created.
    pub async fn ensure_exists(&self, registration: Registration<K>) -> Result<bool> {
        if self.store.count().await? > 0 {
            return Ok(false);
        }
        self.register(registration).await?;
        Ok(true)
    }

    pub async fn find(&self, id: PrincipalId) -> Result<PublicAccount<K>> {
        self.store
            .find_by_id(id)
            .await?
            .map(|account| account.public())
            .ok_or_else(|| Error::not_found(format!("{} {id}", K::ROLE)))
    }

    pub async fn list(&self) -> Result<Vec<PublicAccount<K>>> {
        let accounts = self.store.list().await?;
        Ok(accounts.iter().map(|account| account.public()).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        self.store.count().await
    }

    /// Apply a self-service update. Fields only an administrator may change
    /// are kept from the current record.
    pub async fn update(
        &self,
        id: PrincipalId,
        update: AccountUpdate<K>,
    ) -> Result<PublicAccount<K>> {
        let mut account = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("{} {id}", K::ROLE)))?;

        if let Some(email) = update.email {
            validate_email(&email)?;
            account.email = email;
        }
        if let Some(password) = update.password {
            validate_password(&password)?;
            account.password_hash = self.hasher.hash_blocking(password).await?;
        }
        if let Some(mut details) = update.details {
            details.preserve_managed_fields(&account.details);
            account.details = details;
        }

        self.store.upsert(&account).await?;
        Ok(account.public())
    }

    /// Edit the details of principal `id` in place, with no field protection.
    pub async fn modify_details<F>(&self, id: PrincipalId, edit: F) -> Result<PublicAccount<K>>
    where
        F: FnOnce(&mut K) + Send,
    {
        let mut account = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("{} {id}", K::ROLE)))?;
        edit(&mut account.details);
        self.store.upsert(&account).await?;
        Ok(account.public())
    }

    /// Delete principal `id` unless it is the last of its kind.
    pub async fn delete_unless_last(&self, id: PrincipalId) -> Result<()> {
        if self.store.delete_unless_last(id).await? {
            info!("Deleted {} {id}", K::ROLE);
            Ok(())
        } else {
            Err(Error::not_found(format!("{} {id}", K::ROLE)))
        }
    }

    pub async fn delete(&self, id: PrincipalId) -> Result<()> {
        if self.store.delete(id).await? {
            info!("Deleted {} {id}", K::ROLE);
            Ok(())
        } else {
            Err(Error::not_found(format!("{} {id}", K::ROLE)))
        }
    }
}

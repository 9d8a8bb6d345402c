//! Credential store partitions: one per principal kind, keyed by integer ID
//! with a unique email.

mod memory;

pub use memory::MemoryStore;

use crate::error::{Error, Result};
use crate::model::{
    account::{Account, NewAccount},
    principal::{PrincipalId, PrincipalKind, Role},
};

/// Persistence for the accounts of a single principal kind.
#[rocket::async_trait]
pub trait CredentialStore<K>: Send + Sync
where
    K: PrincipalKind,
{
    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Account<K>>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account<K>>>;

    /// All accounts, ordered by ID.
    async fn list(&self) -> Result<Vec<Account<K>>>;

    /// Assign the next ID and insert. Fails with `Conflict` if the email is taken.
    async fn insert(&self, account: NewAccount<K>) -> Result<Account<K>>;

    /// Replace the whole record with the same ID, inserting if absent.
    /// Fails with `Conflict` if another account already uses the email.
    async fn upsert(&self, account: &Account<K>) -> Result<()>;

    /// Returns whether anything was deleted.
    async fn delete(&self, id: PrincipalId) -> Result<bool>;

    /// Delete `id` unless it is the last account of this kind, which fails
    /// with `Conflict`. Concurrent calls never leave the partition empty.
    /// Returns whether anything was deleted.
    async fn delete_unless_last(&self, id: PrincipalId) -> Result<bool>;

    async fn count(&self) -> Result<u64>;
}

/// The error for deleting the only remaining account of a kind.
pub(crate) fn last_account(role: Role) -> Error {
    Error::Conflict(format!("Cannot delete the last {role}"))
}

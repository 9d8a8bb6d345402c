use std::collections::BTreeMap;

use rocket::tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{
    account::{Account, NewAccount},
    principal::{PrincipalId, PrincipalKind},
};

use super::{last_account, CredentialStore};

/// An in-process credential store.
pub struct MemoryStore<K> {
    inner: RwLock<Inner<K>>,
}

struct Inner<K> {
    accounts: BTreeMap<PrincipalId, Account<K>>,
    next_id: PrincipalId,
}

impl<K> MemoryStore<K> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                accounts: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Inner<K> {
    fn email_taken(&self, email: &str, except: Option<PrincipalId>) -> bool {
        self.accounts
            .values()
            .any(|account| account.email == email && Some(account.id) != except)
    }
}

#[rocket::async_trait]
impl<K> CredentialStore<K> for MemoryStore<K>
where
    K: PrincipalKind,
{
    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Account<K>>> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account<K>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Account<K>>> {
        Ok(self.inner.read().await.accounts.values().cloned().collect())
    }

    async fn insert(&self, account: NewAccount<K>) -> Result<Account<K>> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&account.email, None) {
            return Err(Error::Conflict(format!(
                "Email already registered: {}",
                account.email
            )));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let account = account.with_id(id);
        inner.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn upsert(&self, account: &Account<K>) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&account.email, Some(account.id)) {
            return Err(Error::Conflict(format!(
                "Email already registered: {}",
                account.email
            )));
        }
        inner.next_id = inner.next_id.max(account.id + 1);
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn delete(&self, id: PrincipalId) -> Result<bool> {
        Ok(self.inner.write().await.accounts.remove(&id).is_some())
    }

    async fn delete_unless_last(&self, id: PrincipalId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if !inner.accounts.contains_key(&id) {
            return Ok(false);
        }
        if inner.accounts.len() == 1 {
            return Err(last_account(K::ROLE));
        }
        Ok(inner.accounts.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.inner.read().await.accounts.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::voter::VoterDetails;

    fn new_voter(email: &str) -> NewAccount<VoterDetails> {
        NewAccount {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            details: VoterDetails::example(),
        }
    }

    #[rocket::async_test]
    async fn insert_assigns_sequential_ids() {
        let store = MemoryStore::<VoterDetails>::new();
        let first = store.insert(new_voter("a@x.edu")).await.unwrap();
        let second = store.insert(new_voter("b@x.edu")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.count().await.unwrap(), 2);

        let found = store.find_by_email("b@x.edu").await.unwrap().unwrap();
        assert_eq!(found, second);
    }

    #[rocket::async_test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::<VoterDetails>::new();
        let first = store.insert(new_voter("a@x.edu")).await.unwrap();
        let second = store.insert(new_voter("b@x.edu")).await.unwrap();

        let result = store.insert(new_voter("a@x.edu")).await;
        assert!(matches!(result, Err(Error::Conflict(_))));

        // Renaming one account onto another's email also conflicts...
        let mut renamed = second.clone();
        renamed.email = first.email.clone();
        assert!(matches!(
            store.upsert(&renamed).await,
            Err(Error::Conflict(_))
        ));

        // ...but re-saving an account under its own email does not.
        store.upsert(&first).await.unwrap();
    }

    #[rocket::async_test]
    async fn upsert_with_explicit_id_and_delete() {
        let store = MemoryStore::<VoterDetails>::new();
        let account = new_voter("a@x.edu").with_id(7);
        store.upsert(&account).await.unwrap();
        assert_eq!(store.find_by_id(7).await.unwrap(), Some(account));

        // IDs are never reused below an explicitly stored one.
        let next = store.insert(new_voter("b@x.edu")).await.unwrap();
        assert_eq!(next.id, 8);

        assert!(store.delete(7).await.unwrap());
        assert!(!store.delete(7).await.unwrap());
        assert_eq!(store.find_by_id(7).await.unwrap(), None);
    }

    #[rocket::async_test]
    async fn delete_unless_last_keeps_one() {
        let store = MemoryStore::<VoterDetails>::new();
        let first = store.insert(new_voter("a@x.edu")).await.unwrap();
        let second = store.insert(new_voter("b@x.edu")).await.unwrap();

        assert!(!store.delete_unless_last(99).await.unwrap());
        assert!(store.delete_unless_last(first.id).await.unwrap());
        assert!(matches!(
            store.delete_unless_last(second.id).await,
            Err(Error::Conflict(_))
        ));
        assert_eq!(store.count().await.unwrap(), 1);
    }
}

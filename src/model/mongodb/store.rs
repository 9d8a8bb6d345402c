use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, ReplaceOptions},
    Database,
};
use log::warn;
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    account::{Account, NewAccount},
    principal::{PrincipalId, PrincipalKind},
    store::{last_account, CredentialStore},
};

use super::{is_duplicate_key_error, Coll, Counter};

/// A filter selecting the document with the given principal ID.
fn id_filter(id: PrincipalId) -> Document {
    doc! { "_id": i64::from(id) }
}

/// A credential store backed by one MongoDB collection.
pub struct MongoStore<K> {
    accounts: Coll<Account<K>>,
    counters: Coll<Counter>,
}

impl<K> MongoStore<K>
where
    K: PrincipalKind,
{
    pub fn from_db(db: &Database) -> Self {
        Self {
            accounts: Coll::from_db(db),
            counters: Coll::from_db(db),
        }
    }
}

fn email_conflict(err: mongodb::error::Error, email: &str) -> Error {
    if is_duplicate_key_error(&err) {
        Error::Conflict(format!("Email already registered: {email}"))
    } else {
        err.into()
    }
}

#[rocket::async_trait]
impl<K> CredentialStore<K> for MongoStore<K>
where
    K: PrincipalKind,
{
    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Account<K>>> {
        Ok(self.accounts.find_one(id_filter(id), None).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account<K>>> {
        Ok(self.accounts.find_one(doc! { "email": email }, None).await?)
    }

    async fn list(&self) -> Result<Vec<Account<K>>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let accounts = self
            .accounts
            .find(None, options)
            .await?
            .try_collect()
            .await?;
        Ok(accounts)
    }

    async fn insert(&self, account: NewAccount<K>) -> Result<Account<K>> {
        let id = Counter::next(&self.counters, K::COLLECTION).await?;
        let account = account.with_id(id);
        self.accounts
            .insert_one(&account, None)
            .await
            .map_err(|e| email_conflict(e, &account.email))?;
        Ok(account)
    }

    async fn upsert(&self, account: &Account<K>) -> Result<()> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.accounts
            .replace_one(id_filter(account.id), account, options)
            .await
            .map_err(|e| email_conflict(e, &account.email))?;
        Ok(())
    }

    async fn delete(&self, id: PrincipalId) -> Result<bool> {
        let result = self.accounts.delete_one(id_filter(id), None).await?;
        Ok(result.deleted_count > 0)
    }

    /// Deletes first and restores the record if that emptied the
    /// collection, so racing deletes cannot both succeed on the last two.
    async fn delete_unless_last(&self, id: PrincipalId) -> Result<bool> {
        let deleted = match self.accounts.find_one_and_delete(id_filter(id), None).await? {
            Some(account) => account,
            None => return Ok(false),
        };
        if self.accounts.count_documents(None, None).await? > 0 {
            return Ok(true);
        }
        warn!("Restoring {} {id}, the last of its kind", K::ROLE);
        self.accounts.insert_one(&deleted, None).await?;
        Err(last_account(K::ROLE))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.accounts.count_documents(None, None).await?)
    }
}

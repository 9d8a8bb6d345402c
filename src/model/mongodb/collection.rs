use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::{
    account::Account,
    admin::AdminDetails,
    candidate::CandidateDetails,
    principal::PrincipalKind,
    voter::VoterDetails,
};

use super::counter::Counter;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// One collection per principal kind.
impl<K: PrincipalKind> MongoCollection for Account<K> {
    const NAME: &'static str = K::COLLECTION;
}

// Counter collection
const COUNTERS: &str = "counters";
impl MongoCollection for Counter {
    const NAME: &'static str = COUNTERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    ensure_unique_email::<AdminDetails>(db).await?;
    ensure_unique_email::<VoterDetails>(db).await?;
    ensure_unique_email::<CandidateDetails>(db).await?;

    Ok(())
}

async fn ensure_unique_email<K: PrincipalKind>(db: &Database) -> Result<(), DbError> {
    let unique = IndexOptions::builder().unique(true).build();
    let email_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique)
        .build();
    Coll::<Account<K>>::from_db(db)
        .create_index(email_index, None)
        .await?;
    Ok(())
}

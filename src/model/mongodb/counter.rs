use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{mongodb::Coll, principal::PrincipalId};

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: i64,
}

impl Counter {
    /// Atomically retrieve the next value of the named counter, creating it
    /// at 1 if it does not exist yet.
    pub async fn next(counters: &Coll<Counter>, name: &str) -> Result<PrincipalId> {
        let update = doc! {
            "$inc": { "next": 1_i64 }
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": name }, update, options)
            .await?
            .ok_or_else(|| Error::Internal(format!("Failed to find counter {name}")))?;
        PrincipalId::try_from(counter.next)
            .map_err(|_| Error::Internal(format!("Counter {name} out of range")))
    }
}

//! Persistence gateway: the only way handlers reach the document store.
//!
//! Every call is independent. There are no transactions across calls and
//! no retries.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::err::Error;
use crate::models::RecordId;

pub use self::postgres::PgGateway;

pub type SharedGateway = Arc<dyn Gateway>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Students,
    Schedule,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Schedule => "schedule",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored record: its id plus the JSON document kept for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: RecordId,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    /// The record exists but its `revision` no longer matches the expected one.
    Conflict,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn insert(&self, collection: Collection, id: RecordId, body: Value) -> Result<(), Error>;

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, Error>;

    async fn find_by_id(&self, collection: Collection, id: RecordId) -> Result<Option<Document>, Error>;

    /// Merges `patch` into the top level of the stored document. With
    /// `expected_revision` set, the merge only happens while the document's
    /// `revision` (0 when absent) still equals it.
    async fn update_by_id(
        &self,
        collection: Collection,
        id: RecordId,
        patch: Map<String, Value>,
        expected_revision: Option<i64>,
    ) -> Result<UpdateOutcome, Error>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, collection: Collection, id: RecordId) -> Result<bool, Error>;
}

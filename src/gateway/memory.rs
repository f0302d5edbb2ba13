use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Collection, Document, Gateway, UpdateOutcome};
use crate::err::Error;
use crate::models::RecordId;

/// In-process store with the same merge semantics as the Postgres gateway.
/// Records keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    collections: Mutex<HashMap<Collection, Vec<Document>>>,
    calls: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of gateway operations performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(&collection)
            .map_or(0, Vec::len)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn stored_revision(body: &Value) -> i64 {
    body.get("revision").and_then(Value::as_i64).unwrap_or(0)
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn insert(&self, collection: Collection, id: RecordId, body: Value) -> Result<(), Error> {
        self.touch();
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|doc| doc.id == id) {
            return Err(Error::Persistence {
                kind: "DatabaseError",
                message: format!("duplicate key {}", id),
            });
        }
        docs.push(Document { id, body });
        Ok(())
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, Error> {
        self.touch();
        let collections = self.collections.lock().unwrap();
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, collection: Collection, id: RecordId) -> Result<Option<Document>, Error> {
        self.touch();
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: RecordId,
        patch: Map<String, Value>,
        expected_revision: Option<i64>,
    ) -> Result<UpdateOutcome, Error> {
        self.touch();
        let mut collections = self.collections.lock().unwrap();
        let doc = match collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
        {
            Some(doc) => doc,
            None => return Ok(UpdateOutcome::NotFound),
        };

        if let Some(expected) = expected_revision {
            if stored_revision(&doc.body) != expected {
                return Ok(UpdateOutcome::Conflict);
            }
        }

        if let Value::Object(fields) = &mut doc.body {
            fields.extend(patch);
        } else {
            doc.body = Value::Object(patch);
        }
        Ok(UpdateOutcome::Updated)
    }

    async fn delete_by_id(&self, collection: Collection, id: RecordId) -> Result<bool, Error> {
        self.touch();
        let mut collections = self.collections.lock().unwrap();
        let docs = match collections.get_mut(&collection) {
            Some(docs) => docs,
            None => return Ok(false),
        };
        let before = docs.len();
        docs.retain(|doc| doc.id != id);
        Ok(docs.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn merge_patch_overwrites_top_level_keys_only() {
        let gateway = MemoryGateway::new();
        let id = RecordId::generate();
        gateway
            .insert(Collection::Students, id, json!({"fullname": "A", "phone": "1"}))
            .await
            .unwrap();

        let outcome = gateway
            .update_by_id(Collection::Students, id, patch(json!({"phone": "2"})), None)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);

        let doc = gateway.find_by_id(Collection::Students, id).await.unwrap().unwrap();
        assert_eq!(doc.body, json!({"fullname": "A", "phone": "2"}));
    }

    #[tokio::test]
    async fn stale_revision_is_a_conflict() {
        let gateway = MemoryGateway::new();
        let id = RecordId::generate();
        gateway
            .insert(Collection::Schedule, id, json!({"classes": [], "revision": 2}))
            .await
            .unwrap();

        let stale = gateway
            .update_by_id(Collection::Schedule, id, patch(json!({"revision": 2})), Some(1))
            .await
            .unwrap();
        assert_eq!(stale, UpdateOutcome::Conflict);

        let missing = gateway
            .update_by_id(Collection::Schedule, RecordId::generate(), Map::new(), Some(2))
            .await
            .unwrap();
        assert_eq!(missing, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn collections_are_separate() {
        let gateway = MemoryGateway::new();
        let id = RecordId::generate();
        gateway.insert(Collection::Students, id, json!({})).await.unwrap();

        assert!(gateway.find_by_id(Collection::Schedule, id).await.unwrap().is_none());
        assert!(!gateway.delete_by_id(Collection::Schedule, id).await.unwrap());
        assert!(gateway.delete_by_id(Collection::Students, id).await.unwrap());
        assert_eq!(gateway.len(Collection::Students), 0);
        assert_eq!(gateway.calls(), 4);
    }
}

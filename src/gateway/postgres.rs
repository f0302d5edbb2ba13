use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use uuid::Uuid;

use super::{Collection, Document, Gateway, UpdateOutcome};
use crate::err::Error;
use crate::models::RecordId;

/// Each collection is a table of `(id UUID, doc JSONB)` rows.
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    doc: Json<Value>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: RecordId::from(row.id),
            body: row.doc.0,
        }
    }
}

/// Gateway over a shared Postgres pool. Each statement checks a connection
/// out of the pool and hands it back when the statement finishes or fails.
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    async fn exists(&self, collection: Collection, id: RecordId) -> Result<bool, Error> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", collection.name());
        let exists = sqlx::query_scalar::<_, bool>(&query)
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(exists)
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn insert(&self, collection: Collection, id: RecordId, body: Value) -> Result<(), Error> {
        let query = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", collection.name());
        let res = sqlx::query(&query)
            .bind(id.as_uuid())
            .bind(Json(body))
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;

        if res.rows_affected() < 1 {
            return Err(Error::Persistence {
                kind: "DatabaseError",
                message: format!("Could not insert {} record {}", collection, id),
            });
        }
        Ok(())
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, Error> {
        let query = format!("SELECT id, doc FROM {}", collection.name());
        let rows = sqlx::query_as::<_, DocumentRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn find_by_id(&self, collection: Collection, id: RecordId) -> Result<Option<Document>, Error> {
        let query = format!("SELECT id, doc FROM {} WHERE id = $1 LIMIT 1", collection.name());
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(row.map(Document::from))
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: RecordId,
        patch: Map<String, Value>,
        expected_revision: Option<i64>,
    ) -> Result<UpdateOutcome, Error> {
        let query = format!(
            "UPDATE {} SET doc = doc || $2 WHERE id = $1 \
             AND ($3::BIGINT IS NULL OR COALESCE((doc->>'revision')::BIGINT, 0) = $3)",
            collection.name()
        );
        let res = sqlx::query(&query)
            .bind(id.as_uuid())
            .bind(Json(Value::Object(patch)))
            .bind(expected_revision)
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;

        if res.rows_affected() >= 1 {
            return Ok(UpdateOutcome::Updated);
        }
        if expected_revision.is_some() && self.exists(collection, id).await? {
            return Ok(UpdateOutcome::Conflict);
        }
        Ok(UpdateOutcome::NotFound)
    }

    async fn delete_by_id(&self, collection: Collection, id: RecordId) -> Result<bool, Error> {
        let query = format!("DELETE FROM {} WHERE id = $1", collection.name());
        let res = sqlx::query(&query)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(res.rows_affected() >= 1)
    }
}

use crate::domain::criteria::Criteria;
use crate::domain::document::{set_path, Document, ID_FIELD};
use crate::domain::error::DocError;
use crate::domain::traits::Driver;
use crate::infrastructure::logging::DRIVER_TARGET as LOG_TARGET;
use async_trait::async_trait;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use tokio_rusqlite::{params, Connection};
use zstd::stream::{decode_all, encode_all};

pub async fn init_database(db_path: &Path) -> Result<Connection, DocError> {
    let db = Connection::open(db_path.to_path_buf()).await?;
    create_schema(&db).await?;
    Ok(db)
}

/// In-memory SQLite database, mostly for tests
pub async fn init_memory_database() -> Result<Connection, DocError> {
    let db = Connection::open_in_memory().await?;
    create_schema(&db).await?;
    Ok(db)
}

async fn create_schema(db: &Connection) -> Result<(), DocError> {
    db.call(|conn| {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_updated ON documents(collection, updated_at)",
            [],
        )?;

        Ok(())
    })
    .await?;

    Ok(())
}

/// SQLite backed document store. Bodies are JSON compressed with zstd.
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub async fn open(db_path: &Path) -> Result<Self, DocError> {
        Ok(Self::new(init_database(db_path).await?))
    }

    pub async fn open_in_memory() -> Result<Self, DocError> {
        Ok(Self::new(init_memory_database().await?))
    }

    async fn load(&self, collection: &str, id: Option<&str>) -> Result<Vec<Document>, DocError> {
        let collection = collection.to_string();
        let id = id.map(str::to_string);

        let blobs: Vec<Vec<u8>> = self
            .conn
            .call(move |conn| {
                let mut rows = Vec::new();
                match id {
                    Some(id) => {
                        let mut stmt = conn.prepare(
                            "SELECT data FROM documents WHERE collection = ? AND id = ?",
                        )?;
                        let iter = stmt.query_map(params![collection, id], |row| row.get(0))?;
                        for blob in iter {
                            rows.push(blob?);
                        }
                    }
                    None => {
                        let mut stmt = conn.prepare(
                            "SELECT data FROM documents WHERE collection = ? ORDER BY created_at, id",
                        )?;
                        let iter = stmt.query_map(params![collection], |row| row.get(0))?;
                        for blob in iter {
                            rows.push(blob?);
                        }
                    }
                }
                Ok(rows)
            })
            .await?;

        blobs.iter().map(|b| decode_document(b)).collect()
    }

    /// Rewrite documents keyed by the id each was loaded under. Returns the
    /// number of rows changed.
    async fn write(&self, collection: &str, docs: Vec<(String, Document)>) -> Result<u64, DocError> {
        let now = chrono::Utc::now().timestamp();
        let mut prepared = Vec::with_capacity(docs.len());
        for (loaded_id, doc) in &docs {
            prepared.push((loaded_id.clone(), document_id(doc)?, encode_document(doc)?));
        }

        let collection = collection.to_string();
        let changed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut count = 0u64;
                {
                    let mut stmt = tx.prepare(
                        "UPDATE documents SET id = ?, data = ?, updated_at = ? WHERE collection = ? AND id = ?",
                    )?;
                    for (loaded_id, id, data) in prepared {
                        count += stmt.execute(params![id, data, now, collection, loaded_id])? as u64;
                    }
                }
                tx.commit()?;
                Ok(count)
            })
            .await?;

        Ok(changed)
    }
}

fn document_id(doc: &Document) -> Result<String, DocError> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DocError::InvalidQuery("document has no string _id".to_string()))
}

fn encode_document(doc: &Document) -> Result<Vec<u8>, DocError> {
    let serialized = serde_json::to_vec(doc)?;
    Ok(encode_all(Cursor::new(&serialized), 0)?)
}

fn decode_document(data: &[u8]) -> Result<Document, DocError> {
    let decompressed = decode_all(Cursor::new(data))?;
    Ok(serde_json::from_slice(&decompressed)?)
}

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn find(&self, criteria: &Criteria) -> Result<Vec<Document>, DocError> {
        let candidates = self
            .load(&criteria.collection, criteria.id_equality())
            .await?;
        let scanned = candidates.len();
        let result = criteria.apply(candidates);
        tracing::debug!(
            target: LOG_TARGET,
            collection = %criteria.collection,
            scanned,
            returned = result.len(),
            "find"
        );
        Ok(result)
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<(), DocError> {
        let id = document_id(&doc)?;
        let data = encode_document(&doc)?;
        let now = chrono::Utc::now().timestamp();

        let collection_name = collection.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO documents (collection, id, data, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?)",
                    params![collection_name, id, data, now, now],
                )
            })
            .await?;

        tracing::debug!(target: LOG_TARGET, collection, "insert");
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        selector: &Document,
        set: &Document,
    ) -> Result<u64, DocError> {
        let criteria = Criteria::with_selector(collection, selector.clone())?;
        let mut matched = Vec::new();
        for mut doc in self.load(collection, criteria.id_equality()).await? {
            if !criteria.matches(&doc) {
                continue;
            }
            let loaded_id = document_id(&doc)?;
            for (path, value) in set {
                set_path(&mut doc, path, value.clone());
            }
            matched.push((loaded_id, doc));
        }

        let modified = self.write(collection, matched).await?;
        tracing::debug!(target: LOG_TARGET, collection, modified, "update");
        Ok(modified)
    }

    async fn delete(&self, collection: &str, selector: &Document) -> Result<u64, DocError> {
        let criteria = Criteria::with_selector(collection, selector.clone())?;
        let ids = self
            .load(collection, criteria.id_equality())
            .await?
            .into_iter()
            .filter(|d| criteria.matches(d))
            .map(|d| document_id(&d))
            .collect::<Result<Vec<_>, _>>()?;

        let collection_name = collection.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut count = 0u64;
                {
                    let mut stmt =
                        tx.prepare("DELETE FROM documents WHERE collection = ? AND id = ?")?;
                    for id in ids {
                        count += stmt.execute(params![collection_name, id])? as u64;
                    }
                }
                tx.commit()?;
                Ok(count)
            })
            .await?;

        tracing::debug!(target: LOG_TARGET, collection, deleted, "delete");
        Ok(deleted)
    }

    async fn count(&self, collection: &str) -> Result<u64, DocError> {
        let collection = collection.to_string();
        let count: i64 = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM documents WHERE collection = ?",
                    params![collection],
                    |row| row.get(0),
                )
            })
            .await?;
        Ok(count as u64)
    }
}

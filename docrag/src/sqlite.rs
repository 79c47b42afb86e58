//! File-backed vector store using SQLite with the `sqlite-vec` extension.
//!
//! [`SqliteVectorStore`] persists records at a given database path and
//! survives process restart. Each store instance is bound to one named
//! collection; the collection's dimensionality and similarity metric are
//! written to a metadata row at creation and validated on every reopen, so
//! a collection can never be queried under a different metric than it was
//! built with.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, OptionalExtension, ffi};
use tracing::info;
use uuid::Uuid;

use crate::document::{Chunk, ScoredChunk};
use crate::error::{RagError, Result};
use crate::vectorstore::{Metric, VectorStore};

const BACKEND: &str = "sqlite";

fn store_err(message: impl Into<String>) -> RagError {
    RagError::VectorStore { backend: BACKEND.into(), message: message.into() }
}

/// A persistent, single-collection vector store.
///
/// Records are keyed by an autoincrement sequence, so the documented
/// tie-break for exact similarity ties is insertion order (earliest
/// ingested first): queries sort by distance, then sequence.
pub struct SqliteVectorStore {
    conn: Connection,
    collection: String,
    metric: Metric,
    dimensions: usize,
}

impl std::fmt::Debug for SqliteVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteVectorStore")
            .field("collection", &self.collection)
            .field("metric", &self.metric)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl SqliteVectorStore {
    /// Open (or create) the database at `path` and bind to `collection`.
    ///
    /// Creates parent directories as needed. If the collection already
    /// exists, its persisted `(dimensions, metric)` metadata must match the
    /// arguments.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStore`] if the database cannot be opened,
    /// the `sqlite-vec` extension is unavailable, or the persisted
    /// collection metadata conflicts with the requested configuration.
    pub async fn open(
        path: impl AsRef<Path>,
        collection: impl Into<String>,
        dimensions: usize,
        metric: Metric,
    ) -> Result<Self> {
        register_sqlite_vec()?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| store_err(format!("failed to create {}: {e}", parent.display())))?;
            }
        }

        let conn = Connection::open(path).await.map_err(|e| store_err(e.to_string()))?;
        let collection = collection.into();

        let setup_collection = collection.clone();
        let metric_name = metric.as_str();
        conn.call(move |conn| {
            conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
                .map_err(tokio_rusqlite::Error::Rusqlite)?;

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS collections (
                     name TEXT PRIMARY KEY,
                     dimensions INTEGER NOT NULL,
                     metric TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS records (
                     seq INTEGER PRIMARY KEY AUTOINCREMENT,
                     id TEXT NOT NULL,
                     collection TEXT NOT NULL,
                     content TEXT NOT NULL,
                     metadata TEXT NOT NULL,
                     embedding TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);",
            )
            .map_err(tokio_rusqlite::Error::Rusqlite)?;

            let existing: Option<(i64, String)> = conn
                .query_row(
                    "SELECT dimensions, metric FROM collections WHERE name = ?1",
                    [&setup_collection],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(tokio_rusqlite::Error::Rusqlite)?;

            match existing {
                Some((stored_dims, stored_metric)) => {
                    if stored_dims as usize != dimensions || stored_metric != metric_name {
                        return Err(tokio_rusqlite::Error::Other(
                            format!(
                                "collection '{setup_collection}' was created with \
                                 dimensions={stored_dims} metric={stored_metric}, \
                                 requested dimensions={dimensions} metric={metric_name}"
                            )
                            .into(),
                        ));
                    }
                }
                None => {
                    conn.execute(
                        "INSERT INTO collections (name, dimensions, metric) VALUES (?1, ?2, ?3)",
                        (&setup_collection, dimensions as i64, metric_name),
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                }
            }
            Ok(())
        })
        .await
        .map_err(|e| store_err(e.to_string()))?;

        info!(collection = %collection, path = %path.display(), "opened vector store");
        Ok(Self { conn, collection, metric, dimensions })
    }

    /// The collection this store is bound to.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add(&self, chunks: &[Chunk]) -> Result<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        for chunk in chunks {
            if chunk.embedding.len() != self.dimensions {
                return Err(store_err(format!(
                    "embedding has {} dimensions, collection expects {}",
                    chunk.embedding.len(),
                    self.dimensions
                )));
            }
        }

        let mut rows = Vec::with_capacity(chunks.len());
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let id = Uuid::new_v4().to_string();
            let metadata = serde_json::to_string(&chunk.metadata)
                .map_err(|e| store_err(format!("failed to encode metadata: {e}")))?;
            let embedding = serde_json::to_string(&chunk.embedding)
                .map_err(|e| store_err(format!("failed to encode embedding: {e}")))?;
            rows.push((id.clone(), chunk.content.clone(), metadata, embedding));
            ids.push(id);
        }

        let collection = self.collection.clone();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(tokio_rusqlite::Error::Rusqlite)?;
                for (id, content, metadata, embedding) in &rows {
                    tx.execute(
                        "INSERT INTO records (id, collection, content, metadata, embedding)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        (id, &collection, content, metadata, embedding),
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                }
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|e| store_err(e.to_string()))?;

        Ok(ids)
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let query_json = serde_json::to_string(embedding)
            .map_err(|e| store_err(format!("failed to encode query embedding: {e}")))?;
        let collection = self.collection.clone();
        let metric = self.metric;

        let distance_fn = match metric {
            Metric::Cosine => "vec_distance_cosine",
            Metric::L2 => "vec_distance_l2",
        };
        let sql = format!(
            "SELECT content, metadata, embedding,
                    {distance_fn}(vec_f32(embedding), vec_f32(?2)) AS distance
             FROM records
             WHERE collection = ?1
             ORDER BY distance ASC, seq ASC
             LIMIT ?3"
        );

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql).map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map((&collection, &query_json, k as i64), |row| {
                        let content: String = row.get(0)?;
                        let metadata: String = row.get(1)?;
                        let embedding: String = row.get(2)?;
                        let distance: f32 = row.get(3)?;
                        Ok((content, metadata, embedding, distance))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut results = Vec::new();
                for row in rows {
                    let (content, metadata, embedding, distance) =
                        row.map_err(tokio_rusqlite::Error::Rusqlite)?;
                    let score = match metric {
                        Metric::Cosine => 1.0 - distance,
                        Metric::L2 => -distance,
                    };
                    results.push(ScoredChunk {
                        chunk: Chunk {
                            content,
                            metadata: serde_json::from_str(&metadata).unwrap_or_default(),
                            embedding: serde_json::from_str(&embedding).unwrap_or_default(),
                        },
                        score,
                    });
                }
                Ok(results)
            })
            .await
            .map_err(|e| store_err(e.to_string()))
    }

    async fn count(&self) -> Result<usize> {
        let collection = self.collection.clone();
        self.conn
            .call(move |conn| {
                let count: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM records WHERE collection = ?1",
                        [&collection],
                        |row| row.get(0),
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|e| store_err(e.to_string()))
    }

    async fn delete_collection(&self) -> Result<()> {
        let collection = self.collection.clone();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM records WHERE collection = ?1", [&collection])
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                conn.execute("DELETE FROM collections WHERE name = ?1", [&collection])
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|e| store_err(e.to_string()))?;
        info!(collection = %self.collection, "deleted collection");
        Ok(())
    }
}

/// Register the `sqlite-vec` extension for every new connection.
fn register_sqlite_vec() -> Result<()> {
    use std::sync::Mutex;

    static INIT: Once = Once::new();
    static INIT_RESULT: Mutex<Option<std::result::Result<(), String>>> = Mutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *const c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != 0 {
                Err(format!("failed to register sqlite-vec extension (code {rc})"))
            } else {
                Ok(())
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .expect("init was called but result not set")
        .map_err(store_err)
}

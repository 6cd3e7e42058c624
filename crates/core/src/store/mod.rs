//! ContentStore: embedded document store for every persisted entity.
//!
//! Each record lives as one JSON row in the `documents` table, keyed by
//! `(collection, id)`. Writes are atomic per record; there are no cross-record
//! transactions, so concurrent writers follow last-write-wins.

mod legacy;
mod records;

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

pub use legacy::ImportReport;

/// Persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Faq,
    Sop,
    Product,
    Stock,
    Buyer,
    Moderator,
    Claim,
    Promo,
    Blacklist,
    Knowledge,
    LearningLog,
    Attendance,
}

impl Collection {
    pub const ALL: [Collection; 12] = [
        Self::Faq,
        Self::Sop,
        Self::Product,
        Self::Stock,
        Self::Buyer,
        Self::Moderator,
        Self::Claim,
        Self::Promo,
        Self::Blacklist,
        Self::Knowledge,
        Self::LearningLog,
        Self::Attendance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Faq => "faq",
            Self::Sop => "sop",
            Self::Product => "product",
            Self::Stock => "stock",
            Self::Buyer => "buyer",
            Self::Moderator => "moderator",
            Self::Claim => "claim",
            Self::Promo => "promo",
            Self::Blacklist => "blacklist",
            Self::Knowledge => "knowledge",
            Self::LearningLog => "learning_log",
            Self::Attendance => "attendance",
        }
    }
}

/// A persisted entity with a stable id.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
    fn id(&self) -> Uuid;
}

/// Connect to an in-memory database (single connection, never recycled) and
/// apply migrations. Used for ephemeral mode and tests.
pub async fn memory_pool() -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    Ok(pool)
}

/// Connect to a database URL and apply migrations.
pub async fn connect(url: &str) -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new().max_connections(4).connect(url).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    Ok(pool)
}

/// Document store plus the data directory holding legacy files and backups.
#[derive(Debug, Clone)]
pub struct ContentStore {
    pool: SqlitePool,
    data_dir: PathBuf,
}

impl ContentStore {
    pub fn new(pool: SqlitePool, data_dir: impl Into<PathBuf>) -> Self {
        Self { pool, data_dir: data_dir.into() }
    }

    /// Ephemeral store backed by an in-memory database.
    pub async fn in_memory(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self::new(memory_pool().await?, data_dir))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// All records of a collection in insertion order. Rows that no longer
    /// deserialize are skipped with a warning.
    pub async fn list<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        let bodies = self.bodies(T::COLLECTION).await?;
        Ok(bodies
            .into_iter()
            .filter_map(|body| match serde_json::from_str::<T>(&body) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(collection = T::COLLECTION.as_str(), error = %e, "skipping malformed record");
                    None
                }
            })
            .collect())
    }

    pub async fn get<T: Record>(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ?1 AND id = ?2")
                .bind(T::COLLECTION.as_str())
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((body,)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace one record.
    pub async fn upsert<T: Record>(&self, record: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string(record)?;
        self.upsert_raw(T::COLLECTION, record.id(), &body).await
    }

    async fn upsert_raw(&self, collection: Collection, id: Uuid, body: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind(collection.as_str())
        .bind(id.to_string())
        .bind(body)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove one record. Returns false if it did not exist.
    pub async fn remove<T: Record>(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(T::COLLECTION.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = ?1")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// The collection as one JSON array, the shape the admin panel reads.
    pub async fn export(&self, collection: Collection) -> Result<serde_json::Value, StoreError> {
        let values = self
            .bodies(collection)
            .await?
            .iter()
            .map(|body| serde_json::from_str(body))
            .collect::<Result<Vec<serde_json::Value>, _>>()?;
        Ok(serde_json::Value::Array(values))
    }

    /// Write every collection to `<dir>/<collection>.json`. Returns files written.
    pub async fn export_all(&self, dir: &Path) -> Result<usize, StoreError> {
        tokio::fs::create_dir_all(dir).await?;
        let mut written = 0;
        for collection in Collection::ALL {
            let value = self.export(collection).await?;
            let path = dir.join(format!("{}.json", collection.as_str()));
            tokio::fs::write(&path, serde_json::to_vec_pretty(&value)?).await?;
            written += 1;
        }
        Ok(written)
    }

    async fn bodies(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ?1 ORDER BY seq")
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(body,)| body).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FaqEntry, Moderator};

    fn faq(q: &str) -> FaqEntry {
        FaqEntry { id: Uuid::new_v4(), question: q.into(), answer: "jawab".into(), keywords: vec![] }
    }

    #[tokio::test]
    async fn upsert_list_preserves_insertion_order() {
        let store = ContentStore::in_memory("data").await.unwrap();
        let a = faq("satu");
        let b = faq("dua");
        store.upsert(&a).await.unwrap();
        store.upsert(&b).await.unwrap();

        // Updating `a` keeps its position.
        let mut a2 = a.clone();
        a2.answer = "baru".into();
        store.upsert(&a2).await.unwrap();

        let all: Vec<FaqEntry> = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a.id);
        assert_eq!(all[0].answer, "baru");
        assert_eq!(all[1].id, b.id);
    }

    #[tokio::test]
    async fn get_and_remove_by_stable_id() {
        let store = ContentStore::in_memory("data").await.unwrap();
        let a = faq("satu");
        store.upsert(&a).await.unwrap();
        let got: Option<FaqEntry> = store.get(a.id).await.unwrap();
        assert_eq!(got, Some(a.clone()));
        assert!(store.remove::<FaqEntry>(a.id).await.unwrap());
        assert!(!store.remove::<FaqEntry>(a.id).await.unwrap());
        assert_eq!(store.count(Collection::Faq).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = ContentStore::in_memory("data").await.unwrap();
        store.upsert(&faq("satu")).await.unwrap();
        let mods: Vec<Moderator> = store.list().await.unwrap();
        assert!(mods.is_empty());
        assert_eq!(store.count(Collection::Faq).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn export_all_writes_one_file_per_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::in_memory(dir.path()).await.unwrap();
        store.upsert(&faq("satu")).await.unwrap();
        let out = dir.path().join("snap");
        let n = store.export_all(&out).await.unwrap();
        assert_eq!(n, Collection::ALL.len());
        let raw = std::fs::read_to_string(out.join("faq.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["question"], "satu");
    }
}

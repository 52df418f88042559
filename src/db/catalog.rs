//! Catalog store for clothing records.
//!
//! The whole collection is one JSON array under [`CATALOG_KEY`]. Mutations
//! are load-modify-save cycles serialized by a single async mutex.

use std::collections::HashSet;

use chrono::Utc;
use tokio::sync::Mutex;

use super::KeyValueStore;
use crate::errors::AppError;
use crate::models::{
    ClothingPatch, ClothingRecord, CreateClothingRequest, RevisionInfo, WardrobeSnapshot,
};
use crate::search::filter_records;

/// Storage key holding the serialized catalog.
pub const CATALOG_KEY: &str = "wardrobe";

/// A record as it was before and after an update.
#[derive(Debug, Clone)]
pub struct RecordUpdate {
    pub before: ClothingRecord,
    pub after: ClothingRecord,
}

impl RecordUpdate {
    /// Image paths the update dropped.
    pub fn replaced_images(&self) -> Vec<&str> {
        let current = self.after.image_paths();
        self.before
            .image_paths()
            .into_iter()
            .filter(|p| !current.contains(p))
            .collect()
    }
}

/// Persistence for the full collection of clothing records.
pub struct CatalogStore {
    kv: KeyValueStore,
    write_lock: Mutex<()>,
}

impl CatalogStore {
    pub fn new(kv: KeyValueStore) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    /// Load every record.
    ///
    /// A blob that cannot be decoded is logged and read as an empty catalog.
    pub async fn load_all(&self) -> Result<Vec<ClothingRecord>, AppError> {
        match self.read_records().await {
            Ok(records) => Ok(records),
            Err(AppError::Corrupt(msg)) => {
                tracing::warn!("Treating catalog as empty: {}", msg);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the stored catalog with `records` and return the new revision.
    ///
    /// Rejects a collection with repeated identifiers or invalid prices.
    pub async fn save_all(&self, records: &[ClothingRecord]) -> Result<i64, AppError> {
        let mut seen = HashSet::new();
        for record in records {
            if !seen.insert(record.id.as_str()) {
                return Err(AppError::Conflict(format!(
                    "Clothing item {} appears more than once",
                    record.id
                )));
            }
            record.validate()?;
        }

        let _guard = self.write_lock.lock().await;
        self.write_records(records).await
    }

    /// Get a record by ID.
    pub async fn get(&self, id: &str) -> Result<Option<ClothingRecord>, AppError> {
        Ok(self.load_all().await?.into_iter().find(|r| r.id == id))
    }

    /// Append a record; its identifier must not already be taken.
    pub async fn add(&self, record: ClothingRecord) -> Result<ClothingRecord, AppError> {
        record.validate()?;

        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(AppError::Conflict(format!(
                "Clothing item {} already exists",
                record.id
            )));
        }

        records.push(record.clone());
        let revision = self.write_records(&records).await?;
        tracing::debug!("Added clothing item {} (revision {})", record.id, revision);

        Ok(record)
    }

    /// Build a record with a fresh identifier and add it.
    pub async fn create(
        &self,
        request: CreateClothingRequest,
        default_owner: &str,
    ) -> Result<ClothingRecord, AppError> {
        request.validate()?;

        let id = uuid::Uuid::new_v4().to_string();
        let record =
            ClothingRecord::from_request(request, id, default_owner.to_string(), Utc::now());
        self.add(record).await
    }

    /// Apply `patch` to the record with `id`.
    ///
    /// Returns `None` and leaves the catalog untouched when no record matches.
    pub async fn update(
        &self,
        id: &str,
        patch: ClothingPatch,
    ) -> Result<Option<RecordUpdate>, AppError> {
        patch.validate()?;

        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            tracing::debug!("Update skipped, clothing item {} not found", id);
            return Ok(None);
        };

        let before = record.clone();
        patch.apply(record, Utc::now());
        let after = record.clone();

        let revision = self.write_records(&records).await?;
        tracing::debug!("Updated clothing item {} (revision {})", id, revision);

        Ok(Some(RecordUpdate { before, after }))
    }

    /// Remove the record with `id` and hand it back.
    ///
    /// Removing an absent record succeeds with `None`.
    pub async fn remove(&self, id: &str) -> Result<Option<ClothingRecord>, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        let Some(index) = records.iter().position(|r| r.id == id) else {
            return Ok(None);
        };

        let removed = records.remove(index);
        let revision = self.write_records(&records).await?;
        tracing::debug!("Removed clothing item {} (revision {})", id, revision);

        Ok(Some(removed))
    }

    /// Records whose name, tags or category contain `query`.
    pub async fn search(&self, query: &str) -> Result<Vec<ClothingRecord>, AppError> {
        Ok(filter_records(self.load_all().await?, query))
    }

    pub async fn revision_id(&self) -> Result<i64, AppError> {
        self.kv.revision_id().await
    }

    pub async fn revision_info(&self) -> Result<RevisionInfo, AppError> {
        self.kv.revision_info().await
    }

    /// Get the full catalog together with its revision.
    pub async fn snapshot(&self) -> Result<WardrobeSnapshot, AppError> {
        let clothes = self.load_all().await?;
        let revision = self.kv.revision_info().await?;

        Ok(WardrobeSnapshot {
            schema_version: self.kv.schema_version().await?,
            revision_id: revision.revision_id,
            generated_at: revision.generated_at,
            clothes,
        })
    }

    /// Strict read used before every write.
    async fn read_records(&self) -> Result<Vec<ClothingRecord>, AppError> {
        let Some(raw) = self.kv.get_item(CATALOG_KEY).await? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw)
            .map_err(|e| AppError::Corrupt(format!("Stored catalog is unreadable: {}", e)))
    }

    async fn write_records(&self, records: &[ClothingRecord]) -> Result<i64, AppError> {
        let raw = serde_json::to_string(records)
            .map_err(|e| AppError::Internal(format!("Failed to serialize catalog: {}", e)))?;
        self.kv.set_item(CATALOG_KEY, &raw).await
    }
}

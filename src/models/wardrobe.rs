//! Catalog-wide views: the full snapshot and its revision marker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ClothingRecord;

/// The whole catalog as one payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardrobeSnapshot {
    pub schema_version: i32,
    pub revision_id: i64,
    pub generated_at: DateTime<Utc>,
    pub clothes: Vec<ClothingRecord>,
}

/// Revision information for change detection.
///
/// A view that becomes active compares this against the revision it last
/// rendered and reloads only when it moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: DateTime<Utc>,
}

/// Search results in input order.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total: usize,
    pub results: Vec<ClothingRecord>,
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredImage {
    pub path: String,
    pub bytes: usize,
}

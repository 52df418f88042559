//! Whole-catalog API endpoints.

use axum::extract::State;

use super::{error, success, ApiJson, ApiResult};
use crate::models::{ClothingRecord, RevisionInfo, WardrobeSnapshot};
use crate::AppState;

/// GET /api/wardrobe - Get the full catalog with its revision.
pub async fn get_wardrobe(State(state): State<AppState>) -> ApiResult<WardrobeSnapshot> {
    match state.catalog.snapshot().await {
        Ok(snapshot) => {
            let revision_id = snapshot.revision_id;
            success(snapshot, revision_id)
        }
        Err(e) => error(e, 0),
    }
}

/// GET /api/wardrobe/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.catalog.revision_info().await {
        Ok(info) => {
            let revision_id = info.revision_id;
            success(info, revision_id)
        }
        Err(e) => error(e, 0),
    }
}

/// PUT /api/wardrobe - Replace the whole catalog, e.g. when restoring a backup.
///
/// Image files are left alone; records keep whatever paths they carry.
pub async fn replace_wardrobe(
    State(state): State<AppState>,
    ApiJson(clothes): ApiJson<Vec<ClothingRecord>>,
) -> ApiResult<WardrobeSnapshot> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    if let Err(e) = state.catalog.save_all(&clothes).await {
        return error(e, revision_id);
    }
    tracing::info!("Catalog replaced with {} items", clothes.len());

    match state.catalog.snapshot().await {
        Ok(snapshot) => {
            let new_revision = snapshot.revision_id;
            success(snapshot, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

//! Clothing API endpoints.

use axum::extract::{Path, State};

use super::{error, success, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{
    ClothingRecord, CreateClothingRequest, DeleteClothingResponse, UpdateClothingRequest,
};
use crate::AppState;

/// GET /api/clothes - List all clothing items.
pub async fn list_clothes(State(state): State<AppState>) -> ApiResult<Vec<ClothingRecord>> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.load_all().await {
        Ok(clothes) => success(clothes, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/clothes/:id - Get a single clothing item.
pub async fn get_clothing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ClothingRecord> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.get(&id).await {
        Ok(Some(item)) => success(item, revision_id),
        Ok(None) => error(not_found(&id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/clothes - Add a clothing item.
pub async fn create_clothing(
    State(state): State<AppState>,
    ApiJson(mut request): ApiJson<CreateClothingRequest>,
) -> ApiResult<ClothingRecord> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    if let Err(e) = request.validate() {
        return error(e, revision_id);
    }

    let imported = match request.image_source.take() {
        Some(source) => match state.images.import(&source).await {
            Ok(path) => Some(path),
            Err(e) => return error(e, revision_id),
        },
        None => None,
    };
    if let Some(path) = &imported {
        request.image_url = path.clone();
    }

    match state.catalog.create(request, &state.config.owner_id).await {
        Ok(item) => {
            tracing::info!("Created clothing item {}", item.id);
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(item, new_revision)
        }
        Err(e) => {
            if let Some(path) = &imported {
                state.images.delete_all_quietly(&[path.as_str()]).await;
            }
            error(e, revision_id)
        }
    }
}

/// PUT /api/clothes/:id - Update a clothing item.
///
/// Image files the update replaces are deleted once the new record is saved.
pub async fn update_clothing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateClothingRequest>,
) -> ApiResult<ClothingRecord> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);
    let UpdateClothingRequest {
        image_source,
        mut patch,
    } = request;

    if let Err(e) = patch.validate() {
        return error(e, revision_id);
    }

    let imported = match image_source {
        Some(source) => match state.images.import(&source).await {
            Ok(path) => Some(path),
            Err(e) => return error(e, revision_id),
        },
        None => None,
    };
    if let Some(path) = &imported {
        patch.image_url = Some(path.clone());
    }

    let outcome = state.catalog.update(&id, patch).await;
    if !matches!(outcome, Ok(Some(_))) {
        if let Some(path) = &imported {
            state.images.delete_all_quietly(&[path.as_str()]).await;
        }
    }

    match outcome {
        Ok(Some(update)) => {
            state.images.delete_all_quietly(&update.replaced_images()).await;

            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(update.after, new_revision)
        }
        Ok(None) => error(not_found(&id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/clothes/:id - Delete a clothing item and its images.
///
/// Deleting an item that is already gone succeeds with `removed: false`.
pub async fn delete_clothing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteClothingResponse> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.remove(&id).await {
        Ok(Some(item)) => {
            state.images.delete_all_quietly(&item.image_paths()).await;
            tracing::info!("Deleted clothing item {}", item.id);

            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(
                DeleteClothingResponse {
                    removed: true,
                    item: Some(item),
                },
                new_revision,
            )
        }
        Ok(None) => success(
            DeleteClothingResponse {
                removed: false,
                item: None,
            },
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Clothing item {} not found", id))
}

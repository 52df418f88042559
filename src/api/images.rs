//! Image upload endpoint.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
};
use serde::Deserialize;

use super::{error, success, ApiQuery, ApiResult};
use crate::images::DEFAULT_EXTENSION;
use crate::models::StoredImage;
use crate::AppState;

/// Upload query parameters.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// File extension of the uploaded image (default: jpg).
    #[serde(default = "default_extension")]
    pub ext: String,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

/// POST /api/images - Store raw image bytes and return the permanent path.
pub async fn upload_image(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<UploadQuery>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<StoredImage> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let body = match body {
        Ok(body) => body,
        Err(rejection) => return error(rejection.into(), revision_id),
    };

    match state.images.store_bytes(&body, &params.ext).await {
        Ok(path) => success(
            StoredImage {
                path,
                bytes: body.len(),
            },
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

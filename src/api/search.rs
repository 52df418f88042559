//! Search API endpoints.

use axum::extract::State;
use serde::Deserialize;

use super::{error, success, ApiQuery, ApiResult};
use crate::models::SearchResponse;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string; empty matches everything.
    #[serde(default)]
    pub q: String,
}

/// GET /api/search - Filter the catalog by name, tag or category.
pub async fn search_clothes(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.search(&params.q).await {
        Ok(results) => success(
            SearchResponse {
                query: params.q,
                total: results.len(),
                results,
            },
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

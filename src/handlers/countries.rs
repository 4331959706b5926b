use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::db::countries;
use crate::dto::{ApiResult, DupeFieldRequest, PageRequest};
use crate::entities::country;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// List countries, paged
pub async fn list_countries(
    State(state): State<AppState>,
    Query(request): Query<PageRequest>,
) -> AppResult<Json<ApiResult<country::Model>>> {
    let result = countries::list(&state.db, &request, state.config.max_page_size).await?;
    Ok(Json(result))
}

/// Get a single country by id
pub async fn get_country(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<country::Model>> {
    let country = countries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Country not found".to_string()))?;

    Ok(Json(country))
}

/// Check whether another country already uses a name or ISO code
pub async fn is_dupe_field(
    State(state): State<AppState>,
    Json(payload): Json<DupeFieldRequest>,
) -> AppResult<Json<bool>> {
    Ok(Json(countries::is_dupe_field(&state.db, &payload).await?))
}

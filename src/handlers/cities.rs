use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::db::cities;
use crate::dto::{ApiResult, CityDto, PageRequest};
use crate::entities::city;
use crate::error::{AppError, AppResult};
use crate::AppState;

const MAX_NAME_LEN: usize = 100;

/// List cities, paged
pub async fn list_cities(
    State(state): State<AppState>,
    Query(request): Query<PageRequest>,
) -> AppResult<Json<ApiResult<city::Model>>> {
    let result = cities::list(&state.db, &request, state.config.max_page_size).await?;
    Ok(Json(result))
}

/// Get a single city
pub async fn get_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<city::Model>> {
    let city = cities::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))?;

    Ok(Json(city))
}

/// Create a city; the id is assigned by the database
pub async fn create_city(
    State(state): State<AppState>,
    Json(payload): Json<CityDto>,
) -> AppResult<(StatusCode, Json<city::Model>)> {
    validate_city(&payload)?;

    let city = cities::create(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(city)))
}

/// Update a city
pub async fn update_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CityDto>,
) -> AppResult<Json<city::Model>> {
    if payload.id != 0 && payload.id != id {
        return Err(AppError::BadRequest(
            "City id in body does not match the path".to_string(),
        ));
    }
    validate_city(&payload)?;

    let city = cities::update(&state.db, id, &payload).await?;
    Ok(Json(city))
}

/// Delete a city, returning the removed record
pub async fn delete_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<city::Model>> {
    let city = cities::delete(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))?;

    Ok(Json(city))
}

/// Whether the candidate duplicates another city's name within its country
pub async fn is_dupe_city(
    State(state): State<AppState>,
    Json(candidate): Json<CityDto>,
) -> AppResult<Json<bool>> {
    let dupe = cities::is_dupe(&state.db, &candidate).await?;
    tracing::debug!(name = %candidate.name, country_id = candidate.country_id, dupe, "Duplicate check");
    Ok(Json(dupe))
}

fn validate_city(city: &CityDto) -> AppResult<()> {
    let name = city.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    if !(-90.0..=90.0).contains(&city.lat) {
        return Err(AppError::Validation(
            "Latitude must be between -90 and 90".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&city.lon) {
        return Err(AppError::Validation(
            "Longitude must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::db::countries;
use crate::db::paging::{paged_query, PagedEntity};
use crate::dto::{ApiResult, CityDto, PageRequest};
use crate::entities::city;
use crate::error::{AppError, AppResult};

impl PagedEntity for city::Entity {
    fn sort_column(name: &str) -> Option<city::Column> {
        match name.to_ascii_lowercase().as_str() {
            "id" => Some(city::Column::Id),
            "name" => Some(city::Column::Name),
            "lat" => Some(city::Column::Lat),
            "lon" => Some(city::Column::Lon),
            "countryid" => Some(city::Column::CountryId),
            _ => None,
        }
    }

    fn filter_column(name: &str) -> Option<city::Column> {
        match name.to_ascii_lowercase().as_str() {
            "name" => Some(city::Column::Name),
            _ => None,
        }
    }

    fn primary_column() -> city::Column {
        city::Column::Id
    }
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> AppResult<Option<city::Model>> {
    Ok(city::Entity::find_by_id(id).one(db).await?)
}

pub async fn list(
    db: &DatabaseConnection,
    request: &PageRequest,
    max_page_size: u64,
) -> AppResult<ApiResult<city::Model>> {
    paged_query::<city::Entity>(db, request, max_page_size).await
}

pub async fn create(db: &DatabaseConnection, dto: &CityDto) -> AppResult<city::Model> {
    ensure_country(db, dto.country_id).await?;

    let city = city::ActiveModel {
        name: Set(dto.name.trim().to_string()),
        lat: Set(round_coordinate(dto.lat)),
        lon: Set(round_coordinate(dto.lon)),
        country_id: Set(dto.country_id),
        ..Default::default()
    };

    let created = city.insert(db).await?;
    tracing::info!(city_id = created.id, name = %created.name, "City created");
    Ok(created)
}

pub async fn update(db: &DatabaseConnection, id: i32, dto: &CityDto) -> AppResult<city::Model> {
    let existing = city::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))?;

    ensure_country(db, dto.country_id).await?;

    let mut active: city::ActiveModel = existing.into();
    active.name = Set(dto.name.trim().to_string());
    active.lat = Set(round_coordinate(dto.lat));
    active.lon = Set(round_coordinate(dto.lon));
    active.country_id = Set(dto.country_id);

    let updated = active.update(db).await?;
    tracing::info!(city_id = updated.id, "City updated");
    Ok(updated)
}

/// Deletes the city and returns it, or `None` when there was nothing to delete.
pub async fn delete(db: &DatabaseConnection, id: i32) -> AppResult<Option<city::Model>> {
    let Some(existing) = city::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    city::Entity::delete_by_id(id).exec(db).await?;
    tracing::info!(city_id = id, "City deleted");
    Ok(Some(existing))
}

/// Whether another city already uses the candidate's name within the same country.
///
/// A nonzero `id` is excluded from the match so a city being edited is never its
/// own duplicate.
pub async fn is_dupe(db: &DatabaseConnection, candidate: &CityDto) -> AppResult<bool> {
    let mut query = city::Entity::find()
        .filter(city::Column::Name.eq(candidate.name.trim()))
        .filter(city::Column::CountryId.eq(candidate.country_id));

    if candidate.id != 0 {
        query = query.filter(city::Column::Id.ne(candidate.id));
    }

    Ok(query.count(db).await? > 0)
}

async fn ensure_country(db: &DatabaseConnection, country_id: i32) -> AppResult<()> {
    countries::find_by_id(db, country_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("Invalid country".to_string()))
}

/// Coordinates are stored with at most four fractional digits.
fn round_coordinate(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::db::paging::{paged_query, PagedEntity};
use crate::dto::{ApiResult, DupeFieldRequest, PageRequest};
use crate::entities::country;
use crate::error::{AppError, AppResult};

impl PagedEntity for country::Entity {
    fn sort_column(name: &str) -> Option<country::Column> {
        match name.to_ascii_lowercase().as_str() {
            "id" => Some(country::Column::Id),
            other => Self::filter_column(other),
        }
    }

    fn filter_column(name: &str) -> Option<country::Column> {
        match name.to_ascii_lowercase().as_str() {
            "name" => Some(country::Column::Name),
            "iso2" => Some(country::Column::Iso2),
            "iso3" => Some(country::Column::Iso3),
            _ => None,
        }
    }

    fn primary_column() -> country::Column {
        country::Column::Id
    }
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> AppResult<Option<country::Model>> {
    Ok(country::Entity::find_by_id(id).one(db).await?)
}

pub async fn list(
    db: &DatabaseConnection,
    request: &PageRequest,
    max_page_size: u64,
) -> AppResult<ApiResult<country::Model>> {
    paged_query::<country::Entity>(db, request, max_page_size).await
}

/// Whether a country other than `country_id` already holds `field_value` in `field_name`.
pub async fn is_dupe_field(db: &DatabaseConnection, request: &DupeFieldRequest) -> AppResult<bool> {
    let column = country::Entity::filter_column(&request.field_name).ok_or_else(|| {
        AppError::BadRequest(format!("Invalid field name: {}", request.field_name))
    })?;

    let matches = country::Entity::find()
        .filter(column.eq(request.field_value.trim()))
        .filter(country::Column::Id.ne(request.country_id))
        .count(db)
        .await?;

    Ok(matches > 0)
}

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, IdenStatic, Order, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::dto::{ApiResult, PageRequest, SortOrder};
use crate::error::{AppError, AppResult};

/// An entity that can be listed through [`paged_query`].
///
/// Column names arrive from the query string, so they are resolved through these
/// whitelists and never interpolated into SQL.
pub trait PagedEntity: EntityTrait {
    /// Columns the list may be ordered by, matched case-insensitively.
    fn sort_column(name: &str) -> Option<Self::Column>;

    /// Text columns the list may be filtered on with a prefix match.
    fn filter_column(name: &str) -> Option<Self::Column>;

    /// Tie-breaker ordering so pages stay stable.
    fn primary_column() -> Self::Column;
}

pub async fn paged_query<E>(
    db: &DatabaseConnection,
    request: &PageRequest,
    max_page_size: u64,
) -> AppResult<ApiResult<E::Model>>
where
    E: PagedEntity,
    E::Model: Send + Sync + 'static,
{
    if request.page_size == 0 {
        return Err(AppError::BadRequest(
            "pageSize must be greater than zero".to_string(),
        ));
    }
    let page_size = request.page_size.min(max_page_size.max(1));

    let sort_column = non_empty(&request.sort_column);
    let filter_column = non_empty(&request.filter_column);
    let filter_query = non_empty(&request.filter_query);

    let sort_order = match non_empty(&request.sort_direction) {
        Some(direction) => direction.parse::<SortOrder>()?,
        None => SortOrder::Asc,
    };

    let mut select = E::find();

    if let Some(name) = filter_column {
        let column = E::filter_column(name)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid filter column: {}", name)))?;
        if let Some(query) = filter_query {
            select = select.filter(column.starts_with(query));
        }
    }

    let primary = E::primary_column();
    match sort_column {
        Some(name) => {
            let column = E::sort_column(name)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid sort column: {}", name)))?;
            select = select.order_by(column, order_of(sort_order));
            if column.as_str() != primary.as_str() {
                select = select.order_by(primary, Order::Asc);
            }
        }
        None => select = select.order_by(primary, Order::Asc),
    }

    let paginator = select.paginate(db, page_size);
    let totals = paginator.num_items_and_pages().await?;
    // Past the last page the offset may not fit the binder, so skip the fetch.
    let data = if request.page_index < totals.number_of_pages {
        paginator.fetch_page(request.page_index).await?
    } else {
        Vec::new()
    };

    tracing::debug!(
        page_index = request.page_index,
        page_size,
        total_count = totals.number_of_items,
        returned = data.len(),
        "Paged query"
    );

    Ok(ApiResult {
        data,
        page_index: request.page_index,
        page_size,
        total_count: totals.number_of_items,
        total_pages: totals.number_of_pages,
        sort_column: sort_column.map(str::to_string),
        sort_order: sort_column.map(|_| sort_order),
        filter_column: filter_column.map(str::to_string),
        filter_query: filter_query.map(str::to_string),
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn order_of(sort_order: SortOrder) -> Order {
    match sort_order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

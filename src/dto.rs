//! Wire types shared by the HTTP handlers and the client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(AppError::BadRequest(format!(
                "Invalid sort direction: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Paging, sorting and filtering parameters of a list request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default)]
    pub page_index: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub sort_column: Option<String>,
    #[serde(alias = "sortOrder")]
    pub sort_direction: Option<String>,
    pub filter_column: Option<String>,
    pub filter_query: Option<String>,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort_column: None,
            sort_direction: None,
            filter_column: None,
            filter_query: None,
        }
    }
}

impl PageRequest {
    pub fn new(page_index: u64, page_size: u64) -> Self {
        Self {
            page_index,
            page_size,
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, column: &str, direction: SortOrder) -> Self {
        self.sort_column = Some(column.to_string());
        self.sort_direction = Some(direction.to_string());
        self
    }

    pub fn filtered_by(mut self, column: &str, query: &str) -> Self {
        self.filter_column = Some(column.to_string());
        self.filter_query = Some(query.to_string());
        self
    }

    /// Query-string pairs, skipping unset parameters.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("pageIndex".to_string(), self.page_index.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ];
        let optional = [
            ("sortColumn", &self.sort_column),
            ("sortDirection", &self.sort_direction),
            ("filterColumn", &self.filter_column),
            ("filterQuery", &self.filter_query),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                query.push((key.to_string(), value.clone()));
            }
        }
        query
    }
}

/// A page of rows together with the total count and the echoed paging parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult<T> {
    pub data: Vec<T>,
    pub page_index: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub sort_column: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filter_column: Option<String>,
    pub filter_query: Option<String>,
}

/// City body for create, update and duplicate-check requests. `id` is 0 for new records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDto {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DupeFieldRequest {
    #[serde(default)]
    pub country_id: i32,
    pub field_name: String,
    pub field_value: String,
}

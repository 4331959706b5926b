use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::client::executor::{ApiRequest, ClientResult, RequestExecutor};
use crate::dto::{ApiResult, CityDto, PageRequest};
use crate::entities::{city, country};

/// Typed access to the city and country endpoints.
pub struct CityService<E> {
    executor: Arc<E>,
}

impl<E> Clone for CityService<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: RequestExecutor> CityService<E> {
    pub fn new(executor: E) -> Self {
        Self::from_shared(Arc::new(executor))
    }

    pub fn from_shared(executor: Arc<E>) -> Self {
        Self { executor }
    }

    /// Fetch a city; a 404 is `Ok(None)`.
    pub async fn get_city(&self, id: i32) -> ClientResult<Option<city::Model>> {
        let response = self
            .executor
            .execute(ApiRequest::get(format!("/api/Cities/{}", id)))
            .await?;

        if response.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        response.json().map(Some)
    }

    pub async fn get_cities(&self, page: &PageRequest) -> ClientResult<ApiResult<city::Model>> {
        let request = ApiRequest::get("/api/Cities").with_query(page.to_query());
        self.executor.execute(request).await?.json()
    }

    pub async fn get_countries(&self, page: &PageRequest) -> ClientResult<ApiResult<country::Model>> {
        let request = ApiRequest::get("/api/Countries").with_query(page.to_query());
        self.executor.execute(request).await?.json()
    }

    pub async fn is_dupe_city(&self, city: &CityDto) -> ClientResult<bool> {
        let request = ApiRequest::new(Method::POST, "/api/Cities/IsDupeCity").with_json(city)?;
        self.executor.execute(request).await?.json()
    }

    pub async fn post(&self, city: &CityDto) -> ClientResult<city::Model> {
        let request = ApiRequest::new(Method::POST, "/api/Cities").with_json(city)?;
        self.executor.execute(request).await?.json()
    }

    pub async fn put(&self, city: &CityDto) -> ClientResult<city::Model> {
        let request =
            ApiRequest::new(Method::PUT, format!("/api/Cities/{}", city.id)).with_json(city)?;
        self.executor.execute(request).await?.json()
    }

    pub async fn delete(&self, id: i32) -> ClientResult<city::Model> {
        let request = ApiRequest::new(Method::DELETE, format!("/api/Cities/{}", id));
        self.executor.execute(request).await?.json()
    }
}

//! Helpers for tests: an in-memory database with the schema applied, row builders,
//! and a [`RequestExecutor`] that dispatches straight into the router.

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request},
    Router,
};
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tower::ServiceExt;

use crate::client::{ApiRequest, ApiResponse, ClientError, ClientResult, RequestExecutor};
use crate::config::Config;
use crate::entities::{city, country};
use crate::{db, routes, AppState};

pub const TEST_DATABASE_URL: &str = "sqlite::memory:";

pub async fn test_db() -> DatabaseConnection {
    let config = Config::with_database_url(TEST_DATABASE_URL);
    let db = db::connect(&config).await.expect("connect to in-memory database");
    migration::Migrator::up(&db, None)
        .await
        .expect("run migrations");
    db
}

pub async fn test_state() -> AppState {
    AppState {
        db: test_db().await,
        config: Config::with_database_url(TEST_DATABASE_URL),
    }
}

pub async fn insert_country(db: &DatabaseConnection, name: &str, iso2: &str, iso3: &str) -> i32 {
    country::ActiveModel {
        name: Set(name.to_string()),
        iso2: Set(iso2.to_string()),
        iso3: Set(iso3.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert country")
    .id
}

pub async fn insert_city(
    db: &DatabaseConnection,
    name: &str,
    lat: f64,
    lon: f64,
    country_id: i32,
) -> i32 {
    city::ActiveModel {
        name: Set(name.to_string()),
        lat: Set(lat),
        lon: Set(lon),
        country_id: Set(country_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert city")
    .id
}

/// Serves client requests from an in-process router, without a socket.
#[derive(Clone)]
pub struct RouterExecutor {
    router: Router,
}

impl RouterExecutor {
    pub fn new(state: AppState) -> Self {
        Self {
            router: routes::create_router(state),
        }
    }
}

impl RequestExecutor for RouterExecutor {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let mut builder = Request::builder()
            .method(request.method.clone())
            .uri(request.uri()?);

        let body = match &request.body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(json)?)
            }
            None => Body::empty(),
        };
        let http_request = builder
            .body(body)
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let response = match self.router.clone().oneshot(http_request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(ApiResponse::new(status, bytes.to_vec()))
    }
}

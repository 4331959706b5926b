use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{cities, countries, health};
use crate::middleware::rate_limit::{log_request, GlobalGovernorLayer};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let city_routes = Router::new()
        .route("/", get(cities::list_cities).post(cities::create_city))
        .route("/IsDupeCity", post(cities::is_dupe_city))
        .route(
            "/{id}",
            get(cities::get_city)
                .put(cities::update_city)
                .delete(cities::delete_city),
        );

    let country_routes = Router::new()
        .route("/", get(countries::list_countries))
        .route("/IsDupeField", post(countries::is_dupe_field))
        .route("/{id}", get(countries::get_country));

    Router::new()
        .route("/health", get(health))
        .nest("/api/Cities", city_routes)
        .nest("/api/Countries", country_routes)
        .with_state(state)
}

/// Wrap the API in the HTTP middleware stack. Request logging sits outside the
/// governor so rejected requests are logged too.
pub fn with_middleware(router: Router, governor: GlobalGovernorLayer) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(governor)
        .layer(from_fn(log_request))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        body::Body,
        extract::connect_info::MockConnectInfo,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::rate_limit::create_global_governor;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn test_middleware_stack_rejects_past_burst() {
        let state = test_state().await;
        let mut config = state.config.clone();
        config.rate_limit_burst = 1;
        config.rate_limit_replenish_seconds = 60;
        let governor = create_global_governor(&config).unwrap();

        let app = with_middleware(create_router(state), governor)
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let health = || Request::get("/health").body(Body::empty()).unwrap();
        let first = app.clone().oneshot(health()).await.unwrap();
        let second = app.oneshot(health()).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

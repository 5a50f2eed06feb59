//! HTTP API server with observability for the order service.
//!
//! Exposes the order use cases as REST endpoints, with structured logging
//! (tracing) and Prometheus metrics. Orders are enriched with user details
//! fetched from the user service when it answers in time.

pub mod clients;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use domain::{OrderRepository, OrderService, UserEnrichmentClient};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Name reported by the info and health endpoints.
pub const SERVICE_NAME: &str = "order-service";

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R, U>(state: Arc<AppState<R, U>>, metrics_handle: PrometheusHandle) -> Router
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/", get(routes::root::info))
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create::<R, U>).get(routes::orders::list::<R, U>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<R, U>).delete(routes::orders::delete::<R, U>),
        )
        .route(
            "/orders/number/{number}",
            get(routes::orders::get_by_number::<R, U>),
        )
        .route(
            "/orders/user/{user_id}",
            get(routes::orders::list_by_user::<R, U>),
        )
        .route(
            "/orders/status/{status}",
            get(routes::orders::list_by_status::<R, U>),
        )
        .route(
            "/orders/{id}/status",
            patch(routes::orders::update_status::<R, U>),
        )
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<R, U>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a repository and a user lookup.
pub fn create_default_state<R, U>(repository: R, users: U) -> Arc<AppState<R, U>>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    Arc::new(AppState {
        order_service: OrderService::new(repository, users),
    })
}

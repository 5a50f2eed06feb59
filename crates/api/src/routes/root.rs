//! Service information endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// GET / — names the service and its version.
pub async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: crate::SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

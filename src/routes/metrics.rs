//! src/routes/metrics.rs

use actix_web::HttpResponse;

/// Prometheus scrape endpoint. Empty until the recorder is installed.
pub async fn metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(crate::metrics::render_metrics().unwrap_or_default())
}

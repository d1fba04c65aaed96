//! src/routes/cache.rs

use crate::error::AppResult;
use crate::weather::WeatherService;
use actix_web::{web, HttpResponse};

#[tracing::instrument(name = "Cache health check", skip(service))]
pub async fn cache_health(service: web::Data<WeatherService>) -> AppResult<HttpResponse> {
    service.cache().health().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

#[tracing::instrument(name = "Cache statistics", skip(service))]
pub async fn cache_stats(service: web::Data<WeatherService>) -> AppResult<HttpResponse> {
    let stats = service.cache().get_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

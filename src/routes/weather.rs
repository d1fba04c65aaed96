//! src/routes/weather.rs

use crate::error::AppResult;
use crate::weather::WeatherService;
use actix_web::{web, HttpResponse};

#[derive(serde::Deserialize)]
pub struct WeatherQuery {
    #[serde(default)]
    city: String,
}

#[tracing::instrument(name = "Weather request", skip(query, service), fields(city = %query.city))]
pub async fn get_weather(
    query: web::Query<WeatherQuery>,
    service: web::Data<WeatherService>,
) -> AppResult<HttpResponse> {
    let snapshot = service.get_weather(&query.city).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

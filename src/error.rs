//! src/error.rs

use crate::weather::{CacheError, WeatherError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

pub type AppResult<T> = Result<T, Error>;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

#[derive(thiserror::Error)]
pub enum Error {
    #[error("Failed to get weather")]
    WeatherError(#[from] WeatherError),
    #[error("Cache is unavailable")]
    CacheError(#[from] CacheError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::WeatherError(WeatherError::InvalidCity) => StatusCode::BAD_REQUEST,
            Error::WeatherError(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Error::WeatherError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::CacheError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Error::WeatherError(WeatherError::InvalidCity) => {
                "City parameter is required".to_string()
            }
            Error::WeatherError(e) if e.is_not_found() => "City not found".to_string(),
            Error::WeatherError(_) => "Failed to get weather".to_string(),
            Error::CacheError(e) => e.to_string(),
            Error::UnexpectedError(_) => "Internal server error".to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

//! src/startup.rs

use crate::configuration::Settings;
use crate::routes::{cache_health, cache_stats, get_weather, health_check, metrics};
use crate::scheduler::{Scheduler, SystemClock};
use crate::weather::{TracingProviderLogger, WeatherCache, WeatherService};
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
    weather_service: Arc<WeatherService>,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let weather_service = Arc::new(build_weather_service(&configuration).await?);

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address).context("Failed to bind address.")?;
        let port = listener
            .local_addr()
            .context("Failed to read local address.")?
            .port();
        let server = run(listener, weather_service.clone())?;

        Ok(Self {
            port,
            server,
            weather_service,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn weather_service(&self) -> Arc<WeatherService> {
        self.weather_service.clone()
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Assembles cache and provider chain from configuration.
pub async fn build_weather_service(
    configuration: &Settings,
) -> Result<WeatherService, anyhow::Error> {
    let cache_settings = &configuration.cache;
    let cache = WeatherCache::new(
        cache_settings.backend()?,
        cache_settings.config(),
        cache_settings.metrics(),
    );
    if let Err(e) = cache.health().await {
        tracing::warn!(
            error.cause_chain = ?e,
            error.message = %e,
            "Cache backend is not reachable, continuing without warm cache"
        );
    }
    let chain = configuration
        .weather
        .chain(Arc::new(TracingProviderLogger))
        .context("Failed to build weather provider chain.")?;
    tracing::info!(
        first_provider = chain.first_provider_name(),
        cache_enabled = cache.is_enabled(),
        "Weather service ready"
    );
    Ok(WeatherService::new(Arc::new(cache), Arc::new(chain)))
}

pub fn build_scheduler(
    configuration: &Settings,
    weather_service: Arc<WeatherService>,
) -> Result<Scheduler, anyhow::Error> {
    let mailer = configuration
        .email_client
        .client(&configuration.application.base_url)?;
    let subscriptions = configuration.subscription_service.client()?;
    Ok(Scheduler::new(
        Arc::new(subscriptions),
        weather_service,
        Arc::new(mailer),
        Arc::new(SystemClock),
        configuration.scheduler.config()?,
    ))
}

pub fn run(
    listener: TcpListener,
    weather_service: Arc<WeatherService>,
) -> Result<Server, anyhow::Error> {
    let weather_service = web::Data::from(weather_service);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/weather", web::get().to(get_weather))
            .route("/cache/health", web::get().to(cache_health))
            .route("/cache/stats", web::get().to(cache_stats))
            .route("/metrics", web::get().to(metrics))
            .app_data(weather_service.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

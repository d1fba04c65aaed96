//! src/configuration.rs

use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::metrics::{CacheMetrics, PrometheusCacheMetrics};
use crate::scheduler::SchedulerConfig;
use crate::subscription_client::SubscriptionClient;
use crate::weather::{
    CacheBackend, CacheConfig, InMemoryBackend, OpenWeatherAdapter, ProviderLogger,
    RedisBackend, WeatherAdapter, WeatherApiAdapter, WeatherChain,
};
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::sync::Arc;
use std::time::Duration;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub subscription_service: SubscriptionServiceSettings,
    pub weather: WeatherSettings,
    pub cache: CacheSettings,
    pub scheduler: SchedulerSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub base_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn client(&self, app_base_url: &str) -> Result<EmailClient, anyhow::Error> {
        let sender_email = self.sender()?;
        EmailClient::new(
            self.base_url.clone(),
            sender_email,
            self.authorization_token.clone(),
            self.timeout(),
            app_base_url.to_owned(),
        )
    }

    pub fn sender(&self) -> Result<SubscriberEmail, anyhow::Error> {
        Ok(SubscriberEmail::parse(self.sender_email.clone())?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct SubscriptionServiceSettings {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl SubscriptionServiceSettings {
    pub fn client(&self) -> Result<SubscriptionClient, anyhow::Error> {
        SubscriptionClient::new(
            self.base_url.clone(),
            Duration::from_millis(self.timeout_milliseconds),
        )
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct WeatherSettings {
    /// Providers in fallback order; the first one is asked first.
    pub providers: Vec<ProviderSettings>,
}

impl WeatherSettings {
    pub fn chain(&self, logger: Arc<dyn ProviderLogger>) -> Result<WeatherChain, anyhow::Error> {
        let providers = self
            .providers
            .iter()
            .map(|p| Ok((p.name.clone(), p.adapter()?)))
            .collect::<Result<Vec<_>, anyhow::Error>>()?;
        WeatherChain::from_providers(providers, logger)
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenWeather,
    WeatherApi,
}

#[derive(serde::Deserialize, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub name: String,
    pub base_url: String,
    pub api_key: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl ProviderSettings {
    pub fn adapter(&self) -> Result<Arc<dyn WeatherAdapter>, anyhow::Error> {
        let timeout = Duration::from_millis(self.timeout_milliseconds);
        let adapter: Arc<dyn WeatherAdapter> = match self.kind {
            ProviderKind::OpenWeather => Arc::new(OpenWeatherAdapter::new(
                self.base_url.clone(),
                self.api_key.clone(),
                timeout,
            )?),
            ProviderKind::WeatherApi => Arc::new(WeatherApiAdapter::new(
                self.base_url.clone(),
                self.api_key.clone(),
                timeout,
            )?),
        };
        Ok(adapter)
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Memory,
    Redis,
}

#[derive(serde::Deserialize, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub backend: CacheBackendKind,
    pub namespace: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub default_ttl_seconds: u64,
    pub redis: RedisSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    pub url: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub pool_size: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl CacheSettings {
    pub fn config(&self) -> CacheConfig {
        CacheConfig {
            enabled: self.enabled,
            namespace: self.namespace.clone(),
            default_ttl: Duration::from_secs(self.default_ttl_seconds),
        }
    }

    pub fn backend(&self) -> Result<Arc<dyn CacheBackend>, anyhow::Error> {
        use secrecy::ExposeSecret;
        let backend: Arc<dyn CacheBackend> = match self.backend {
            CacheBackendKind::Memory => Arc::new(InMemoryBackend::new()),
            CacheBackendKind::Redis => Arc::new(RedisBackend::new(
                self.redis.url.expose_secret(),
                self.redis.pool_size,
                Duration::from_millis(self.redis.timeout_milliseconds),
            )?),
        };
        Ok(backend)
    }

    pub fn metrics(&self) -> Arc<dyn CacheMetrics> {
        let label = match self.backend {
            CacheBackendKind::Memory => "memory",
            CacheBackendKind::Redis => "redis",
        };
        Arc::new(PrometheusCacheMetrics::new(label))
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct SchedulerSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub notification_hour: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_concurrency: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub batch_timeout_seconds: u64,
}

impl SchedulerSettings {
    pub fn config(&self) -> Result<SchedulerConfig, anyhow::Error> {
        if self.notification_hour > 23 {
            anyhow::bail!(
                "notification_hour must be an hour of the day (0-23), got {}.",
                self.notification_hour
            );
        }
        Ok(SchedulerConfig {
            notification_hour: self.notification_hour,
            max_concurrency: self.max_concurrency,
            batch_timeout: Duration::from_secs(self.batch_timeout_seconds),
        })
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!(
            "Failed to determine the current directory: {}",
            e
        ))
    })?;
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment.
    // Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_APPLICATION__PORT=5001 would set `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. \
                Use either `local` or `production`.",
                other
            )),
        }
    }
}

//! src/weather/chain.rs
//!
//! Ordered fallback over weather providers. Each link owns its successor;
//! a failing link hands the request on, the last one reports the aggregate
//! failure.

use crate::domain::WeatherSnapshot;
use crate::weather::{AdapterError, WeatherAdapter, WeatherError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type HandleFuture<'a> =
    Pin<Box<dyn Future<Output = Result<WeatherSnapshot, WeatherError>> + Send + 'a>>;

/// Result of one chain resolution, as reported to a [`ProviderLogger`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutcome {
    pub provider_name: String,
    pub snapshot: Option<WeatherSnapshot>,
    pub error: Option<String>,
}

impl ProviderOutcome {
    fn new(provider_name: &str, result: &Result<WeatherSnapshot, WeatherError>) -> Self {
        match result {
            Ok(snapshot) => Self {
                provider_name: provider_name.to_owned(),
                snapshot: Some(snapshot.clone()),
                error: None,
            },
            Err(e) => Self {
                provider_name: provider_name.to_owned(),
                snapshot: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Sink for provider outcomes. Must not block.
pub trait ProviderLogger: Send + Sync {
    fn log_response(&self, outcome: &ProviderOutcome);
}

/// Emits provider outcomes as tracing events and counts them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProviderLogger;

impl ProviderLogger for TracingProviderLogger {
    fn log_response(&self, outcome: &ProviderOutcome) {
        match (&outcome.snapshot, &outcome.error) {
            (Some(snapshot), _) => tracing::info!(
                provider = %outcome.provider_name,
                success = true,
                temperature = snapshot.temperature(),
                humidity = snapshot.humidity(),
                description = %snapshot.description(),
                "Weather provider response"
            ),
            (None, error) => tracing::warn!(
                provider = %outcome.provider_name,
                success = false,
                error.message = error.as_deref().unwrap_or_default(),
                "Weather provider response"
            ),
        }
        crate::metrics::record_provider_outcome(&outcome.provider_name, outcome.is_success());
    }
}

/// One provider in the chain.
pub struct ProviderLink {
    name: String,
    adapter: Arc<dyn WeatherAdapter>,
    next: Option<Box<ProviderLink>>,
}

impl ProviderLink {
    pub fn new(name: impl Into<String>, adapter: Arc<dyn WeatherAdapter>) -> Self {
        Self {
            name: name.into(),
            adapter,
            next: None,
        }
    }

    /// Places `next` directly after this link and returns it, so links can be
    /// appended one after another.
    pub fn set_next(&mut self, next: ProviderLink) -> &mut ProviderLink {
        self.next.insert(Box::new(next))
    }

    pub fn provider_name(&self) -> &str {
        &self.name
    }

    pub fn handle<'a>(&'a self, city: &'a str) -> HandleFuture<'a> {
        Box::pin(async move {
            match self.adapter.fetch_weather(city).await {
                Ok(snapshot) => Ok(snapshot),
                Err(error) => match &self.next {
                    Some(next) => next.handle(city).await,
                    None => Err(self.exhausted(error)),
                },
            }
        })
    }

    fn exhausted(&self, source: AdapterError) -> WeatherError {
        WeatherError::ProvidersExhausted {
            provider: self.name.clone(),
            source,
        }
    }
}

pub struct WeatherChain {
    first: ProviderLink,
    logger: Arc<dyn ProviderLogger>,
}

impl WeatherChain {
    pub fn new(first: ProviderLink, logger: Arc<dyn ProviderLogger>) -> Self {
        Self { first, logger }
    }

    /// Links the providers in the given order.
    pub fn from_providers(
        providers: Vec<(String, Arc<dyn WeatherAdapter>)>,
        logger: Arc<dyn ProviderLogger>,
    ) -> Result<Self, anyhow::Error> {
        let mut head: Option<ProviderLink> = None;
        for (name, adapter) in providers.into_iter().rev() {
            let mut link = ProviderLink::new(name, adapter);
            if let Some(next) = head.take() {
                link.set_next(next);
            }
            head = Some(link);
        }
        let first = head.ok_or_else(|| anyhow::anyhow!("no weather providers configured"))?;
        Ok(Self::new(first, logger))
    }

    pub fn first_provider_name(&self) -> &str {
        self.first.provider_name()
    }

    /// Resolves the weather for `city`, emitting exactly one provider outcome.
    ///
    /// The outcome is attributed to the first configured provider, whichever
    /// link actually answered.
    #[tracing::instrument(name = "Resolve weather through provider chain", skip(self))]
    pub async fn get_weather(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let result = self.first.handle(city).await;
        self.logger
            .log_response(&ProviderOutcome::new(self.first.provider_name(), &result));
        result
    }
}

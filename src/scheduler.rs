//! src/scheduler.rs
//!
//! Periodic weather notifications. A single tick loop checks the wall clock
//! once per tick; on the hour it delivers the hourly batch, and at the
//! configured notification hour the daily batch right after it.

use crate::domain::{Frequency, SubscriberEmail, SubscriberToken, Subscription};
use crate::email_client::MailerProvider;
use crate::subscription_client::SubscriptionProvider;
use crate::weather::WeatherProvider;
use chrono::{Local, NaiveDateTime, Timelike};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{timeout_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Wall-clock resolution of the tick loop. Batches are due during one whole
/// minute, so each minute must be observed exactly once.
const TICK: Duration = Duration::from_secs(60);

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Source of wall-clock time for the tick policy.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Hour of day (0-23) at which daily notifications go out.
    pub notification_hour: u32,
    pub max_concurrency: usize,
    /// Deadline shared by every delivery of one batch.
    pub batch_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            notification_hour: 8,
            max_concurrency: 10,
            batch_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,
    #[error("scheduler has been stopped and cannot be restarted")]
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Result of one `send` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The subscription list could not be fetched; nothing was sent.
    Aborted,
    Completed {
        delivered: usize,
        skipped: usize,
        failed: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Invalid contact details or no weather for the city.
    Skipped,
    Failed,
}

impl DeliveryOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Skipped => "skipped",
            DeliveryOutcome::Failed => "failed",
        }
    }
}

/// Returns the batches due at `now`, in the order they must run.
pub fn due_frequencies(now: &impl Timelike, notification_hour: u32) -> Vec<Frequency> {
    let mut due = Vec::new();
    if now.minute() == 0 {
        due.push(Frequency::Hourly);
        if now.hour() == notification_hour {
            due.push(Frequency::Daily);
        }
    }
    due
}

struct Inner {
    subscriptions: Arc<dyn SubscriptionProvider>,
    weather: Arc<dyn WeatherProvider>,
    mailer: Arc<dyn MailerProvider>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    state: AtomicU8,
    shutdown: CancellationToken,
}

#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionProvider>,
        weather: Arc<dyn WeatherProvider>,
        mailer: Arc<dyn MailerProvider>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscriptions,
                weather,
                mailer,
                clock,
                config,
                state: AtomicU8::new(IDLE),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn state(&self) -> SchedulerState {
        match self.inner.state.load(Ordering::SeqCst) {
            IDLE => SchedulerState::Idle,
            RUNNING => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Spawns the tick loop. A scheduler runs at most once.
    pub fn start(&self) -> Result<JoinHandle<()>, SchedulerError> {
        match self
            .inner
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {}
            Err(RUNNING) => return Err(SchedulerError::AlreadyRunning),
            Err(_) => return Err(SchedulerError::Stopped),
        }
        let scheduler = self.clone();
        Ok(tokio::spawn(async move { scheduler.run_loop().await }))
    }

    /// Ends the tick loop. A batch already in progress runs to completion.
    /// Safe to call any number of times.
    pub fn stop(&self) {
        if self.inner.state.swap(STOPPED, Ordering::SeqCst) != STOPPED {
            self.inner.shutdown.cancel();
        }
    }

    async fn run_loop(&self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            notification_hour = self.inner.config.notification_hour,
            "Weather notification loop started"
        );
        loop {
            tokio::select! {
                biased;
                _ = self.inner.shutdown.cancelled() => {
                    tracing::info!("Stopping weather notification loop");
                    break;
                }
                _ = ticker.tick() => {
                    let now = self.inner.clock.now();
                    self.tick(now).await;
                }
            }
        }
    }

    /// Runs every batch due at `now`; the hourly batch completes before the
    /// daily one starts.
    pub async fn tick(&self, now: NaiveDateTime) -> Vec<(Frequency, BatchOutcome)> {
        let mut outcomes = Vec::new();
        for frequency in due_frequencies(&now, self.inner.config.notification_hour) {
            outcomes.push((frequency, self.send(frequency).await));
        }
        outcomes
    }

    /// Delivers the current weather to every confirmed subscription of
    /// `frequency`. Returns once all deliveries have finished.
    #[tracing::instrument(name = "Send weather notifications", skip(self))]
    pub async fn send(&self, frequency: Frequency) -> BatchOutcome {
        let deadline = Instant::now() + self.inner.config.batch_timeout;

        let subscriptions = match timeout_at(
            deadline,
            self.inner.subscriptions.get_confirmed(frequency),
        )
        .await
        {
            Ok(Ok(subscriptions)) => subscriptions,
            Ok(Err(e)) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to fetch confirmed subscriptions"
                );
                return BatchOutcome::Aborted;
            }
            Err(_) => {
                tracing::error!("Timed out fetching confirmed subscriptions");
                return BatchOutcome::Aborted;
            }
        };

        let semaphore = Arc::new(Semaphore::new(self.inner.config.max_concurrency.max(1)));
        let mut workers = JoinSet::new();
        for subscription in subscriptions {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let weather = self.inner.weather.clone();
            let mailer = self.inner.mailer.clone();
            workers.spawn(async move {
                let _permit = permit;
                let outcome = match timeout_at(
                    deadline,
                    deliver(weather.as_ref(), mailer.as_ref(), &subscription),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::warn!(
                            subscription_id = %subscription.id,
                            "Batch deadline exceeded before delivery completed"
                        );
                        DeliveryOutcome::Failed
                    }
                };
                crate::metrics::record_delivery(frequency.as_str(), outcome.as_str());
                outcome
            });
        }

        let (mut delivered, mut skipped, mut failed) = (0, 0, 0);
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(DeliveryOutcome::Delivered) => delivered += 1,
                Ok(DeliveryOutcome::Skipped) => skipped += 1,
                Ok(DeliveryOutcome::Failed) => failed += 1,
                Err(e) => {
                    tracing::error!(
                        error.cause_chain = ?e,
                        error.message = %e,
                        "Notification worker panicked"
                    );
                    failed += 1;
                }
            }
        }
        tracing::info!(delivered, skipped, failed, "Weather notification batch finished");
        BatchOutcome::Completed {
            delivered,
            skipped,
            failed,
        }
    }
}

#[tracing::instrument(
    name = "Deliver weather notification",
    skip_all,
    fields(
        subscription_id = %subscription.id,
        subscriber_email = %subscription.email,
        city = %subscription.city
    )
)]
async fn deliver(
    weather: &dyn WeatherProvider,
    mailer: &dyn MailerProvider,
    subscription: &Subscription,
) -> DeliveryOutcome {
    let contact = SubscriberEmail::parse(subscription.email.clone()).and_then(|email| {
        SubscriberToken::parse(subscription.token.clone()).map(|token| (email, token))
    });
    let (email, token) = match contact {
        Ok(contact) => contact,
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Skipping a confirmed subscriber. Their stored contact details are invalid."
            );
            return DeliveryOutcome::Skipped;
        }
    };

    let snapshot = match weather.get_weather(&subscription.city).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(
                error.cause_chain = ?e,
                error.message = %e,
                "Weather fetch failed, skipping subscriber"
            );
            return DeliveryOutcome::Skipped;
        }
    };

    match mailer
        .send_weather_email(&email, &subscription.city, &snapshot, &token)
        .await
    {
        Ok(()) => {
            tracing::info!("Weather email sent");
            DeliveryOutcome::Delivered
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to send weather email"
            );
            DeliveryOutcome::Failed
        }
    }
}

//! main.rs

use anyhow::Context;
use std::fmt::{Debug, Display};
use tokio::task::JoinError;
use weather_notify::configuration::get_configuration;
use weather_notify::error::AppResult;
use weather_notify::metrics::init_metrics;
use weather_notify::startup::{build_scheduler, Application};
use weather_notify::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> AppResult<()> {
    let subscriber = get_subscriber("weather_notify".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    // Panic if we can't read configuration
    let configuration = get_configuration().expect("Failed to read configuration.");
    init_metrics();

    let application = Application::build(configuration.clone()).await?;
    let scheduler = build_scheduler(&configuration, application.weather_service())?;
    let scheduler_task = scheduler
        .start()
        .context("Failed to start notification scheduler.")?;
    let application_task = tokio::spawn(application.run_until_stopped());

    tokio::select! {
        o = application_task => report_exit("API", o),
        o = scheduler_task => {
            report_exit("Notification scheduler", o.map(Ok::<(), std::io::Error>))
        }
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown signal received"),
    };
    scheduler.stop();

    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} task failed to complete",
                task_name
            )
        }
    }
}

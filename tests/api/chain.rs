//! tests/api/chain.rs

use crate::helpers::{RecordingLogger, ScriptedAdapter};
use claims::assert_ok_eq;
use std::sync::Arc;
use weather_notify::domain::WeatherSnapshot;
use weather_notify::weather::{WeatherAdapter, WeatherChain};

fn chain(
    providers: Vec<(&str, Arc<ScriptedAdapter>)>,
    logger: Arc<RecordingLogger>,
) -> WeatherChain {
    let providers = providers
        .into_iter()
        .map(|(name, adapter)| {
            let adapter: Arc<dyn WeatherAdapter> = adapter;
            (name.to_string(), adapter)
        })
        .collect();
    WeatherChain::from_providers(providers, logger).unwrap()
}

fn sunny() -> WeatherSnapshot {
    WeatherSnapshot::new(25.0, 30.0, "Sunny")
}

#[tokio::test]
async fn later_links_are_not_asked_after_a_success() {
    let first = ScriptedAdapter::answering(sunny());
    let second = ScriptedAdapter::answering(WeatherSnapshot::new(0.0, 0.0, "unused"));
    let chain = chain(
        vec![("first", first.clone()), ("second", second.clone())],
        Arc::new(RecordingLogger::default()),
    );

    assert_ok_eq!(chain.get_weather("Kyiv").await, sunny());
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 0);
}

#[tokio::test]
async fn failures_cascade_in_configured_order() {
    let first = ScriptedAdapter::failing();
    let second = ScriptedAdapter::not_found();
    let third = ScriptedAdapter::answering(sunny());
    let chain = chain(
        vec![
            ("first", first.clone()),
            ("second", second.clone()),
            ("third", third.clone()),
        ],
        Arc::new(RecordingLogger::default()),
    );

    assert_ok_eq!(chain.get_weather("Kyiv").await, sunny());
    assert_eq!((first.calls(), second.calls(), third.calls()), (1, 1, 1));
}

#[tokio::test]
async fn exhausted_chain_names_the_last_provider() {
    let chain = chain(
        vec![
            ("first", ScriptedAdapter::not_found()),
            ("last", ScriptedAdapter::failing()),
        ],
        Arc::new(RecordingLogger::default()),
    );

    let error = chain.get_weather("Kyiv").await.unwrap_err();

    assert_eq!(
        error.to_string(),
        "all weather providers failed, last error from last: provider unavailable"
    );
    assert!(!error.is_not_found());
}

#[tokio::test]
async fn not_found_from_the_last_provider_is_preserved() {
    let chain = chain(
        vec![
            ("first", ScriptedAdapter::failing()),
            ("last", ScriptedAdapter::not_found()),
        ],
        Arc::new(RecordingLogger::default()),
    );

    let error = chain.get_weather("Atlantis").await.unwrap_err();

    assert!(error.is_not_found());
}

#[tokio::test]
async fn single_outcome_is_attributed_to_the_first_provider() {
    let logger = Arc::new(RecordingLogger::default());
    let chain = chain(
        vec![
            ("first", ScriptedAdapter::failing()),
            ("second", ScriptedAdapter::answering(sunny())),
        ],
        logger.clone(),
    );

    chain.get_weather("Kyiv").await.unwrap();

    let outcomes = logger.outcomes.lock().unwrap().clone();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].provider_name, "first");
    assert_eq!(outcomes[0].snapshot, Some(sunny()));
    assert!(outcomes[0].is_success());
}

#[tokio::test]
async fn failed_resolution_is_logged_once_with_the_error() {
    let logger = Arc::new(RecordingLogger::default());
    let chain = chain(
        vec![
            ("first", ScriptedAdapter::failing()),
            ("second", ScriptedAdapter::failing()),
        ],
        logger.clone(),
    );

    chain.get_weather("Kyiv").await.unwrap_err();

    let outcomes = logger.outcomes.lock().unwrap().clone();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].provider_name, "first");
    assert!(outcomes[0].snapshot.is_none());
    assert!(outcomes[0]
        .error
        .as_deref()
        .unwrap()
        .contains("last error from second"));
}

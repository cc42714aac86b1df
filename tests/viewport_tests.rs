//! Viewport loading through shared services.

mod support;

use std::sync::Arc;
use std::time::Duration;

use propview::application::coordinator::DebounceState;
use propview::application::viewport::{DataOrigin, ViewportOutcome, ViewportState};
use propview::domain::GeoBounds;
use propview::error::FetchError;
use propview::testkit::domain::{bounds_at, cdmx_bounds, properties};
use propview::testkit::probe::ScriptedProbe;
use propview::testkit::source::ScriptedPropertySource;

fn jittered_cdmx() -> GeoBounds {
    GeoBounds::try_new(19.449, 19.401, -99.101, -99.199).unwrap()
}

#[tokio::test(start_paused = true)]
async fn jittered_bounds_are_served_from_cache_without_fetch() {
    let source = Arc::new(ScriptedPropertySource::new().respond(Ok(properties(12))));
    let services = support::services::scripted(Arc::clone(&source), Arc::new(ScriptedProbe::new()));
    let loader = services.viewport_loader();

    let first = loader.load(cdmx_bounds()).await.unwrap();
    assert!(first.is_network());
    assert_eq!(services.region_cache().len(), 1);

    let second = services.viewport_loader().load(jittered_cdmx()).await.unwrap();
    assert!(matches!(
        second,
        ViewportOutcome::Ready {
            origin: DataOrigin::Cache,
            ..
        }
    ));
    assert_eq!(second.properties().unwrap().len(), 12);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn sub_epsilon_change_on_ready_viewport_is_unchanged() {
    let source = Arc::new(ScriptedPropertySource::new().respond(Ok(properties(3))));
    let services = support::services::scripted(Arc::clone(&source), Arc::new(ScriptedProbe::new()));
    let loader = services.viewport_loader();

    loader.load(cdmx_bounds()).await.unwrap();
    let outcome = loader.load(jittered_cdmx()).await.unwrap();

    assert!(matches!(outcome, ViewportOutcome::Unchanged { .. }));
    assert_eq!(outcome.properties().unwrap().len(), 3);
    assert_eq!(loader.stats().unchanged, 1);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn burst_of_bounds_events_fetches_once() {
    let source = Arc::new(ScriptedPropertySource::new().respond(Ok(properties(3))));
    let services = support::services::scripted(Arc::clone(&source), Arc::new(ScriptedProbe::new()));
    let loader = services.viewport_loader();

    let first = loader.on_bounds_changed(cdmx_bounds());
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = loader.on_bounds_changed(jittered_cdmx());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(first.state(), DebounceState::Cancelled);
    assert_eq!(second.state(), DebounceState::Fired);
    assert_eq!(source.calls(), 1);
    assert_eq!(source.bounds_requested(), vec![jittered_cdmx()]);
    assert_eq!(loader.state().name(), "ready");
}

#[tokio::test(start_paused = true)]
async fn zoom_event_evicts_distant_regions_before_loading() {
    let source = Arc::new(
        ScriptedPropertySource::new()
            .respond(Ok(properties(2)))
            .respond(Ok(properties(4))),
    );
    let services = support::services::scripted(Arc::clone(&source), Arc::new(ScriptedProbe::new()));
    let loader = services.viewport_loader();

    loader.load(bounds_at(40.41, -3.70)).await.unwrap();
    loader.on_zoom_changed(cdmx_bounds());
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(services.region_cache().regions(), vec![cdmx_bounds()]);
    assert_eq!(loader.visible().unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn stale_result_for_superseded_bounds_is_not_applied() {
    let source = Arc::new(
        ScriptedPropertySource::new()
            .with_delay(Duration::from_millis(200))
            .respond(Ok(properties(2)))
            .respond(Ok(properties(7))),
    );
    let services = support::services::scripted(Arc::clone(&source), Arc::new(ScriptedProbe::new()));
    let loader = services.viewport_loader();

    let slow = tokio::spawn({
        let loader = loader.clone();
        async move { loader.load(bounds_at(19.6, -99.15)).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let latest = loader.load(cdmx_bounds()).await.unwrap();
    let stale = slow.await.unwrap().unwrap();

    assert_eq!(stale, ViewportOutcome::Superseded);
    assert_eq!(latest.properties().unwrap().len(), 7);
    match loader.state() {
        ViewportState::Ready { bounds, .. } => assert_eq!(bounds, cdmx_bounds()),
        other => panic!("expected ready, got {other:?}"),
    }
    // The superseded response still warms the cache.
    assert_eq!(services.region_cache().len(), 2);
    assert_eq!(loader.stats().superseded, 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failure_keeps_last_good_markers() {
    let source = Arc::new(
        ScriptedPropertySource::new()
            .respond(Ok(properties(5)))
            .respond(Err(FetchError::Status(503))),
    );
    let services = support::services::scripted(Arc::clone(&source), Arc::new(ScriptedProbe::new()));
    let loader = services.viewport_loader();
    let mut states = loader.subscribe();

    loader.load(cdmx_bounds()).await.unwrap();
    let outcome = loader.load(bounds_at(40.41, -3.70)).await.unwrap();

    assert!(matches!(
        outcome,
        ViewportOutcome::Failed {
            error: FetchError::Status(503),
            ..
        }
    ));
    assert_eq!(outcome.properties().unwrap().len(), 5);
    assert!(states.has_changed().unwrap());
    match &*states.borrow_and_update() {
        ViewportState::Error { last_good, .. } => {
            assert_eq!(last_good.as_ref().unwrap().len(), 5);
        }
        other => panic!("expected error state, got {other:?}"),
    }
    assert_eq!(loader.markers().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn concurrent_sessions_share_one_fetch() {
    let source = Arc::new(
        ScriptedPropertySource::new()
            .with_delay(Duration::from_millis(100))
            .respond(Ok(properties(6))),
    );
    let services = support::services::scripted(Arc::clone(&source), Arc::new(ScriptedProbe::new()));
    let a = services.viewport_loader();
    let b = services.viewport_loader();

    let (ra, rb) = tokio::join!(a.load(cdmx_bounds()), b.load(cdmx_bounds()));

    assert_eq!(ra.unwrap().properties().unwrap().len(), 6);
    assert_eq!(rb.unwrap().properties().unwrap().len(), 6);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn eleventh_region_evicts_oldest_after_ready() {
    let source = Arc::new(ScriptedPropertySource::new());
    let services = support::services::scripted(Arc::clone(&source), Arc::new(ScriptedProbe::new()));
    let loader = services.viewport_loader();

    // Regions close enough together that distance eviction keeps them all.
    for i in 0..11 {
        let bounds = bounds_at(19.0 + f64::from(i) * 0.03, -99.0);
        loader.load(bounds).await.unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
    }

    assert_eq!(services.region_cache().len(), 10);
    assert!(!services
        .region_cache()
        .regions()
        .contains(&bounds_at(19.0, -99.0)));
}

#[tokio::test(start_paused = true)]
async fn jitter_while_loading_fetches_once() {
    let source = Arc::new(
        ScriptedPropertySource::new()
            .with_delay(Duration::from_millis(200))
            .respond(Ok(properties(4))),
    );
    let services = support::services::scripted(Arc::clone(&source), Arc::new(ScriptedProbe::new()));
    let loader = services.viewport_loader();

    let first = tokio::spawn({
        let loader = loader.clone();
        async move { loader.load(cdmx_bounds()).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = loader.load(jittered_cdmx()).await.unwrap();
    let first = first.await.unwrap().unwrap();

    assert!(first.is_network());
    assert_eq!(second.properties().unwrap().len(), 4);
    assert_eq!(source.calls(), 1);
    match loader.state() {
        ViewportState::Ready { bounds, .. } => assert_eq!(bounds, cdmx_bounds()),
        other => panic!("expected ready, got {other:?}"),
    }
}

mod support;

use std::time::Duration;

use campus_api::CampusApiError;
use campus_nav::location::{LocationTracker, RawPosition, TrackerConfig};
use campus_nav::route::{
    Destination, RecalculationConfig, RouteRecalculationLoop, RouteUpdate, SampleDisposition,
};
use campus_nav::{
    ChatPresentationAdapter, GeolocationError, LatLng, LocationSample, LocationStatus,
    RecalculationError, TravelMode, DEFAULT_COORDINATE,
};
use pretty_assertions::assert_eq;
use support::{route_error, route_success, FakeGeolocation, ManualUpdater};

const LIBRARY: LatLng = LatLng::new(8.5581, 39.2917);

fn in_bounds(lat: f64, lng: f64) -> LocationSample {
    TrackerConfig::default().classify(&RawPosition::new(lat, lng, 8.0))
}

fn unthrottled() -> RecalculationConfig {
    RecalculationConfig {
        min_interval: Duration::ZERO,
        mode: TravelMode::Walking,
    }
}

#[tokio::test]
async fn denied_geolocation_yields_single_default_sample() {
    let source = FakeGeolocation::replay_and_hold(vec![Err(GeolocationError::PermissionDenied)]);
    let mut tracker = LocationTracker::new(source);
    let mut samples = tracker.start();

    let sample = samples.recv().await.expect("fallback sample");
    assert_eq!(sample.status, LocationStatus::Denied);
    assert_eq!(sample.coord(), LatLng::new(8.55686, 39.29108));
    assert_eq!(sample.accuracy, None);
    assert!(samples.recv().await.is_none(), "watch ends after denial");
}

#[tokio::test]
async fn missing_capability_yields_unsupported_default() {
    let source = FakeGeolocation::failing(GeolocationError::Unsupported);
    let mut tracker = LocationTracker::new(source);
    let mut samples = tracker.start();

    let sample = samples.recv().await.expect("fallback sample");
    assert_eq!(sample.status, LocationStatus::UnsupportedDefault);
    assert_eq!(sample.coord(), DEFAULT_COORDINATE);
    assert!(samples.recv().await.is_none());
    assert!(!tracker.is_watching());
}

#[tokio::test]
async fn out_of_bounds_and_transient_errors_are_handled_in_stream() {
    let source = FakeGeolocation::replay(vec![
        Ok(RawPosition::new(8.5569, 39.2911, 5.0)),
        Err(GeolocationError::Timeout),
        Err(GeolocationError::Unavailable("no satellites".to_string())),
        Ok(RawPosition::new(9.0054, 38.7636, 20.0)),
    ]);
    let mut tracker = LocationTracker::new(source);
    let mut samples = tracker.start();

    let first = samples.recv().await.expect("first sample");
    let second = samples.recv().await.expect("second sample");

    assert_eq!(first.status, LocationStatus::Actual);
    assert_eq!(first.coord(), LatLng::new(8.5569, 39.2911));
    assert_eq!(second.status, LocationStatus::OutsideBounds);
    assert_eq!(second.coord(), DEFAULT_COORDINATE);
    assert!(samples.recv().await.is_none());
}

#[tokio::test]
async fn restarting_tracker_replaces_previous_watch() {
    let source = FakeGeolocation::replay_and_hold(vec![Ok(RawPosition::new(8.5569, 39.2911, 5.0))]);
    let mut tracker = LocationTracker::new(source.clone());

    let mut first = tracker.start();
    first.recv().await.expect("first watch sample");
    let mut second = tracker.start();

    assert!(first.recv().await.is_none(), "previous watch is released");
    assert!(second.recv().await.is_some());
    assert_eq!(source.watch_count(), 2);

    tracker.stop();
    tracker.stop();
    assert!(second.recv().await.is_none());
}

#[tokio::test]
async fn out_of_order_responses_apply_only_the_newest() {
    let updater = ManualUpdater::new();
    let mut route = RouteRecalculationLoop::new(updater.clone(), unthrottled());
    route.set_destination(Some(Destination::named(LIBRARY, "Library")));

    assert_eq!(
        route.on_sample(in_bounds(8.5560, 39.2905)),
        SampleDisposition::Issued(1)
    );
    assert_eq!(
        route.on_sample(in_bounds(8.5565, 39.2908)),
        SampleDisposition::Issued(2)
    );
    updater.wait_for_requests(2).await;

    updater.resolve(2, Ok(route_success(&[(8.5565, 39.2908), (8.5581, 39.2917)], "160m")));
    assert_eq!(route.next_update().await, RouteUpdate::Applied { seq: 2 });

    updater.resolve(1, Ok(route_success(&[(8.5560, 39.2905), (8.5581, 39.2917)], "210m")));
    assert_eq!(route.next_update().await, RouteUpdate::Stale { seq: 1 });

    let state = route.state();
    assert_eq!(state.last_applied_seq, 2);
    assert_eq!(state.distance_remaining.as_deref(), Some("160m"));
    assert_eq!(state.coordinates.first().copied(), Some(LatLng::new(8.5565, 39.2908)));

    let requests = updater.requests();
    assert_eq!(requests[1].destination_name.as_deref(), Some("Library"));
    assert_eq!(requests[1].destination_lat, Some(LIBRARY.lat));
    assert_eq!(requests[1].mode, TravelMode::Walking);
}

#[tokio::test]
async fn failed_recalculations_leave_route_unchanged() {
    let updater = ManualUpdater::new();
    let mut route = RouteRecalculationLoop::new(updater.clone(), unthrottled());
    route.set_destination(Some(Destination::new(LIBRARY)));

    route.on_sample(in_bounds(8.5560, 39.2905));
    updater.wait_for_requests(1).await;
    updater.resolve(1, Ok(route_success(&[(8.5560, 39.2905), (8.5581, 39.2917)], "210m")));
    assert_eq!(route.next_update().await, RouteUpdate::Applied { seq: 1 });
    let applied = route.state().clone();

    route.on_sample(in_bounds(8.5562, 39.2906));
    route.on_sample(in_bounds(8.5564, 39.2907));
    route.on_sample(in_bounds(8.5566, 39.2908));
    updater.wait_for_requests(4).await;

    updater.resolve(2, Ok(route_error("No path between points")));
    updater.resolve(3, Ok(route_success(&[], "0m")));
    updater.resolve(4, Err(CampusApiError::Unknown("socket closed".to_string())));

    let mut failures = Vec::new();
    for _ in 0..3 {
        match route.next_update().await {
            RouteUpdate::Failed { seq, error } => failures.push((seq, error)),
            other => panic!("unexpected update: {other:?}"),
        }
    }
    failures.sort_by_key(|(seq, _)| *seq);

    assert_eq!(
        failures,
        vec![
            (
                2,
                RecalculationError::Rejected("No path between points".to_string())
            ),
            (3, RecalculationError::EmptyRoute),
            (4, RecalculationError::Transport("socket closed".to_string())),
        ]
    );
    assert_eq!(route.state(), &applied);
}

#[tokio::test(start_paused = true)]
async fn throttled_samples_fire_one_trailing_request_for_latest_position() {
    let updater = ManualUpdater::new();
    let mut route = RouteRecalculationLoop::new(updater.clone(), RecalculationConfig::default());
    route.set_destination(Some(Destination::new(LIBRARY)));

    assert_eq!(
        route.on_sample(in_bounds(8.5560, 39.2905)),
        SampleDisposition::Issued(1)
    );
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(
        route.on_sample(in_bounds(8.5562, 39.2906)),
        SampleDisposition::Throttled
    );
    assert_eq!(
        route.on_sample(in_bounds(8.5564, 39.2907)),
        SampleDisposition::Throttled
    );
    assert_eq!(
        route.current_position().map(LocationSample::coord),
        Some(LatLng::new(8.5564, 39.2907))
    );

    updater.wait_for_requests(1).await;
    updater.resolve(1, Ok(route_success(&[(8.5560, 39.2905), (8.5581, 39.2917)], "210m")));
    assert_eq!(route.next_update().await, RouteUpdate::Applied { seq: 1 });

    let started = tokio::time::Instant::now();
    assert_eq!(route.next_update().await, RouteUpdate::Issued { seq: 2 });
    assert!(started.elapsed() <= Duration::from_secs(4));

    updater.wait_for_requests(2).await;
    let requests = updater.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].latitude, 8.5564);
    assert_eq!(requests[1].longitude, 39.2907);
}

#[tokio::test(start_paused = true)]
async fn responses_after_stop_are_discarded() {
    let updater = ManualUpdater::new();
    let mut route = RouteRecalculationLoop::new(updater.clone(), unthrottled());
    route.set_destination(Some(Destination::new(LIBRARY)));

    route.on_sample(in_bounds(8.5560, 39.2905));
    updater.wait_for_requests(1).await;
    route.stop();
    route.stop();

    updater.resolve(1, Ok(route_success(&[(8.5560, 39.2905), (8.5581, 39.2917)], "210m")));
    let late = tokio::time::timeout(Duration::from_secs(30), route.next_update()).await;

    assert!(late.is_err());
    assert!(route.state().coordinates.is_empty());
    assert_eq!(route.state().last_applied_seq, 0);
    assert_eq!(route.in_flight(), 0);
}

#[tokio::test]
async fn clearing_destination_clears_route_and_stops_issuing() {
    let updater = ManualUpdater::new();
    let mut route = RouteRecalculationLoop::new(updater.clone(), unthrottled());
    route.set_destination(Some(Destination::new(LIBRARY)));
    route.on_sample(in_bounds(8.5560, 39.2905));
    updater.wait_for_requests(1).await;
    updater.resolve(1, Ok(route_success(&[(8.5560, 39.2905), (8.5581, 39.2917)], "210m")));
    route.next_update().await;

    route.set_destination(None);
    assert_eq!(
        route.on_sample(in_bounds(8.5561, 39.2906)),
        SampleDisposition::NoDestination
    );

    let overlay = ChatPresentationAdapter::map_overlay(route.state(), route.current_position());
    assert!(overlay.route.is_empty());
    assert_eq!(overlay.destination, None);
    assert_eq!(overlay.current_position, Some(LatLng::new(8.5561, 39.2906)));
    assert_eq!(overlay.position_status, Some("actual"));
    assert_eq!(updater.requests().len(), 1);
}

#[tokio::test]
async fn fallback_sample_still_drives_recalculation() {
    let updater = ManualUpdater::new();
    let mut route = RouteRecalculationLoop::new(updater.clone(), unthrottled());
    route.set_destination(Some(Destination::new(LIBRARY)));

    let outside = TrackerConfig::default().classify(&RawPosition::new(9.03, 38.74, 50.0));
    assert_eq!(route.on_sample(outside), SampleDisposition::Issued(1));
    updater.wait_for_requests(1).await;

    let requests = updater.requests();
    let request = &requests[0];
    assert_eq!(request.latitude, DEFAULT_COORDINATE.lat);
    assert_eq!(request.longitude, DEFAULT_COORDINATE.lng);
}

use super::{Engine, Event, LegOutcome, LegRequest};

use async_trait::async_trait;
use futures::future::join_all;

use crate::{
    api::RouteAPI,
    entities::{Route, TravelMode},
};

impl Engine {
    #[tracing::instrument(skip(self, request), fields(index = request.index))]
    async fn compute_leg(&self, request: LegRequest) -> LegOutcome {
        let result = self
            .directions
            .find_routes(
                request.from.coordinates,
                request.to.coordinates,
                TravelMode::Walking,
                true,
            )
            .await;

        let outcome = self.sequence.lock().await.complete_leg(request, result);

        match &outcome {
            LegOutcome::Computed { leg } => {
                tracing::info!("leg {} computed: {} m", leg.index, leg.distance);
                self.publish(Event::LegComputed { leg: leg.clone() });
            }
            LegOutcome::Failed { index, error, .. } => {
                tracing::warn!("leg {} failed: {}", index, error);
                self.publish(Event::LegFailed {
                    index: *index,
                    error: error.clone(),
                });
                self.notify(error);
            }
            LegOutcome::Stale { index } => {
                tracing::debug!("leg {} discarded", index);
            }
        }

        outcome
    }
}

#[async_trait]
impl RouteAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn compute_route(&self) -> Vec<LegOutcome> {
        let requests = self.sequence.lock().await.plan_route();

        if requests.is_empty() {
            tracing::info!("fewer than two waypoints, nothing to route");
            return vec![];
        }

        tracing::info!("requesting {} legs", requests.len());

        join_all(requests.into_iter().map(|r| self.compute_leg(r))).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_route(&self) -> Route {
        self.sequence.lock().await.route()
    }
}

#[cfg(test)]
fn stops() -> [crate::entities::Coordinates; 4] {
    use crate::entities::Coordinates;

    [
        Coordinates::new(53.900, 27.550),
        Coordinates::new(53.905, 27.560),
        Coordinates::new(53.910, 27.570),
        Coordinates::new(53.915, 27.580),
    ]
}

#[test]
fn no_requests_below_two_waypoints() {
    use super::fakes::engine_with;
    use crate::api::WaypointAPI;
    use tokio_test::block_on;

    let [a, ..] = stops();
    let (engine, _, directions) = engine_with(&[("a", a)], &[]);

    assert!(block_on(engine.compute_route()).is_empty());

    block_on(engine.add_address("a".into())).unwrap();
    assert!(block_on(engine.compute_route()).is_empty());

    assert_eq!(directions.calls(), 0);
    assert!(block_on(engine.find_route()).legs.is_empty());
}

#[test]
fn one_walking_request_per_leg() {
    use super::fakes::engine_with;
    use crate::api::WaypointAPI;
    use tokio_test::block_on;

    let [a, b, c, d] = stops();
    let (engine, _, directions) = engine_with(
        &[("a", a), ("b", b), ("c", c), ("d", d)],
        &[
            (a, b, vec![500.0, 300.0, 450.0]),
            (b, c, vec![300.0, 300.0]),
            (c, d, vec![90.0]),
        ],
    );

    for address in ["a", "b", "c", "d"] {
        block_on(engine.add_address(address.into())).unwrap();
    }

    let outcomes = block_on(engine.compute_route());
    assert_eq!(outcomes.len(), 3);
    assert_eq!(directions.calls(), 3);
    for (origin, destination, mode, alternates) in directions.requests() {
        assert_eq!(mode, TravelMode::Walking);
        assert!(alternates);
        assert_ne!(origin, destination);
    }

    let route = block_on(engine.find_route());
    let distances: Vec<f64> = route.legs.iter().map(|l| l.distance).collect();
    assert_eq!(distances, vec![300.0, 300.0, 90.0]);
    assert_eq!(route.distance, 690.0);
    assert!(route.is_complete());
    assert_eq!(route.legs[0].from.label, "a");
    assert_eq!(route.legs[2].to.label, "d");
}

#[test]
fn failed_leg_does_not_block_others() {
    use super::fakes::engine_with;
    use crate::api::WaypointAPI;
    use crate::error::upstream_error;
    use tokio_test::block_on;

    let [a, b, c, d] = stops();
    let (engine, _, directions) = engine_with(
        &[("a", a), ("b", b), ("c", c), ("d", d)],
        &[(a, b, vec![100.0]), (c, d, vec![200.0])],
    );
    directions.fail_between(a, b, upstream_error());

    for address in ["a", "b", "c", "d"] {
        block_on(engine.add_address(address.into())).unwrap();
    }

    let events = engine.events();
    while events.try_recv().is_ok() {}

    let outcomes = block_on(engine.compute_route());
    assert!(matches!(outcomes[0], LegOutcome::Failed { index: 0, .. }));
    // b -> c has no entry: the provider returned no candidates
    match &outcomes[1] {
        LegOutcome::Failed { index, error, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(error.code, 103);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(matches!(outcomes[2], LegOutcome::Computed { .. }));

    let route = block_on(engine.find_route());
    assert_eq!(route.failed, vec![0, 1]);
    assert_eq!(route.legs.len(), 1);
    assert_eq!(route.distance, 200.0);

    let mut notifications = 0;
    while let Ok(event) = events.try_recv() {
        if let Event::Notification(_) = event {
            notifications += 1;
        }
    }
    assert_eq!(notifications, 2);
}

#[test]
fn legs_finishing_out_of_order_stay_ordered() {
    use super::fakes::engine_with;
    use crate::api::WaypointAPI;
    use std::time::Duration;
    use tokio_test::block_on;

    let [a, b, c, _] = stops();
    let (engine, _, directions) = engine_with(
        &[("a", a), ("b", b), ("c", c)],
        &[(a, b, vec![100.0]), (b, c, vec![200.0])],
    );
    directions.delay_between(a, b, Duration::from_millis(50));

    for address in ["a", "b", "c"] {
        block_on(engine.add_address(address.into())).unwrap();
    }

    let events = engine.events();
    while events.try_recv().is_ok() {}

    let outcomes = block_on(engine.compute_route());
    let indices: Vec<usize> = outcomes.iter().map(|o| o.index()).collect();
    assert_eq!(indices, vec![0, 1]);

    // second leg lands first
    let mut landed = vec![];
    while let Ok(event) = events.try_recv() {
        if let Event::LegComputed { leg } = event {
            landed.push(leg.index);
        }
    }
    assert_eq!(landed, vec![1, 0]);

    let route = block_on(engine.find_route());
    let order: Vec<usize> = route.legs.iter().map(|l| l.index).collect();
    assert_eq!(order, vec![0, 1]);
}

#[test]
fn late_legs_after_reset_are_dropped() {
    use super::fakes::engine_with;
    use crate::api::WaypointAPI;
    use std::sync::Arc;
    use tokio_test::block_on;

    let [a, b, c, _] = stops();
    let (engine, _, directions) = engine_with(
        &[("a", a), ("b", b), ("c", c)],
        &[(a, b, vec![100.0]), (b, c, vec![200.0])],
    );
    let engine = Arc::new(engine);

    block_on(async {
        for address in ["a", "b", "c"] {
            engine.add_address(address.into()).await.unwrap();
        }

        directions.hold();

        let e = engine.clone();
        let pending = tokio::spawn(async move { e.compute_route().await });

        while directions.calls() < 2 {
            tokio::task::yield_now().await;
        }

        engine.reset().await;
        engine.add_address("a".into()).await.unwrap();
        directions.release();

        let outcomes = pending.await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, LegOutcome::Stale { .. })));

        let route = engine.find_route().await;
        assert!(route.legs.is_empty());
        assert_eq!(engine.find_waypoints().await.waypoints.len(), 1);
    });
}

#[test]
fn waypoint_added_after_compute_needs_recompute() {
    use super::fakes::engine_with;
    use crate::api::WaypointAPI;
    use tokio_test::block_on;

    let [a, b, c, d] = stops();
    let (engine, _, directions) = engine_with(
        &[("a", a), ("b", b), ("c", c), ("d", d)],
        &[(a, b, vec![300.0]), (b, c, vec![200.0]), (c, d, vec![100.0])],
    );

    for address in ["a", "b", "c"] {
        block_on(engine.add_address(address.into())).unwrap();
    }
    block_on(engine.compute_route());
    assert!(block_on(engine.find_route()).is_complete());

    block_on(engine.add_address("d".into())).unwrap();
    let route = block_on(engine.find_route());
    assert_eq!(route.unrouted, 1);
    assert!(!route.is_complete());

    block_on(engine.compute_route());
    let route = block_on(engine.find_route());
    assert!(route.is_complete());
    assert_eq!(route.distance, 600.0);
    assert_eq!(directions.calls(), 5);
}

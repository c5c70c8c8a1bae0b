use super::{Addition, Engine, Event, Overview};

use async_trait::async_trait;

use crate::{
    api::WaypointAPI,
    entities::Coordinates,
    error::{invalid_input_error, invalid_state_error, Error},
};

#[async_trait]
impl WaypointAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn add_address(&self, address: String) -> Result<Addition, Error> {
        if address.trim().is_empty() {
            let err = invalid_input_error();
            self.notify(&err);
            return Err(err);
        }

        let generation = self.sequence.lock().await.generation();

        let place = match self.geocoder.geocode(address.clone()).await {
            Ok(place) => place,
            Err(err) => {
                tracing::warn!("geocoding {:?} failed: {}", address, err);
                self.notify(&err);
                return Err(err);
            }
        };

        tracing::info!("geocoded {:?} as {:?}", address, place.formatted_address);

        let added = self
            .sequence
            .lock()
            .await
            .add_waypoint_for(generation, address, place.coordinates);

        match added {
            Ok(Some(addition)) => {
                self.publish(Event::WaypointAdded {
                    waypoint: addition.waypoint.clone(),
                    route_available: addition.route_available,
                });
                Ok(addition)
            }
            // reset while the geocode was in flight
            Ok(None) => Err(invalid_state_error()),
            Err(err) => {
                self.notify(&err);
                Err(err)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn add_waypoint(
        &self,
        label: String,
        coordinates: Coordinates,
    ) -> Result<Addition, Error> {
        let addition = self
            .sequence
            .lock()
            .await
            .add_waypoint(label, coordinates)?;

        self.publish(Event::WaypointAdded {
            waypoint: addition.waypoint.clone(),
            route_available: addition.route_available,
        });

        Ok(addition)
    }

    #[tracing::instrument(skip(self))]
    async fn find_waypoints(&self) -> Overview {
        self.sequence.lock().await.overview()
    }

    #[tracing::instrument(skip(self))]
    async fn reset(&self) {
        self.sequence.lock().await.reset();

        tracing::info!("waypoints cleared");

        self.publish(Event::Reset);
    }
}

#[test]
fn add_address_appends_geocoded_waypoint() {
    use super::fakes::engine_with;
    use crate::entities::Coordinates;
    use tokio_test::block_on;

    let (engine, geocoder, _) = engine_with(&[("Minsk", Coordinates::new(53.9, 27.56))], &[]);

    let addition = block_on(engine.add_address("Minsk".into())).unwrap();
    assert_eq!(addition.waypoint.label, "Minsk");
    assert_eq!(addition.waypoint.coordinates, Coordinates::new(53.9, 27.56));
    assert!(!addition.route_available);
    assert_eq!(geocoder.calls(), 1);

    let overview = block_on(engine.find_waypoints());
    assert_eq!(overview.waypoints.len(), 1);
}

#[test]
fn failed_geocode_adds_nothing_and_notifies() {
    use super::fakes::engine_with;
    use crate::error::Notification;
    use tokio_test::block_on;

    let (engine, _, _) = engine_with(&[], &[]);
    let events = engine.events();

    let err = block_on(engine.add_address("Atlantis".into())).unwrap_err();
    assert_eq!(err.code, 102);

    assert!(block_on(engine.find_waypoints()).waypoints.is_empty());
    assert_eq!(
        events.try_recv().unwrap(),
        Event::Notification(Notification {
            title: "Error".into(),
            message: "Address not found".into(),
        })
    );
}

#[test]
fn blank_address_skips_geocoder() {
    use super::fakes::engine_with;
    use tokio_test::block_on;

    let (engine, geocoder, _) = engine_with(&[], &[]);

    let err = block_on(engine.add_address("   ".into())).unwrap_err();
    assert_eq!(err.code, 101);
    assert_eq!(geocoder.calls(), 0);
}

#[test]
fn waypoint_count_matches_successful_adds() {
    use super::fakes::engine_with;
    use crate::entities::Coordinates;
    use tokio_test::block_on;

    let (engine, _, _) = engine_with(
        &[
            ("a", Coordinates::new(1.0, 1.0)),
            ("b", Coordinates::new(2.0, 2.0)),
            ("c", Coordinates::new(3.0, 3.0)),
        ],
        &[],
    );

    let mut successes = 0;
    for address in ["a", "missing", "b", "", "c", "also missing"] {
        if block_on(engine.add_address(address.into())).is_ok() {
            successes += 1;
        }
    }

    let overview = block_on(engine.find_waypoints());
    assert_eq!(successes, 3);
    assert_eq!(overview.waypoints.len(), 3);
    assert!(overview.route_available);
    assert_eq!(overview.status, super::Status::RouteReady);
}

#[test]
fn geocode_finishing_after_reset_is_discarded() {
    use super::fakes::engine_with;
    use crate::entities::Coordinates;
    use std::sync::Arc;
    use tokio_test::block_on;

    let (engine, geocoder, _) = engine_with(&[("late", Coordinates::new(1.0, 1.0))], &[]);
    geocoder.hold();
    let engine = Arc::new(engine);

    block_on(async {
        let e = engine.clone();
        let pending = tokio::spawn(async move { e.add_address("late".into()).await });

        while geocoder.calls() == 0 {
            tokio::task::yield_now().await;
        }

        engine.reset().await;
        geocoder.release();

        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(err.code, 100);
        assert!(engine.find_waypoints().await.waypoints.is_empty());
    });
}

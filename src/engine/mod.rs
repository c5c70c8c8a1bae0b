mod route_api;
mod sequence;
mod waypoint_api;

#[cfg(test)]
pub(crate) mod fakes;

pub use sequence::{
    Addition, LegOutcome, LegRequest, Overview, Status, WaypointSequence,
    ROUTE_AFFORDANCE_THRESHOLD,
};

use async_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    api::{DynDirections, DynGeocoder, API},
    entities::{RouteLeg, Waypoint},
    error::{Error, Notification},
};

const EVENT_BUFFER: usize = 256;

/// Pushed to the presentation layer as the sequence changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    WaypointAdded {
        waypoint: Waypoint,
        route_available: bool,
    },
    LegComputed {
        leg: RouteLeg,
    },
    LegFailed {
        index: usize,
        error: Error,
    },
    Reset,
    Notification(Notification),
}

/// Owns the waypoint sequence and talks to the geocoding and directions
/// services. All mutation goes through `sequence`; the lock is never held
/// across a remote call.
pub struct Engine {
    geocoder: DynGeocoder,
    directions: DynDirections,
    sequence: Mutex<WaypointSequence>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(geocoder: DynGeocoder, directions: DynDirections) -> Self {
        let (events_tx, events_rx) = async_channel::bounded(EVENT_BUFFER);

        Self {
            geocoder,
            directions,
            sequence: Mutex::new(WaypointSequence::new()),
            events_tx,
            events_rx,
        }
    }

    /// Events for the presentation layer. Receivers share one queue, so each
    /// event goes to exactly one of them.
    pub fn events(&self) -> Receiver<Event> {
        self.events_rx.clone()
    }

    fn publish(&self, event: Event) {
        if let Err(err) = self.events_tx.try_send(event) {
            tracing::debug!("event dropped: {:?}", err.into_inner());
        }
    }

    fn notify(&self, err: &Error) {
        self.publish(Event::Notification(err.into()));
    }
}

impl API for Engine {}

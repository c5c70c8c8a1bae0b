use serde::{Deserialize, Serialize};

use crate::entities::{Bounds, Coordinates, Route, RouteCandidate, RouteLeg, Waypoint};
use crate::error::{route_unavailable_error, Error, Notification};

/// The route affordance shows once the sequence holds more than this many
/// waypoints.
pub const ROUTE_AFFORDANCE_THRESHOLD: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Empty,
    Collecting,
    RouteReady,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Addition {
    pub waypoint: Waypoint,
    pub route_available: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub waypoints: Vec<Waypoint>,
    pub bounds: Option<Bounds>,
    pub center: Option<Coordinates>,
    pub status: Status,
    pub route_available: bool,
}

/// One directions request to issue. Carries the generation and round it was
/// planned under so a late completion can be recognised.
#[derive(Clone, Debug, PartialEq)]
pub struct LegRequest {
    pub generation: u64,
    pub round: u64,
    pub index: usize,
    pub from: Waypoint,
    pub to: Waypoint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LegOutcome {
    Computed { leg: RouteLeg },
    Failed {
        index: usize,
        error: Error,
        notification: Notification,
    },
    Stale { index: usize },
}

impl LegOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Computed { leg } => leg.index,
            Self::Failed { index, .. } => *index,
            Self::Stale { index } => *index,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum LegState {
    Pending,
    Computed(RouteLeg),
    Failed,
}

/// Ordered waypoints and the legs computed between them.
///
/// `generation` moves on every reset, `round` on every route computation.
/// Completions tagged with an older pair are dropped.
#[derive(Debug, Default)]
pub struct WaypointSequence {
    waypoints: Vec<Waypoint>,
    legs: Vec<LegState>,
    generation: u64,
    round: u64,
}

impl WaypointSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn route_available(&self) -> bool {
        self.waypoints.len() > ROUTE_AFFORDANCE_THRESHOLD
    }

    pub fn status(&self) -> Status {
        if self.waypoints.is_empty() {
            Status::Empty
        } else if self.route_available() {
            Status::RouteReady
        } else {
            Status::Collecting
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(self.waypoints.iter().map(|w| &w.coordinates))
    }

    pub fn overview(&self) -> Overview {
        let bounds = self.bounds();

        Overview {
            waypoints: self.waypoints.clone(),
            bounds,
            center: bounds.map(|b| b.center()),
            status: self.status(),
            route_available: self.route_available(),
        }
    }

    pub fn add_waypoint(
        &mut self,
        label: String,
        coordinates: Coordinates,
    ) -> Result<Addition, Error> {
        let coordinates = coordinates.validate()?;
        let waypoint = Waypoint::new(label, coordinates);

        self.waypoints.push(waypoint.clone());

        Ok(Addition {
            waypoint,
            route_available: self.route_available(),
        })
    }

    /// Adds a waypoint whose geocode was issued under `generation`. Returns
    /// `Ok(None)` when the sequence has been reset since.
    pub fn add_waypoint_for(
        &mut self,
        generation: u64,
        label: String,
        coordinates: Coordinates,
    ) -> Result<Option<Addition>, Error> {
        if generation != self.generation {
            tracing::debug!(
                "dropping geocode for {:?} from generation {}",
                label,
                generation
            );
            return Ok(None);
        }

        self.add_waypoint(label, coordinates).map(Some)
    }

    /// Starts a new route computation. Returns one request per adjacent pair,
    /// or nothing when fewer than two waypoints exist.
    pub fn plan_route(&mut self) -> Vec<LegRequest> {
        self.round += 1;
        self.legs.clear();

        if self.waypoints.len() < 2 {
            return vec![];
        }

        let requests: Vec<LegRequest> = self
            .waypoints
            .windows(2)
            .enumerate()
            .map(|(index, pair)| LegRequest {
                generation: self.generation,
                round: self.round,
                index,
                from: pair[0].clone(),
                to: pair[1].clone(),
            })
            .collect();

        self.legs = vec![LegState::Pending; requests.len()];

        requests
    }

    /// Records the directions result for a planned leg.
    pub fn complete_leg(
        &mut self,
        request: LegRequest,
        result: Result<Vec<RouteCandidate>, Error>,
    ) -> LegOutcome {
        let index = request.index;

        if request.generation != self.generation || request.round != self.round {
            tracing::debug!(
                "dropping leg {} from generation {} round {}",
                index,
                request.generation,
                request.round
            );
            return LegOutcome::Stale { index };
        }

        let slot = match self.legs.get_mut(index) {
            Some(slot) => slot,
            None => return LegOutcome::Stale { index },
        };

        let chosen = result.and_then(|candidates| {
            RouteCandidate::shortest(candidates).ok_or_else(route_unavailable_error)
        });

        match chosen {
            Ok(candidate) => {
                let leg = RouteLeg::new(index, request.from, request.to, candidate);
                *slot = LegState::Computed(leg.clone());
                LegOutcome::Computed { leg }
            }
            Err(error) => {
                *slot = LegState::Failed;
                LegOutcome::Failed {
                    index,
                    notification: Notification::from(&error),
                    error,
                }
            }
        }
    }

    pub fn route(&self) -> Route {
        let mut route = Route::default();

        for (index, state) in self.legs.iter().enumerate() {
            match state {
                LegState::Pending => route.pending += 1,
                LegState::Failed => route.failed.push(index),
                LegState::Computed(leg) => {
                    route.distance += leg.distance;
                    route.legs.push(leg.clone());
                }
            }
        }

        route.unrouted = self
            .waypoints
            .len()
            .saturating_sub(1)
            .saturating_sub(self.legs.len());

        route
    }

    pub fn reset(&mut self) {
        self.waypoints.clear();
        self.legs.clear();
        self.generation += 1;
    }
}

#[cfg(test)]
fn sequence_of(n: usize) -> WaypointSequence {
    let mut sequence = WaypointSequence::new();
    for i in 0..n {
        sequence
            .add_waypoint(format!("stop {}", i), Coordinates::new(53.9, 27.5 + i as f64 * 0.01))
            .unwrap();
    }
    sequence
}

#[cfg(test)]
fn candidates(distances: &[f64]) -> Vec<RouteCandidate> {
    distances
        .iter()
        .map(|d| RouteCandidate::new(vec![Coordinates::new(0.0, *d / 1000.0)], *d))
        .collect()
}

#[test]
fn affordance_appears_after_two_waypoints() {
    let mut sequence = WaypointSequence::new();
    assert_eq!(sequence.status(), Status::Empty);

    let addition = sequence
        .add_waypoint("a".into(), Coordinates::new(53.90, 27.55))
        .unwrap();
    assert!(!addition.route_available);
    assert_eq!(sequence.status(), Status::Collecting);

    let addition = sequence
        .add_waypoint("b".into(), Coordinates::new(53.91, 27.56))
        .unwrap();
    assert!(!addition.route_available);
    assert_eq!(sequence.status(), Status::Collecting);

    let addition = sequence
        .add_waypoint("c".into(), Coordinates::new(53.92, 27.57))
        .unwrap();
    assert!(addition.route_available);
    assert_eq!(sequence.status(), Status::RouteReady);
    assert_eq!(sequence.len(), 3);
}

#[test]
fn duplicate_waypoints_are_kept() {
    let mut sequence = WaypointSequence::new();
    let c = Coordinates::new(53.9, 27.5);

    sequence.add_waypoint("home".into(), c).unwrap();
    sequence.add_waypoint("home".into(), c).unwrap();

    assert_eq!(sequence.len(), 2);
    assert_ne!(sequence.waypoints()[0].id, sequence.waypoints()[1].id);
}

#[test]
fn invalid_coordinates_are_rejected() {
    let mut sequence = sequence_of(1);

    let err = sequence
        .add_waypoint("nowhere".into(), Coordinates::new(120.0, 0.0))
        .unwrap_err();

    assert_eq!(err.code, 101);
    assert_eq!(sequence.len(), 1);
}

#[test]
fn plan_route_is_empty_below_two_waypoints() {
    assert!(sequence_of(0).plan_route().is_empty());
    assert!(sequence_of(1).plan_route().is_empty());

    let mut sequence = sequence_of(1);
    sequence.plan_route();
    assert_eq!(sequence.route(), Route::default());
}

#[test]
fn plan_route_pairs_adjacent_waypoints() {
    let mut sequence = sequence_of(4);
    let requests = sequence.plan_route();

    assert_eq!(requests.len(), 3);
    for (i, request) in requests.iter().enumerate() {
        assert_eq!(request.index, i);
        assert_eq!(request.from, sequence.waypoints()[i]);
        assert_eq!(request.to, sequence.waypoints()[i + 1]);
    }

    assert_eq!(sequence.route().pending, 3);
}

#[test]
fn complete_leg_stores_shortest_candidate() {
    let mut sequence = sequence_of(2);
    let request = sequence.plan_route().remove(0);

    let outcome = sequence.complete_leg(request, Ok(candidates(&[500.0, 300.0, 450.0])));

    match outcome {
        LegOutcome::Computed { leg } => assert_eq!(leg.distance, 300.0),
        other => panic!("unexpected outcome {:?}", other),
    }

    let route = sequence.route();
    assert_eq!(route.legs.len(), 1);
    assert_eq!(route.distance, 300.0);
    assert!(route.is_complete());
}

#[test]
fn empty_candidates_fail_only_that_leg() {
    let mut sequence = sequence_of(3);
    let mut requests = sequence.plan_route();
    let second = requests.pop().unwrap();
    let first = requests.pop().unwrap();

    let outcome = sequence.complete_leg(first, Ok(vec![]));
    assert_eq!(
        outcome,
        LegOutcome::Failed {
            index: 0,
            error: route_unavailable_error(),
            notification: Notification {
                title: "Error".into(),
                message: "Route isn't available".into(),
            },
        }
    );

    let outcome = sequence.complete_leg(second, Ok(candidates(&[120.0])));
    assert_eq!(outcome.index(), 1);

    let route = sequence.route();
    assert_eq!(route.failed, vec![0]);
    assert_eq!(route.legs.len(), 1);
    assert_eq!(route.legs[0].index, 1);
    assert!(!route.is_complete());
}

#[test]
fn out_of_order_completion_keeps_leg_order() {
    let mut sequence = sequence_of(4);
    let requests = sequence.plan_route();

    for request in requests.into_iter().rev() {
        let distance = 100.0 * (request.index + 1) as f64;
        sequence.complete_leg(request, Ok(candidates(&[distance])));
    }

    let route = sequence.route();
    let indices: Vec<usize> = route.legs.iter().map(|l| l.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(route.distance, 600.0);
    assert_eq!(route.polyline().len(), 3);
}

#[test]
fn waypoint_added_after_compute_leaves_route_incomplete() {
    let mut sequence = sequence_of(3);
    for request in sequence.plan_route() {
        sequence.complete_leg(request, Ok(candidates(&[100.0])));
    }
    assert!(sequence.route().is_complete());

    sequence
        .add_waypoint("late".into(), Coordinates::new(53.95, 27.6))
        .unwrap();

    let route = sequence.route();
    assert_eq!(route.legs.len(), 2);
    assert_eq!(route.pending, 0);
    assert_eq!(route.unrouted, 1);
    assert!(!route.is_complete());

    for request in sequence.plan_route() {
        sequence.complete_leg(request, Ok(candidates(&[100.0])));
    }
    let route = sequence.route();
    assert_eq!(route.unrouted, 0);
    assert_eq!(route.legs.len(), 3);
    assert!(route.is_complete());
}

#[test]
fn completion_after_reset_is_stale() {
    let mut sequence = sequence_of(3);
    let requests = sequence.plan_route();

    sequence.reset();
    for i in 0..3 {
        sequence
            .add_waypoint(format!("new {}", i), Coordinates::new(10.0, i as f64))
            .unwrap();
    }
    sequence.plan_route();

    for request in requests {
        let outcome = sequence.complete_leg(request, Ok(candidates(&[1.0])));
        assert!(matches!(outcome, LegOutcome::Stale { .. }));
    }

    let route = sequence.route();
    assert!(route.legs.is_empty());
    assert_eq!(route.pending, 2);
}

#[test]
fn completion_from_superseded_round_is_stale() {
    let mut sequence = sequence_of(2);
    let old = sequence.plan_route().remove(0);
    let new = sequence.plan_route().remove(0);

    let outcome = sequence.complete_leg(old, Ok(candidates(&[1.0])));
    assert_eq!(outcome, LegOutcome::Stale { index: 0 });

    sequence.complete_leg(new, Ok(candidates(&[2.0])));
    assert_eq!(sequence.route().distance, 2.0);
}

#[test]
fn geocode_after_reset_is_dropped() {
    let mut sequence = sequence_of(1);
    let generation = sequence.generation();

    sequence.reset();

    let added = sequence
        .add_waypoint_for(generation, "late".into(), Coordinates::new(1.0, 1.0))
        .unwrap();
    assert!(added.is_none());
    assert!(sequence.is_empty());
}

#[test]
fn reset_is_idempotent() {
    let mut sequence = sequence_of(3);
    let request = sequence.plan_route().remove(0);
    sequence.complete_leg(request, Ok(candidates(&[10.0])));

    sequence.reset();
    let once = (sequence.overview(), sequence.route());

    sequence.reset();
    let twice = (sequence.overview(), sequence.route());

    assert_eq!(once, twice);
    assert_eq!(once.0, WaypointSequence::new().overview());
    assert_eq!(once.1, Route::default());
    assert_eq!(sequence.generation(), 2);
}

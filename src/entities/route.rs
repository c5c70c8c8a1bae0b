use geo_types::LineString;
use serde::{Deserialize, Serialize};

use crate::entities::{Coordinates, Waypoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Walking,
}

impl TravelMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Walking => "walking",
        }
    }
}

/// One path the directions provider offers for a leg.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub polyline: Vec<Coordinates>,
    /// Meters.
    pub distance: f64,
}

impl RouteCandidate {
    pub fn new(polyline: Vec<Coordinates>, distance: f64) -> Self {
        RouteCandidate { polyline, distance }
    }

    /// Picks the candidate with the strictly smallest distance. Ties keep the
    /// earliest candidate.
    pub fn shortest(candidates: Vec<RouteCandidate>) -> Option<RouteCandidate> {
        let mut candidates = candidates.into_iter();
        let mut best = candidates.next()?;

        for candidate in candidates {
            if candidate.distance < best.distance {
                best = candidate;
            }
        }

        Some(best)
    }
}

// geo-types keeps (x, y) = (longitude, latitude)
impl From<LineString<f64>> for RouteCandidate {
    fn from(line: LineString<f64>) -> Self {
        let polyline = line
            .into_inner()
            .into_iter()
            .map(|c| Coordinates::new(c.y, c.x))
            .collect();

        RouteCandidate::new(polyline, 0.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub index: usize,
    pub from: Waypoint,
    pub to: Waypoint,
    pub polyline: Vec<Coordinates>,
    pub distance: f64,
}

impl RouteLeg {
    pub fn new(index: usize, from: Waypoint, to: Waypoint, chosen: RouteCandidate) -> Self {
        RouteLeg {
            index,
            from,
            to,
            polyline: chosen.polyline,
            distance: chosen.distance,
        }
    }
}

/// The assembled route: resolved legs in index order.
///
/// `unrouted` counts adjacent waypoint pairs that no computation has covered
/// yet, e.g. pins added after the last route request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub legs: Vec<RouteLeg>,
    pub distance: f64,
    pub pending: usize,
    pub unrouted: usize,
    pub failed: Vec<usize>,
}

impl Route {
    pub fn is_complete(&self) -> bool {
        self.pending == 0
            && self.unrouted == 0
            && self.failed.is_empty()
            && !self.legs.is_empty()
    }

    /// Every leg's polyline joined end to end.
    pub fn polyline(&self) -> Vec<Coordinates> {
        self.legs
            .iter()
            .flat_map(|leg| leg.polyline.iter().copied())
            .collect()
    }
}

#[test]
fn shortest_picks_minimum_distance() {
    let candidates = vec![
        RouteCandidate::new(vec![], 500.0),
        RouteCandidate::new(vec![Coordinates::new(1.0, 1.0)], 300.0),
        RouteCandidate::new(vec![], 450.0),
    ];

    let best = RouteCandidate::shortest(candidates).unwrap();
    assert_eq!(best.distance, 300.0);
    assert_eq!(best.polyline, vec![Coordinates::new(1.0, 1.0)]);
}

#[test]
fn shortest_keeps_first_on_tie() {
    let candidates = vec![
        RouteCandidate::new(vec![Coordinates::new(1.0, 1.0)], 300.0),
        RouteCandidate::new(vec![Coordinates::new(2.0, 2.0)], 300.0),
    ];

    let best = RouteCandidate::shortest(candidates).unwrap();
    assert_eq!(best.polyline, vec![Coordinates::new(1.0, 1.0)]);
}

#[test]
fn shortest_of_nothing_is_none() {
    assert!(RouteCandidate::shortest(vec![]).is_none());
}

#[test]
fn candidate_from_line_string_swaps_axes() {
    let line: LineString<f64> = vec![(27.5, 53.9), (27.6, 53.8)].into();
    let candidate = RouteCandidate::from(line);

    assert_eq!(
        candidate.polyline,
        vec![Coordinates::new(53.9, 27.5), Coordinates::new(53.8, 27.6)]
    );
}

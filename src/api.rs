use async_trait::async_trait;
use std::sync::Arc;

use crate::engine::{Addition, LegOutcome, Overview};
use crate::entities::{Coordinates, Place, Route, RouteCandidate, TravelMode};
use crate::error::Error;

/// Address text to coordinates.
#[async_trait]
pub trait GeocodingAPI {
    async fn geocode(&self, address: String) -> Result<Place, Error>;
}

/// Candidate routes between two points. An empty list means the provider
/// knows of no route.
#[async_trait]
pub trait DirectionsAPI {
    async fn find_routes(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
        alternates: bool,
    ) -> Result<Vec<RouteCandidate>, Error>;
}

#[async_trait]
pub trait WaypointAPI {
    async fn add_address(&self, address: String) -> Result<Addition, Error>;
    async fn add_waypoint(&self, label: String, coordinates: Coordinates)
        -> Result<Addition, Error>;
    async fn find_waypoints(&self) -> Overview;
    async fn reset(&self);
}

#[async_trait]
pub trait RouteAPI {
    async fn compute_route(&self) -> Vec<LegOutcome>;
    async fn find_route(&self) -> Route;
}

pub trait API: WaypointAPI + RouteAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
pub type DynGeocoder = Arc<dyn GeocodingAPI + Send + Sync>;
pub type DynDirections = Arc<dyn DirectionsAPI + Send + Sync>;

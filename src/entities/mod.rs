mod location;
mod route;

pub use location::{Bounds, Coordinates, Place, Waypoint};
pub use route::{Route, RouteCandidate, RouteLeg, TravelMode};

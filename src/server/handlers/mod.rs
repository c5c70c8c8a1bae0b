pub mod routes;
pub mod waypoints;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use super::Engine;
use crate::{
    api::{DirectionsAPI, GeocodingAPI},
    entities::{Coordinates, Place, RouteCandidate, TravelMode},
    error::{address_not_found_error, Error},
};

/// Blocks callers while held.
struct Gate {
    held: AtomicBool,
    permits: Semaphore,
}

impl Default for Gate {
    fn default() -> Self {
        Gate {
            held: AtomicBool::new(false),
            permits: Semaphore::new(0),
        }
    }
}

impl Gate {
    async fn pass(&self) {
        if self.held.load(Ordering::SeqCst) {
            if let Ok(permit) = self.permits.acquire().await {
                permit.forget();
            }
        }
    }

    fn release(&self) {
        self.permits.add_permits(1024);
    }
}

#[derive(Default)]
pub struct FakeGeocoder {
    places: HashMap<String, Coordinates>,
    calls: AtomicUsize,
    gate: Gate,
}

impl FakeGeocoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn hold(&self) {
        self.gate.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gate.release();
    }
}

#[async_trait]
impl GeocodingAPI for FakeGeocoder {
    async fn geocode(&self, address: String) -> Result<Place, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;

        let coordinates = *self
            .places
            .get(&address)
            .ok_or_else(address_not_found_error)?;

        Ok(Place {
            coordinates,
            formatted_address: format!("{}, Earth", address),
        })
    }
}

fn key(origin: Coordinates, destination: Coordinates) -> String {
    format!("{}|{}", String::from(origin), String::from(destination))
}

#[derive(Default)]
pub struct FakeDirections {
    routes: Mutex<HashMap<String, Result<Vec<RouteCandidate>, Error>>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<(Coordinates, Coordinates, TravelMode, bool)>>,
    gate: Gate,
}

impl FakeDirections {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(Coordinates, Coordinates, TravelMode, bool)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fail_between(&self, origin: Coordinates, destination: Coordinates, err: Error) {
        self.routes
            .lock()
            .unwrap()
            .insert(key(origin, destination), Err(err));
    }

    pub fn delay_between(&self, origin: Coordinates, destination: Coordinates, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(key(origin, destination), delay);
    }

    pub fn hold(&self) {
        self.gate.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gate.release();
    }
}

#[async_trait]
impl DirectionsAPI for FakeDirections {
    async fn find_routes(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
        alternates: bool,
    ) -> Result<Vec<RouteCandidate>, Error> {
        self.requests
            .lock()
            .unwrap()
            .push((origin, destination, mode, alternates));

        let k = key(origin, destination);
        let delay = self.delays.lock().unwrap().get(&k).copied();

        self.gate.pass().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.routes.lock().unwrap().get(&k).cloned();
        result.unwrap_or_else(|| Ok(vec![]))
    }
}

/// Engine over fakes. Each route entry is (origin, destination, candidate
/// distances); pairs without an entry have no route.
pub fn engine_with(
    places: &[(&str, Coordinates)],
    routes: &[(Coordinates, Coordinates, Vec<f64>)],
) -> (Engine, Arc<FakeGeocoder>, Arc<FakeDirections>) {
    let geocoder = Arc::new(FakeGeocoder {
        places: places
            .iter()
            .map(|(address, c)| (address.to_string(), *c))
            .collect(),
        ..Default::default()
    });

    let directions = Arc::new(FakeDirections::default());
    for (origin, destination, distances) in routes {
        let candidates = distances
            .iter()
            .map(|d| RouteCandidate::new(vec![*origin, *destination], *d))
            .collect();

        directions
            .routes
            .lock()
            .unwrap()
            .insert(key(*origin, *destination), Ok(candidates));
    }

    let engine = Engine::new(geocoder.clone(), directions.clone());

    (engine, geocoder, directions)
}

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    api::{DirectionsAPI, GeocodingAPI},
    config::Config,
    entities::{Coordinates, Place, RouteCandidate, TravelMode},
    error::{address_not_found_error, invalid_input_error, upstream_error, Error},
};

const POLYLINE_PRECISION: u32 = 5;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for Coordinates {
    fn from(l: LatLng) -> Self {
        Coordinates::new(l.lat, l.lng)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub geometry: Geometry,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionsRoute {
    pub overview_polyline: EncodedPolyline,
    pub legs: Vec<DirectionsLeg>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncodedPolyline {
    pub points: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionsLeg {
    pub distance: TextValue,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextValue {
    pub value: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response<T> {
    status: String,
    results: Option<T>,
    routes: Option<T>,
    error_message: Option<String>,
}

impl TryFrom<DirectionsRoute> for RouteCandidate {
    type Error = Error;

    fn try_from(route: DirectionsRoute) -> Result<Self, Error> {
        let line = polyline::decode_polyline(&route.overview_polyline.points, POLYLINE_PRECISION)
            .map_err(|err| {
                tracing::warn!("undecodable polyline: {:?}", err);
                upstream_error()
            })?;

        let mut candidate = RouteCandidate::from(line);
        candidate.distance = route.legs.iter().map(|leg| leg.distance.value).sum();

        Ok(candidate)
    }
}

/// Google Maps Geocoding and Directions web services.
#[derive(Clone, Debug)]
pub struct GoogleMaps {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GoogleMaps {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.google_maps_api_base.trim_end_matches('/').to_string(),
            api_key: config.google_maps_api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<Response<T>, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let res = self
            .client
            .get(self.url(path))
            .query(&[("key", &self.api_key)])
            .query(query)
            .send()
            .await?;

        let status = res.status();

        if status.is_client_error() {
            return Err(invalid_input_error());
        } else if status != StatusCode::OK {
            return Err(upstream_error());
        }

        Ok(res.json().await?)
    }
}

#[async_trait]
impl GeocodingAPI for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn geocode(&self, address: String) -> Result<Place, Error> {
        let data: Response<Vec<GeocodeResult>> = self
            .get("/maps/api/geocode/json", &[("address", address)])
            .await?;

        match data.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Err(address_not_found_error()),
            "INVALID_REQUEST" => return Err(invalid_input_error()),
            status => {
                tracing::warn!("geocoding status {}: {:?}", status, data.error_message);
                return Err(upstream_error());
            }
        }

        let result = data
            .results
            .and_then(|results| results.into_iter().next())
            .ok_or_else(address_not_found_error)?;

        Ok(Place {
            coordinates: result.geometry.location.into(),
            formatted_address: result.formatted_address,
        })
    }
}

#[async_trait]
impl DirectionsAPI for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn find_routes(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TravelMode,
        alternates: bool,
    ) -> Result<Vec<RouteCandidate>, Error> {
        let data: Response<Vec<DirectionsRoute>> = self
            .get(
                "/maps/api/directions/json",
                &[
                    ("origin", String::from(origin)),
                    ("destination", String::from(destination)),
                    ("mode", mode.name().to_string()),
                    ("alternatives", alternates.to_string()),
                ],
            )
            .await?;

        match data.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" | "NOT_FOUND" => return Ok(vec![]),
            "INVALID_REQUEST" => return Err(invalid_input_error()),
            status => {
                tracing::warn!("directions status {}: {:?}", status, data.error_message);
                return Err(upstream_error());
            }
        }

        data.routes
            .unwrap_or_default()
            .into_iter()
            .map(RouteCandidate::try_from)
            .collect()
    }
}

#[test]
fn directions_route_sums_leg_distances() {
    // encodes (38.5, -120.2), (40.7, -120.95), (43.252, -126.453)
    let route = DirectionsRoute {
        overview_polyline: EncodedPolyline {
            points: "_p~iF~ps|U_ulLnnqC_mqNvxq`@".into(),
        },
        legs: vec![
            DirectionsLeg {
                distance: TextValue { value: 1200.0 },
            },
            DirectionsLeg {
                distance: TextValue { value: 34.0 },
            },
        ],
    };

    let candidate = RouteCandidate::try_from(route).unwrap();
    assert_eq!(candidate.distance, 1234.0);
    assert_eq!(candidate.polyline.len(), 3);
    assert!((candidate.polyline[0].latitude - 38.5).abs() < 1e-6);
    assert!((candidate.polyline[0].longitude + 120.2).abs() < 1e-6);
    assert!((candidate.polyline[2].latitude - 43.252).abs() < 1e-6);
}

#[test]
fn lat_lng_converts_to_coordinates() {
    let c: Coordinates = LatLng {
        lat: 53.9,
        lng: 27.56,
    }
    .into();
    assert_eq!(c, Coordinates::new(53.9, 27.56));
}

//! `GoogleMaps` against a local wiremock server standing in for the
//! Geocoding and Directions web services.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fastest_route::api::{DirectionsAPI, GeocodingAPI};
use fastest_route::config::Config;
use fastest_route::entities::{Coordinates, TravelMode};
use fastest_route::external::google_maps::GoogleMaps;

fn maps_for(server: &MockServer) -> GoogleMaps {
    let config = Config {
        google_maps_api_base: server.uri(),
        google_maps_api_key: "test-key".into(),
        listen_addr: "127.0.0.1:0".parse().unwrap(),
    };

    GoogleMaps::new(&config)
}

fn geocode_result(address: &str, lat: f64, lng: f64) -> serde_json::Value {
    json!({
        "formatted_address": address,
        "geometry": { "location": { "lat": lat, "lng": lng } }
    })
}

fn directions_route(points: &str, leg_distances: &[f64]) -> serde_json::Value {
    let legs: Vec<_> = leg_distances
        .iter()
        .map(|d| json!({ "distance": { "text": format!("{} m", d), "value": d } }))
        .collect();

    json!({
        "summary": "",
        "overview_polyline": { "points": points },
        "legs": legs
    })
}

#[tokio::test]
async fn geocode_takes_first_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("address", "Nezavisimosti 1"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                geocode_result("Nezavisimosti Ave 1, Minsk", 53.8935, 27.5474),
                geocode_result("Nezavisimosti St 1, Brest", 52.0976, 23.7341)
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let place = maps_for(&server)
        .geocode("Nezavisimosti 1".into())
        .await
        .unwrap();

    assert_eq!(place.formatted_address, "Nezavisimosti Ave 1, Minsk");
    assert_eq!(place.coordinates, Coordinates::new(53.8935, 27.5474));
}

#[tokio::test]
async fn geocode_zero_results_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ZERO_RESULTS", "results": [] })),
        )
        .mount(&server)
        .await;

    let err = maps_for(&server)
        .geocode("zzzz".into())
        .await
        .unwrap_err();

    assert_eq!(err.code, 102);
}

#[tokio::test]
async fn geocode_denied_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .mount(&server)
        .await;

    let err = maps_for(&server)
        .geocode("Minsk".into())
        .await
        .unwrap_err();

    assert_eq!(err.code, 4);
}

#[tokio::test]
async fn server_errors_are_upstream_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let maps = maps_for(&server);

    let err = maps.geocode("Minsk".into()).await.unwrap_err();
    assert_eq!(err.code, 4);

    let err = maps
        .find_routes(
            Coordinates::new(53.90, 27.55),
            Coordinates::new(53.91, 27.56),
            TravelMode::Walking,
            true,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, 4);
}

#[tokio::test]
async fn directions_requests_walking_alternatives() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/directions/json"))
        .and(query_param("origin", "38.5,-120.2"))
        .and(query_param("destination", "43.252,-126.453"))
        .and(query_param("mode", "walking"))
        .and(query_param("alternatives", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "routes": [
                directions_route("_p~iF~ps|U_ulLnnqC_mqNvxq`@", &[800.0, 400.0]),
                directions_route("_p~iF~ps|U_mqNvxq`@", &[950.0])
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = maps_for(&server)
        .find_routes(
            Coordinates::new(38.5, -120.2),
            Coordinates::new(43.252, -126.453),
            TravelMode::Walking,
            true,
        )
        .await
        .unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].distance, 1200.0);
    assert_eq!(candidates[0].polyline.len(), 3);
    assert_eq!(candidates[1].distance, 950.0);
    assert_eq!(candidates[1].polyline.len(), 2);
}

#[tokio::test]
async fn directions_zero_results_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/directions/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ZERO_RESULTS", "routes": [] })),
        )
        .mount(&server)
        .await;

    let candidates = maps_for(&server)
        .find_routes(
            Coordinates::new(53.90, 27.55),
            Coordinates::new(40.71, -74.0),
            TravelMode::Walking,
            true,
        )
        .await
        .unwrap();

    assert!(candidates.is_empty());
}

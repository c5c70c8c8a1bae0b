use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::engine::{Addition, Overview};
use crate::entities::Coordinates;
use crate::error::Error;

/// Either an address to geocode or an already known point.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateParams {
    Address {
        address: String,
    },
    Point {
        label: String,
        coordinates: Coordinates,
    },
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<CreateParams>,
) -> Result<Json<Addition>, Error> {
    let addition = match params {
        CreateParams::Address { address } => api.add_address(address).await?,
        CreateParams::Point { label, coordinates } => {
            api.add_waypoint(label, coordinates).await?
        }
    };

    Ok(addition.into())
}

pub async fn list(Extension(api): Extension<DynAPI>) -> Json<Overview> {
    api.find_waypoints().await.into()
}

pub async fn reset(Extension(api): Extension<DynAPI>) -> Json<Overview> {
    api.reset().await;

    api.find_waypoints().await.into()
}

#[test]
fn create_from_address_and_point() {
    use crate::engine::fakes::engine_with;
    use std::sync::Arc;
    use tokio_test::block_on;

    let (engine, _, _) = engine_with(&[("Minsk", Coordinates::new(53.9, 27.56))], &[]);
    let api = Arc::new(engine) as DynAPI;

    let params: CreateParams = serde_json::from_str(r#"{"address": "Minsk"}"#).unwrap();
    let Json(addition) = block_on(create(Extension(api.clone()), Json(params))).unwrap();
    assert_eq!(addition.waypoint.label, "Minsk");

    let params: CreateParams = serde_json::from_str(
        r#"{"label": "park", "coordinates": {"latitude": 53.91, "longitude": 27.57}}"#,
    )
    .unwrap();
    let Json(addition) = block_on(create(Extension(api.clone()), Json(params))).unwrap();
    assert_eq!(addition.waypoint.coordinates, Coordinates::new(53.91, 27.57));

    let Json(overview) = block_on(list(Extension(api.clone())));
    assert_eq!(overview.waypoints.len(), 2);
    assert!(overview.bounds.is_some());
    let center = overview.center.unwrap();
    assert!((center.latitude - 53.905).abs() < 1e-9);
    assert!((center.longitude - 27.565).abs() < 1e-9);

    let Json(overview) = block_on(reset(Extension(api)));
    assert!(overview.waypoints.is_empty());
}

#[test]
fn create_unknown_address_is_bad_request() {
    use crate::engine::fakes::engine_with;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::Arc;
    use tokio_test::block_on;

    let (engine, _, _) = engine_with(&[], &[]);
    let api = Arc::new(engine) as DynAPI;

    let params = CreateParams::Address {
        address: "nowhere".into(),
    };
    let err = match block_on(create(Extension(api), Json(params))) {
        Ok(_) => panic!("expected an error"),
        Err(err) => err,
    };

    assert_eq!(err.body()["notification"]["message"], "Address not found");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::engine::LegOutcome;
use crate::entities::{Coordinates, Route};

#[derive(Serialize, Deserialize)]
pub struct ComputeResponse {
    pub legs: Vec<LegOutcome>,
    pub complete: bool,
    /// All computed legs joined, ready to draw as one line.
    pub polyline: Vec<Coordinates>,
    pub route: Route,
}

pub async fn compute(Extension(api): Extension<DynAPI>) -> Json<ComputeResponse> {
    let legs = api.compute_route().await;
    let route = api.find_route().await;

    ComputeResponse {
        legs,
        complete: route.is_complete(),
        polyline: route.polyline(),
        route,
    }
    .into()
}

pub async fn find(Extension(api): Extension<DynAPI>) -> Json<Route> {
    api.find_route().await.into()
}

#[test]
fn compute_reports_each_leg() {
    use crate::engine::fakes::engine_with;
    use crate::entities::Coordinates;
    use std::sync::Arc;
    use tokio_test::block_on;

    let a = Coordinates::new(53.90, 27.55);
    let b = Coordinates::new(53.91, 27.56);
    let c = Coordinates::new(53.92, 27.57);
    let (engine, _, _) = engine_with(
        &[("a", a), ("b", b), ("c", c)],
        &[(a, b, vec![700.0, 650.0])],
    );
    let api = Arc::new(engine) as DynAPI;

    for address in ["a", "b", "c"] {
        block_on(api.add_address(address.into())).unwrap();
    }

    let Json(response) = block_on(compute(Extension(api.clone())));
    assert_eq!(response.legs.len(), 2);
    assert!(matches!(response.legs[0], LegOutcome::Computed { .. }));
    assert!(matches!(response.legs[1], LegOutcome::Failed { index: 1, .. }));
    assert_eq!(response.route.distance, 650.0);
    assert_eq!(response.route.failed, vec![1]);

    let json = serde_json::to_value(&response.legs[1]).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["error"]["code"], 103);
    assert_eq!(json["notification"]["message"], "Route isn't available");

    assert!(!response.complete);
    assert_eq!(response.polyline, response.route.legs[0].polyline);

    let Json(route) = block_on(find(Extension(api)));
    assert_eq!(route, response.route);
}

#[test]
fn upstream_leg_failure_tells_client_to_retry() {
    use crate::engine::fakes::engine_with;
    use crate::entities::Coordinates;
    use crate::error::upstream_error;
    use std::sync::Arc;
    use tokio_test::block_on;

    let a = Coordinates::new(53.90, 27.55);
    let b = Coordinates::new(53.91, 27.56);
    let (engine, _, directions) = engine_with(&[("a", a), ("b", b)], &[(a, b, vec![700.0])]);
    directions.fail_between(a, b, upstream_error());
    let api = Arc::new(engine) as DynAPI;

    for address in ["a", "b"] {
        block_on(api.add_address(address.into())).unwrap();
    }

    let Json(response) = block_on(compute(Extension(api)));
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["legs"][0]["status"], "failed");
    assert_eq!(
        json["legs"][0]["notification"]["message"],
        "Server isn't available. Try again"
    );
    assert_eq!(json["complete"], false);
}

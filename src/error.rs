use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::fmt::{self, Display};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub fn is_internal(&self) -> bool {
        (1..=99).contains(&self.code)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        if self.is_internal() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_REQUEST
        }
    }

    pub fn body(&self) -> serde_json::Value {
        let error_message = if self.is_internal() {
            "Internal Server Error"
        } else {
            self.message.as_str()
        };

        json!({
            "code": self.code,
            "error": error_message,
            "notification": Notification::from(self),
        })
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// What the presentation layer shows the user when an operation fails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl From<&Error> for Notification {
    fn from(err: &Error) -> Self {
        let message = match err.code {
            3 | 4 => "Server isn't available. Try again".to_string(),
            _ if err.is_internal() => "Something went wrong".to_string(),
            _ => err.message.clone(),
        };

        Notification {
            title: "Error".into(),
            message,
        }
    }
}

pub fn invalid_state_error() -> Error {
    Error {
        code: 100,
        message: "invalid state".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "Invalid input".into(),
    }
}

pub fn address_not_found_error() -> Error {
    Error {
        code: 102,
        message: "Address not found".into(),
    }
}

pub fn route_unavailable_error() -> Error {
    Error {
        code: 103,
        message: "Route isn't available".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn reqwest_error(err: reqwest::Error) -> Error {
    tracing::warn!("request failed: {}", err);

    Error {
        code: 3,
        message: "reqwest error".into(),
    }
}

pub fn upstream_error() -> Error {
    Error {
        code: 4,
        message: "upstream error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

#[test]
fn notification_hides_internal_details() {
    let notification = Notification::from(&upstream_error());
    assert_eq!(notification.title, "Error");
    assert_eq!(notification.message, "Server isn't available. Try again");

    let notification = Notification::from(&unexpected_error());
    assert_eq!(notification.message, "Something went wrong");
}

#[test]
fn notification_passes_through_caller_errors() {
    let notification = Notification::from(&route_unavailable_error());
    assert_eq!(notification.message, "Route isn't available");

    let notification = Notification::from(&address_not_found_error());
    assert_eq!(notification.message, "Address not found");
}

#[test]
fn internal_codes_map_to_server_error() {
    assert!(upstream_error().is_internal());
    assert!(!invalid_input_error().is_internal());

    let response = unexpected_error().into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = address_not_found_error().into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn response_body_carries_notification() {
    let body = upstream_error().body();
    assert_eq!(body["code"], 4);
    assert_eq!(body["error"], "Internal Server Error");
    assert_eq!(body["notification"]["title"], "Error");
    assert_eq!(body["notification"]["message"], "Server isn't available. Try again");

    let body = invalid_input_error().body();
    assert_eq!(body["error"], "Invalid input");
    assert_eq!(body["notification"]["message"], "Invalid input");
}

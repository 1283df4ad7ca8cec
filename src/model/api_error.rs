use axum::body::Body;
use axum::http::{Response, StatusCode};
use serde::{Deserialize, Serialize};

/// The JSON body both authorization failures surface with. The status code
/// is 401 in both cases; only the message tells them apart.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    pub status: String,
}

impl ApiError {
    fn unauthorized(message: &str) -> Response<Body> {
        let body = ApiError {
            message: message.into(),
            status: "unauthorized".into(),
        };
        let body_json = serde_json::to_string(&body).unwrap();

        Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(body_json.into())
            .unwrap()
    }

    /// The response for requests with no usable session token.
    pub fn invalid_token() -> Response<Body> {
        Self::unauthorized("Invalid access token.")
    }

    /// The response for a valid session that lacks permission on the
    /// referenced resource.
    pub fn not_authorized() -> Response<Body> {
        Self::unauthorized("You are not authorized to perform that action.")
    }
}

//! Contains all endpoint-associated functions. These are grouped depending on the security level required to access them
//!
//! The endpoints requiring no authentication are here, and the endpoints requiring higher levels of authorization are in the `todo`, `student`, `instructor`, and `admin` submodules respectively.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Response, StatusCode, header::AUTHORIZATION, request::Parts},
};

use crate::{
    AppState,
    database::{self, auth::Session},
    model::request::ClientRequest,
};

pub mod admin;
pub mod instructor;
pub mod student;
pub mod todo;

/// Logs in a user provided their username and password
///
/// Returns a session token to be used for subsequent operations. By default, this token expires after an hour.
pub async fn login(
    State(state): State<AppState>,
    Json(login_req): Json<ClientRequest>,
) -> Response<Body> {
    match database::user::login_user(&state.pool, login_req).await {
        Ok(s) => {
            let session = Session::new(s);
            let session_json = serde_json::to_string(&session).unwrap();
            Response::builder()
                .status(StatusCode::OK)
                .body(session_json.into())
                .unwrap()
        }
        Err(e) => {
            tracing::error!("{e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Error".into())
                .unwrap()
        }
    }
}

/// Signs up a new user with the provided credentials
///
/// Returns a session token to be used for subsequent operations. By default, it expires after an hour.
pub async fn signup(
    State(state): State<AppState>,
    Json(signup_req): Json<ClientRequest>,
) -> Response<Body> {
    match database::user::register_user(&state.pool, signup_req).await {
        Ok(s) => {
            let session = Session::new(s);
            let session_json = serde_json::to_string(&session).unwrap();
            Response::builder()
                .status(StatusCode::OK)
                .body(session_json.into())
                .unwrap()
        }
        Err(e) => {
            tracing::error!("{e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Error".into())
                .unwrap()
        }
    }
}

/// Resolves the calling user from the Authorization header.
pub(crate) async fn session_user(
    state: &AppState,
    parts: &Parts,
) -> Result<Option<i64>, String> {
    let Some(auth_header) = parts.headers.get(&AUTHORIZATION) else {
        return Ok(None);
    };
    let Ok(token) = auth_header.to_str() else {
        return Ok(None);
    };

    database::user::get_user_from_session(&state.pool, token).await
}

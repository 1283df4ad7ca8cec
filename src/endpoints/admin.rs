use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Response, StatusCode},
};

use crate::{AppState, database, model::request::ClientRequest};

pub async fn create_course(
    State(state): State<AppState>,
    Json(client_req): Json<ClientRequest>,
) -> Response<Body> {
    let ClientRequest {
        course_name: Some(course_name),
        ..
    } = client_req
    else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    match database::operations::create_course(&state.pool, course_name).await {
        Ok(course_id) => Response::builder()
            .status(StatusCode::OK)
            .body(format!(r#"{{ "course_id": {course_id} }}"#).into())
            .unwrap(),
        Err(e) => {
            tracing::error!("Could not create course: {e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Error".into())
                .unwrap()
        }
    }
}

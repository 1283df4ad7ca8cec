//! Exercises the to-do endpoints through the full router, the way a client
//! would: sign in, list outstanding work, dismiss items, watch them come
//! back when the state behind them moves.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header::AUTHORIZATION};
use base64::{Engine, prelude::BASE64_STANDARD};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use tower::ServiceExt;

use worklist::database::operations::{self, CourseRole};
use worklist::database::{self, user};
use worklist::model::request::ClientRequest;
use worklist::{AppState, app};

const BASE_URL: &str = "http://worklist.test";

struct Fixture {
    state: AppState,
    router: Router,
    token: String,
    teacher_course: i64,
    student_course: i64,
    a1: i64,
    a1_due: DateTime<Utc>,
    a2: i64,
    a2_due: DateTime<Utc>,
}

async fn create_user(pool: &Pool<Sqlite>, user_name: &str) -> (i64, String) {
    let signup = ClientRequest {
        user_name: Some(user_name.to_owned()),
        pass: Some("hunter2".to_owned()),
        first_name: Some("Test".to_owned()),
        last_name: Some(user_name.to_owned()),
        ..Default::default()
    };

    let session_id = user::register_user(pool, signup).await.unwrap();
    let token = BASE64_STANDARD.encode(session_id);
    let user_id = operations::user_id_by_name(pool, user_name)
        .await
        .unwrap()
        .unwrap();

    (user_id, token)
}

/// One teacher course with a submitted assignment to grade, one student
/// course with an assignment still to turn in.
async fn fixture() -> Fixture {
    let pool = database::connect("sqlite::memory:").await.unwrap();
    database::init_database(&pool).await.unwrap();

    let state = AppState {
        pool,
        public_url: BASE_URL.to_owned(),
    };

    let (me, token) = create_user(&state.pool, "me").await;

    let teacher_course = operations::create_course(&state.pool, "algorithms".into())
        .await
        .unwrap();
    let student_course = operations::create_course(&state.pool, "literature".into())
        .await
        .unwrap();
    operations::enroll_user(&state.pool, me, teacher_course, CourseRole::Teacher)
        .await
        .unwrap();
    operations::enroll_user(&state.pool, me, student_course, CourseRole::Student)
        .await
        .unwrap();

    // An assignment I need to submit
    let a1_due = Utc::now() + TimeDelta::days(6);
    let a1 = operations::add_assignment(
        &state.pool,
        student_course,
        "required work".into(),
        None,
        Some(a1_due),
        Some(10.0),
        vec!["online_text_entry".into()],
    )
    .await
    .unwrap();

    // An assignment I created, and a student who submits it
    let a2_due = Utc::now() + TimeDelta::days(1);
    let a2 = operations::add_assignment(
        &state.pool,
        teacher_course,
        "text".into(),
        None,
        Some(a2_due),
        Some(15.0),
        vec!["online_text_entry".into()],
    )
    .await
    .unwrap();

    let (sam, _) = create_user(&state.pool, "sam").await;
    operations::enroll_user(&state.pool, sam, teacher_course, CourseRole::Student)
        .await
        .unwrap();
    operations::submit_homework(&state.pool, a2, sam, Some("done".into()))
        .await
        .unwrap();

    let router = app(state.clone());

    Fixture {
        state,
        router,
        token,
        teacher_course,
        student_course,
        a1,
        a1_due,
        a2,
        a2_due,
    }
}

async fn another_submission(f: &Fixture) {
    let (riley, _) = create_user(&f.state.pool, "riley").await;
    operations::enroll_user(&f.state.pool, riley, f.teacher_course, CourseRole::Student)
        .await
        .unwrap();
    operations::submit_homework(&f.state.pool, f.a2, riley, Some("me too".into()))
        .await
        .unwrap();
}

fn submitting_json(f: &Fixture) -> Value {
    json!({
        "type": "submitting",
        "assignment": {
            "id": f.a1,
            "course_id": f.student_course,
            "name": "required work",
            "description": null,
            "muted": false,
            "points_possible": 10.0,
            "submission_types": ["online_text_entry"],
            "due_at": f.a1_due.to_rfc3339(),
            "html_url": format!("{BASE_URL}/courses/{}/assignments/{}", f.student_course, f.a1),
        },
        "ignore": format!("{BASE_URL}/api/v1/users/self/todo/assignment_{}/submitting?permanent=0", f.a1),
        "ignore_permanently": format!("{BASE_URL}/api/v1/users/self/todo/assignment_{}/submitting?permanent=1", f.a1),
        "html_url": format!("{BASE_URL}/courses/{}/assignments/{}#submit", f.student_course, f.a1),
        "context_type": "Course",
        "course_id": f.student_course,
    })
}

fn grading_json(f: &Fixture, needs_grading_count: i64) -> Value {
    json!({
        "type": "grading",
        "assignment": {
            "id": f.a2,
            "course_id": f.teacher_course,
            "name": "text",
            "description": null,
            "muted": false,
            "points_possible": 15.0,
            "needs_grading_count": needs_grading_count,
            "submission_types": ["online_text_entry"],
            "due_at": f.a2_due.to_rfc3339(),
            "html_url": format!("{BASE_URL}/courses/{}/assignments/{}", f.teacher_course, f.a2),
        },
        "needs_grading_count": needs_grading_count,
        "ignore": format!("{BASE_URL}/api/v1/users/self/todo/assignment_{}/grading?permanent=0", f.a2),
        "ignore_permanently": format!("{BASE_URL}/api/v1/users/self/todo/assignment_{}/grading?permanent=1", f.a2),
        "html_url": format!("{BASE_URL}/courses/{}/gradebook/speed_grader?assignment_id={}", f.teacher_course, f.a2),
        "context_type": "Course",
        "course_id": f.teacher_course,
    })
}

async fn api_get(router: &Router, token: Option<&str>, uri: &str) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }

    let resp = router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

async fn api_delete(router: &Router, token: Option<&str>, uri: &str) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }

    let resp = router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

async fn api_send(
    router: &Router,
    method: &str,
    token: Option<&str>,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }

    let resp = router
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

#[tokio::test]
async fn checks_for_auth() {
    let f = fixture().await;

    let (status, body) = api_get(&f.router, None, "/api/v1/users/self/todo").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"message": "Invalid access token.", "status": "unauthorized"})
    );

    let (status, body) = api_get(&f.router, Some("!!not-base64!!"), "/api/v1/users/self/todo").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"message": "Invalid access token.", "status": "unauthorized"})
    );

    let course_uri = format!("/api/v1/courses/{}/todo", f.teacher_course);
    let (status, body) = api_get(&f.router, None, &course_uri).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"message": "Invalid access token.", "status": "unauthorized"})
    );

    // A valid session with no enrollment in the course
    let (_, outsider_token) = create_user(&f.state.pool, "outsider").await;
    let (status, body) = api_get(&f.router, Some(&outsider_token), &course_uri).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"message": "You are not authorized to perform that action.", "status": "unauthorized"})
    );
}

#[tokio::test]
async fn returns_a_global_user_todo_list() {
    let f = fixture().await;

    let (status, body) = api_get(&f.router, Some(&f.token), "/api/v1/users/self/todo").await;
    assert_eq!(status, StatusCode::OK);

    let mut items = body.as_array().unwrap().clone();
    items.sort_by_key(|t| t["assignment"]["id"].as_i64());
    assert_eq!(items, vec![submitting_json(&f), grading_json(&f, 1)]);
}

#[tokio::test]
async fn returns_a_course_specific_todo_list() {
    let f = fixture().await;

    let uri = format!("/api/v1/courses/{}/todo", f.student_course);
    let (status, body) = api_get(&f.router, Some(&f.token), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([submitting_json(&f)]));

    let uri = format!("/api/v1/courses/{}/todo", f.teacher_course);
    let (status, body) = api_get(&f.router, Some(&f.token), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([grading_json(&f, 1)]));
}

#[tokio::test]
async fn ignores_a_todo_item_permanently() {
    let f = fixture().await;

    let uri = format!(
        "/api/v1/users/self/todo/assignment_{}/grading?permanent=1",
        f.a2
    );
    let (status, _) = api_delete(&f.router, Some(&f.token), &uri).await;
    assert!(status.is_success());

    let course_uri = format!("/api/v1/courses/{}/todo", f.teacher_course);
    let (_, body) = api_get(&f.router, Some(&f.token), &course_uri).await;
    assert_eq!(body, json!([]));

    // After a new student submission, still ignored
    another_submission(&f).await;
    let (_, body) = api_get(&f.router, Some(&f.token), &course_uri).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn ignores_a_todo_item_until_the_next_change() {
    let f = fixture().await;

    let uri = format!(
        "/api/v1/users/self/todo/assignment_{}/grading?permanent=0",
        f.a2
    );
    let (status, _) = api_delete(&f.router, Some(&f.token), &uri).await;
    assert!(status.is_success());

    let course_uri = format!("/api/v1/courses/{}/todo", f.teacher_course);
    let (_, body) = api_get(&f.router, Some(&f.token), &course_uri).await;
    assert_eq!(body, json!([]));

    // After a new student submission, no longer ignored
    another_submission(&f).await;
    let (_, body) = api_get(&f.router, Some(&f.token), &course_uri).await;
    assert_eq!(body, json!([grading_json(&f, 2)]));
}

#[tokio::test]
async fn repeating_a_dismissal_has_no_further_effect() {
    let f = fixture().await;

    let uri = format!(
        "/api/v1/users/self/todo/assignment_{}/grading?permanent=1",
        f.a2
    );
    let (status, _) = api_delete(&f.router, Some(&f.token), &uri).await;
    assert!(status.is_success());
    let (status, _) = api_delete(&f.router, Some(&f.token), &uri).await;
    assert!(status.is_success());

    let (_, body) = api_get(&f.router, Some(&f.token), "/api/v1/users/self/todo").await;
    assert_eq!(body, json!([submitting_json(&f)]));
}

#[tokio::test]
async fn rejects_dismissals_for_foreign_or_unknown_assets() {
    let f = fixture().await;

    // Unknown assignment
    let (status, _) = api_delete(
        &f.router,
        Some(&f.token),
        "/api/v1/users/self/todo/assignment_9999/grading?permanent=1",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Malformed asset string and purpose
    let (status, _) = api_delete(
        &f.router,
        Some(&f.token),
        "/api/v1/users/self/todo/quiz_1/grading?permanent=1",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/api/v1/users/self/todo/assignment_{}/archiving?permanent=1",
        f.a2
    );
    let (status, _) = api_delete(&f.router, Some(&f.token), &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // An assignment in a course the caller is not enrolled in
    let (_, outsider_token) = create_user(&f.state.pool, "outsider").await;
    let uri = format!(
        "/api/v1/users/self/todo/assignment_{}/grading?permanent=1",
        f.a2
    );
    let (status, body) = api_delete(&f.router, Some(&outsider_token), &uri).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"message": "You are not authorized to perform that action.", "status": "unauthorized"})
    );
}

#[tokio::test]
async fn returns_an_empty_list_when_nothing_is_outstanding() {
    let f = fixture().await;

    let (_, token) = create_user(&f.state.pool, "idle").await;
    let (status, body) = api_get(&f.router, Some(&token), "/api/v1/users/self/todo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn skips_assignments_that_are_not_actionable() {
    let f = fixture().await;

    let (idle, token) = create_user(&f.state.pool, "idle").await;
    let course = operations::create_course(&f.state.pool, "ceramics".into())
        .await
        .unwrap();
    operations::enroll_user(&f.state.pool, idle, course, CourseRole::Student)
        .await
        .unwrap();

    // Already past due
    operations::add_assignment(
        &f.state.pool,
        course,
        "late".into(),
        None,
        Some(Utc::now() - TimeDelta::days(2)),
        None,
        vec!["online_text_entry".into()],
    )
    .await
    .unwrap();

    // No due date at all
    operations::add_assignment(
        &f.state.pool,
        course,
        "undated".into(),
        None,
        None,
        None,
        vec!["online_text_entry".into()],
    )
    .await
    .unwrap();

    // Collected outside the platform
    operations::add_assignment(
        &f.state.pool,
        course,
        "kiln work".into(),
        None,
        Some(Utc::now() + TimeDelta::days(3)),
        None,
        vec!["on_paper".into()],
    )
    .await
    .unwrap();

    let (status, body) = api_get(&f.router, Some(&token), "/api/v1/users/self/todo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn submitting_items_clear_after_the_student_submits() {
    let f = fixture().await;

    let uri = format!("/api/student/{}/{}/submit", f.student_course, f.a1);
    let (status, body) = api_send(
        &f.router,
        "POST",
        Some(&f.token),
        &uri,
        json!({"body": "my essay"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "OK"}));

    let (_, body) = api_get(&f.router, Some(&f.token), "/api/v1/users/self/todo").await;
    assert_eq!(body, json!([grading_json(&f, 1)]));
}

#[tokio::test]
async fn grading_items_clear_once_every_submission_is_graded() {
    let f = fixture().await;

    let uri = format!("/api/instructor/{}/{}/grade", f.teacher_course, f.a2);
    let (status, _) = api_send(
        &f.router,
        "PUT",
        Some(&f.token),
        &uri,
        json!({"student_user_name": "sam", "grade": 14.0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = api_get(&f.router, Some(&f.token), "/api/v1/users/self/todo").await;
    assert_eq!(body, json!([submitting_json(&f)]));
}

#[tokio::test]
async fn management_routes_enforce_their_privilege_levels() {
    let f = fixture().await;

    // A student of the course cannot add assignments to it
    let (_, sam_token) = {
        let login = ClientRequest {
            user_name: Some("sam".to_owned()),
            pass: Some("hunter2".to_owned()),
            ..Default::default()
        };
        let session_id = user::login_user(&f.state.pool, login).await.unwrap();
        (0, BASE64_STANDARD.encode(session_id))
    };

    let uri = format!("/api/instructor/{}/add_assignment", f.teacher_course);
    let (status, body) = api_send(
        &f.router,
        "POST",
        Some(&sam_token),
        &uri,
        json!({"title": "sneaky"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"message": "You are not authorized to perform that action.", "status": "unauthorized"})
    );

    // Course creation requires an admin
    let (status, _) = api_send(
        &f.router,
        "POST",
        Some(&f.token),
        "/api/admin/create_course",
        json!({"course_name": "rhetoric"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let me = operations::user_id_by_name(&f.state.pool, "me")
        .await
        .unwrap()
        .unwrap();
    operations::set_admin(&f.state.pool, me).await.unwrap();

    let (status, body) = api_send(
        &f.router,
        "POST",
        Some(&f.token),
        "/api/admin/create_course",
        json!({"course_name": "rhetoric"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["course_id"].is_i64());
}

#[tokio::test]
async fn signup_returns_a_working_session_token() {
    let f = fixture().await;

    let (status, body) = api_send(
        &f.router,
        "POST",
        None,
        "/api/signup",
        json!({
            "user_name": "newcomer",
            "pass": "hunter2",
            "first_name": "New",
            "last_name": "Comer",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = body["session_base"].as_str().unwrap().to_owned();
    let (status, body) = api_get(&f.router, Some(&token), "/api/v1/users/self/todo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

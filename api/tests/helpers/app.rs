use api::{app, auth::generate_jwt, state::AppState};
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use db::{
    models::{
        class::Model as ClassModel,
        enrollment::Model as EnrollmentModel,
        user::{Model as UserModel, UserRole},
    },
    test_utils::setup_test_db,
};
use serde_json::Value;
use std::time::Duration;
use util::config::AppConfig;

pub const JWT_SECRET: &str = "integration-test-secret";

/// Campus quad used as the class location throughout the tests.
pub const LAT: f64 = 12.9716;
pub const LON: f64 = 77.5946;

pub struct TestData {
    pub teacher: UserModel,
    pub other_teacher: UserModel,
    pub students: Vec<UserModel>,
    pub outsider: UserModel,
    pub class: ClassModel,
}

impl TestData {
    async fn seed(db: &sea_orm::DatabaseConnection) -> Self {
        let teacher = UserModel::create(db, "teacher", "teacher@test.com", "Dr. Rao", "T-001", UserRole::Teacher)
            .await
            .unwrap();
        let other_teacher = UserModel::create(db, "teacher2", "teacher2@test.com", "Dr. Iyer", "T-002", UserRole::Teacher)
            .await
            .unwrap();
        let mut students = Vec::new();
        for i in 1..=2 {
            let s = UserModel::create(
                db,
                &format!("student{i}"),
                &format!("student{i}@test.com"),
                &format!("Student {i}"),
                &format!("S-00{i}"),
                UserRole::Student,
            )
            .await
            .unwrap();
            students.push(s);
        }
        let outsider = UserModel::create(db, "outsider", "outsider@test.com", "Outsider", "S-999", UserRole::Student)
            .await
            .unwrap();

        let class = ClassModel::create(db, "Surveying 101", teacher.id).await.unwrap();
        for s in &students {
            EnrollmentModel::enroll(db, class.id, s.id).await.unwrap();
        }

        Self {
            teacher,
            other_teacher,
            students,
            outsider,
            class,
        }
    }
}

pub fn token(user: &UserModel) -> String {
    generate_jwt(user.id, user.role).unwrap().0
}

/// App over a fresh in-memory database with a seeded class.
pub async fn make_test_app() -> (Router, AppState, TestData) {
    make_test_app_with_poll(Duration::from_secs(5)).await
}

pub async fn make_test_app_with_poll(poll_every: Duration) -> (Router, AppState, TestData) {
    AppConfig::set_jwt_secret(JWT_SECRET);

    let db = setup_test_db().await;
    let data = TestData::seed(&db).await;
    let state = AppState::with_poll_interval(db, poll_every);

    (app(state.clone()), state, data)
}

/// JSON request with a bearer token.
pub fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn attendance_uri(class_id: i64) -> String {
    format!("/api/classes/{class_id}/attendance")
}

pub fn start_body(duration: i64, radius: Option<f64>) -> Value {
    let mut body = serde_json::json!({
        "location": { "latitude": LAT, "longitude": LON },
        "duration": duration,
    });
    if let Some(r) = radius {
        body["radius"] = r.into();
    }
    body
}

pub fn mark_body(session_id: i64, latitude: f64, longitude: f64) -> Value {
    serde_json::json!({
        "session_id": session_id,
        "location": { "latitude": latitude, "longitude": longitude },
    })
}

/// Starts a session as the class creator and returns its id.
pub async fn start_session(app: &Router, data: &TestData, duration: i64) -> i64 {
    use tower::ServiceExt;

    let req = json_request(
        "POST",
        &attendance_uri(data.class.id),
        &token(&data.teacher),
        start_body(duration, Some(50.0)),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), 201);
    body_json(resp).await["data"]["session_id"].as_i64().unwrap()
}

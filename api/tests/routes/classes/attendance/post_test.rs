#[cfg(test)]
mod tests {
    use crate::helpers::app::{
        LAT, LON, attendance_uri, body_json, json_request, make_test_app, start_body, token,
    };
    use axum::{
        body::Body as AxumBody,
        http::{Request, StatusCode},
    };
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use serial_test::serial;
    use tower::ServiceExt;

    #[tokio::test]
    #[serial]
    async fn test_start_session_as_creator_ok() {
        let (app, state, data) = make_test_app().await;

        let req = json_request(
            "POST",
            &attendance_uri(data.class.id),
            &token(&data.teacher),
            start_body(300, Some(50.0)),
        );
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Attendance session started");

        let id = json["data"]["session_id"].as_i64().expect("session_id present");
        let end_time: DateTime<Utc> = json["data"]["end_time"].as_str().unwrap().parse().unwrap();
        let remaining = end_time - Utc::now();
        assert!(remaining.num_seconds() > 290 && remaining.num_seconds() <= 300);

        let stored = state.manager().store().find_session(id).await.unwrap().unwrap();
        assert_eq!(stored.class_id, data.class.id);
        assert_eq!(stored.creator_id, data.teacher.id);
        assert_eq!(stored.radius, 50.0);
        assert_eq!(stored.latitude, LAT);
        assert_eq!(stored.longitude, LON);
        assert_eq!(stored.total_students, 2);
    }

    #[tokio::test]
    #[serial]
    async fn test_start_session_defaults_radius() {
        let (app, state, data) = make_test_app().await;

        let req = json_request(
            "POST",
            &attendance_uri(data.class.id),
            &token(&data.teacher),
            start_body(60, None),
        );
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let id = body_json(resp).await["data"]["session_id"].as_i64().unwrap();
        let stored = state.manager().store().find_session(id).await.unwrap().unwrap();
        assert_eq!(stored.radius, 100.0);
    }

    #[tokio::test]
    #[serial]
    async fn test_start_session_conflict_when_active() {
        let (app, _, data) = make_test_app().await;
        let uri = attendance_uri(data.class.id);
        let tok = token(&data.teacher);

        let first = app
            .clone()
            .oneshot(json_request("POST", &uri, &tok, start_body(300, None)))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(json_request("POST", &uri, &tok, start_body(300, None)))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let json = body_json(second).await;
        assert_eq!(json["success"], false);
        assert_eq!(
            json["message"],
            "An attendance session is already active for this class"
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_start_session_role_and_ownership() {
        let (app, _, data) = make_test_app().await;
        let uri = attendance_uri(data.class.id);

        let student = app
            .clone()
            .oneshot(json_request("POST", &uri, &token(&data.students[0]), start_body(300, None)))
            .await
            .unwrap();
        assert_eq!(student.status(), StatusCode::UNAUTHORIZED);

        let other = app
            .clone()
            .oneshot(json_request("POST", &uri, &token(&data.other_teacher), start_body(300, None)))
            .await
            .unwrap();
        assert_eq!(other.status(), StatusCode::FORBIDDEN);

        let missing = app
            .oneshot(json_request(
                "POST",
                &attendance_uri(9_999),
                &token(&data.teacher),
                start_body(300, None),
            ))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn test_start_session_validation_errors() {
        let (app, _, data) = make_test_app().await;
        let uri = attendance_uri(data.class.id);
        let tok = token(&data.teacher);

        let bad_latitude = json!({
            "location": { "latitude": 95.0, "longitude": LON },
            "duration": 300,
        });
        let resp = app
            .clone()
            .oneshot(json_request("POST", &uri, &tok, bad_latitude))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Latitude must be between -90 and 90");

        let zero_duration = app
            .clone()
            .oneshot(json_request("POST", &uri, &tok, start_body(0, None)))
            .await
            .unwrap();
        assert_eq!(zero_duration.status(), StatusCode::BAD_REQUEST);

        let negative_radius = app
            .oneshot(json_request("POST", &uri, &tok, start_body(300, Some(-5.0))))
            .await
            .unwrap();
        assert_eq!(negative_radius.status(), StatusCode::BAD_REQUEST);
        let json = body_json(negative_radius).await;
        assert_eq!(json["message"], "Radius must be a positive number of meters");
    }

    #[tokio::test]
    #[serial]
    async fn test_start_session_requires_token() {
        let (app, _, data) = make_test_app().await;

        let req = Request::builder()
            .method("POST")
            .uri(attendance_uri(data.class.id))
            .header("Content-Type", "application/json")
            .body(AxumBody::from(start_body(300, None).to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let forged = json_request(
            "POST",
            &attendance_uri(data.class.id),
            "not-a-jwt",
            start_body(300, None),
        );
        let resp = app.oneshot(forged).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Invalid or expired token");
    }
}

#[cfg(test)]
mod tests {
    use crate::helpers::app::{
        LAT, LON, attendance_uri, body_json, json_request, make_test_app, mark_body,
        start_session, token,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use serial_test::serial;
    use tower::ServiceExt;

    // ~22 m north of the class location.
    const NEAR_LAT: f64 = LAT + 0.0002;
    // ~111 m north, outside a 50 m fence.
    const FAR_LAT: f64 = LAT + 0.001;

    #[tokio::test]
    #[serial]
    async fn test_mark_attendance_inside_fence_ok() {
        let (app, state, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 300).await;
        let student = &data.students[0];

        let req = json_request(
            "PUT",
            &attendance_uri(data.class.id),
            &token(student),
            mark_body(session_id, NEAR_LAT, LON),
        );
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["session_id"], session_id);
        assert_eq!(json["data"]["student_id"], student.id);
        assert!(json["data"]["marked_at"].is_string());

        assert!(state.manager().store().has_attendee(session_id, student.id).await.unwrap());
    }

    #[tokio::test]
    #[serial]
    async fn test_mark_attendance_twice_conflicts() {
        let (app, _, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 300).await;
        let uri = attendance_uri(data.class.id);
        let tok = token(&data.students[1]);

        let first = app
            .clone()
            .oneshot(json_request("PUT", &uri, &tok, mark_body(session_id, LAT, LON)))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        // Already marked wins over the geofence.
        let second = app
            .oneshot(json_request("PUT", &uri, &tok, mark_body(session_id, FAR_LAT, LON)))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let json = body_json(second).await;
        assert_eq!(json["message"], "Attendance already marked for this session");
    }

    #[tokio::test]
    #[serial]
    async fn test_mark_attendance_outside_fence_rejected() {
        let (app, state, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 300).await;
        let student = &data.students[0];

        let resp = app
            .oneshot(json_request(
                "PUT",
                &attendance_uri(data.class.id),
                &token(student),
                mark_body(session_id, FAR_LAT, LON),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = body_json(resp).await;
        let message = json["message"].as_str().unwrap();
        assert!(message.starts_with("You are 111 m"), "{message}");
        assert!(message.contains("allowed radius 50 m"), "{message}");

        assert!(!state.manager().store().has_attendee(session_id, student.id).await.unwrap());
    }

    #[tokio::test]
    #[serial]
    async fn test_mark_attendance_requires_enrollment() {
        let (app, _, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 300).await;
        let uri = attendance_uri(data.class.id);

        for user in [&data.outsider, &data.teacher] {
            let resp = app
                .clone()
                .oneshot(json_request("PUT", &uri, &token(user), mark_body(session_id, LAT, LON)))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "user {}", user.username);
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_mark_attendance_unknown_or_ended_session() {
        let (app, _, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 300).await;
        let uri = attendance_uri(data.class.id);
        let tok = token(&data.students[0]);

        let unknown = app
            .clone()
            .oneshot(json_request("PUT", &uri, &tok, mark_body(session_id + 100, LAT, LON)))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let end = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &uri,
                &token(&data.teacher),
                json!({ "session_id": session_id }),
            ))
            .await
            .unwrap();
        assert_eq!(end.status(), StatusCode::OK);

        let late = app
            .oneshot(json_request("PUT", &uri, &tok, mark_body(session_id, LAT, LON)))
            .await
            .unwrap();
        assert_eq!(late.status(), StatusCode::NOT_FOUND);
        let json = body_json(late).await;
        assert_eq!(json["message"], "No active attendance session");
    }

    #[tokio::test]
    #[serial]
    async fn test_mark_attendance_after_expiry() {
        let (app, state, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 1).await;

        tokio::time::sleep(std::time::Duration::from_millis(1_200)).await;

        let resp = app
            .oneshot(json_request(
                "PUT",
                &attendance_uri(data.class.id),
                &token(&data.students[0]),
                mark_body(session_id, LAT, LON),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let stored = state.manager().store().find_session(session_id).await.unwrap().unwrap();
        assert!(!stored.is_active());
    }

    #[tokio::test]
    #[serial]
    async fn test_mark_attendance_rejects_bad_coordinates() {
        let (app, _, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 300).await;

        let resp = app
            .oneshot(json_request(
                "PUT",
                &attendance_uri(data.class.id),
                &token(&data.students[0]),
                mark_body(session_id, LAT, 181.0),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Longitude must be between -180 and 180");
    }
}

#[cfg(test)]
mod tests {
    use crate::helpers::app::{
        attendance_uri, body_json, get_request, json_request, make_test_app, start_session, token,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use serial_test::serial;
    use tower::ServiceExt;

    #[tokio::test]
    #[serial]
    async fn test_end_session_by_creator_is_idempotent() {
        let (app, _, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 300).await;
        let uri = attendance_uri(data.class.id);
        let tok = token(&data.teacher);

        for _ in 0..2 {
            let resp = app
                .clone()
                .oneshot(json_request("PATCH", &uri, &tok, json!({ "session_id": session_id })))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let json = body_json(resp).await;
            assert_eq!(json["success"], true);
            assert_eq!(json["message"], "Attendance session ended");
        }

        let status = app
            .oneshot(get_request(&uri, &token(&data.students[0])))
            .await
            .unwrap();
        let json = body_json(status).await;
        assert_eq!(json["data"], json!({ "active": false }));
    }

    #[tokio::test]
    #[serial]
    async fn test_end_session_allows_a_new_one() {
        let (app, _, data) = make_test_app().await;
        let first = start_session(&app, &data, 300).await;

        let resp = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &attendance_uri(data.class.id),
                &token(&data.teacher),
                json!({ "session_id": first }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let second = start_session(&app, &data, 300).await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    #[serial]
    async fn test_end_session_forbidden_for_others() {
        let (app, _, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 300).await;
        let uri = attendance_uri(data.class.id);

        for user in [&data.students[0], &data.other_teacher] {
            let resp = app
                .clone()
                .oneshot(json_request(
                    "PATCH",
                    &uri,
                    &token(user),
                    json!({ "session_id": session_id }),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "user {}", user.username);
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_end_session_in_wrong_class_not_found() {
        let (app, state, data) = make_test_app().await;
        let session_id = start_session(&app, &data, 300).await;

        let other_class =
            db::models::class::Model::create(state.db(), "Geodesy 201", data.teacher.id)
                .await
                .unwrap();

        let resp = app
            .oneshot(json_request(
                "PATCH",
                &attendance_uri(other_class.id),
                &token(&data.teacher),
                json!({ "session_id": session_id }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

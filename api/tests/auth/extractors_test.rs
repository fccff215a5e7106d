#[cfg(test)]
mod tests {
    use crate::helpers::app::{
        JWT_SECRET, attendance_uri, body_json, get_request, make_test_app, token,
    };
    use api::auth::Claims;
    use axum::{
        body::Body as AxumBody,
        http::{Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use db::models::user::UserRole;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serial_test::serial;
    use tower::ServiceExt;

    fn signed(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn missing_token_is_unauthorized() {
        let (app, _, data) = make_test_app().await;

        let req = Request::builder()
            .uri(attendance_uri(data.class.id))
            .body(AxumBody::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Missing or invalid Authorization header");
    }

    #[tokio::test]
    #[serial]
    async fn expired_or_foreign_tokens_are_rejected() {
        let (app, _, data) = make_test_app().await;
        let uri = attendance_uri(data.class.id);

        let expired = signed(
            &Claims {
                sub: data.students[0].id,
                role: UserRole::Student,
                exp: (Utc::now() - Duration::hours(1)).timestamp() as usize,
            },
            JWT_SECRET,
        );
        let resp = app.clone().oneshot(get_request(&uri, &expired)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let foreign = signed(
            &Claims {
                sub: data.students[0].id,
                role: UserRole::Student,
                exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
            },
            "some-other-secret",
        );
        let resp = app.oneshot(get_request(&uri, &foreign)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn query_token_is_accepted() {
        let (app, _, data) = make_test_app().await;

        let req = Request::builder()
            .uri(format!(
                "{}?token={}",
                attendance_uri(data.class.id),
                token(&data.students[0])
            ))
            .body(AxumBody::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

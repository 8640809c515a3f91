#[cfg(test)]
mod tests {
    use crate::api::{LoginResponse, UserData};
    use crate::test::test_utils::{
        ADMIN_EMAIL, OTHER_PARENT_EMAIL, PARENT_EMAIL, create_standard_test_db, login_test_user,
        setup_test_client,
    };
    use crate::validation::ValidationResponse;
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    #[rocket::async_test]
    async fn test_login_api() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": ADMIN_EMAIL,
                    "password": "password123"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

        assert!(login_response.success);
        let user = login_response.user.unwrap();
        assert_eq!(user.email, ADMIN_EMAIL);
        assert_eq!(user.role, "admin");

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": ADMIN_EMAIL,
                    "password": "wrong_password"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

        assert!(!login_response.success);
        assert!(login_response.user.is_none());
        assert!(login_response.error.is_some());
    }

    #[rocket::async_test]
    async fn test_login_ignores_email_case() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "Parent@Family.test").await;

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let me: UserData = response.into_json().await.unwrap();
        assert_eq!(me.email, PARENT_EMAIL);
        assert_eq!(me.role, "parent");
        assert_eq!(me.display_name, "Kofi Mensah");
    }

    #[rocket::async_test]
    async fn test_login_rejects_malformed_email() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(json!({ "email": "not-an-email", "password": "x" }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body: ValidationResponse = response.into_json().await.unwrap();
        assert!(body.errors.contains_key("email"));
    }

    #[rocket::async_test]
    async fn test_auth_required_apis() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let endpoints = vec![
            "/api/me",
            "/api/students",
            "/api/fees",
            "/api/admin/dashboard",
            "/api/parent/students",
            "/api/live/students",
        ];

        for endpoint in endpoints {
            let response = client.get(endpoint).dispatch().await;
            assert_eq!(
                response.status(),
                Status::Unauthorized,
                "Endpoint {} did not require authentication",
                endpoint
            );

            let body: ValidationResponse = response.into_json().await.unwrap();
            assert!(body.errors.contains_key("authentication"));
        }
    }

    #[rocket::async_test]
    async fn test_role_comes_from_account_not_email() {
        let test_db = crate::test::test_db::TestDbBuilder::new()
            .parent("admin@school.test", None)
            .build()
            .await
            .unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "admin@school.test").await;

        let response = client.get("/api/students").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client.get("/api/me").dispatch().await;
        let me: UserData = response.into_json().await.unwrap();
        assert_eq!(me.role, "parent");
    }

    #[rocket::async_test]
    async fn test_logout_ends_session() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, ADMIN_EMAIL).await;
        assert_eq!(client.get("/api/me").dispatch().await.status(), Status::Ok);

        let response = client.post("/api/logout").dispatch().await;
        assert_eq!(response.status(), Status::NoContent);

        assert_eq!(
            client.get("/api/me").dispatch().await.status(),
            Status::Unauthorized
        );
    }

    #[rocket::async_test]
    async fn test_change_password() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, OTHER_PARENT_EMAIL).await;

        let response = client
            .post("/api/change-password")
            .header(ContentType::JSON)
            .body(
                json!({
                    "current_password": "not-my-password",
                    "new_password": "a-much-longer-secret"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
        let body: ValidationResponse = response.into_json().await.unwrap();
        assert!(body.errors.contains_key("current_password"));

        let response = client
            .post("/api/change-password")
            .header(ContentType::JSON)
            .body(
                json!({
                    "current_password": "password123",
                    "new_password": "short"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);

        let response = client
            .post("/api/change-password")
            .header(ContentType::JSON)
            .body(
                json!({
                    "current_password": "password123",
                    "new_password": "a-much-longer-secret"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        client.post("/api/logout").dispatch().await;

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": OTHER_PARENT_EMAIL,
                    "password": "a-much-longer-secret"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        let login_response: LoginResponse = response.into_json().await.unwrap();
        assert!(login_response.success);
    }

    #[rocket::async_test]
    async fn test_update_profile() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, OTHER_PARENT_EMAIL).await;

        let response = client
            .put("/api/profile")
            .header(ContentType::JSON)
            .body(json!({ "display_name": "  Efua Boateng " }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let me: UserData = client.get("/api/me").dispatch().await.into_json().await.unwrap();
        assert_eq!(me.display_name, "Efua Boateng");

        let response = client
            .put("/api/profile")
            .header(ContentType::JSON)
            .body(json!({ "display_name": "" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
    }

    #[rocket::async_test]
    async fn test_health_and_unknown_route() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("\"status\":\"OK\""));

        let response = client.get("/api/no-such-thing").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        let body: ValidationResponse = response.into_json().await.unwrap();
        assert_eq!(body.status, "error");
    }
}

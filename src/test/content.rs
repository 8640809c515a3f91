#[cfg(test)]
mod tests {
    use crate::db::DashboardCounts;
    use crate::models::Notice;
    use crate::test::test_utils::{
        ADMIN_EMAIL, PARENT_EMAIL, create_standard_test_db, login_test_user, setup_test_client,
    };
    use rocket::http::{ContentType, Status};
    use serde_json::{Value, json};

    #[rocket::async_test]
    async fn test_content_defaults_and_merge() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client.get("/api/content/heroSection").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let hero: Value = response.into_json().await.unwrap();
        assert_eq!(hero["body"]["title"], "Welcome to CampusConnect Academy");
        assert_eq!(hero["updated_at"], Value::Null);

        let response = client
            .put("/api/content/heroSection")
            .header(ContentType::JSON)
            .body(json!({ "title": "Welcome back" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        login_test_user(&client, ADMIN_EMAIL).await;

        let response = client
            .put("/api/content/heroSection")
            .header(ContentType::JSON)
            .body(json!({ "title": "Welcome back", "banner": "Open day on Saturday" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let hero: Value = client
            .get("/api/content/heroSection")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(hero["body"]["title"], "Welcome back");
        assert_eq!(hero["body"]["banner"], "Open day on Saturday");
        assert_eq!(hero["body"]["ctaButton1Link"], "/about", "Unsent keys are kept");
        assert_ne!(hero["updated_at"], Value::Null);

        let response = client.get("/api/content/footer").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_parent_cannot_edit_content() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, PARENT_EMAIL).await;

        let response = client
            .put("/api/content/aboutUsPage")
            .header(ContentType::JSON)
            .body(json!({ "pageTitle": "Hacked" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_published_notices_are_public() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, ADMIN_EMAIL).await;

        for (title, date, status) in [
            ("Sports day", "2024-05-10", Some("Published")),
            ("Draft budget", "2024-05-12", Some("Draft")),
            ("Term starts", "2024-05-20", None),
        ] {
            let mut body = json!({
                "notice_title": title,
                "notice_content": "Details inside",
                "audience": "All",
                "publish_date": date,
            });
            if let Some(status) = status {
                body["status"] = json!(status);
            }

            let response = client
                .post("/api/notices")
                .header(ContentType::JSON)
                .body(body.to_string())
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::Created);
        }

        let all: Vec<Notice> = client
            .get("/api/notices")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        client.post("/api/logout").dispatch().await;

        let published: Vec<Notice> = client
            .get("/api/notices/published")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let titles: Vec<&str> = published.iter().map(|n| n.notice_title.as_str()).collect();
        assert_eq!(titles, vec!["Term starts", "Sports day"]);
        assert!(published.iter().all(|n| !n.is_urgent));
    }

    #[rocket::async_test]
    async fn test_dashboard_counts() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, ADMIN_EMAIL).await;

        let response = client
            .post("/api/teachers")
            .header(ContentType::JSON)
            .body(
                json!({
                    "teacher_name": "Abena Ofori",
                    "teacher_number": "T001",
                    "email": "abena@campus.test"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let counts: DashboardCounts = client
            .get("/api/admin/dashboard")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(
            counts,
            DashboardCounts {
                students: 3,
                teachers: 1,
                classes: 0,
                published_notices: 0,
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::test::test_utils::{
        ADMIN_EMAIL, PARENT_EMAIL, create_standard_test_db, login_test_user, setup_test_client,
    };
    use rocket::http::{ContentType, Status};
    use serde_json::Value;

    #[rocket::async_test]
    async fn test_report_cards_grouped_by_term() {
        let test_db = create_standard_test_db().await;
        let ama = test_db.student_id("Ama Mensah").unwrap();
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, PARENT_EMAIL).await;

        let response = client
            .get(format!("/api/students/{}/report-cards", ama))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["student"]["student_name"], "Ama Mensah");

        let terms = body["terms"].as_array().unwrap();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0]["term"], "Term 2");
        assert_eq!(terms[0]["overall_average"], Value::Null);
        assert_eq!(terms[1]["term"], "Term 1");
        assert_eq!(terms[1]["overall_average"], 90.0);
        assert_eq!(terms[1]["results"][0]["subject_name"], "Mathematics");
    }

    #[rocket::async_test]
    async fn test_report_card_html() {
        let test_db = create_standard_test_db().await;
        let ama = test_db.student_id("Ama Mensah").unwrap();
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, ADMIN_EMAIL).await;

        let response = client
            .get(format!("/api/students/{}/report-card?term=Term%201", ama))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::HTML));

        let html = response.into_string().await.unwrap();
        assert!(html.contains("CampusConnect Academy"));
        assert!(html.contains("Ama Mensah"));
        assert!(html.contains("Overall Average:</strong> 90%"));

        let response = client
            .get(format!("/api/students/{}/report-card?term=Term%209", ama))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_report_card_pdf_download() {
        let test_db = create_standard_test_db().await;
        let ama = test_db.student_id("Ama Mensah").unwrap();
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, PARENT_EMAIL).await;

        let path = format!("/api/students/{}/report-card.pdf?term=Term%201", ama);

        let response = client.get(path.as_str()).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::PDF));
        assert_eq!(
            response.headers().get_one("Content-Disposition"),
            Some("attachment; filename=\"Report-Card-Ama_Mensah-Term_1.pdf\"")
        );

        let first = response.into_bytes().await.unwrap();
        assert!(first.starts_with(b"%PDF-1.4"));
        assert!(first.ends_with(b"%%EOF\n"));

        let second = client
            .get(path.as_str())
            .dispatch()
            .await
            .into_bytes()
            .await
            .unwrap();
        assert_eq!(first, second, "Same data on the same day exports identical bytes");
    }

    #[rocket::async_test]
    async fn test_report_card_pdf_forbidden_for_other_parent() {
        let test_db = create_standard_test_db().await;
        let ama = test_db.student_id("Ama Mensah").unwrap();
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, crate::test::test_utils::OTHER_PARENT_EMAIL).await;

        let response = client
            .get(format!("/api/students/{}/report-card.pdf?term=Term%201", ama))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Fee, Student, StudentResult};
    use crate::test::test_utils::{
        ADMIN_EMAIL, OTHER_PARENT_EMAIL, PARENT_EMAIL, create_standard_test_db, login_test_user,
        setup_test_client,
    };
    use crate::validation::ValidationResponse;
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    #[rocket::async_test]
    async fn test_student_crud() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, ADMIN_EMAIL).await;

        let response = client
            .post("/api/students")
            .header(ContentType::JSON)
            .body(
                json!({
                    "student_name": "  Yaw Asante ",
                    "student_number": "S0100",
                    "grade_level": "Grade 1",
                    "parent_email": "",
                    "date_of_birth": "2018-02-11"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let created: Student = response.into_json().await.unwrap();
        assert_eq!(created.student_name, "Yaw Asante");
        assert_eq!(created.parent_email, None);
        assert_eq!(created.date_of_birth.as_deref(), Some("2018-02-11"));

        let listed: Vec<Student> = client
            .get("/api/students")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(listed.len(), 4);
        assert_eq!(listed[0].id, created.id, "Newest student is listed first");

        let response = client
            .put(format!("/api/students/{}", created.id))
            .header(ContentType::JSON)
            .body(json!({ "grade_level": "Grade 2" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let updated: Student = response.into_json().await.unwrap();
        assert_eq!(updated.grade_level, "Grade 2");
        assert_eq!(updated.student_name, "Yaw Asante");

        let response = client
            .delete(format!("/api/students/{}", created.id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        let response = client
            .get(format!("/api/students/{}", created.id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);

        let response = client
            .delete(format!("/api/students/{}", created.id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_student_validation() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, ADMIN_EMAIL).await;

        let response = client
            .post("/api/students")
            .header(ContentType::JSON)
            .body(
                json!({
                    "student_number": "S0200",
                    "grade_level": "Grade 4",
                    "parent_email": "not an email"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);

        let body: ValidationResponse = response.into_json().await.unwrap();
        assert!(body.errors.contains_key("student_name"));
        assert!(body.errors.contains_key("parent_email"));
        assert!(!body.errors.contains_key("grade_level"));
    }

    #[rocket::async_test]
    async fn test_parent_sees_only_linked_children() {
        let test_db = create_standard_test_db().await;
        let ama = test_db.student_id("Ama Mensah").unwrap();
        let esi = test_db.student_id("Esi Owusu").unwrap();
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, PARENT_EMAIL).await;

        let children: Vec<Student> = client
            .get("/api/parent/students")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let names: Vec<&str> = children.iter().map(|s| s.student_name.as_str()).collect();
        assert_eq!(names, vec!["Ama Mensah", "Kwame Mensah"]);

        let response = client.get(format!("/api/students/{}", ama)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let results: Vec<StudentResult> = client
            .get(format!("/api/students/{}/results", ama))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].term, "Term 2");

        for path in [
            format!("/api/students/{}", esi),
            format!("/api/students/{}/results", esi),
            format!("/api/students/{}/fees", esi),
            format!("/api/students/{}/attendance", esi),
            format!("/api/students/{}/report-cards", esi),
            "/api/students/does-not-exist/results".to_string(),
            "/api/students/does-not-exist".to_string(),
        ] {
            let response = client.get(path.as_str()).dispatch().await;
            assert_eq!(response.status(), Status::Forbidden, "{} should be forbidden", path);
        }

        for path in ["/api/students", "/api/results", "/api/fees", "/api/admin/dashboard"] {
            let response = client.get(path).dispatch().await;
            assert_eq!(response.status(), Status::Forbidden, "{} should be forbidden", path);
        }
    }

    #[rocket::async_test]
    async fn test_parent_without_children_sees_empty_list() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, OTHER_PARENT_EMAIL).await;

        let children: Vec<Student> = client
            .get("/api/parent/students")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert!(children.is_empty());
    }

    #[rocket::async_test]
    async fn test_records_survive_student_deletion() {
        let test_db = create_standard_test_db().await;
        let ama = test_db.student_id("Ama Mensah").unwrap();
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, ADMIN_EMAIL).await;

        let response = client
            .post("/api/fees")
            .header(ContentType::JSON)
            .body(
                json!({
                    "student_id": ama,
                    "fee_title": "Library",
                    "amount_due": 50.0,
                    "due_date": "2024-09-01",
                    "status": "Pending"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let response = client.delete(format!("/api/students/{}", ama)).dispatch().await;
        assert_eq!(response.status(), Status::NoContent);

        let results: Vec<StudentResult> = client
            .get(format!("/api/students/{}/results", ama))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.student_name == "Ama Mensah"));

        let fees: Vec<Fee> = client
            .get(format!("/api/students/{}/fees", ama))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].student_name, "Ama Mensah");
    }
}

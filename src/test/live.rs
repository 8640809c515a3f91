#[cfg(test)]
mod tests {
    use crate::live::{ChangeBus, ChangeEvent, ChangeKind, Collection, snapshot};
    use crate::test::test_db::TestDbBuilder;
    use crate::test::test_utils::{
        ADMIN_EMAIL, PARENT_EMAIL, create_standard_test_db, login_test_user, setup_test_client,
    };
    use rocket::http::{ContentType, Status};
    use rocket::tokio;
    use rocket::tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
    use rocket::tokio::sync::broadcast::error::TryRecvError;
    use rocket::tokio::time::{Duration, timeout};
    use serde_json::{Value, json};

    /// Reads one server-sent event, skipping heartbeat comments.
    async fn next_event<R: AsyncBufRead + Unpin>(reader: &mut R) -> (String, Value) {
        let mut name = String::new();
        let mut data = String::new();
        loop {
            let mut line = String::new();
            let read = reader.read_line(&mut line).await.expect("stream is readable");
            assert!(read > 0, "live stream ended early");

            let line = line.trim_end();
            if line.is_empty() {
                if data.is_empty() {
                    continue;
                }
                break;
            }
            if let Some(value) = line.strip_prefix("event:") {
                name = value.trim().to_string();
            } else if let Some(value) = line.strip_prefix("data:") {
                data.push_str(value.trim());
            }
        }

        (name, serde_json::from_str(&data).expect("event data is JSON"))
    }

    #[test]
    fn test_collection_names_round_trip() {
        for name in [
            "students", "teachers", "classes", "subjects", "results", "fees", "attendance",
            "notices", "content",
        ] {
            assert_eq!(Collection::parse(name).unwrap().as_str(), name);
        }
        assert!(Collection::parse("users").is_err());
    }

    #[test]
    fn test_bus_delivers_to_every_subscriber() {
        let bus = ChangeBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(Collection::Fees, ChangeKind::Updated, "fee-1");

        let expected = ChangeEvent {
            collection: Collection::Fees,
            kind: ChangeKind::Updated,
            id: "fee-1".to_string(),
        };
        assert_eq!(first.try_recv().unwrap(), expected);
        assert_eq!(second.try_recv().unwrap(), expected);
        assert!(matches!(first.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let bus = ChangeBus::new(2);
        bus.publish(Collection::Students, ChangeKind::Created, "s-1");

        let mut late = bus.subscribe();
        assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_slow_subscriber_lags() {
        let bus = ChangeBus::new(2);
        let mut rx = bus.subscribe();

        for id in ["a", "b", "c"] {
            bus.publish(Collection::Notices, ChangeKind::Created, id);
        }

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Lagged(1))));
        assert_eq!(rx.try_recv().unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_snapshot_matches_collection() {
        let test_db = TestDbBuilder::new()
            .student("Ama Mensah", "Grade 5", None)
            .student("Esi Owusu", "Grade 5", None)
            .results("Ama Mensah", "Term 1", &[("Mathematics", "88", "")])
            .build()
            .await
            .unwrap();

        let students = snapshot(&test_db.pool, Collection::Students).await.unwrap();
        let students = students.as_array().unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0]["student_name"], "Esi Owusu");

        let results = snapshot(&test_db.pool, Collection::Results).await.unwrap();
        assert_eq!(results.as_array().unwrap().len(), 1);

        let content = snapshot(&test_db.pool, Collection::Content).await.unwrap();
        let sections: Vec<&str> = content
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s["section"].as_str())
            .collect();
        assert_eq!(
            sections,
            vec!["heroSection", "featuresSection", "aboutUsPage", "programsPageContent"]
        );

        let fees = snapshot(&test_db.pool, Collection::Fees).await.unwrap();
        assert!(fees.as_array().unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn test_writes_publish_change_events() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, ADMIN_EMAIL).await;

        let mut rx = client
            .rocket()
            .state::<ChangeBus>()
            .expect("change bus is managed")
            .subscribe();

        let response = client
            .post("/api/notices")
            .header(ContentType::JSON)
            .body(
                json!({
                    "notice_title": "Open day",
                    "notice_content": "Saturday 10am",
                    "audience": "Parents",
                    "publish_date": "2024-06-01"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let notice: serde_json::Value = response.into_json().await.unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.collection, Collection::Notices);
        assert_eq!(event.kind, ChangeKind::Created);
        assert_eq!(event.id, notice["id"].as_str().unwrap());

        let response = client
            .delete(format!("/api/notices/{}", event.id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, ChangeKind::Deleted);

        // Rejected writes publish nothing.
        let response = client
            .post("/api/notices")
            .header(ContentType::JSON)
            .body(json!({ "notice_title": "" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[rocket::async_test]
    async fn test_live_route_guards() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, PARENT_EMAIL).await;
        let response = client.get("/api/live/students").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        client.post("/api/logout").dispatch().await;
        login_test_user(&client, ADMIN_EMAIL).await;
        let response = client.get("/api/live/users").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_live_stream_sends_snapshots_for_its_collection() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;
        login_test_user(&client, ADMIN_EMAIL).await;

        let response = client.get("/api/live/students").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let mut stream = BufReader::new(Box::pin(response));

        let (name, students) = next_event(&mut stream).await;
        assert_eq!(name, "snapshot");
        assert_eq!(students.as_array().unwrap().len(), 3);

        let response = client
            .post("/api/students")
            .header(ContentType::JSON)
            .body(
                json!({
                    "student_name": "Yaw Asante",
                    "student_number": "S0100",
                    "grade_level": "Grade 1"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let (name, students) = next_event(&mut stream).await;
        assert_eq!(name, "snapshot");
        let students = students.as_array().unwrap();
        assert_eq!(students.len(), 4);
        assert_eq!(students[0]["student_name"], "Yaw Asante");

        let response = client
            .post("/api/notices")
            .header(ContentType::JSON)
            .body(
                json!({
                    "notice_title": "Open day",
                    "notice_content": "Saturday 10am",
                    "audience": "Parents",
                    "publish_date": "2024-06-01"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let quiet = timeout(Duration::from_millis(300), next_event(&mut stream)).await;
        assert!(quiet.is_err(), "Writes to other collections send nothing");
    }
}

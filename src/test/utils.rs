#[cfg(test)]
pub mod test_db {
    use crate::auth::Role;
    use crate::db::{create_results, create_student, create_user};
    use crate::error::AppError;
    use crate::models::{NewStudent, ResultEntry};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;
    use tracing::log::LevelFilter;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        students: Vec<TestStudent>,
        results: Vec<TestResult>,
    }

    pub struct TestUser {
        pub email: String,
        pub display_name: Option<String>,
        pub role: Role,
        pub password: String,
    }

    pub struct TestStudent {
        pub name: String,
        pub grade_level: String,
        pub parent_email: Option<String>,
    }

    pub struct TestResult {
        pub student_name: String,
        pub term: String,
        pub entries: Vec<ResultEntry>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn admin(mut self, email: &str, display_name: Option<&str>) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                display_name: display_name.map(String::from),
                role: Role::Admin,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn parent(mut self, email: &str, display_name: Option<&str>) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                display_name: display_name.map(String::from),
                role: Role::Parent,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn student(mut self, name: &str, grade_level: &str, parent_email: Option<&str>) -> Self {
            self.students.push(TestStudent {
                name: name.to_string(),
                grade_level: grade_level.to_string(),
                parent_email: parent_email.map(String::from),
            });
            self
        }

        /// Result batch for a student added with [`TestDbBuilder::student`].
        /// Entries are `(subject, marks, comments)`.
        pub fn results(mut self, student_name: &str, term: &str, entries: &[(&str, &str, &str)]) -> Self {
            self.results.push(TestResult {
                student_name: student_name.to_string(),
                term: term.to_string(),
                entries: entries
                    .iter()
                    .map(|(subject, marks, comments)| ResultEntry {
                        subject_name: subject.to_string(),
                        marks: marks.to_string(),
                        comments: comments.to_string(),
                    })
                    .collect(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            // Every connection to `sqlite::memory:` is its own database.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let mut user_id_map: HashMap<String, String> = HashMap::new();
            let mut student_id_map: HashMap<String, String> = HashMap::new();

            for user in &self.users {
                let id = create_user(
                    &pool,
                    &user.email,
                    &user.password,
                    user.role,
                    user.display_name.as_deref(),
                )
                .await?;
                user_id_map.insert(user.email.clone(), id);
            }

            for (index, student) in self.students.iter().enumerate() {
                let created = create_student(
                    &pool,
                    &NewStudent {
                        student_name: student.name.clone(),
                        student_number: format!("S{:04}", index + 1),
                        grade_level: student.grade_level.clone(),
                        parent_email: student.parent_email.clone(),
                        ..Default::default()
                    },
                )
                .await?;
                student_id_map.insert(student.name.clone(), created.id);
            }

            for batch in &self.results {
                let student_id = student_id_map.get(&batch.student_name).ok_or_else(|| {
                    AppError::NotFound(format!("Test student {} was not seeded", batch.student_name))
                })?;
                create_results(&pool, student_id, &batch.term, &batch.entries).await?;
            }

            Ok(TestDb {
                pool,
                user_id_map,
                student_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, String>,
        pub student_id_map: HashMap<String, String>,
    }

    impl TestDb {
        pub fn user_id(&self, email: &str) -> Option<String> {
            self.user_id_map.get(email).cloned()
        }

        pub fn student_id(&self, name: &str) -> Option<String> {
            self.student_id_map.get(name).cloned()
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::test_db::{STANDARD_PASSWORD, TestDb, TestDbBuilder};
    use crate::env::AppConfig;
    use crate::init_rocket;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;

    pub const ADMIN_EMAIL: &str = "admin@campus.test";
    pub const PARENT_EMAIL: &str = "parent@family.test";
    pub const OTHER_PARENT_EMAIL: &str = "other@family.test";

    /// Admin, two parents, three students (one unlinked) and two terms of
    /// results for Ama.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .admin(ADMIN_EMAIL, Some("Head Office"))
            .parent(PARENT_EMAIL, Some("Kofi Mensah"))
            .parent(OTHER_PARENT_EMAIL, None)
            .student("Ama Mensah", "Grade 5", Some(PARENT_EMAIL))
            .student("Kwame Mensah", "Grade 3", Some("PARENT@family.test"))
            .student("Esi Owusu", "Grade 5", None)
            .results(
                "Ama Mensah",
                "Term 1",
                &[("Mathematics", "88", "Good"), ("English", "92%", "Excellent")],
            )
            .results("Ama Mensah", "Term 2", &[("Mathematics", "A", "Consistent")])
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = init_rocket(test_db.pool.clone(), AppConfig::default())
            .await
            .configure(rocket::Config::figment().merge(("log_level", "off")));

        let client = Client::tracked(rocket)
            .await
            .expect("Failed to create Rocket client");

        (client, test_db)
    }

    pub async fn login_test_user(client: &Client, email: &str) {
        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": email,
                    "password": STANDARD_PASSWORD
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap_or_default();
        assert!(body.contains("\"success\":true"), "Login failed for {}: {}", email, body);
    }
}

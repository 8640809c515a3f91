#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod db;
mod env;
mod error;
mod live;
mod models;
mod report;
mod telemetry;
mod validation;
#[cfg(test)]
mod test;

use anyhow::Context;
use api::{
    api_change_password, api_create_attendance, api_create_class, api_create_fee,
    api_create_notice, api_create_parent, api_create_results, api_create_student,
    api_create_subject, api_create_teacher, api_dashboard, api_delete_attendance,
    api_delete_class, api_delete_fee, api_delete_notice, api_delete_result, api_delete_student,
    api_delete_subject, api_delete_teacher, api_get_attendance, api_get_class, api_get_content,
    api_get_fee, api_get_notice, api_get_result, api_get_student, api_get_subject,
    api_get_teacher, api_list_attendance, api_list_classes, api_list_fees, api_list_notices,
    api_list_results, api_list_students, api_list_subjects, api_list_teachers, api_login,
    api_logout, api_me, api_me_unauthorized, api_parent_students, api_published_notices,
    api_report_card_html, api_report_card_pdf, api_report_cards, api_save_content,
    api_student_attendance, api_student_fees, api_student_results, api_update_attendance,
    api_update_class, api_update_fee, api_update_notice, api_update_profile, api_update_result,
    api_update_student, api_update_subject, api_update_teacher, health,
};
use auth::{
    Role, bad_request_api, forbidden_api, not_found_api, unauthorized_api, unprocessable_api,
};
use db::{clean_expired_sessions, count_users_with_role, create_user};
use env::{AppConfig, load_environment};
use live::{ChangeBus, api_live};
use once_cell::sync::Lazy;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket, tokio};
use std::sync::Mutex;
use telemetry::{OtelGuard, TelemetryFairing, init_tracing, shutdown_telemetry};

use sqlx::SqlitePool;
use tracing::{error, info};

const SESSION_SWEEP_INTERVAL_SECS: u64 = 3600;

pub static TELEMETRY_GUARD: Lazy<Mutex<Option<OtelGuard>>> = Lazy::new(|| Mutex::new(None));

#[launch]
async fn rocket() -> _ {
    if let Err(err) = load_environment() {
        eprintln!("Failed to load environment files: {}", err);
    }

    let guard = init_tracing();
    match TELEMETRY_GUARD.lock() {
        Ok(mut slot) => *slot = guard,
        Err(poisoned) => *poisoned.into_inner() = guard,
    }

    let config = AppConfig::from_env();

    let pool = match prepare_database(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to prepare database: {:#}", e);
            panic!("Database setup failed: {:#}", e);
        }
    };

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS))
                .await;
        }
    });

    init_rocket(pool, config).await
}

async fn prepare_database(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePool::connect(&config.database_url)
        .await
        .with_context(|| format!("connecting to {}", config.database_url))?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running migrations")?;
    info!("Migrations completed successfully");

    bootstrap_admin(&pool, config).await?;

    Ok(pool)
}

/// Creates the first administrator from the environment when no admin
/// account exists yet.
async fn bootstrap_admin(pool: &SqlitePool, config: &AppConfig) -> anyhow::Result<()> {
    let Some(admin) = &config.bootstrap_admin else {
        return Ok(());
    };

    if count_users_with_role(pool, Role::Admin).await? > 0 {
        return Ok(());
    }

    create_user(pool, &admin.email, &admin.password, Role::Admin, Some("Administrator"))
        .await
        .context("creating bootstrap administrator")?;
    info!(email = %admin.email, "Bootstrap administrator created");

    Ok(())
}

pub async fn init_rocket(pool: SqlitePool, config: AppConfig) -> Rocket<Build> {
    info!(school = %config.letterhead.school_name, "Starting CampusConnect");

    rocket::build()
        .manage(pool)
        .manage(ChangeBus::default())
        .manage(config)
        .mount(
            "/api",
            routes![
                api_login,
                api_me,
                api_me_unauthorized,
                api_logout,
                api_change_password,
                api_update_profile,
                api_list_students,
                api_get_student,
                api_create_student,
                api_update_student,
                api_delete_student,
                api_student_results,
                api_student_fees,
                api_student_attendance,
                api_list_teachers,
                api_get_teacher,
                api_create_teacher,
                api_update_teacher,
                api_delete_teacher,
                api_list_classes,
                api_get_class,
                api_create_class,
                api_update_class,
                api_delete_class,
                api_list_subjects,
                api_get_subject,
                api_create_subject,
                api_update_subject,
                api_delete_subject,
                api_list_results,
                api_get_result,
                api_create_results,
                api_update_result,
                api_delete_result,
                api_list_fees,
                api_get_fee,
                api_create_fee,
                api_update_fee,
                api_delete_fee,
                api_list_attendance,
                api_get_attendance,
                api_create_attendance,
                api_update_attendance,
                api_delete_attendance,
                api_published_notices,
                api_list_notices,
                api_get_notice,
                api_create_notice,
                api_update_notice,
                api_delete_notice,
                api_get_content,
                api_save_content,
                api_dashboard,
                api_create_parent,
                api_parent_students,
                api_report_cards,
                api_report_card_html,
                api_report_card_pdf,
                api_live,
            ],
        )
        .register(
            "/api",
            catchers![
                bad_request_api,
                unauthorized_api,
                forbidden_api,
                not_found_api,
                unprocessable_api
            ],
        )
        .mount("/api", routes![health])
        .attach(TelemetryFairing)
        .attach(AdHoc::on_shutdown("Telemetry shutdown", |_| {
            Box::pin(async { shutdown_telemetry() })
        }))
}

use chrono::Utc;
use rocket::{Responder, State};
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use super::authorize_student_view;
use crate::auth::User;
use crate::db::{get_student, results_for_report};
use crate::env::AppConfig;
use crate::error::AppError;
use crate::models::Student;
use crate::report::{ReportCard, ReportExporter, TermSummary, aggregate_by_term, render_report_html};
use crate::validation::ApiResult;

#[derive(Serialize)]
pub struct ReportCardsResponse {
    pub student: Student,
    pub terms: Vec<TermSummary>,
}

/// PDF body sent as a download.
#[derive(Responder)]
#[response(content_type = "application/pdf")]
pub struct PdfAttachment {
    bytes: Vec<u8>,
    disposition: Header<'static>,
}

impl PdfAttachment {
    fn new(filename: &str, bytes: Vec<u8>) -> Self {
        let safe: String = filename
            .chars()
            .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
            .collect();

        Self {
            bytes,
            disposition: Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", safe),
            ),
        }
    }
}

async fn load_report(
    db: &Pool<Sqlite>,
    user: &User,
    id: &str,
) -> Result<(Student, Vec<TermSummary>), AppError> {
    let student = match authorize_student_view(db, user, id).await? {
        Some(student) => student,
        None => get_student(db, id).await?,
    };
    let results = results_for_report(db, &student.id).await?;

    Ok((student, aggregate_by_term(&results)))
}

fn find_term(terms: Vec<TermSummary>, term: &str) -> Result<TermSummary, AppError> {
    terms
        .into_iter()
        .find(|summary| summary.term == term)
        .ok_or_else(|| AppError::NotFound(format!("No results recorded for term {}", term)))
}

#[get("/students/<id>/report-cards")]
pub async fn api_report_cards(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<ReportCardsResponse>> {
    let (student, terms) = load_report(db, &user, id).await?;
    Ok(Json(ReportCardsResponse { student, terms }))
}

#[get("/students/<id>/report-card?<term>")]
pub async fn api_report_card_html(
    id: &str,
    term: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<RawHtml<String>> {
    let (student, terms) = load_report(db, &user, id).await?;
    let summary = find_term(terms, term)?;

    let card = ReportCard {
        letterhead: &config.letterhead,
        student_name: &student.student_name,
        grade_level: &student.grade_level,
        summary: &summary,
        issued_on: Utc::now().date_naive(),
    };

    Ok(RawHtml(render_report_html(&card)))
}

/// Report card for one term as an A4 PDF download. Nothing is stored.
#[get("/students/<id>/report-card.pdf?<term>")]
pub async fn api_report_card_pdf(
    id: &str,
    term: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<PdfAttachment> {
    let (student, terms) = load_report(db, &user, id).await?;
    let summary = find_term(terms, term)?;

    let card = ReportCard {
        letterhead: &config.letterhead,
        student_name: &student.student_name,
        grade_level: &student.grade_level,
        summary: &summary,
        issued_on: Utc::now().date_naive(),
    };

    let mut exporter = ReportExporter::new(&student.student_name, &summary.term);
    let bytes = exporter.export(&card)?;

    tracing::info!(
        student_id = %student.id,
        filename = %exporter.filename(),
        size = bytes.len(),
        "Report card exported"
    );

    Ok(PdfAttachment::new(exporter.filename(), bytes))
}

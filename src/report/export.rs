use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{error, info, instrument};

use super::{ReportCard, capture, package};
use crate::error::AppError;

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Progress of one export. Ends in `Done` or `Failed`; a failed export
/// leaves no file behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    Idle,
    Capturing,
    Packaging,
    Done,
    Failed,
}

/// `Report-Card-<Name>-<Term>.pdf` with whitespace runs turned into `_`.
pub fn report_filename(student_name: &str, term: &str) -> String {
    let name = WHITESPACE.replace_all(student_name, "_");
    let name = if name.is_empty() { "Student".into() } else { name };
    let term = WHITESPACE.replace_all(term, "_");

    format!("Report-Card-{}-{}.pdf", name, term)
}

/// Runs one capture-then-package export. Each instance is single use;
/// concurrent exports each get their own.
#[derive(Debug)]
pub struct ReportExporter {
    state: ExportState,
    filename: String,
}

impl ReportExporter {
    pub fn new(student_name: &str, term: &str) -> Self {
        Self {
            state: ExportState::Idle,
            filename: report_filename(student_name, term),
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn transition(&mut self, next: ExportState) {
        info!(
            filename = %self.filename,
            from = ?self.state,
            to = ?next,
            "Report export state change"
        );
        self.state = next;
    }

    fn fail(&mut self, err: AppError) -> AppError {
        error!(filename = %self.filename, error = %err, "Report export failed");
        self.transition(ExportState::Failed);
        err
    }

    #[instrument(skip(self, card), fields(filename = %self.filename))]
    pub fn export(&mut self, card: &ReportCard) -> Result<Vec<u8>, AppError> {
        if self.state != ExportState::Idle {
            return Err(AppError::Internal(format!(
                "Export of {} already ran",
                self.filename
            )));
        }

        self.transition(ExportState::Capturing);
        let canvas = capture(card).map_err(|err| self.fail(err))?;

        self.transition(ExportState::Packaging);
        let bytes = package(&canvas).map_err(|err| self.fail(err))?;

        if bytes.is_empty() {
            return Err(self.fail(AppError::Export("Packaged report is empty".to_string())));
        }

        self.transition(ExportState::Done);
        Ok(bytes)
    }
}

//! Report cards: per-term aggregation of results, the HTML block shown to
//! parents, and the A4 PDF export of that same block.

pub mod aggregate;
pub mod canvas;
pub mod export;
pub mod html;
pub mod pdf;

pub use aggregate::{TermSummary, aggregate_by_term};
pub use canvas::{Canvas, CanvasItem, capture};
pub use export::ReportExporter;
pub use html::render_report_html;
pub use pdf::package;

use chrono::NaiveDate;

pub const REPORT_TITLE: &str = "ACADEMIC REPORT CARD";
pub const NO_RESULTS_MESSAGE: &str = "No subject results recorded for this term.";
pub const OVERALL_REMARK: &str =
    "Overall remarks: Keep up the excellent effort! Consistent hard work leads to great achievements.";

/// Institution details printed at the top of every report card.
#[derive(Debug, Clone, PartialEq)]
pub struct Letterhead {
    pub school_name: String,
    pub address: String,
    pub motto: Option<String>,
}

/// Everything one rendered report card is made from.
#[derive(Debug, Clone, Copy)]
pub struct ReportCard<'a> {
    pub letterhead: &'a Letterhead,
    pub student_name: &'a str,
    pub grade_level: &'a str,
    pub summary: &'a TermSummary,
    pub issued_on: NaiveDate,
}

/// One visual element of a report card, top to bottom. HTML and canvas
/// rendering both walk this list so the two stay identical in content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Letterhead {
        school_name: String,
        address: String,
        motto: Option<String>,
    },
    Title(String),
    Field {
        label: String,
        value: String,
    },
    SectionTitle(String),
    TableHeader,
    TableRow {
        subject: String,
        marks: String,
        comments: String,
    },
    EmptyTable(String),
    Summary {
        average: f64,
        remark: String,
    },
    Signatures,
}

fn or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

impl ReportCard<'_> {
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = vec![
            Block::Letterhead {
                school_name: self.letterhead.school_name.clone(),
                address: self.letterhead.address.clone(),
                motto: self.letterhead.motto.clone(),
            },
            Block::Title(REPORT_TITLE.to_string()),
            Block::Field {
                label: "Student Name".to_string(),
                value: self.student_name.to_string(),
            },
            Block::Field {
                label: "Grade Level".to_string(),
                value: or_na(self.grade_level),
            },
            Block::Field {
                label: "Term".to_string(),
                value: self.summary.term.clone(),
            },
            Block::Field {
                label: "Date Issued".to_string(),
                value: self.issued_on.format("%Y-%m-%d").to_string(),
            },
            Block::SectionTitle("Academic Performance".to_string()),
            Block::TableHeader,
        ];

        if self.summary.results.is_empty() {
            blocks.push(Block::EmptyTable(NO_RESULTS_MESSAGE.to_string()));
        }

        blocks.extend(self.summary.results.iter().map(|result| Block::TableRow {
            subject: result.subject_name.clone(),
            marks: result.marks.clone(),
            comments: or_na(&result.comments),
        }));

        if let Some(average) = self.summary.overall_average {
            blocks.push(Block::Summary {
                average,
                remark: OVERALL_REMARK.to_string(),
            });
        }

        blocks.push(Block::Signatures);
        blocks
    }
}

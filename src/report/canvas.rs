use tracing::debug;

use super::{Block, ReportCard};
use crate::error::AppError;

/// Upscaling applied to the logical layout before packaging.
pub const SCALE: f64 = 2.0;

const LOGICAL_WIDTH: f64 = 720.0;
const PADDING: f64 = 32.0;
const BODY_SIZE: f64 = 13.0;
const SMALL_SIZE: f64 = 11.0;
const LINE_GAP: f64 = 1.45;

// Helvetica averages close to half an em per glyph.
const GLYPH_WIDTH: f64 = 0.52;

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasItem {
    /// `y` is the text baseline.
    Text {
        x: f64,
        y: f64,
        size: f64,
        bold: bool,
        text: String,
    },
    /// Filled rectangle; `y` is the top edge.
    Rule {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// A report block laid out in scaled pixels, origin top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub items: Vec<CanvasItem>,
}

struct Layout {
    y: f64,
    items: Vec<CanvasItem>,
}

impl Layout {
    fn text(&mut self, x: f64, size: f64, bold: bool, text: &str) {
        self.items.push(CanvasItem::Text {
            x: x * SCALE,
            y: (self.y + size) * SCALE,
            size: size * SCALE,
            bold,
            text: text.to_string(),
        });
    }

    fn rule(&mut self, x: f64, width: f64) {
        self.items.push(CanvasItem::Rule {
            x: x * SCALE,
            y: self.y * SCALE,
            width: width * SCALE,
            height: SCALE,
        });
    }

    fn advance(&mut self, by: f64) {
        self.y += by;
    }

    fn line(&mut self, x: f64, size: f64, bold: bool, text: &str) {
        self.text(x, size, bold, text);
        self.advance(size * LINE_GAP);
    }
}

fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * GLYPH_WIDTH
}

/// Greedy word wrap against an estimated glyph width. A single word wider
/// than the column gets a line of its own.
fn wrap(text: &str, width: f64, size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if !current.is_empty() && text_width(&candidate, size) > width {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lays the report card out as positioned text runs and rules, the way it
/// appears on screen, at `SCALE` times its logical size.
pub fn capture(card: &ReportCard) -> Result<Canvas, AppError> {
    let content_width = LOGICAL_WIDTH - 2.0 * PADDING;
    let subject_x = PADDING + 8.0;
    let marks_x = PADDING + content_width * 0.4;
    let comments_x = PADDING + content_width * 0.6;
    let subject_width = marks_x - subject_x - 8.0;
    let comments_width = PADDING + content_width - comments_x - 8.0;

    let mut layout = Layout {
        y: PADDING,
        items: Vec::new(),
    };

    for block in card.blocks() {
        match block {
            Block::Letterhead {
                school_name,
                address,
                motto,
            } => {
                layout.line(PADDING, 18.0, true, &school_name);
                layout.line(PADDING, SMALL_SIZE, false, &address);
                if let Some(motto) = motto {
                    layout.line(PADDING, SMALL_SIZE, false, &motto);
                }
            }
            Block::Title(title) => {
                layout.advance(4.0);
                layout.line(PADDING, 22.0, true, &title);
                layout.rule(PADDING, content_width);
                layout.advance(16.0);
            }
            Block::Field { label, value } => {
                let label = format!("{}:", label);
                layout.text(PADDING, BODY_SIZE, true, &label);
                let value_x = PADDING + text_width(&label, BODY_SIZE) + 6.0;
                layout.line(value_x, BODY_SIZE, false, &value);
            }
            Block::SectionTitle(title) => {
                layout.advance(12.0);
                layout.line(PADDING, 16.0, true, &title);
                layout.advance(4.0);
            }
            Block::TableHeader => {
                layout.rule(PADDING, content_width);
                layout.advance(8.0);
                layout.text(subject_x, BODY_SIZE, true, "Subject");
                layout.text(marks_x, BODY_SIZE, true, "Marks/Grade");
                layout.line(comments_x, BODY_SIZE, true, "Comments");
                layout.rule(PADDING, content_width);
                layout.advance(8.0);
            }
            Block::TableRow {
                subject,
                marks,
                comments,
            } => {
                let subject_lines = wrap(&subject, subject_width, BODY_SIZE);
                let comment_lines = wrap(&comments, comments_width, SMALL_SIZE);
                let row_top = layout.y;

                for (i, line) in subject_lines.iter().enumerate() {
                    layout.y = row_top + i as f64 * BODY_SIZE * LINE_GAP;
                    layout.text(subject_x, BODY_SIZE, i == 0, line);
                }
                layout.y = row_top;
                layout.text(marks_x, BODY_SIZE, true, &marks);
                for (i, line) in comment_lines.iter().enumerate() {
                    layout.y = row_top + i as f64 * BODY_SIZE * LINE_GAP;
                    layout.text(comments_x, SMALL_SIZE, false, line);
                }

                let rows = subject_lines.len().max(comment_lines.len()).max(1);
                layout.y = row_top + rows as f64 * BODY_SIZE * LINE_GAP + 6.0;
                layout.rule(PADDING, content_width);
                layout.advance(8.0);
            }
            Block::EmptyTable(message) => {
                layout.advance(16.0);
                layout.line(subject_x, BODY_SIZE, false, &message);
                layout.advance(16.0);
                layout.rule(PADDING, content_width);
            }
            Block::Summary { average, remark } => {
                layout.advance(16.0);
                layout.line(PADDING, 14.0, true, "Term Summary");
                let label = "Overall Average:";
                layout.text(PADDING, BODY_SIZE, true, label);
                let value_x = PADDING + text_width(label, BODY_SIZE) + 6.0;
                layout.line(value_x, 16.0, true, &format!("{}%", average));
                for line in wrap(&remark, content_width, SMALL_SIZE) {
                    layout.line(PADDING, SMALL_SIZE, false, &line);
                }
            }
            Block::Signatures => {
                layout.advance(24.0);
                layout.rule(PADDING, content_width);
                layout.advance(40.0);
                let right_x = PADDING + content_width * 0.6;
                layout.text(PADDING, SMALL_SIZE, false, "_________________________");
                layout.line(right_x, SMALL_SIZE, false, "_________________________");
                layout.text(PADDING, SMALL_SIZE, false, "Class Teacher's Signature");
                layout.line(right_x, SMALL_SIZE, false, "Principal's Signature");
            }
        }
    }

    let height = (layout.y + PADDING) * SCALE;
    if layout.items.is_empty() || height <= 0.0 {
        return Err(AppError::Export("Report capture produced an empty canvas".to_string()));
    }

    debug!(items = layout.items.len(), height, "Captured report canvas");

    Ok(Canvas {
        width: LOGICAL_WIDTH * SCALE,
        height,
        items: layout.items,
    })
}

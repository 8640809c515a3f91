use super::{Block, ReportCard};

const REPORT_CSS: &str = "\
.report-card{font-family:Helvetica,Arial,sans-serif;max-width:720px;padding:32px;border:1px solid #ddd;color:#222}\
.report-card header{display:flex;justify-content:space-between;border-bottom:1px solid #ddd;padding-bottom:16px;margin-bottom:24px}\
.report-card h2{margin:0;font-size:24px}\
.report-card .muted{color:#666;font-size:13px;margin:2px 0}\
.report-card table{width:100%;border-collapse:collapse;margin-bottom:24px}\
.report-card th,.report-card td{border-bottom:1px solid #eee;padding:10px 8px;text-align:left}\
.report-card td.marks,.report-card th.marks{text-align:center;font-weight:bold}\
.report-card .summary{border:1px solid #ddd;padding:16px;margin-bottom:24px}\
.report-card .signatures{display:flex;justify-content:space-between;border-top:1px solid #ddd;padding-top:24px;font-size:12px}";

struct Html {
    buf: String,
}

impl Html {
    fn new() -> Self {
        Self {
            buf: String::with_capacity(8 * 1024),
        }
    }

    fn push<S: AsRef<str>>(&mut self, s: S) {
        self.buf.push_str(s.as_ref());
    }

    fn text(&mut self, s: &str) {
        self.buf.push_str(&esc(s));
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// Standalone HTML document for one term's report card. Same input gives
/// the same bytes.
pub fn render_report_html(card: &ReportCard) -> String {
    let mut w = Html::new();

    w.push("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>");
    w.text(&format!("Report Card - {} - {}", card.student_name, card.summary.term));
    w.push("</title><style>");
    w.push(REPORT_CSS);
    w.push("</style></head><body><article class=\"report-card\">");

    let mut table_open = false;
    for block in card.blocks() {
        let is_row = matches!(block, Block::TableRow { .. } | Block::EmptyTable(_));
        if table_open && !is_row {
            w.push("</tbody></table>");
            table_open = false;
        }

        match block {
            Block::Letterhead {
                school_name,
                address,
                motto,
            } => {
                w.push("<header><div><p class=\"school\"><strong>");
                w.text(&school_name);
                w.push("</strong></p><p class=\"muted\">");
                w.text(&address);
                w.push("</p>");
                if let Some(motto) = motto {
                    w.push("<p class=\"muted\"><em>");
                    w.text(&motto);
                    w.push("</em></p>");
                }
                w.push("</div>");
            }
            Block::Title(title) => {
                w.push("<h2>");
                w.text(&title);
                w.push("</h2></header><section class=\"identity\">");
            }
            Block::Field { label, value } => {
                w.push("<p><strong>");
                w.text(&label);
                w.push(":</strong> ");
                w.text(&value);
                w.push("</p>");
            }
            Block::SectionTitle(title) => {
                w.push("</section><h3>");
                w.text(&title);
                w.push("</h3>");
            }
            Block::TableHeader => {
                w.push(
                    "<table><thead><tr><th>Subject</th><th class=\"marks\">Marks/Grade</th>\
                     <th>Comments</th></tr></thead><tbody>",
                );
                table_open = true;
            }
            Block::TableRow {
                subject,
                marks,
                comments,
            } => {
                w.push("<tr><td>");
                w.text(&subject);
                w.push("</td><td class=\"marks\">");
                w.text(&marks);
                w.push("</td><td>");
                w.text(&comments);
                w.push("</td></tr>");
            }
            Block::EmptyTable(message) => {
                w.push("<tr><td colspan=\"3\" class=\"muted\">");
                w.text(&message);
                w.push("</td></tr>");
            }
            Block::Summary { average, remark } => {
                w.push("<div class=\"summary\"><h4>Term Summary</h4><p><strong>Overall Average:</strong> ");
                w.text(&format!("{}%", average));
                w.push("</p><p class=\"muted\">");
                w.text(&remark);
                w.push("</p></div>");
            }
            Block::Signatures => {
                w.push(
                    "<footer class=\"signatures\"><div><p>_________________________</p>\
                     <p>Class Teacher's Signature</p></div><div><p>_________________________</p>\
                     <p>Principal's Signature</p></div></footer>",
                );
            }
        }
    }

    if table_open {
        w.push("</tbody></table>");
    }

    w.push("</article></body></html>");
    w.finish()
}

fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::*;

    #[test]
    fn renders_rows_and_average() {
        let letterhead = letterhead();
        let summary = summary(
            "Term 1 - 2024",
            &[("Math", "92%", "Strong work"), ("Art", "A+", ""), ("Science", "88%", "")],
        );
        let card = ReportCard {
            letterhead: &letterhead,
            student_name: "Ada Obi",
            grade_level: "Grade 5",
            summary: &summary,
            issued_on: issued_on(),
        };

        let html = render_report_html(&card);

        assert!(html.contains("CampusConnect Academy"));
        assert!(html.contains("<td>Math</td><td class=\"marks\">92%</td><td>Strong work</td>"));
        assert!(html.contains("<td>Art</td><td class=\"marks\">A+</td><td>N/A</td>"));
        assert!(html.contains("Overall Average:</strong> 90%"));
        assert!(html.contains("2024-04-12"));
        assert_eq!(html.matches("<table>").count(), 1);
        assert_eq!(html.matches("</table>").count(), 1);
    }

    #[test]
    fn user_text_is_escaped() {
        let letterhead = letterhead();
        let summary = summary("Term <1>", &[("R&D", "70", "\"great\"")]);
        let card = ReportCard {
            letterhead: &letterhead,
            student_name: "<script>alert(1)</script>",
            grade_level: "Grade 5",
            summary: &summary,
            issued_on: issued_on(),
        };

        let html = render_report_html(&card);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("R&amp;D"));
        assert!(html.contains("&quot;great&quot;"));
    }

    #[test]
    fn empty_term_shows_placeholder_row_and_no_summary() {
        let letterhead = letterhead();
        let summary = summary("Term 3", &[]);
        let card = ReportCard {
            letterhead: &letterhead,
            student_name: "Ada Obi",
            grade_level: "Grade 5",
            summary: &summary,
            issued_on: issued_on(),
        };

        let html = render_report_html(&card);

        assert!(html.contains("No subject results recorded for this term."));
        assert!(!html.contains("Overall Average"));
    }
}

use tracing::debug;

use super::{Canvas, CanvasItem};
use crate::error::AppError;

/// A4 portrait in PDF points.
pub const PAGE_WIDTH: f64 = 595.28;
pub const PAGE_HEIGHT: f64 = 841.89;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

/// Scales `canvas` to the page width and tiles it down as many A4 pages as
/// its height needs. Output depends only on the canvas.
pub fn package(canvas: &Canvas) -> Result<Vec<u8>, AppError> {
    let pages = tile_pages(canvas)?;
    debug!(pages = pages.len(), "Packaging report canvas");
    Ok(write_document(&pages))
}

/// Content stream of each page. An item that would straddle a page boundary
/// moves down to start at the top edge of the next page, so nothing is cut.
fn tile_pages(canvas: &Canvas) -> Result<Vec<String>, AppError> {
    if canvas.items.is_empty() || canvas.width <= 0.0 || canvas.height <= 0.0 {
        return Err(AppError::Export("Nothing to package".to_string()));
    }

    let ratio = PAGE_WIDTH / canvas.width;
    let scaled_height = canvas.height * ratio;
    let page_count = ((scaled_height / PAGE_HEIGHT).ceil() as usize).max(1);

    let mut pages = vec![String::new(); page_count];
    for item in &canvas.items {
        match item {
            CanvasItem::Text {
                x,
                y,
                size,
                bold,
                text,
            } => {
                let size = size * ratio;
                let (page, baseline) = place(y * ratio - size, size, &mut pages);
                let font = if *bold { FONT_BOLD } else { FONT_REGULAR };
                pages[page].push_str(&format!(
                    "BT /{} {:.2} Tf {:.2} {:.2} Td ({}) Tj ET\n",
                    font,
                    size,
                    x * ratio,
                    PAGE_HEIGHT - baseline,
                    encode_text(text)
                ));
            }
            CanvasItem::Rule {
                x,
                y,
                width,
                height,
            } => {
                let h = height * ratio;
                let (page, bottom) = place(y * ratio, h, &mut pages);
                pages[page].push_str(&format!(
                    "0.85 g {:.2} {:.2} {:.2} {:.2} re f 0 g\n",
                    x * ratio,
                    PAGE_HEIGHT - bottom,
                    width * ratio,
                    h
                ));
            }
        }
    }

    Ok(pages)
}

/// Page for an item whose top edge sits at `top` on the scaled canvas, and
/// the offset of its bottom edge from that page's top.
fn place(top: f64, extent: f64, pages: &mut Vec<String>) -> (usize, f64) {
    let page = ((top / PAGE_HEIGHT).floor().max(0.0) as usize).min(pages.len() - 1);
    let bottom = top + extent - page as f64 * PAGE_HEIGHT;
    if bottom <= PAGE_HEIGHT {
        return (page, bottom);
    }

    if page + 1 == pages.len() {
        pages.push(String::new());
    }
    (page + 1, extent)
}

/// WinAnsi literal string body. Latin-1 characters are written as octal
/// escapes, anything outside it becomes `?`.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", ch as u32)),
            _ => out.push('?'),
        }
    }
    out
}

fn write_document(pages: &[String]) -> Vec<u8> {
    let mut objects: Vec<String> = Vec::with_capacity(4 + pages.len() * 2);

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 5 + i * 2))
        .collect();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );

    for (i, content) in pages.iter().enumerate() {
        let content_id = 6 + i * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Resources << /Font << /{} 3 0 R /{} 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH, PAGE_HEIGHT, FONT_REGULAR, FONT_BOLD, content_id
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_at(y: f64) -> CanvasItem {
        CanvasItem::Text {
            x: 64.0,
            y,
            size: 26.0,
            bold: false,
            text: "Math".to_string(),
        }
    }

    fn page_count(pdf: &str) -> usize {
        pdf.matches("/Type /Page ").count()
    }

    #[test]
    fn short_canvas_fits_one_page() {
        let canvas = Canvas {
            width: 1440.0,
            height: 1200.0,
            items: vec![text_at(100.0)],
        };

        let pdf = String::from_utf8(package(&canvas).unwrap()).unwrap();

        assert!(pdf.starts_with("%PDF-1.4"));
        assert!(pdf.ends_with("%%EOF\n"));
        assert_eq!(page_count(&pdf), 1);
        assert!(pdf.contains("/Count 1"));
    }

    #[test]
    fn tall_canvas_is_tiled_across_pages() {
        // 1440 px wide scales by 595.28 / 1440; 6000 px tall is about 2480 pt.
        let canvas = Canvas {
            width: 1440.0,
            height: 6000.0,
            items: vec![text_at(100.0), text_at(2500.0), text_at(5900.0)],
        };

        let pdf = String::from_utf8(package(&canvas).unwrap()).unwrap();

        assert_eq!(page_count(&pdf), 3);
        assert!(pdf.contains("/Count 3"));
    }

    #[test]
    fn line_straddling_a_page_break_moves_to_the_next_page() {
        let ratio = PAGE_WIDTH / 1440.0;
        let canvas = Canvas {
            width: 1440.0,
            height: 2400.0,
            items: vec![text_at((PAGE_HEIGHT + 1.0) / ratio)],
        };

        let pages = tile_pages(&canvas).unwrap();

        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_empty());
        // 26 px scales to 10.75 pt, so the glyph top lands on the page edge.
        assert_eq!(pages[1], "BT /F1 10.75 Tf 26.46 831.14 Td (Math) Tj ET\n");
    }

    #[test]
    fn line_above_a_page_break_stays_put() {
        let ratio = PAGE_WIDTH / 1440.0;
        let canvas = Canvas {
            width: 1440.0,
            height: 2400.0,
            items: vec![text_at((PAGE_HEIGHT - 2.0) / ratio)],
        };

        let pages = tile_pages(&canvas).unwrap();

        assert_eq!(pages[0], "BT /F1 10.75 Tf 26.46 2.00 Td (Math) Tj ET\n");
        assert!(pages[1].is_empty());
    }

    #[test]
    fn straddling_rule_on_the_last_page_adds_a_page() {
        let ratio = PAGE_WIDTH / 1440.0;
        let canvas = Canvas {
            width: 1440.0,
            height: PAGE_HEIGHT / ratio - 10.0,
            items: vec![CanvasItem::Rule {
                x: 0.0,
                y: (PAGE_HEIGHT - 1.0) / ratio,
                width: 1440.0,
                height: 2.0 / ratio,
            }],
        };

        let pages = tile_pages(&canvas).unwrap();

        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_empty());
        assert_eq!(pages[1], "0.85 g 0.00 839.89 595.28 2.00 re f 0 g\n");
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let canvas = Canvas {
            width: 1440.0,
            height: 400.0,
            items: vec![text_at(50.0)],
        };
        let pdf = String::from_utf8(package(&canvas).unwrap()).unwrap();

        let xref_at = pdf.find("xref\n").unwrap();
        let entries: Vec<usize> = pdf[xref_at..]
            .lines()
            .skip(3)
            .take_while(|line| line.ends_with(" n "))
            .map(|line| line[..10].parse().unwrap())
            .collect();

        for (i, offset) in entries.iter().enumerate() {
            assert!(pdf[*offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn text_is_escaped_for_pdf_strings() {
        assert_eq!(encode_text("Art (A+)"), "Art \\(A+\\)");
        assert_eq!(encode_text("Zoë"), "Zo\\353");
        assert_eq!(encode_text("中"), "?");
    }

    #[test]
    fn empty_canvas_is_an_export_error() {
        let canvas = Canvas {
            width: 1440.0,
            height: 0.0,
            items: Vec::new(),
        };
        assert!(matches!(package(&canvas), Err(AppError::Export(_))));
    }
}

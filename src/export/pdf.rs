//! Paginated PDF report built directly with `lopdf`.
//!
//! Layout is A4 portrait in millimetres, converted to points when emitted:
//! a title, three metadata lines, then a table whose header repeats on each
//! page. Only the standard Helvetica fonts are used, so text is reduced to
//! Latin-1.

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::format::{cell_text, headers, Record};
use super::{ExportError, ExportMetadata};

const PAGE_W_MM: f32 = 210.0;
const PAGE_H_MM: f32 = 297.0;
const MARGIN_MM: f32 = 14.0;
const TABLE_START_MM: f32 = 60.0;
const FONT_SIZE: f32 = 8.0;
const CELL_PADDING_MM: f32 = 2.0;

const HEADER_FILL: (f32, f32, f32) = (66.0, 139.0, 202.0);
const ALT_ROW_FILL: (f32, f32, f32) = (245.0, 245.0, 245.0);

fn pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// PDF y axis grows upwards; layout positions are measured from the top.
fn y_pt(mm_from_top: f32) -> f32 {
    pt(PAGE_H_MM - mm_from_top)
}

fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

/// Clips text to roughly fit `width_mm` at the table font size.
fn fit(text: &str, width_mm: f32) -> String {
    // Helvetica averages about half an em per glyph
    let max_chars = ((pt(width_mm - 2.0 * CELL_PADDING_MM)) / (FONT_SIZE * 0.5)).floor() as usize;
    let count = text.chars().count();
    if count <= max_chars || max_chars < 2 {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars - 1).collect();
    clipped.push('~');
    clipped
}

struct PageBuilder {
    ops: Vec<Operation>,
}

impl PageBuilder {
    fn new() -> Self {
        Self { ops: Vec::new() }
    }

    fn fill_color(&mut self, (r, g, b): (f32, f32, f32)) {
        self.ops.push(Operation::new(
            "rg",
            vec![(r / 255.0).into(), (g / 255.0).into(), (b / 255.0).into()],
        ));
    }

    fn rect(&mut self, x_mm: f32, top_mm: f32, w_mm: f32, h_mm: f32, fill: (f32, f32, f32)) {
        self.fill_color(fill);
        self.ops.push(Operation::new(
            "re",
            vec![
                pt(x_mm).into(),
                y_pt(top_mm + h_mm).into(),
                pt(w_mm).into(),
                pt(h_mm).into(),
            ],
        ));
        self.ops.push(Operation::new("f", vec![]));
    }

    /// Draws text with its baseline at `baseline_mm` from the top of the page.
    fn text(&mut self, font: &str, size: f32, x_mm: f32, baseline_mm: f32, text: &str) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.ops.push(Operation::new(
            "Td",
            vec![pt(x_mm).into(), y_pt(baseline_mm).into()],
        ));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(latin1(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        Content { operations: self.ops }
            .encode()
            .map_err(|e| ExportError::Serialize(e.to_string()))
    }
}

struct Table<'a> {
    columns: Vec<String>,
    rows: &'a [Record],
    col_w: f32,
    row_h: f32,
}

impl<'a> Table<'a> {
    fn new(rows: &'a [Record]) -> Self {
        let columns = headers(rows);
        let usable = PAGE_W_MM - 2.0 * MARGIN_MM;
        let col_w = usable / columns.len().max(1) as f32;
        // Font size in mm plus padding above and below
        let row_h = FONT_SIZE * 25.4 / 72.0 + 2.0 * CELL_PADDING_MM;
        Self {
            columns,
            rows,
            col_w,
            row_h,
        }
    }

    fn draw_row(&self, page: &mut PageBuilder, top: f32, cells: &[String], header: bool, alt: bool) {
        let width = self.col_w * self.columns.len() as f32;
        if header {
            page.rect(MARGIN_MM, top, width, self.row_h, HEADER_FILL);
            page.fill_color((255.0, 255.0, 255.0));
        } else {
            if alt {
                page.rect(MARGIN_MM, top, width, self.row_h, ALT_ROW_FILL);
            }
            page.fill_color((0.0, 0.0, 0.0));
        }
        let font = if header { "F2" } else { "F1" };
        let baseline = top + self.row_h - CELL_PADDING_MM - 0.6;
        for (i, cell) in cells.iter().enumerate() {
            let x = MARGIN_MM + i as f32 * self.col_w + CELL_PADDING_MM;
            page.text(font, FONT_SIZE, x, baseline, &fit(cell, self.col_w));
        }
    }

    /// Lays the table out over as many pages as needed; `first` already holds
    /// the report heading.
    fn render(&self, first: PageBuilder) -> Vec<PageBuilder> {
        let mut pages = Vec::new();
        let mut page = first;
        let mut top = TABLE_START_MM;
        let bottom = PAGE_H_MM - MARGIN_MM;

        self.draw_row(&mut page, top, &self.columns, true, false);
        top += self.row_h;

        for (i, row) in self.rows.iter().enumerate() {
            if top + self.row_h > bottom {
                pages.push(page);
                page = PageBuilder::new();
                top = MARGIN_MM;
                self.draw_row(&mut page, top, &self.columns, true, false);
                top += self.row_h;
            }
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| row.get(c).map(cell_text).unwrap_or_default())
                .collect();
            self.draw_row(&mut page, top, &cells, false, i % 2 == 1);
            top += self.row_h;
        }
        pages.push(page);
        pages
    }
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    content: Vec<u8>,
) -> ObjectId {
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    })
}

pub fn to_pdf(
    rows: &[Record],
    metadata: &ExportMetadata,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let mut first = PageBuilder::new();
    first.fill_color((0.0, 0.0, 0.0));
    first.text("F1", 20.0, MARGIN_MM, 22.0, &format!("{} Report", metadata.record_type));
    first.text("F1", 12.0, MARGIN_MM, 35.0, &format!("Network: {}", metadata.network));
    first.text(
        "F1",
        12.0,
        MARGIN_MM,
        42.0,
        &format!("Total Records: {}", metadata.total_records),
    );
    let export_date = DateTime::parse_from_rfc3339(&metadata.export_date)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(now);
    first.text(
        "F1",
        12.0,
        MARGIN_MM,
        49.0,
        &format!("Export Date: {}", export_date.format("%-m/%-d/%Y")),
    );

    let pages = if rows.is_empty() {
        vec![first]
    } else {
        Table::new(rows).render(first)
    };

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = page.finish()?;
        kids.push(add_page(&mut doc, pages_id, content).into());
    }
    let count = kids.len() as i64;

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), pt(PAGE_W_MM).into(), pt(PAGE_H_MM).into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExportError::Serialize(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(total: usize) -> ExportMetadata {
        ExportMetadata {
            record_type: "Transactions".into(),
            network: "base".into(),
            total_records: total,
            export_date: "2025-03-04T05:06:07.000Z".into(),
        }
    }

    #[test]
    fn paginates_long_tables() {
        let rows: Vec<Record> = (0..120)
            .map(|i| json!({"Hash": format!("0x{:064x}", i), "Value": i}).as_object().cloned().unwrap())
            .collect();
        let bytes = to_pdf(&rows, &metadata(rows.len()), Utc::now()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn empty_report_has_one_page() {
        let bytes = to_pdf(&[], &metadata(0), Utc::now()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn clips_wide_cells() {
        let clipped = fit(&"x".repeat(200), 20.0);
        assert!(clipped.ends_with('~'));
        assert!(clipped.chars().count() < 200);
        assert_eq!(fit("short", 20.0), "short");
    }
}

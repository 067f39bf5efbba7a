use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs;

use crate::dashboard::render::{format_number, wrap_text, DirectorVotes, ResultsView};
use crate::dashboard::{DashResult, DashboardError};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const TITLE_WRAP: usize = 55;

/// One piece of text at its final position, in millimeters from the bottom left corner.
#[derive(PartialEq, Debug, Clone)]
struct PlacedText {
    text: String,
    size: f32,
    x: f32,
    y: f32,
    bold: bool,
}

/// Fills the pages from the top, starting a new one when the next line does not fit.
struct Layout {
    pages: Vec<Vec<PlacedText>>,
    y: f32,
}

impl Layout {
    fn new() -> Layout {
        Layout {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn line_height(size: f32) -> f32 {
        size * 0.3528 * 1.5
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    /// Several texts on the same line.
    fn row(&mut self, cells: &[(f32, String)], size: f32, bold: bool) {
        let h = Layout::line_height(size);
        self.ensure_space(h);
        self.y -= h;
        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            for (x, text) in cells.iter() {
                page.push(PlacedText {
                    text: text.clone(),
                    size,
                    x: *x,
                    y,
                    bold,
                });
            }
        }
    }

    fn text(&mut self, text: &str, size: f32, bold: bool) {
        self.row(&[(MARGIN, text.to_string())], size, bold);
    }

    fn gap(&mut self) {
        self.y -= 4.0;
    }
}

fn count(x: u64) -> String {
    format_number(i64::try_from(x).unwrap_or(i64::MAX))
}

fn layout_directors(l: &mut Layout, title: &str, directors: &[DirectorVotes]) {
    l.gap();
    l.text(title, 13.0, true);
    l.row(
        &[(MARGIN, "Name".to_string()), (150.0, "Votes".to_string())],
        10.0,
        true,
    );
    for d in directors.iter() {
        l.row(
            &[(MARGIN, d.name.clone()), (150.0, format_number(d.votes))],
            10.0,
            false,
        );
    }
}

fn layout_view(view: &ResultsView) -> Vec<Vec<PlacedText>> {
    let mut l = Layout::new();
    l.text(&view.organization, 16.0, true);
    l.text(&view.meeting_title, 12.0, false);
    l.text(&format!("AS OF {}", view.as_of), 11.0, true);

    l.gap();
    l.text("SUMMARY", 13.0, true);
    l.row(
        &[
            (MARGIN, "Eligible voters".to_string()),
            (80.0, count(view.eligible_voter_count)),
        ],
        10.0,
        false,
    );
    l.row(
        &[
            (MARGIN, "Total shares".to_string()),
            (80.0, format_number(view.total_shares)),
        ],
        10.0,
        false,
    );
    l.row(
        &[
            (MARGIN, "Total max votes".to_string()),
            (80.0, format_number(view.total_max_votes)),
        ],
        10.0,
        false,
    );

    layout_directors(&mut l, "REGULAR DIRECTOR", &view.regular);
    layout_directors(&mut l, "INDEPENDENT DIRECTOR", &view.independent);

    l.gap();
    l.text("RESOLUTION RESULTS", 13.0, true);
    let columns = [MARGIN, 30.0, 130.0, 147.0, 164.0, 181.0];
    let header = ["No.", "Title", "For", "Against", "Abstain", "Total"];
    let header_cells: Vec<(f32, String)> = columns
        .iter()
        .zip(header.iter())
        .map(|(x, h)| (*x, h.to_string()))
        .collect();
    l.row(&header_cells, 9.0, true);
    for r in view.resolutions.iter() {
        let mut title_lines = wrap_text(&r.title, TITLE_WRAP).into_iter();
        let first = title_lines.next().unwrap_or_default();
        l.row(
            &[
                (columns[0], r.number.clone()),
                (columns[1], first),
                (columns[2], count(r.for_count)),
                (columns[3], count(r.against_count)),
                (columns[4], count(r.abstain_count)),
                (columns[5], count(r.total)),
            ],
            9.0,
            false,
        );
        for line in title_lines {
            l.row(&[(columns[1], line)], 9.0, false);
        }
    }
    l.pages
}

pub fn export_pdf(view: &ResultsView, path: &str) -> DashResult<()> {
    let pdf_error = |message: String| DashboardError::ExportPdf {
        path: path.to_string(),
        message,
    };
    let pages = layout_view(view);

    let title = format!("{} - {}", view.organization, view.meeting_title);
    let (doc, first_page, first_layer) =
        PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| pdf_error(format!("{:?}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| pdf_error(format!("{:?}", e)))?;

    let mut first = Some((first_page, first_layer));
    for texts in pages.iter() {
        let (page, layer) = match first.take() {
            Some(x) => x,
            None => doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1"),
        };
        let current = doc.get_page(page).get_layer(layer);
        for t in texts.iter() {
            let f = if t.bold { &bold } else { &font };
            current.use_text(t.text.clone(), t.size, Mm(t.x), Mm(t.y), f);
        }
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| pdf_error(format!("{:?}", e)))?;
    fs::write(path, bytes).map_err(|e| pdf_error(e.to_string()))?;
    Ok(())
}

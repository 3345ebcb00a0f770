//! PDF rendering of an analysis report

use std::io::BufWriter;

use printpdf::*;

use crate::analyze::AnalysisReport;
use crate::error::{Error, Result};
use crate::export::SYNTHETIC_BANNER;

// A4 dimensions (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 18.0;
const MARGIN_RIGHT: f32 = 18.0;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;
const SECTION_SIZE: f32 = 11.0;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

/// Cut a cell so it fits its column
fn fit(text: &str, width: f32) -> String {
    let max_chars = (width / (FONT_SIZE * 0.19)) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

struct ReportWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    page: PdfPageIndex,
    layer: PdfLayerIndex,
    y: f32,
}

impl ReportWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| Error::Export(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| Error::Export(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            page,
            layer,
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
            self.page = page;
            self.layer = layer;
            self.y = MARGIN_TOP;
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.doc
            .get_page(self.page)
            .get_layer(self.layer)
            .use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
    }

    fn hline(&self) {
        let layer = self.doc.get_page(self.page).get_layer(self.layer);
        layer.set_outline_thickness(0.5);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.pdf_y())), false),
                (Point::new(Mm(PAGE_W - MARGIN_RIGHT), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        });
    }

    fn title(&mut self, title: &str, subtitle: &str) {
        self.text(title, MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 7.0;
        self.text(subtitle, MARGIN_LEFT, FONT_SIZE, false);
        self.y += 4.0;
        self.hline();
        self.y += 6.0;
    }

    fn line(&mut self, s: &str, bold: bool) {
        self.ensure_space(ROW_H);
        self.text(s, MARGIN_LEFT, FONT_SIZE, bold);
        self.y += ROW_H;
    }

    fn section(&mut self, label: &str) {
        self.ensure_space(ROW_H * 3.0);
        self.y += 3.0;
        self.text(label, MARGIN_LEFT, SECTION_SIZE, true);
        self.y += ROW_H + 1.0;
    }

    fn row(&mut self, cols: &[Col], values: &[String], bold: bool) {
        self.ensure_space(ROW_H);
        let mut x = MARGIN_LEFT;
        for (col, value) in cols.iter().zip(values) {
            let value = fit(value, col.width);
            match col.align {
                Align::Left => self.text(&value, x, FONT_SIZE, bold),
                Align::Right => {
                    let tw = approx_text_width(&value, FONT_SIZE);
                    self.text(&value, x + col.width - tw, FONT_SIZE, bold);
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    fn table(&mut self, cols: &[Col], headers: &[&str], rows: Vec<Vec<String>>) {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        self.row(cols, &headers, true);
        self.hline();
        self.y += 2.0;
        for row in rows {
            self.row(cols, &row, false);
        }
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| Error::Export(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| Error::Export(e.to_string()))
    }
}

/// Render the overview, categories, recurring payments, anomalies and
/// savings suggestions
pub fn render_report(report: &AnalysisReport) -> Result<Vec<u8>> {
    let mut pdf = ReportWriter::new("Statement Analysis")?;

    let overview = &report.overview;
    let period = match (overview.first_date, overview.last_date) {
        (Some(first), Some(last)) => format!("{} to {}", first, last),
        _ => "No transactions".to_string(),
    };
    pdf.title("Statement Analysis", &period);

    if report.synthetic {
        pdf.line(SYNTHETIC_BANNER, true);
        pdf.y += 2.0;
    }

    pdf.section("Overview");
    pdf.line(&format!("Transactions: {}", overview.transaction_count), false);
    pdf.line(&format!("Money out: {:.2}", overview.total_debits), false);
    pdf.line(&format!("Money in: {:.2}", overview.total_credits), false);
    pdf.line(&format!("Net: {:.2}", overview.net), false);
    pdf.line(&format!("Monthly average spend: {:.2}", overview.monthly_average), false);
    if let Some(category) = overview.top_category {
        pdf.line(&format!("Top category: {}", category), false);
    }
    if let Some(month) = &overview.reference_month {
        pdf.line(
            &format!(
                "Change in {} versus previous month: {:+.1}%",
                month, overview.month_over_month_change
            ),
            false,
        );
    }

    if !report.categories.is_empty() {
        pdf.section("Spending by category");
        let cols = [
            Col { width: 90.0, align: Align::Left },
            Col { width: 25.0, align: Align::Right },
            Col { width: 30.0, align: Align::Right },
            Col { width: 25.0, align: Align::Right },
        ];
        let rows = report
            .categories
            .iter()
            .map(|c| {
                vec![
                    c.category.to_string(),
                    c.count.to_string(),
                    format!("{:.2}", c.total),
                    format!("{:.1}%", c.percentage),
                ]
            })
            .collect();
        pdf.table(&cols, &["Category", "Count", "Total", "Share"], rows);
    }

    if !report.recurring.is_empty() {
        pdf.section("Recurring payments");
        let cols = [
            Col { width: 70.0, align: Align::Left },
            Col { width: 30.0, align: Align::Left },
            Col { width: 25.0, align: Align::Right },
            Col { width: 45.0, align: Align::Right },
        ];
        let rows = report
            .recurring
            .iter()
            .map(|r| {
                vec![
                    r.merchant.clone(),
                    r.frequency.to_string(),
                    format!("{:.2}", r.amount),
                    r.next_date.to_string(),
                ]
            })
            .collect();
        pdf.table(&cols, &["Merchant", "Frequency", "Amount", "Next payment"], rows);
    }

    if !report.anomalies.is_empty() {
        pdf.section("Unusual activity");
        for anomaly in &report.anomalies {
            pdf.line(
                &format!("[{}] {}", anomaly.severity, fit(&anomaly.summary(), 160.0)),
                false,
            );
        }
    }

    if !report.savings.is_empty() {
        pdf.section("Ways to save");
        for opportunity in &report.savings {
            pdf.line(
                &format!(
                    "{}: save about {:.2}",
                    opportunity.title, opportunity.potential_savings
                ),
                true,
            );
            pdf.line(&fit(&opportunity.description, 170.0), false);
        }
    }

    pdf.to_bytes()
}

//! The three tabular reports, rendered to in-memory PDF bytes.

use crate::error::PdfResult;
use crate::grouping::{bucket_rows, StockGroupBy};
use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use rust_decimal::Decimal;

/// One medication row on the stock-take report.
#[derive(Debug, Clone)]
pub struct StockTakeRow {
    pub medication_name: String,
    pub dosage_form: String,
    pub quantity_on_hand: i32,
    pub schedule: i32,
    pub supplier: String,
}

/// One dispensed item on the pharmacist's dispense report.
#[derive(Debug, Clone)]
pub struct DispenseReportRow {
    pub date: DateTime<Utc>,
    pub medication_name: String,
    pub quantity: i32,
    pub schedule: i32,
}

/// One collected item on the customer's prescriptions report.
#[derive(Debug, Clone)]
pub struct CollectionReportRow {
    pub date: DateTime<Utc>,
    pub medication_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 20.0;
const ROW_STEP_MM: f64 = 7.0;

fn mm(value: f64) -> Mm {
    Mm(value as _)
}

/// Cursor that writes rows top-down and breaks to a new page when the
/// current one is full.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: f64,
}

impl PageWriter {
    fn new(title: &str) -> PdfResult<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(PAGE_WIDTH_MM), mm(PAGE_HEIGHT_MM), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            font,
            bold,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        })
    }

    fn break_page_if_needed(&mut self) {
        if self.y < MARGIN_MM + ROW_STEP_MM {
            let (page, layer) =
                self.doc
                    .add_page(mm(PAGE_WIDTH_MM), mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn title(&mut self, text: &str) {
        self.layer
            .use_text(text, 16.0 as _, mm(MARGIN_MM), mm(self.y), &self.bold);
        self.y -= ROW_STEP_MM * 1.5;
    }

    fn subtitle(&mut self, text: &str) {
        self.layer
            .use_text(text, 10.0 as _, mm(MARGIN_MM), mm(self.y), &self.font);
        self.y -= ROW_STEP_MM * 1.5;
    }

    /// One table row. `columns` pairs each cell with its x offset in mm.
    fn row(&mut self, columns: &[(f64, String)], bold: bool) {
        self.break_page_if_needed();
        let font = if bold { &self.bold } else { &self.font };
        for (x, cell) in columns {
            self.layer
                .use_text(cell.as_str(), 10.0 as _, mm(*x), mm(self.y), font);
        }
        self.y -= ROW_STEP_MM;
    }

    fn heading(&mut self, text: &str) {
        self.break_page_if_needed();
        self.layer
            .use_text(text, 11.0 as _, mm(MARGIN_MM), mm(self.y), &self.bold);
        self.y -= ROW_STEP_MM;
    }

    fn finish(self) -> PdfResult<Vec<u8>> {
        Ok(self.doc.save_to_bytes()?)
    }
}

fn generated_line() -> String {
    format!("Generated: {}", Utc::now().format("%d/%m/%Y %H:%M"))
}

fn period_line(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    format!(
        "Report Period: {} to {}",
        from.format("%d/%m/%Y"),
        to.format("%d/%m/%Y")
    )
}

/// PDF report renderer.
pub struct PdfService;

impl PdfService {
    /// Stock-take report for a pharmacy, bucketed by the selected grouping key.
    pub fn generate_stock_take_pdf(
        pharmacy_name: &str,
        medications: Vec<StockTakeRow>,
        group_by: StockGroupBy,
    ) -> PdfResult<Vec<u8>> {
        let mut page = PageWriter::new(&format!("{} - Stock Take Report", pharmacy_name))?;
        page.title(&format!("{} - Stock Take Report", pharmacy_name));
        page.subtitle(&generated_line());

        page.row(
            &[
                (MARGIN_MM, "Medication".to_string()),
                (80.0, "Dosage Form".to_string()),
                (115.0, "Qty on Hand".to_string()),
                (145.0, "Schedule".to_string()),
                (170.0, "Supplier".to_string()),
            ],
            true,
        );

        for (label, rows) in bucket_rows(medications, group_by) {
            page.heading(&label);
            for row in rows {
                page.row(
                    &[
                        (MARGIN_MM, row.medication_name),
                        (80.0, row.dosage_form),
                        (115.0, row.quantity_on_hand.to_string()),
                        (145.0, row.schedule.to_string()),
                        (170.0, row.supplier),
                    ],
                    false,
                );
            }
        }

        page.finish()
    }

    /// Pharmacist's dispense report over an inclusive date range.
    pub fn generate_pharmacist_report_pdf(
        pharmacist_name: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        dispensed_items: Vec<DispenseReportRow>,
    ) -> PdfResult<Vec<u8>> {
        let mut page = PageWriter::new(&format!("Dispense Report - {}", pharmacist_name))?;
        page.title(&format!("Dispense Report - {}", pharmacist_name));
        page.subtitle(&period_line(from, to));

        page.row(
            &[
                (MARGIN_MM, "Date".to_string()),
                (60.0, "Medication".to_string()),
                (130.0, "Quantity".to_string()),
                (160.0, "Schedule".to_string()),
            ],
            true,
        );

        for item in dispensed_items {
            page.row(
                &[
                    (MARGIN_MM, item.date.format("%d/%m/%Y").to_string()),
                    (60.0, item.medication_name),
                    (130.0, item.quantity.to_string()),
                    (160.0, item.schedule.to_string()),
                ],
                false,
            );
        }

        page.finish()
    }

    /// Customer's collected-prescriptions report with line prices and a total.
    pub fn generate_customer_report_pdf(
        customer_name: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        collected_items: Vec<CollectionReportRow>,
        total_amount: Decimal,
    ) -> PdfResult<Vec<u8>> {
        let mut page = PageWriter::new(&format!(
            "Dispensed Prescriptions Report - {}",
            customer_name
        ))?;
        page.title(&format!("Dispensed Prescriptions Report - {}", customer_name));
        page.subtitle(&period_line(from, to));

        page.row(
            &[
                (MARGIN_MM, "Date".to_string()),
                (60.0, "Medication".to_string()),
                (130.0, "Quantity".to_string()),
                (160.0, "Price".to_string()),
            ],
            true,
        );

        for item in collected_items {
            page.row(
                &[
                    (MARGIN_MM, item.date.format("%d/%m/%Y").to_string()),
                    (60.0, item.medication_name),
                    (130.0, item.quantity.to_string()),
                    (160.0, format!("R{:.2}", item.price)),
                ],
                false,
            );
        }

        page.row(
            &[(130.0, format!("Total Amount: R{:.2}", total_amount))],
            true,
        );

        page.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn sample_stock() -> Vec<StockTakeRow> {
        vec![
            StockTakeRow {
                medication_name: "Panado".into(),
                dosage_form: "Tablet".into(),
                quantity_on_hand: 120,
                schedule: 1,
                supplier: "MediSupply Co".into(),
            },
            StockTakeRow {
                medication_name: "Allergex".into(),
                dosage_form: "Syrup".into(),
                quantity_on_hand: 40,
                schedule: 2,
                supplier: "MediSupply Co".into(),
            },
        ]
    }

    #[test]
    fn stock_take_pdf_has_pdf_header() {
        let bytes = PdfService::generate_stock_take_pdf(
            "Ibhayi Pharmacy",
            sample_stock(),
            StockGroupBy::DosageForm,
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn dispense_report_renders_many_rows_across_pages() {
        let rows: Vec<DispenseReportRow> = (0..120)
            .map(|i| DispenseReportRow {
                date: Utc::now(),
                medication_name: format!("Medication {}", i),
                quantity: i,
                schedule: (i % 7) as i32,
            })
            .collect();

        let bytes =
            PdfService::generate_pharmacist_report_pdf("T. Nkosi", Utc::now(), Utc::now(), rows)
                .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn customer_report_renders_total() {
        let rows = vec![CollectionReportRow {
            date: Utc::now(),
            medication_name: "Panado".into(),
            quantity: 2,
            price: dec("19.99"),
        }];

        let bytes = PdfService::generate_customer_report_pdf(
            "Jane Doe",
            Utc::now(),
            Utc::now(),
            rows,
            dec("39.98"),
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

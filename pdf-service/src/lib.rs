//! PDF report rendering for the Ibhayi pharmacy platform.
//!
//! Three tabular reports leave this system as `application/pdf` downloads: the
//! manager's stock-take report, the pharmacist's dispense report, and the
//! customer's collected-prescriptions report. Rendering is self-contained
//! (built-in Helvetica, in-memory output) so report generation is unit-testable
//! without any external tooling.

pub mod error;
pub mod grouping;
pub mod reports;

pub use error::{PdfError, PdfResult};
pub use grouping::StockGroupBy;
pub use reports::{CollectionReportRow, DispenseReportRow, PdfService, StockTakeRow};

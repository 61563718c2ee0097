//! SMTP notification delivery for the Ibhayi pharmacy platform.
//!
//! Three transactional notifications leave this system: the prescription-ready
//! notice to a customer, the stock-order summary to a supplier, and the
//! password-reset link. Delivery failures are reported to the caller as
//! [`EmailError`]. The HTTP handlers log and swallow them, since a failed
//! email must never fail the request that triggered it.

pub mod error;
pub mod notifications;
pub mod service;

pub use error::{EmailError, EmailResult};
pub use notifications::StockOrderLine;
pub use service::{EmailConfig, EmailService};

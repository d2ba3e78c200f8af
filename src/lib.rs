//! Point-of-sale invoice client: draft entry, validation, submission to the
//! remote invoice service, and lookup of previously generated invoices.

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod flow;
pub mod history;
pub mod logging;
pub mod model;
pub mod pdf;
pub mod validation;

pub use api::{HttpInvoiceService, InvoiceService};
pub use config::Settings;
pub use draft::{DraftEdit, InvoiceDraft, ItemEdit};
pub use flow::SubmissionFlow;
pub use model::{Category, InvoiceRequest, PaymentMode};

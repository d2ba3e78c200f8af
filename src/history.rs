use chrono::{DateTime, NaiveDate, NaiveDateTime};
use comfy_table::{Attribute, Cell, Table};
use tracing::debug;

use crate::api::{ApiError, InvoiceService};
use crate::model::InvoiceRecord;

/// What the history screen asks the service for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryQuery {
    #[default]
    All,
    Search(String),
}

impl HistoryQuery {
    /// A blank term means "show everything". Otherwise the term is searched
    /// for as typed.
    pub fn from_term(term: Option<&str>) -> Self {
        match term {
            Some(t) if !t.trim().is_empty() => HistoryQuery::Search(t.to_string()),
            _ => HistoryQuery::All,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to fetch invoices: {0}")]
    Fetch(#[source] ApiError),

    #[error("Search failed: {0}")]
    Search(#[source] ApiError),
}

pub fn lookup<S: InvoiceService>(
    service: &S,
    query: &HistoryQuery,
) -> Result<Vec<InvoiceRecord>, HistoryError> {
    debug!(?query, "loading invoice history");
    match query {
        HistoryQuery::All => service.list_invoices().map_err(HistoryError::Fetch),
        HistoryQuery::Search(term) => service.search_invoices(term).map_err(HistoryError::Search),
    }
}

/// The current query and the last list the service returned for it.
#[derive(Debug, Default)]
pub struct HistoryView {
    pub query: HistoryQuery,
    pub records: Vec<InvoiceRecord>,
}

impl HistoryView {
    pub fn new(query: HistoryQuery) -> Self {
        HistoryView { query, records: Vec::new() }
    }

    /// Reloads `records` for the current query. A failed lookup leaves the
    /// previous records in place.
    pub fn refresh<S: InvoiceService>(&mut self, service: &S) -> Result<(), HistoryError> {
        self.records = lookup(service, &self.query)?;
        Ok(())
    }
}

/// `2026-10-15T09:30:00Z` -> `15 Oct 2026`. Blank dates show as `-`,
/// anything unparseable is shown as received.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "-".to_string();
    }
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|d| d.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|d| d.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));
    match date {
        Ok(d) => d.format("%d %b %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn render_table(records: &[InvoiceRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Invoice No").add_attribute(Attribute::Bold),
        Cell::new("Date"),
        Cell::new("Customer"),
        Cell::new("Payment"),
    ]);
    for (index, record) in records.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&record.invoice_number),
            Cell::new(format_date(&record.date)),
            Cell::new(&record.customer_name),
            Cell::new(&record.payment_mode),
        ]);
    }
    table
}

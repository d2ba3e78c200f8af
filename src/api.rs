use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{InvoiceRecord, InvoiceRequest, InvoiceResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid service address {0}")]
    BaseUrl(String),

    #[error("could not reach the invoice service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invoice service answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invoice service sent an unreadable response: {0}")]
    Decode(String),

    #[error("invoice service did not return a PDF link")]
    MissingPdfUrl,

    #[error("invoice service returned an invalid PDF link {0:?}")]
    InvalidPdfUrl(String),
}

/// The remote invoice service, as seen by the form and the history screen.
pub trait InvoiceService {
    /// `POST /invoice`, resolving to the generated PDF's address.
    fn create_invoice(&self, request: &InvoiceRequest) -> Result<Url, ApiError>;

    /// `GET /invoices`
    fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, ApiError>;

    /// `GET /invoices/search?q=`
    fn search_invoices(&self, term: &str) -> Result<Vec<InvoiceRecord>, ApiError>;
}

pub struct HttpInvoiceService {
    client: Client,
    base: Url,
}

impl HttpInvoiceService {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        // Keep a trailing slash so `join` appends instead of replacing the last segment.
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base = Url::parse(&normalized).map_err(|_| ApiError::BaseUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .user_agent(concat!("pos-invoice/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpInvoiceService { client, base })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|_| ApiError::BaseUrl(self.base.to_string()))
    }

    fn fetch_records(&self, url: Url) -> Result<Vec<InvoiceRecord>, ApiError> {
        debug!(%url, "fetching invoices");
        let response = check_status(self.client.get(url).send()?)?;
        let body: serde_json::Value = response.json().map_err(|e| ApiError::Decode(e.to_string()))?;
        records_from(body)
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    warn!(%status, "invoice service request failed");
    Err(ApiError::Status { status, body })
}

/// The listing endpoints answer with a bare array; anything else counts as no results.
fn records_from(body: serde_json::Value) -> Result<Vec<InvoiceRecord>, ApiError> {
    if !body.is_array() {
        warn!("invoice listing was not an array, treating as empty");
        return Ok(Vec::new());
    }
    serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Pulls the PDF address out of a successful `POST /invoice` reply.
pub fn pdf_url_from(response: InvoiceResponse) -> Result<Url, ApiError> {
    let raw = match response.pdf_url {
        Some(url) if !url.trim().is_empty() => url,
        _ => return Err(ApiError::MissingPdfUrl),
    };
    Url::parse(raw.trim()).map_err(|_| ApiError::InvalidPdfUrl(raw))
}

impl InvoiceService for HttpInvoiceService {
    fn create_invoice(&self, request: &InvoiceRequest) -> Result<Url, ApiError> {
        let url = self.endpoint("invoice")?;
        debug!(%url, items = request.items.len(), "submitting invoice");
        let response = check_status(self.client.post(url).json(request).send()?)?;
        let body: InvoiceResponse = response.json().map_err(|e| ApiError::Decode(e.to_string()))?;
        let pdf_url = pdf_url_from(body)?;
        info!(%pdf_url, "invoice generated");
        Ok(pdf_url)
    }

    fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, ApiError> {
        let url = self.endpoint("invoices")?;
        self.fetch_records(url)
    }

    fn search_invoices(&self, term: &str) -> Result<Vec<InvoiceRecord>, ApiError> {
        let mut url = self.endpoint("invoices/search")?;
        url.query_pairs_mut().append_pair("q", term);
        self.fetch_records(url)
    }
}

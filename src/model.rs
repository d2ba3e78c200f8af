use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Phone,
    Charger,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Phone, Category::Charger];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Phone => f.write_str("Phone"),
            Category::Charger => f.write_str("Charger"),
        }
    }
}

/// Payment mode label. The accepted set comes from `Settings::payment_modes`,
/// so this is a plain string on the wire rather than a closed enum.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct PaymentMode(pub String);

impl PaymentMode {
    pub fn new(mode: impl Into<String>) -> Self {
        PaymentMode(mode.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::new("Cash")
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of the `POST /invoice` body. Optional fields are omitted
/// entirely when absent; the service treats a missing key differently
/// from an empty string.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceItem {
    pub category: Category,
    #[serde(default)]
    pub item_name: String,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charger_included: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charger_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charger_serial_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceRequest {
    pub customer_name: String,
    pub customer_address: String,
    pub payment_mode: PaymentMode,
    pub items: Vec<InvoiceItem>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InvoiceResponse {
    #[serde(default)]
    pub pdf_url: Option<String>,
}

/// A previously generated invoice as listed by the service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub id: String,
    pub invoice_number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    pub customer_name: String,
    pub payment_mode: PaymentMode,
    pub pdf_url: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

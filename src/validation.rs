//! Draft validation and payload normalization.
//!
//! `validate` stops at the first problem it finds. `normalize` assumes a
//! validated draft and keeps only the fields the item's category carries,
//! dropping blank optionals instead of sending them empty.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::draft::{InvoiceDraft, ItemDetails, LineItemDraft};
use crate::model::{Category, InvoiceItem, InvoiceRequest, PaymentMode};

/// Knobs that differ between shop setups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Phones must carry a model name.
    pub require_phone_item_name: bool,
    pub payment_modes: Vec<PaymentMode>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            require_phone_item_name: true,
            payment_modes: ["Cash", "Online", "EMI"].into_iter().map(PaymentMode::new).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    ItemName,
    Quantity,
    Price,
    Imei1,
    ChargerName,
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemField::ItemName => "Item Name",
            ItemField::Quantity => "Quantity",
            ItemField::Price => "Base Price",
            ItemField::Imei1 => "IMEI 1",
            ItemField::ChargerName => "Charger Name",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Customer Name is required")]
    CustomerNameRequired,

    #[error("Customer Address is required")]
    CustomerAddressRequired,

    #[error("Payment Mode {0} is not accepted")]
    PaymentModeNotAccepted(PaymentMode),

    #[error("At least one item is required")]
    NoItems,

    #[error("Item {}: {}", .position, item_reason(.field, .category))]
    Item {
        /// 1-based, as shown to the user.
        position: usize,
        field: ItemField,
        category: Category,
    },
}

fn item_reason(field: &ItemField, category: &Category) -> String {
    match (field, category) {
        (ItemField::Quantity | ItemField::Price, _) => format!("{field} must be greater than 0"),
        (ItemField::Imei1, _) => format!("{field} is required for Phone"),
        (ItemField::ChargerName, Category::Phone) => {
            format!("{field} is required when charger is included")
        }
        _ => format!("{field} is required"),
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn validate_item(item: &LineItemDraft, policy: &ValidationPolicy) -> Result<(), ItemField> {
    let category = item.category();
    if category == Category::Phone && policy.require_phone_item_name && is_blank(&item.item_name) {
        return Err(ItemField::ItemName);
    }
    if item.quantity <= 0 {
        return Err(ItemField::Quantity);
    }
    if item.price <= Decimal::ZERO {
        return Err(ItemField::Price);
    }
    match &item.details {
        ItemDetails::Phone { imei_1, charger, .. } => {
            if is_blank(imei_1) {
                return Err(ItemField::Imei1);
            }
            if charger.as_ref().is_some_and(|c| is_blank(&c.name)) {
                return Err(ItemField::ChargerName);
            }
        }
        ItemDetails::Charger(charger) => {
            if is_blank(&charger.name) {
                return Err(ItemField::ChargerName);
            }
        }
    }
    Ok(())
}

pub fn validate(draft: &InvoiceDraft, policy: &ValidationPolicy) -> Result<(), ValidationError> {
    if is_blank(&draft.customer_name) {
        return Err(ValidationError::CustomerNameRequired);
    }
    if is_blank(&draft.customer_address) {
        return Err(ValidationError::CustomerAddressRequired);
    }
    if !policy.payment_modes.contains(&draft.payment_mode) {
        return Err(ValidationError::PaymentModeNotAccepted(draft.payment_mode.clone()));
    }
    if draft.items.is_empty() {
        return Err(ValidationError::NoItems);
    }
    for (index, item) in draft.items.iter().enumerate() {
        validate_item(item, policy).map_err(|field| ValidationError::Item {
            position: index + 1,
            field,
            category: item.category(),
        })?;
    }
    Ok(())
}

fn present(value: &str) -> Option<String> {
    (!is_blank(value)).then(|| value.to_string())
}

fn normalize_item(item: &LineItemDraft) -> InvoiceItem {
    let mut out = InvoiceItem {
        category: item.category(),
        item_name: item.item_name.clone(),
        quantity: item.quantity,
        price: item.price,
        imei_1: None,
        imei_2: None,
        charger_included: None,
        charger_name: None,
        charger_serial_number: None,
    };
    match &item.details {
        ItemDetails::Phone { imei_1, imei_2, charger } => {
            out.imei_1 = present(imei_1);
            out.imei_2 = present(imei_2);
            out.charger_included = Some(charger.is_some());
            if let Some(charger) = charger {
                out.charger_name = present(&charger.name);
                out.charger_serial_number = present(&charger.serial_number);
            }
        }
        ItemDetails::Charger(charger) => {
            out.charger_name = present(&charger.name);
            out.charger_serial_number = present(&charger.serial_number);
        }
    }
    out
}

/// Builds the request body. Call only on a draft that passed `validate`.
pub fn normalize(draft: &InvoiceDraft) -> InvoiceRequest {
    InvoiceRequest {
        customer_name: draft.customer_name.clone(),
        customer_address: draft.customer_address.clone(),
        payment_mode: draft.payment_mode.clone(),
        items: draft.items.iter().map(normalize_item).collect(),
    }
}

pub fn prepare(
    draft: &InvoiceDraft,
    policy: &ValidationPolicy,
) -> Result<InvoiceRequest, ValidationError> {
    validate(draft, policy)?;
    Ok(normalize(draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{DraftEdit, ItemEdit};
    use serde_json::json;

    fn raj_draft() -> InvoiceDraft {
        InvoiceDraft::default()
            .apply(DraftEdit::CustomerName("Raj".into()))
            .apply(DraftEdit::CustomerAddress("Delhi".into()))
            .apply(DraftEdit::Item(0, ItemEdit::ItemName("X".into())))
            .apply(DraftEdit::Item(0, ItemEdit::Price(Decimal::from(100))))
            .apply(DraftEdit::Item(0, ItemEdit::Imei1("123456789012345".into())))
    }

    fn charger_draft(name: &str) -> InvoiceDraft {
        raj_draft()
            .apply(DraftEdit::Item(0, ItemEdit::Category(Category::Charger)))
            .apply(DraftEdit::Item(0, ItemEdit::ChargerName(name.into())))
    }

    #[test]
    fn phone_without_charger_has_no_charger_keys() {
        let request = prepare(&raj_draft(), &ValidationPolicy::default()).unwrap();
        let item = serde_json::to_value(&request.items[0]).unwrap();
        assert_eq!(
            item,
            json!({
                "category": "Phone",
                "item_name": "X",
                "quantity": 1,
                "price": 100.0,
                "imei_1": "123456789012345",
                "charger_included": false,
            })
        );
        assert_eq!(request.payment_mode.as_str(), "Cash");
    }

    #[test]
    fn zero_quantity_reports_item_one() {
        let draft = raj_draft().apply(DraftEdit::Item(0, ItemEdit::Quantity(0)));
        let err = validate(&draft, &ValidationPolicy::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Item {
                position: 1,
                field: ItemField::Quantity,
                category: Category::Phone,
            }
        );
        assert_eq!(err.to_string(), "Item 1: Quantity must be greater than 0");
    }

    #[test]
    fn charger_with_blank_name_is_rejected() {
        let err = validate(&charger_draft("  "), &ValidationPolicy::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Item {
                position: 1,
                field: ItemField::ChargerName,
                category: Category::Charger,
            }
        );
        assert_eq!(err.to_string(), "Item 1: Charger Name is required");
    }

    #[test]
    fn blank_customer_fields_fail_first() {
        let policy = ValidationPolicy::default();
        let draft = raj_draft().apply(DraftEdit::CustomerName("   ".into()));
        assert_eq!(validate(&draft, &policy), Err(ValidationError::CustomerNameRequired));

        let draft = raj_draft()
            .apply(DraftEdit::CustomerAddress("\t".into()))
            .apply(DraftEdit::Item(0, ItemEdit::Quantity(0)));
        assert_eq!(validate(&draft, &policy), Err(ValidationError::CustomerAddressRequired));
    }

    #[test]
    fn reports_the_first_offending_item() {
        let draft = raj_draft()
            .apply(DraftEdit::AddItem)
            .apply(DraftEdit::AddItem)
            .apply(DraftEdit::Item(1, ItemEdit::Category(Category::Charger)))
            .apply(DraftEdit::Item(1, ItemEdit::ChargerName("Cable".into())))
            .apply(DraftEdit::Item(1, ItemEdit::Price(Decimal::new(-1, 0))));

        let err = validate(&draft, &ValidationPolicy::default()).unwrap_err();
        assert_eq!(err.to_string(), "Item 2: Base Price must be greater than 0");
    }

    #[test]
    fn bundled_charger_needs_a_name() {
        let draft = raj_draft().apply(DraftEdit::Item(0, ItemEdit::ChargerIncluded(true)));
        let err = validate(&draft, &ValidationPolicy::default()).unwrap_err();
        assert_eq!(err.to_string(), "Item 1: Charger Name is required when charger is included");
    }

    #[test]
    fn item_name_policy_is_configurable() {
        let draft = raj_draft().apply(DraftEdit::Item(0, ItemEdit::ItemName(String::new())));
        let strict = ValidationPolicy::default();
        assert_eq!(
            validate(&draft, &strict).unwrap_err().to_string(),
            "Item 1: Item Name is required"
        );

        let relaxed = ValidationPolicy { require_phone_item_name: false, ..strict };
        assert!(validate(&draft, &relaxed).is_ok());
    }

    #[test]
    fn unknown_payment_mode_is_rejected() {
        let draft = raj_draft().apply(DraftEdit::PaymentMode(PaymentMode::new("Cheque")));
        let mut policy = ValidationPolicy::default();
        assert_eq!(
            validate(&draft, &policy),
            Err(ValidationError::PaymentModeNotAccepted(PaymentMode::new("Cheque")))
        );

        policy.payment_modes.push(PaymentMode::new("Cheque"));
        assert!(validate(&draft, &policy).is_ok());
    }

    #[test]
    fn charger_items_never_carry_phone_fields() {
        let request = prepare(&charger_draft("Fast 25W"), &ValidationPolicy::default()).unwrap();
        let item = &request.items[0];
        assert_eq!(item.imei_1, None);
        assert_eq!(item.imei_2, None);
        assert_eq!(item.charger_included, None);
        assert_eq!(item.charger_name.as_deref(), Some("Fast 25W"));
        assert_eq!(item.charger_serial_number, None);
    }

    #[test]
    fn blank_imei_is_left_out_of_the_payload() {
        let draft = raj_draft().apply(DraftEdit::Item(0, ItemEdit::Imei1("  ".into())));
        let item = serde_json::to_value(&normalize(&draft).items[0]).unwrap();

        assert!(item.get("imei_1").is_none());
        assert!(item.get("imei_2").is_none());
        assert_eq!(item["charger_included"], json!(false));
    }

    #[test]
    fn bundled_charger_fields_only_when_filled() {
        let draft = raj_draft()
            .apply(DraftEdit::Item(0, ItemEdit::ChargerIncluded(true)))
            .apply(DraftEdit::Item(0, ItemEdit::ChargerName("Fast 25W".into())))
            .apply(DraftEdit::Item(0, ItemEdit::ChargerSerialNumber(" ".into())))
            .apply(DraftEdit::Item(0, ItemEdit::Imei2(String::new())));
        let item = &normalize(&draft).items[0];

        assert_eq!(item.charger_included, Some(true));
        assert_eq!(item.charger_name.as_deref(), Some("Fast 25W"));
        assert_eq!(item.charger_serial_number, None);
        assert_eq!(item.imei_2, None);
    }

    #[test]
    fn values_are_sent_as_entered() {
        let draft = raj_draft().apply(DraftEdit::CustomerName(" Raj Kumar ".into()));
        let request = normalize(&draft);
        assert_eq!(request.customer_name, " Raj Kumar ");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let draft = raj_draft()
            .apply(DraftEdit::Item(0, ItemEdit::ChargerIncluded(true)))
            .apply(DraftEdit::Item(0, ItemEdit::ChargerName("Fast 25W".into())))
            .apply(DraftEdit::AddItem)
            .apply(DraftEdit::Item(1, ItemEdit::Category(Category::Charger)))
            .apply(DraftEdit::Item(1, ItemEdit::ChargerName("Cable".into())))
            .apply(DraftEdit::Item(1, ItemEdit::ChargerSerialNumber("C-1".into())));

        let once = normalize(&draft);
        let twice = normalize(&InvoiceDraft::from(once.clone()));
        assert_eq!(once, twice);
    }
}

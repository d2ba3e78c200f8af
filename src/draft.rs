//! Editable invoice form state.
//!
//! Every edit consumes the draft and hands back the next one, so callers
//! always hold a single owned value instead of sharing mutable state.
//! Fields that do not belong to an item's category cannot be represented:
//! switching category or dropping the bundled charger discards them.

use rust_decimal::Decimal;
use tracing::debug;

use crate::model::{Category, InvoiceItem, InvoiceRequest, PaymentMode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChargerDraft {
    pub name: String,
    pub serial_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDetails {
    Phone {
        imei_1: String,
        imei_2: String,
        /// `Some` when a charger is bundled with the phone.
        charger: Option<ChargerDraft>,
    },
    Charger(ChargerDraft),
}

impl ItemDetails {
    fn empty(category: Category) -> Self {
        match category {
            Category::Phone => ItemDetails::Phone {
                imei_1: String::new(),
                imei_2: String::new(),
                charger: None,
            },
            Category::Charger => ItemDetails::Charger(ChargerDraft::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemDraft {
    pub item_name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub details: ItemDetails,
}

impl Default for LineItemDraft {
    fn default() -> Self {
        LineItemDraft {
            item_name: String::new(),
            quantity: 1,
            price: Decimal::ZERO,
            details: ItemDetails::empty(Category::Phone),
        }
    }
}

impl LineItemDraft {
    pub fn category(&self) -> Category {
        match self.details {
            ItemDetails::Phone { .. } => Category::Phone,
            ItemDetails::Charger(_) => Category::Charger,
        }
    }

    pub fn charger_included(&self) -> bool {
        matches!(self.details, ItemDetails::Phone { charger: Some(_), .. })
    }

    /// The charger sold with this line, either standalone or bundled.
    pub fn charger(&self) -> Option<&ChargerDraft> {
        match &self.details {
            ItemDetails::Phone { charger, .. } => charger.as_ref(),
            ItemDetails::Charger(charger) => Some(charger),
        }
    }

    pub fn apply(mut self, edit: ItemEdit) -> Self {
        match edit {
            ItemEdit::Category(category) => return self.with_category(category),
            ItemEdit::ItemName(name) => self.item_name = name,
            ItemEdit::Quantity(quantity) => self.quantity = quantity,
            ItemEdit::Price(price) => self.price = price,
            ItemEdit::Imei1(value) => match &mut self.details {
                ItemDetails::Phone { imei_1, .. } => *imei_1 = value,
                ItemDetails::Charger(_) => debug!("ignoring imei_1 on a charger item"),
            },
            ItemEdit::Imei2(value) => match &mut self.details {
                ItemDetails::Phone { imei_2, .. } => *imei_2 = value,
                ItemDetails::Charger(_) => debug!("ignoring imei_2 on a charger item"),
            },
            ItemEdit::ChargerIncluded(included) => match &mut self.details {
                ItemDetails::Phone { charger, .. } => {
                    if !included {
                        *charger = None;
                    } else if charger.is_none() {
                        *charger = Some(ChargerDraft::default());
                    }
                }
                ItemDetails::Charger(_) => debug!("ignoring charger_included on a charger item"),
            },
            ItemEdit::ChargerName(value) => match self.charger_mut() {
                Some(charger) => charger.name = value,
                None => debug!("ignoring charger_name, no charger on this item"),
            },
            ItemEdit::ChargerSerialNumber(value) => match self.charger_mut() {
                Some(charger) => charger.serial_number = value,
                None => debug!("ignoring charger_serial_number, no charger on this item"),
            },
        }
        self
    }

    fn charger_mut(&mut self) -> Option<&mut ChargerDraft> {
        match &mut self.details {
            ItemDetails::Phone { charger, .. } => charger.as_mut(),
            ItemDetails::Charger(charger) => Some(charger),
        }
    }

    fn with_category(mut self, category: Category) -> Self {
        if self.category() == category {
            return self;
        }
        debug!(from = %self.category(), to = %category, "switching item category");
        self.details = match (self.details, category) {
            // A bundled charger becomes the standalone charger; the IMEIs go.
            (ItemDetails::Phone { charger, .. }, Category::Charger) => {
                ItemDetails::Charger(charger.unwrap_or_default())
            }
            (_, category) => ItemDetails::empty(category),
        };
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemEdit {
    Category(Category),
    ItemName(String),
    Quantity(i64),
    Price(Decimal),
    Imei1(String),
    Imei2(String),
    ChargerIncluded(bool),
    ChargerName(String),
    ChargerSerialNumber(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    CustomerName(String),
    CustomerAddress(String),
    PaymentMode(PaymentMode),
    AddItem,
    /// Zero-based index.
    RemoveItem(usize),
    /// Zero-based index.
    Item(usize, ItemEdit),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub customer_name: String,
    pub customer_address: String,
    pub payment_mode: PaymentMode,
    pub items: Vec<LineItemDraft>,
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        InvoiceDraft::new(PaymentMode::default())
    }
}

impl InvoiceDraft {
    /// A blank form with a single default phone line.
    pub fn new(payment_mode: PaymentMode) -> Self {
        InvoiceDraft {
            customer_name: String::new(),
            customer_address: String::new(),
            payment_mode,
            items: vec![LineItemDraft::default()],
        }
    }

    pub fn apply(mut self, edit: DraftEdit) -> Self {
        match edit {
            DraftEdit::CustomerName(name) => self.customer_name = name,
            DraftEdit::CustomerAddress(address) => self.customer_address = address,
            DraftEdit::PaymentMode(mode) => self.payment_mode = mode,
            DraftEdit::AddItem => self.items.push(LineItemDraft::default()),
            DraftEdit::RemoveItem(index) => {
                if self.items.len() > 1 && index < self.items.len() {
                    self.items.remove(index);
                } else {
                    debug!(index, len = self.items.len(), "refusing to remove item");
                }
            }
            DraftEdit::Item(index, edit) => {
                if index < self.items.len() {
                    let item = self.items.remove(index);
                    self.items.insert(index, item.apply(edit));
                } else {
                    debug!(index, len = self.items.len(), "edit for missing item ignored");
                }
            }
        }
        self
    }
}

impl From<InvoiceItem> for LineItemDraft {
    fn from(item: InvoiceItem) -> Self {
        let charger = |name: Option<String>, serial: Option<String>| ChargerDraft {
            name: name.unwrap_or_default(),
            serial_number: serial.unwrap_or_default(),
        };
        let details = match item.category {
            Category::Phone => ItemDetails::Phone {
                imei_1: item.imei_1.unwrap_or_default(),
                imei_2: item.imei_2.unwrap_or_default(),
                charger: item
                    .charger_included
                    .unwrap_or(false)
                    .then(|| charger(item.charger_name, item.charger_serial_number)),
            },
            Category::Charger => {
                ItemDetails::Charger(charger(item.charger_name, item.charger_serial_number))
            }
        };
        LineItemDraft {
            item_name: item.item_name,
            quantity: item.quantity,
            price: item.price,
            details,
        }
    }
}

impl From<InvoiceRequest> for InvoiceDraft {
    fn from(request: InvoiceRequest) -> Self {
        InvoiceDraft {
            customer_name: request.customer_name,
            customer_address: request.customer_address,
            payment_mode: request.payment_mode,
            items: request.items.into_iter().map(LineItemDraft::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone_with_charger() -> LineItemDraft {
        LineItemDraft::default()
            .apply(ItemEdit::Imei1("123456789012345".into()))
            .apply(ItemEdit::Imei2("543210987654321".into()))
            .apply(ItemEdit::ChargerIncluded(true))
            .apply(ItemEdit::ChargerName("Fast 25W".into()))
            .apply(ItemEdit::ChargerSerialNumber("SN-1".into()))
    }

    #[test]
    fn new_draft_has_one_blank_phone() {
        let draft = InvoiceDraft::default();
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].category(), Category::Phone);
        assert_eq!(draft.items[0].quantity, 1);
        assert!(!draft.items[0].charger_included());
        assert_eq!(draft.payment_mode.as_str(), "Cash");
    }

    #[test]
    fn phone_to_charger_drops_imeis_and_keeps_bundled_charger() {
        let item = phone_with_charger().apply(ItemEdit::Category(Category::Charger));
        assert_eq!(
            item.details,
            ItemDetails::Charger(ChargerDraft {
                name: "Fast 25W".into(),
                serial_number: "SN-1".into(),
            })
        );
        assert!(!item.charger_included());
    }

    #[test]
    fn charger_to_phone_drops_charger_fields() {
        let item = LineItemDraft::default()
            .apply(ItemEdit::Category(Category::Charger))
            .apply(ItemEdit::ChargerName("Cable".into()))
            .apply(ItemEdit::ChargerSerialNumber("C-9".into()))
            .apply(ItemEdit::Category(Category::Phone));

        assert_eq!(
            item.details,
            ItemDetails::Phone {
                imei_1: String::new(),
                imei_2: String::new(),
                charger: None,
            }
        );
    }

    #[test]
    fn toggling_charger_off_discards_its_fields() {
        let item = phone_with_charger()
            .apply(ItemEdit::ChargerIncluded(false))
            .apply(ItemEdit::ChargerIncluded(true));
        assert_eq!(item.charger(), Some(&ChargerDraft::default()));
    }

    #[test]
    fn same_category_keeps_fields() {
        let item = phone_with_charger();
        assert_eq!(item.clone().apply(ItemEdit::Category(Category::Phone)), item);
    }

    #[test]
    fn phone_only_edits_are_ignored_on_chargers() {
        let item = LineItemDraft::default().apply(ItemEdit::Category(Category::Charger));
        let edited = item
            .clone()
            .apply(ItemEdit::Imei1("1".into()))
            .apply(ItemEdit::ChargerIncluded(true));
        assert_eq!(edited, item);
    }

    #[test]
    fn charger_name_needs_a_charger() {
        let item = LineItemDraft::default().apply(ItemEdit::ChargerName("Orphan".into()));
        assert_eq!(item.charger(), None);
    }

    #[test]
    fn last_item_cannot_be_removed() {
        let draft = InvoiceDraft::default().apply(DraftEdit::RemoveItem(0));
        assert_eq!(draft.items.len(), 1);

        let draft = draft
            .apply(DraftEdit::AddItem)
            .apply(DraftEdit::Item(1, ItemEdit::Category(Category::Charger)))
            .apply(DraftEdit::RemoveItem(0));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].category(), Category::Charger);
    }

    #[test]
    fn out_of_range_item_edit_is_ignored() {
        let draft = InvoiceDraft::default();
        let edited = draft.clone().apply(DraftEdit::Item(3, ItemEdit::Quantity(5)));
        assert_eq!(edited, draft);
    }
}

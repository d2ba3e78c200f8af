use comfy_table::{Attribute, Cell, Table};
use inquire::{Confirm, InquireError, Select, Text};
use pos_invoice::config::Settings;
use pos_invoice::draft::{DraftEdit, InvoiceDraft, ItemDetails, ItemEdit, LineItemDraft};
use pos_invoice::model::{Category, InvoiceRecord, PaymentMode};
use pos_invoice::pdf::PdfDisplay;
use pos_invoice::validation::{ItemField, ValidationError};
use rust_decimal::Decimal;

pub type PromptResult<T> = Result<T, InquireError>;

const SEARCH_OPT: &str = "🔍 Search invoices";
const ALL_OPT: &str = "📋 Show all invoices";

// ==========================================
// 1. Customer & Items
// ==========================================

/// Fills in a fresh draft. The draft starts with one phone line, which
/// becomes the first item entered.
pub fn enter_draft(draft: InvoiceDraft, settings: &Settings) -> PromptResult<InvoiceDraft> {
    println!("\n--- Customer Details ---");
    let name = Text::new("Customer Name:").prompt()?;
    let address = Text::new("Customer Address:").prompt()?;
    let mut draft = draft
        .apply(DraftEdit::CustomerName(name))
        .apply(DraftEdit::CustomerAddress(address));

    println!("\n--- Items ---");
    let mut index = 0;
    loop {
        let item = enter_item(index, draft.items[index].clone())?;
        draft.items[index] = item;

        if !Confirm::new("Add another item?").with_default(false).prompt()? {
            break;
        }
        draft = draft.apply(DraftEdit::AddItem);
        index += 1;
    }

    let mode = select_payment_mode(settings, &draft.payment_mode)?;
    Ok(draft.apply(DraftEdit::PaymentMode(mode)))
}

fn enter_item(index: usize, item: LineItemDraft) -> PromptResult<LineItemDraft> {
    println!("\n[Item {}]", index + 1);
    let category = Select::new("Category:", Category::ALL.to_vec()).prompt()?;
    let mut item = item.apply(ItemEdit::Category(category));

    if category == Category::Phone {
        item = item.apply(ItemEdit::ItemName(Text::new("Item Name:").prompt()?));
    }
    item = item
        .apply(ItemEdit::Quantity(read_quantity()?))
        .apply(ItemEdit::Price(read_price()?));

    match category {
        Category::Phone => {
            item = item
                .apply(ItemEdit::Imei1(Text::new("IMEI 1:").prompt()?))
                .apply(ItemEdit::Imei2(Text::new("IMEI 2 (Optional):").prompt()?));
            let included = Confirm::new("Charger Included?").with_default(false).prompt()?;
            item = item.apply(ItemEdit::ChargerIncluded(included));
            if included {
                item = enter_charger(item)?;
            }
        }
        Category::Charger => item = enter_charger(item)?,
    }
    Ok(item)
}

fn enter_charger(item: LineItemDraft) -> PromptResult<LineItemDraft> {
    Ok(item
        .apply(ItemEdit::ChargerName(Text::new("Charger Name:").prompt()?))
        .apply(ItemEdit::ChargerSerialNumber(
            Text::new("Charger Serial Number (Optional):").prompt()?,
        )))
}

// Unparseable numbers become 0 and are caught by validation.
fn read_quantity() -> PromptResult<i64> {
    let raw = Text::new("Quantity:").with_default("1").prompt()?;
    Ok(raw.trim().parse().unwrap_or(0))
}

fn read_price() -> PromptResult<Decimal> {
    let raw = Text::new("Base Price:").prompt()?;
    Ok(raw.trim().parse().unwrap_or(Decimal::ZERO))
}

fn select_payment_mode(settings: &Settings, current: &PaymentMode) -> PromptResult<PaymentMode> {
    let modes = settings.payment_modes.clone();
    let start = modes.iter().position(|m| m == current).unwrap_or(0);
    Select::new("Payment Mode:", modes).with_starting_cursor(start).prompt()
}

/// Re-asks only the field the validator complained about.
pub fn fix(
    draft: InvoiceDraft,
    error: &ValidationError,
    settings: &Settings,
) -> PromptResult<InvoiceDraft> {
    let draft = match error {
        ValidationError::CustomerNameRequired => {
            draft.apply(DraftEdit::CustomerName(Text::new("Customer Name:").prompt()?))
        }
        ValidationError::CustomerAddressRequired => {
            draft.apply(DraftEdit::CustomerAddress(Text::new("Customer Address:").prompt()?))
        }
        ValidationError::PaymentModeNotAccepted(mode) => {
            let mode = select_payment_mode(settings, mode)?;
            draft.apply(DraftEdit::PaymentMode(mode))
        }
        ValidationError::NoItems => {
            let draft = draft.apply(DraftEdit::AddItem);
            let item = enter_item(0, draft.items[0].clone())?;
            InvoiceDraft { items: vec![item], ..draft }
        }
        ValidationError::Item { position, field, .. } => {
            let index = position - 1;
            println!("\n[Item {}]", position);
            let edit = match field {
                ItemField::ItemName => ItemEdit::ItemName(Text::new("Item Name:").prompt()?),
                ItemField::Quantity => ItemEdit::Quantity(read_quantity()?),
                ItemField::Price => ItemEdit::Price(read_price()?),
                ItemField::Imei1 => ItemEdit::Imei1(Text::new("IMEI 1:").prompt()?),
                ItemField::ChargerName => {
                    ItemEdit::ChargerName(Text::new("Charger Name:").prompt()?)
                }
            };
            draft.apply(DraftEdit::Item(index, edit))
        }
    };
    Ok(draft)
}

pub fn review_table(draft: &InvoiceDraft) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Category"),
        Cell::new("Item"),
        Cell::new("Qty"),
        Cell::new("Price"),
        Cell::new("IMEI / Serial"),
        Cell::new("Charger"),
    ]);

    let mut total = Decimal::ZERO;
    for (index, item) in draft.items.iter().enumerate() {
        let identifiers = match &item.details {
            ItemDetails::Phone { imei_1, imei_2, .. } => {
                [imei_1.as_str(), imei_2.as_str()]
                    .into_iter()
                    .filter(|s| !s.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" / ")
            }
            ItemDetails::Charger(charger) => charger.serial_number.clone(),
        };
        let charger = item.charger().map(|c| c.name.clone()).unwrap_or_else(|| "-".to_string());
        total += item.price * Decimal::from(item.quantity);

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(item.category()),
            Cell::new(&item.item_name),
            Cell::new(item.quantity),
            Cell::new(format!("{:.2}", item.price)),
            Cell::new(identifiers),
            Cell::new(charger),
        ]);
    }

    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(format!("{} / {}", draft.customer_name.trim(), draft.payment_mode)),
        Cell::new(""),
        Cell::new(format!("{:.2}", total)).add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
    ]);
    table
}

// ==========================================
// 2. History
// ==========================================

pub enum HistoryAction {
    Open(usize),
    Search(Option<String>),
    Done,
}

pub fn pick_record(records: &[InvoiceRecord]) -> PromptResult<HistoryAction> {
    let mut options = vec![SEARCH_OPT.to_string(), ALL_OPT.to_string()];
    options.extend(
        records
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {} | {}", i + 1, r.invoice_number, r.customer_name)),
    );

    let choice = Select::new("Open an invoice (Esc to quit):", options)
        .with_page_size(10)
        .prompt_skippable()?;

    Ok(match choice.as_deref() {
        None => HistoryAction::Done,
        Some(SEARCH_OPT) => {
            let term = Text::new("Search by invoice number or customer name:").prompt()?;
            HistoryAction::Search(Some(term))
        }
        Some(ALL_OPT) => HistoryAction::Search(None),
        Some(label) => label
            .split('.')
            .next()
            .and_then(|n| n.parse::<usize>().ok())
            .map(|n| HistoryAction::Open(n - 1))
            .unwrap_or(HistoryAction::Done),
    })
}

// ==========================================
// 3. Settings
// ==========================================

pub fn edit_settings(current: Settings) -> PromptResult<Settings> {
    println!("\n⚙️  --- Configuration Setup ---");

    let api_base_url =
        Text::new("Invoice service URL:").with_default(&current.api_base_url).prompt()?;

    let modes_default =
        current.payment_modes.iter().map(PaymentMode::as_str).collect::<Vec<_>>().join(", ");
    let modes_raw =
        Text::new("Payment modes (comma separated):").with_default(&modes_default).prompt()?;
    let mut payment_modes: Vec<PaymentMode> = modes_raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(PaymentMode::new)
        .collect();
    if payment_modes.is_empty() {
        println!("⚠️  No payment modes entered, keeping the previous list.");
        payment_modes = current.payment_modes.clone();
    }

    let start = payment_modes.iter().position(|m| *m == current.default_payment_mode).unwrap_or(0);
    let default_payment_mode = Select::new("Default payment mode:", payment_modes.clone())
        .with_starting_cursor(start)
        .prompt()?;

    let require_phone_item_name = Confirm::new("Require an item name for phones?")
        .with_default(current.require_phone_item_name)
        .prompt()?;

    let start = PdfDisplay::ALL.iter().position(|d| *d == current.pdf_display).unwrap_or(0);
    let pdf_display = Select::new("Show generated PDFs by:", PdfDisplay::ALL.to_vec())
        .with_starting_cursor(start)
        .prompt()?;

    let download_dir = Text::new("Download folder:").with_default(&current.download_dir).prompt()?;

    Ok(Settings {
        api_base_url,
        payment_modes,
        default_payment_mode,
        require_phone_item_name,
        pdf_display,
        download_dir,
    })
}

mod prompt;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, InquireError};
use pos_invoice::config::{self, Settings};
use pos_invoice::draft::InvoiceDraft;
use pos_invoice::error::{SubmitError, ValidationError};
use pos_invoice::flow::SubmissionFlow;
use pos_invoice::history::{self, HistoryQuery, HistoryView};
use pos_invoice::model::InvoiceRequest;
use pos_invoice::{HttpInvoiceService, logging, pdf, validation};
use reqwest::Url;

use crate::prompt::HistoryAction;

// ==========================================
// Structs & Enums
// ==========================================

#[derive(Parser)]
#[command(name = "pos-invoice")]
struct Cli {
    /// Log requests and state changes to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new invoice
    New {
        /// Read the invoice from a JSON or TOML file instead of prompting
        #[arg(long)]
        from: Option<PathBuf>,
        /// Print the request that would be sent and stop
        #[arg(long, requires = "from")]
        dry_run: bool,
    },
    /// List or search generated invoices
    History {
        /// Invoice number or customer name
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Configure service address, payment modes and PDF handling
    Config,
}

enum Next {
    Show(Url),
    Fix(ValidationError),
    Resubmit(String),
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help().ok();
        return;
    };

    if let Err(e) = run(command) {
        if let Some(InquireError::OperationCanceled | InquireError::OperationInterrupted) =
            e.downcast_ref::<InquireError>()
        {
            println!("Cancelled");
            return;
        }
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::New { from: Some(path), dry_run } => {
            let settings = Settings::load()?;
            submit_file(&settings, &path, dry_run)
        }
        Commands::New { from: None, .. } => {
            let settings = Settings::load()?;
            create_invoice(&settings)
        }
        Commands::History { search } => {
            let settings = Settings::load()?;
            browse_history(&settings, search)
        }
        Commands::Config => {
            let path = config::config_path();
            let current = Settings::load_from(&path).unwrap_or_else(|e| {
                println!("⚠️  {}. Starting from defaults.", e);
                Settings::default()
            });
            let settings = prompt::edit_settings(current)?;
            settings.save_to(&path)?;
            println!("✅ Settings saved to {:?}", path);
            Ok(())
        }
    }
}

fn connect(settings: &Settings) -> anyhow::Result<HttpInvoiceService> {
    HttpInvoiceService::new(&settings.api_base_url)
        .with_context(|| format!("cannot use invoice service at {}", settings.api_base_url))
}

// ==========================================
// 1. Create Invoice
// ==========================================

fn create_invoice(settings: &Settings) -> anyhow::Result<()> {
    let service = connect(settings)?;
    let policy = settings.policy();

    let blank = InvoiceDraft::new(settings.default_payment_mode.clone());
    let draft = prompt::enter_draft(blank, settings)?;
    let mut flow = SubmissionFlow::new(draft);

    loop {
        println!("\n--- Review ---");
        println!("{}", prompt::review_table(flow.draft()));
        if !Confirm::new("Generate invoice?").with_default(true).prompt()? {
            println!("❌ Aborted. Nothing was sent.");
            return Ok(());
        }

        println!("\n🔨 Generating invoice...");
        flow = flow.submit(&service, &policy, &settings.default_payment_mode);

        let next = match &flow {
            SubmissionFlow::Succeeded { pdf_url, .. } => Next::Show(pdf_url.clone()),
            SubmissionFlow::Idle { error: Some(SubmitError::Invalid(e)), .. } => {
                Next::Fix(e.clone())
            }
            SubmissionFlow::Idle { error: Some(e), .. } => Next::Resubmit(e.to_string()),
            other => bail!("submission ended in an unexpected state: {:?}", other),
        };

        match next {
            Next::Show(pdf_url) => {
                println!("✅ Invoice generated.");
                let shown = pdf::present(
                    settings.pdf_display,
                    &pdf_url,
                    service.client(),
                    &settings.download_path(),
                );
                if let Err(e) = shown {
                    println!("❌ {}", e);
                    println!("📄 Invoice PDF: {}", pdf_url);
                }
                flow = flow.acknowledge();
                if !Confirm::new("Create another invoice?").with_default(false).prompt()? {
                    return Ok(());
                }
                let fresh = prompt::enter_draft(flow.draft().clone(), settings)?;
                flow = flow.edit(|_| fresh);
            }
            Next::Fix(error) => {
                println!("❌ {}", error);
                let fixed = prompt::fix(flow.draft().clone(), &error, settings)?;
                flow = flow.edit(|_| fixed);
            }
            Next::Resubmit(message) => {
                println!("❌ {}", message);
                println!("Your entries were kept.");
            }
        }
    }
}

fn load_request(path: &Path) -> anyhow::Result<InvoiceRequest> {
    let content = fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    let request = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("invalid invoice JSON in {:?}", path))?,
        _ => toml::from_str(&content)
            .with_context(|| format!("invalid invoice TOML in {:?}", path))?,
    };
    Ok(request)
}

fn submit_file(settings: &Settings, path: &Path, dry_run: bool) -> anyhow::Result<()> {
    let policy = settings.policy();
    let draft = InvoiceDraft::from(load_request(path)?);

    if dry_run {
        let request = validation::prepare(&draft, &policy)?;
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let service = connect(settings)?;
    println!("🔨 Generating invoice for {}...", draft.customer_name.trim());
    match SubmissionFlow::new(draft).submit(&service, &policy, &settings.default_payment_mode) {
        SubmissionFlow::Succeeded { pdf_url, .. } => {
            println!("✅ Invoice generated.");
            let download_dir = settings.download_path();
            pdf::present(settings.pdf_display, &pdf_url, service.client(), &download_dir)?;
            Ok(())
        }
        SubmissionFlow::Idle { error: Some(e), .. } => Err(e.into()),
        other => bail!("submission ended in an unexpected state: {:?}", other),
    }
}

// ==========================================
// 2. History
// ==========================================

fn browse_history(settings: &Settings, search: Option<String>) -> anyhow::Result<()> {
    let service = connect(settings)?;
    let mut view = HistoryView::new(HistoryQuery::from_term(search.as_deref()));
    let mut reload = true;

    loop {
        if reload {
            reload = false;
            match view.refresh(&service) {
                Ok(()) => show_records(&view),
                Err(e) => println!("❌ {}", e),
            }
        }

        match prompt::pick_record(&view.records)? {
            HistoryAction::Done => return Ok(()),
            HistoryAction::Search(term) => {
                view.query = HistoryQuery::from_term(term.as_deref());
                reload = true;
            }
            HistoryAction::Open(index) => {
                let Some(record) = view.records.get(index) else { continue };
                match Url::parse(&record.pdf_url) {
                    Ok(url) => {
                        let shown = pdf::present(
                            settings.pdf_display,
                            &url,
                            service.client(),
                            &settings.download_path(),
                        );
                        if let Err(e) = shown {
                            println!("❌ {}", e);
                        }
                    }
                    Err(_) => {
                        println!("❌ Invoice {} has no valid PDF link.", record.invoice_number)
                    }
                }
            }
        }
    }
}

fn show_records(view: &HistoryView) {
    match &view.query {
        HistoryQuery::All => println!("\n--- Invoice History ---"),
        HistoryQuery::Search(term) => println!("\n--- Invoices matching \"{}\" ---", term),
    }
    if view.records.is_empty() {
        println!("(No invoices found)");
    } else {
        println!("{}", history::render_table(&view.records));
    }
}

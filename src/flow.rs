//! Submission state machine for the create-invoice screen.
//!
//! `Idle -> Submitting -> Succeeded`, or back to `Idle` carrying the error
//! and the untouched draft. There is no retry; the user resubmits.

use reqwest::Url;
use tracing::{debug, warn};

use crate::api::{ApiError, InvoiceService};
use crate::draft::InvoiceDraft;
use crate::model::{InvoiceRequest, PaymentMode};
use crate::validation::{self, ValidationError, ValidationPolicy};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Failed to generate invoice: {0}")]
    Service(#[from] ApiError),
}

#[derive(Debug)]
pub enum SubmissionFlow {
    Idle {
        draft: InvoiceDraft,
        error: Option<SubmitError>,
    },
    Submitting {
        draft: InvoiceDraft,
        request: InvoiceRequest,
    },
    Succeeded {
        pdf_url: Url,
        /// Fresh form to return to once the PDF has been shown.
        next: InvoiceDraft,
    },
}

impl SubmissionFlow {
    pub fn new(draft: InvoiceDraft) -> Self {
        SubmissionFlow::Idle { draft, error: None }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionFlow::Submitting { .. })
    }

    pub fn draft(&self) -> &InvoiceDraft {
        match self {
            SubmissionFlow::Idle { draft, .. } | SubmissionFlow::Submitting { draft, .. } => draft,
            SubmissionFlow::Succeeded { next, .. } => next,
        }
    }

    pub fn error(&self) -> Option<&SubmitError> {
        match self {
            SubmissionFlow::Idle { error, .. } => error.as_ref(),
            _ => None,
        }
    }

    /// Replaces the draft while idle, clearing the previous error.
    pub fn edit(self, f: impl FnOnce(InvoiceDraft) -> InvoiceDraft) -> Self {
        match self {
            SubmissionFlow::Idle { draft, .. } => SubmissionFlow::new(f(draft)),
            other => {
                debug!("draft is locked outside the idle state");
                other
            }
        }
    }

    /// Validates and normalizes the draft. Only a valid draft moves to
    /// `Submitting`; any other state is returned unchanged.
    pub fn begin(self, policy: &ValidationPolicy) -> Self {
        match self {
            SubmissionFlow::Idle { draft, .. } => match validation::prepare(&draft, policy) {
                Ok(request) => SubmissionFlow::Submitting { draft, request },
                Err(e) => {
                    debug!(error = %e, "draft rejected");
                    SubmissionFlow::Idle { draft, error: Some(e.into()) }
                }
            },
            other => {
                debug!("submission already in flight or finished");
                other
            }
        }
    }

    /// Resolves an in-flight submission with the service's answer.
    pub fn complete(self, outcome: Result<Url, ApiError>, payment_mode: PaymentMode) -> Self {
        match self {
            SubmissionFlow::Submitting { draft, .. } => match outcome {
                Ok(pdf_url) => {
                    SubmissionFlow::Succeeded { pdf_url, next: InvoiceDraft::new(payment_mode) }
                }
                Err(e) => {
                    warn!(error = %e, "invoice submission failed");
                    SubmissionFlow::Idle { draft, error: Some(e.into()) }
                }
            },
            other => other,
        }
    }

    /// `begin`, call the service, then `complete`.
    pub fn submit<S: InvoiceService>(
        self,
        service: &S,
        policy: &ValidationPolicy,
        default_mode: &PaymentMode,
    ) -> Self {
        let flow = self.begin(policy);
        let outcome = match &flow {
            SubmissionFlow::Submitting { request, .. } => Some(service.create_invoice(request)),
            _ => None,
        };
        match outcome {
            Some(outcome) => flow.complete(outcome, default_mode.clone()),
            None => flow,
        }
    }

    /// Leaves the result display, returning to an empty form.
    pub fn acknowledge(self) -> Self {
        match self {
            SubmissionFlow::Succeeded { next, .. } => SubmissionFlow::new(next),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use rust_decimal::Decimal;

    use super::*;
    use crate::draft::{DraftEdit, ItemEdit};
    use crate::model::{Category, InvoiceRecord};

    struct FakeService {
        answer: RefCell<Option<Result<Url, ApiError>>>,
        calls: Cell<usize>,
        last: RefCell<Option<InvoiceRequest>>,
    }

    impl FakeService {
        fn answering(answer: Result<Url, ApiError>) -> Self {
            FakeService {
                answer: RefCell::new(Some(answer)),
                calls: Cell::new(0),
                last: RefCell::new(None),
            }
        }
    }

    impl InvoiceService for FakeService {
        fn create_invoice(&self, request: &InvoiceRequest) -> Result<Url, ApiError> {
            self.calls.set(self.calls.get() + 1);
            *self.last.borrow_mut() = Some(request.clone());
            self.answer.borrow_mut().take().unwrap_or(Err(ApiError::MissingPdfUrl))
        }

        fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, ApiError> {
            Ok(Vec::new())
        }

        fn search_invoices(&self, _term: &str) -> Result<Vec<InvoiceRecord>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn raj_draft() -> InvoiceDraft {
        InvoiceDraft::default()
            .apply(DraftEdit::CustomerName("Raj".into()))
            .apply(DraftEdit::CustomerAddress("Delhi".into()))
            .apply(DraftEdit::Item(0, ItemEdit::ItemName("X".into())))
            .apply(DraftEdit::Item(0, ItemEdit::Price(Decimal::from(100))))
            .apply(DraftEdit::Item(0, ItemEdit::Imei1("123456789012345".into())))
    }

    fn pdf() -> Url {
        Url::parse("https://x/y.pdf").unwrap()
    }

    #[test]
    fn success_shows_pdf_and_resets_draft() {
        let service = FakeService::answering(Ok(pdf()));
        let flow = SubmissionFlow::new(raj_draft()).submit(
            &service,
            &ValidationPolicy::default(),
            &PaymentMode::default(),
        );

        match &flow {
            SubmissionFlow::Succeeded { pdf_url, next } => {
                assert_eq!(pdf_url.as_str(), "https://x/y.pdf");
                assert_eq!(next, &InvoiceDraft::default());
                assert_eq!(next.items[0].category(), Category::Phone);
            }
            other => panic!("unexpected state {other:?}"),
        }
        let sent = service.last.borrow().clone().unwrap();
        assert_eq!(sent.customer_name, "Raj");
        assert_eq!(sent.items[0].charger_name, None);

        let flow = flow.acknowledge();
        assert!(flow.error().is_none());
        assert_eq!(flow.draft(), &InvoiceDraft::default());
    }

    #[test]
    fn invalid_draft_never_reaches_the_service() {
        let service = FakeService::answering(Ok(pdf()));
        let draft = raj_draft().apply(DraftEdit::CustomerName(" ".into()));
        let flow = SubmissionFlow::new(draft.clone()).submit(
            &service,
            &ValidationPolicy::default(),
            &PaymentMode::default(),
        );

        assert_eq!(service.calls.get(), 0);
        assert_eq!(flow.draft(), &draft);
        assert!(matches!(
            flow.error(),
            Some(SubmitError::Invalid(ValidationError::CustomerNameRequired))
        ));
    }

    #[test]
    fn service_failure_keeps_the_draft() {
        let service = FakeService::answering(Err(ApiError::MissingPdfUrl));
        let flow = SubmissionFlow::new(raj_draft()).submit(
            &service,
            &ValidationPolicy::default(),
            &PaymentMode::default(),
        );

        assert_eq!(service.calls.get(), 1);
        assert_eq!(flow.draft(), &raj_draft());
        let error = flow.error().unwrap();
        assert_eq!(
            error.to_string(),
            "Failed to generate invoice: invoice service did not return a PDF link"
        );
    }

    #[test]
    fn second_begin_while_submitting_is_refused() {
        let policy = ValidationPolicy::default();
        let flow = SubmissionFlow::new(raj_draft()).begin(&policy);
        assert!(flow.is_submitting());

        let flow = flow.begin(&policy).edit(|d| d.apply(DraftEdit::CustomerName("Other".into())));
        assert!(flow.is_submitting());
        assert_eq!(flow.draft().customer_name, "Raj");
    }

    #[test]
    fn editing_clears_the_previous_error() {
        let policy = ValidationPolicy::default();
        let flow = SubmissionFlow::new(raj_draft().apply(DraftEdit::Item(0, ItemEdit::Quantity(0))))
            .begin(&policy);
        assert!(flow.error().is_some());

        let flow = flow
            .edit(|d| d.apply(DraftEdit::Item(0, ItemEdit::Quantity(2))))
            .begin(&policy);
        assert!(flow.is_submitting());
    }
}

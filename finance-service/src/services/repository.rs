//! Tenant-scoped document store and the guarded lifecycle operations.
//!
//! Every mutation recomputes totals through the calculator and checks
//! the status graph before touching state; totals are never patched
//! incrementally. Storage is an embedded concurrent map; a durable
//! backend is a drop-in replacement behind the same surface as long as
//! it preserves the (company, number) uniqueness constraint and the
//! append-only payment list.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use finance_core::error::AppError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    CreateDocument, CreateRecurringProfile, DocumentAction, DocumentStatus, DocumentType,
    EstimateStatus, FinancialDocument, InvoiceKind, LineItem, ListDocumentsFilter, Money, Payment,
    PayableStatus, RecordPayment, RecurringProfile, RecurringStatus, StatusGraph, UpdateDocument,
};
use crate::services::calculator;
use crate::services::metrics::{
    DOCUMENTS_TOTAL, ERRORS_TOTAL, OPERATION_DURATION, PAYMENTS_TOTAL, PAYMENT_AMOUNT_TOTAL,
    TRANSITIONS_TOTAL,
};
use crate::services::sequencer::NumberSequencer;

/// Numbering conflicts are expected under concurrent load and
/// self-resolving; anything past this many attempts is surfaced as
/// transient.
const MAX_NUMBERING_ATTEMPTS: u32 = 3;

/// In-process store for documents, numbering series and recurring
/// profiles, scoped per company on every query.
#[derive(Clone)]
pub struct FinanceRepository {
    documents: Arc<DashMap<Uuid, FinancialDocument>>,
    numbers: Arc<DashMap<(Uuid, String), Uuid>>,
    profiles: Arc<DashMap<Uuid, RecurringProfile>>,
    sequencer: Arc<NumberSequencer>,
}

fn not_found(entity: &str, id: Uuid) -> AppError {
    AppError::NotFound(anyhow!("{} {} not found", entity, id))
}

impl FinanceRepository {
    pub fn new(sequencer: NumberSequencer) -> Self {
        Self {
            documents: Arc::new(DashMap::new()),
            numbers: Arc::new(DashMap::new()),
            profiles: Arc::new(DashMap::new()),
            sequencer: Arc::new(sequencer),
        }
    }

    pub(crate) fn profiles_map(&self) -> &DashMap<Uuid, RecurringProfile> {
        &self.profiles
    }

    // -------------------------------------------------------------------------
    // Documents
    // -------------------------------------------------------------------------

    /// Create a document: validate and derive line items, compute totals,
    /// allocate a collision-free number and persist, all as one logical
    /// step. Recurring emission uses this same path.
    #[instrument(skip(self, input), fields(company_id = %input.company_id, doc_type = input.doc_type.as_str()))]
    pub fn create_document(&self, input: CreateDocument) -> Result<FinancialDocument, AppError> {
        self.create_document_with_id(Uuid::new_v4(), input)
    }

    pub(crate) fn create_document_with_id(
        &self,
        document_id: Uuid,
        input: CreateDocument,
    ) -> Result<FinancialDocument, AppError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["create_document"])
            .start_timer();

        if input.currency.trim().is_empty() {
            return Err(AppError::Validation(anyhow!("currency must be provided")));
        }

        let line_items = calculator::build_line_items(&input.line_items, &input.currency)?;
        let totals = calculator::compute_totals(&line_items)?;

        let invoice_kind = match input.doc_type {
            DocumentType::Invoice => Some(input.invoice_kind.unwrap_or(InvoiceKind::Domestic)),
            _ => None,
        };

        let due_date = input.due_date.or_else(|| {
            input
                .payment_terms
                .and_then(|terms| terms.due_date(input.issue_date))
        });

        let (document_number, fiscal_year) =
            self.allocate_number(input.company_id, input.doc_type, invoice_kind, input.issue_date, document_id)?;

        let now = Utc::now();
        let status = match (input.doc_type, input.save_as_draft) {
            (DocumentType::Estimate, true) => DocumentStatus::Estimate(EstimateStatus::Draft),
            (DocumentType::Estimate, false) => DocumentStatus::Estimate(EstimateStatus::Sent),
            (_, true) => DocumentStatus::Payable(PayableStatus::Draft),
            (_, false) => DocumentStatus::Payable(PayableStatus::Sent),
        };
        let sent_utc = (!input.save_as_draft).then_some(now);

        let document = FinancialDocument {
            document_id,
            company_id: input.company_id,
            doc_type: input.doc_type,
            invoice_kind,
            counterparty_id: input.counterparty_id,
            document_number: document_number.clone(),
            fiscal_year,
            issue_date: input.issue_date,
            due_date,
            payment_terms: input.payment_terms,
            currency: input.currency,
            status,
            line_items,
            subtotal: totals.subtotal,
            discount_total: totals.discount_total,
            tax_total: totals.tax_total,
            grand_total: totals.grand_total.clone(),
            paid_amount: Money::zero(totals.grand_total.currency()),
            balance_due: totals.grand_total,
            payments: Vec::new(),
            notes: input.notes,
            converted_to_invoice: false,
            converted_invoice_id: None,
            created_utc: now,
            sent_utc,
            paid_utc: None,
        };

        self.documents.insert(document_id, document.clone());

        DOCUMENTS_TOTAL
            .with_label_values(&[document.doc_type.as_str()])
            .inc();
        timer.observe_duration();

        info!(
            document_id = %document_id,
            document_number = %document_number,
            "Document created"
        );

        Ok(document)
    }

    /// Allocate the next series number and claim it in the uniqueness
    /// index. The entry lock makes the claim atomic; a claimed number is
    /// retried because a conflict here is expected to self-resolve.
    fn allocate_number(
        &self,
        company_id: Uuid,
        doc_type: DocumentType,
        kind: Option<InvoiceKind>,
        on_date: NaiveDate,
        document_id: Uuid,
    ) -> Result<(String, String), AppError> {
        for _ in 0..MAX_NUMBERING_ATTEMPTS {
            let (number, fiscal_year) =
                self.sequencer
                    .next_number(company_id, doc_type, kind, on_date);
            match self.numbers.entry((company_id, number.clone())) {
                Entry::Occupied(_) => {
                    ERRORS_TOTAL
                        .with_label_values(&["numbering_conflict"])
                        .inc();
                    continue;
                }
                Entry::Vacant(slot) => {
                    slot.insert(document_id);
                    return Ok((number, fiscal_year));
                }
            }
        }
        Err(AppError::Transient(anyhow!(
            "could not allocate a document number for company {} after {} attempts",
            company_id,
            MAX_NUMBERING_ATTEMPTS
        )))
    }

    #[instrument(skip(self), fields(company_id = %company_id, document_id = %document_id))]
    pub fn get_document(
        &self,
        company_id: Uuid,
        document_id: Uuid,
    ) -> Result<FinancialDocument, AppError> {
        let doc = self
            .documents
            .get(&document_id)
            .ok_or_else(|| not_found("document", document_id))?;
        if doc.company_id != company_id {
            return Err(not_found("document", document_id));
        }
        Ok(doc.clone())
    }

    #[instrument(skip(self, filter), fields(company_id = %company_id))]
    pub fn list_documents(
        &self,
        company_id: Uuid,
        filter: &ListDocumentsFilter,
    ) -> Vec<FinancialDocument> {
        let mut docs: Vec<FinancialDocument> = self
            .documents
            .iter()
            .filter(|entry| {
                let doc = entry.value();
                doc.company_id == company_id
                    && filter.doc_type.map_or(true, |t| doc.doc_type == t)
                    && filter
                        .status
                        .as_deref()
                        .map_or(true, |s| doc.status.as_str() == s)
                    && filter
                        .counterparty_id
                        .map_or(true, |c| doc.counterparty_id == Some(c))
            })
            .map(|entry| entry.value().clone())
            .collect();
        docs.sort_by(|a, b| {
            b.issue_date
                .cmp(&a.issue_date)
                .then(b.created_utc.cmp(&a.created_utc))
        });
        docs
    }

    /// Update a draft-side document. Rejected once money has moved
    /// (paid/partially_paid), once cancelled, or once an estimate has
    /// been converted. Line-item changes recompute every total.
    #[instrument(skip(self, update), fields(company_id = %company_id, document_id = %document_id))]
    pub fn update_document(
        &self,
        company_id: Uuid,
        document_id: Uuid,
        update: UpdateDocument,
    ) -> Result<FinancialDocument, AppError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["update_document"])
            .start_timer();

        let mut doc = self
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| not_found("document", document_id))?;
        if doc.company_id != company_id {
            return Err(not_found("document", document_id));
        }

        Self::ensure_mutable(&doc, "update")?;

        if let Some(counterparty_id) = update.counterparty_id {
            doc.counterparty_id = Some(counterparty_id);
        }
        if let Some(issue_date) = update.issue_date {
            doc.issue_date = issue_date;
        }
        if let Some(due_date) = update.due_date {
            doc.due_date = Some(due_date);
        }
        if let Some(terms) = update.payment_terms {
            doc.payment_terms = Some(terms);
        }
        if let Some(notes) = update.notes {
            doc.notes = Some(notes);
        }

        if let Some(inputs) = update.line_items {
            let line_items = calculator::build_line_items(&inputs, &doc.currency)?;
            let totals = calculator::compute_totals(&line_items)?;
            let balance = totals.grand_total.subtract(&doc.paid_amount)?;
            doc.line_items = line_items;
            doc.subtotal = totals.subtotal;
            doc.discount_total = totals.discount_total;
            doc.tax_total = totals.tax_total;
            doc.grand_total = totals.grand_total;
            doc.balance_due = balance;
        }

        timer.observe_duration();
        Ok(doc.clone())
    }

    /// Delete a document. A document with recorded money movement is
    /// never hard-deleted, and a converted estimate is frozen; both are
    /// enforced here independent of any client-side guard.
    #[instrument(skip(self), fields(company_id = %company_id, document_id = %document_id))]
    pub fn delete_document(&self, company_id: Uuid, document_id: Uuid) -> Result<(), AppError> {
        {
            let doc = self
                .documents
                .get(&document_id)
                .ok_or_else(|| not_found("document", document_id))?;
            if doc.company_id != company_id {
                return Err(not_found("document", document_id));
            }
            Self::ensure_deletable(&doc)?;
        }

        let removed = self.documents.remove_if(&document_id, |_, doc| {
            doc.company_id == company_id && Self::ensure_deletable(doc).is_ok()
        });

        match removed {
            Some((_, doc)) => {
                self.numbers
                    .remove(&(company_id, doc.document_number.clone()));
                info!(document_number = %doc.document_number, "Document deleted");
                Ok(())
            }
            // A payment slipped in between the check and the removal.
            None => Err(AppError::Conflict(anyhow!(
                "document {} changed while being deleted",
                document_id
            ))),
        }
    }

    fn ensure_mutable(doc: &FinancialDocument, operation: &'static str) -> Result<(), AppError> {
        if doc.converted_to_invoice {
            return Err(AppError::ConversionConflict {
                estimate_id: doc.document_id,
            });
        }
        if let Some(status) = doc.status.payable() {
            if matches!(
                status,
                PayableStatus::Paid | PayableStatus::PartiallyPaid | PayableStatus::Cancelled
            ) {
                return Err(AppError::InvalidTransition {
                    entity_id: doc.document_id,
                    operation,
                    current: status.as_str().to_string(),
                });
            }
        }
        Ok(())
    }

    fn ensure_deletable(doc: &FinancialDocument) -> Result<(), AppError> {
        if doc.converted_to_invoice {
            return Err(AppError::ConversionConflict {
                estimate_id: doc.document_id,
            });
        }
        if let Some(status) = doc.status.payable() {
            if matches!(status, PayableStatus::Paid | PayableStatus::PartiallyPaid) {
                return Err(AppError::InvalidTransition {
                    entity_id: doc.document_id,
                    operation: "delete",
                    current: status.as_str().to_string(),
                });
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Apply a guarded lifecycle action. Illegal edges are rejected with
    /// the current status so the caller can reconcile its view.
    #[instrument(skip(self), fields(company_id = %company_id, document_id = %document_id, action = action.as_str()))]
    pub fn transition(
        &self,
        company_id: Uuid,
        document_id: Uuid,
        action: DocumentAction,
        today: NaiveDate,
    ) -> Result<FinancialDocument, AppError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["transition"])
            .start_timer();

        let result = match action {
            DocumentAction::MarkSent => self.mark_sent(company_id, document_id),
            DocumentAction::MarkViewed => self.mark_viewed(company_id, document_id),
            DocumentAction::MarkPaid => self.mark_paid(company_id, document_id, today),
            DocumentAction::Cancel => self.cancel(company_id, document_id),
            DocumentAction::Accept => {
                self.advance_estimate(company_id, document_id, EstimateStatus::Accepted, "accept")
            }
            DocumentAction::Reject => {
                self.advance_estimate(company_id, document_id, EstimateStatus::Rejected, "reject")
            }
            DocumentAction::MarkExpired => self.advance_estimate(
                company_id,
                document_id,
                EstimateStatus::Expired,
                "mark_expired",
            ),
            DocumentAction::ConvertToInvoice => {
                self.convert_to_invoice(company_id, document_id, today)
            }
        };

        if let Ok(ref doc) = result {
            TRANSITIONS_TOTAL
                .with_label_values(&[doc.doc_type.as_str(), action.as_str()])
                .inc();
        }
        timer.observe_duration();
        result
    }

    fn mark_sent(
        &self,
        company_id: Uuid,
        document_id: Uuid,
    ) -> Result<FinancialDocument, AppError> {
        let mut doc = self.document_mut(company_id, document_id)?;
        let next = match doc.status {
            DocumentStatus::Payable(s) => {
                Self::check_edge(document_id, s, PayableStatus::Sent, "mark_sent")?;
                DocumentStatus::Payable(PayableStatus::Sent)
            }
            DocumentStatus::Estimate(s) => {
                Self::check_edge(document_id, s, EstimateStatus::Sent, "mark_sent")?;
                DocumentStatus::Estimate(EstimateStatus::Sent)
            }
        };
        doc.status = next;
        doc.sent_utc = Some(Utc::now());
        Ok(doc.clone())
    }

    fn mark_viewed(
        &self,
        company_id: Uuid,
        document_id: Uuid,
    ) -> Result<FinancialDocument, AppError> {
        let mut doc = self.document_mut(company_id, document_id)?;
        let next = match doc.status {
            DocumentStatus::Payable(s) => {
                Self::check_edge(document_id, s, PayableStatus::Viewed, "mark_viewed")?;
                DocumentStatus::Payable(PayableStatus::Viewed)
            }
            DocumentStatus::Estimate(s) => {
                Self::check_edge(document_id, s, EstimateStatus::Viewed, "mark_viewed")?;
                DocumentStatus::Estimate(EstimateStatus::Viewed)
            }
        };
        doc.status = next;
        Ok(doc.clone())
    }

    /// Convenience form of `record_payment` that settles the open
    /// balance in full.
    fn mark_paid(
        &self,
        company_id: Uuid,
        document_id: Uuid,
        today: NaiveDate,
    ) -> Result<FinancialDocument, AppError> {
        let balance = {
            let doc = self
                .documents
                .get(&document_id)
                .ok_or_else(|| not_found("document", document_id))?;
            if doc.company_id != company_id {
                return Err(not_found("document", document_id));
            }
            doc.balance_due.to_major()
        };

        self.record_payment(
            company_id,
            document_id,
            RecordPayment {
                amount: balance,
                currency: None,
                date: today,
                method: crate::models::PaymentMethod::BankTransfer,
                reference: None,
            },
        )
    }

    /// Cancel a payable document. Only reachable from draft or sent, and
    /// only while no payment has been recorded.
    fn cancel(&self, company_id: Uuid, document_id: Uuid) -> Result<FinancialDocument, AppError> {
        let mut doc = self.document_mut(company_id, document_id)?;
        let Some(status) = doc.status.payable() else {
            return Err(AppError::BadRequest(anyhow!(
                "cancel does not apply to estimates; use reject"
            )));
        };
        if !doc.payments.is_empty() {
            return Err(AppError::InvalidTransition {
                entity_id: document_id,
                operation: "cancel",
                current: status.as_str().to_string(),
            });
        }
        Self::check_edge(document_id, status, PayableStatus::Cancelled, "cancel")?;
        doc.status = DocumentStatus::Payable(PayableStatus::Cancelled);
        Ok(doc.clone())
    }

    fn advance_estimate(
        &self,
        company_id: Uuid,
        document_id: Uuid,
        next: EstimateStatus,
        operation: &'static str,
    ) -> Result<FinancialDocument, AppError> {
        let mut doc = self.document_mut(company_id, document_id)?;
        let Some(status) = doc.status.estimate() else {
            return Err(AppError::BadRequest(anyhow!(
                "{} only applies to estimates",
                operation
            )));
        };
        if doc.converted_to_invoice {
            return Err(AppError::ConversionConflict {
                estimate_id: document_id,
            });
        }
        Self::check_edge(document_id, status, next, operation)?;
        doc.status = DocumentStatus::Estimate(next);
        Ok(doc.clone())
    }

    /// Turn an accepted estimate into a new invoice. The conversion is
    /// reserved on the estimate under its entry lock before the invoice
    /// is created, and rolled back if creation fails, so either both
    /// writes land or neither does.
    fn convert_to_invoice(
        &self,
        company_id: Uuid,
        document_id: Uuid,
        today: NaiveDate,
    ) -> Result<FinancialDocument, AppError> {
        let invoice_id = Uuid::new_v4();

        let create_input = {
            let mut doc = self.document_mut(company_id, document_id)?;
            if doc.doc_type != DocumentType::Estimate {
                return Err(AppError::BadRequest(anyhow!(
                    "only estimates can be converted to invoices"
                )));
            }
            if doc.converted_to_invoice {
                return Err(AppError::ConversionConflict {
                    estimate_id: document_id,
                });
            }
            if doc.status.estimate() != Some(EstimateStatus::Accepted) {
                return Err(AppError::InvalidTransition {
                    entity_id: document_id,
                    operation: "convert_to_invoice",
                    current: doc.status.as_str().to_string(),
                });
            }

            doc.converted_to_invoice = true;
            doc.converted_invoice_id = Some(invoice_id);

            CreateDocument {
                company_id,
                doc_type: DocumentType::Invoice,
                invoice_kind: Some(InvoiceKind::Domestic),
                counterparty_id: doc.counterparty_id,
                issue_date: today,
                due_date: None,
                payment_terms: doc.payment_terms,
                currency: doc.currency.clone(),
                notes: doc.notes.clone(),
                line_items: doc.line_items.iter().map(LineItem::to_input).collect(),
                save_as_draft: true,
            }
        };

        match self.create_document_with_id(invoice_id, create_input) {
            Ok(invoice) => {
                info!(
                    estimate_id = %document_id,
                    invoice_id = %invoice.document_id,
                    invoice_number = %invoice.document_number,
                    "Estimate converted to invoice"
                );
                self.get_document(company_id, document_id)
            }
            Err(e) => {
                if let Some(mut doc) = self.documents.get_mut(&document_id) {
                    doc.converted_to_invoice = false;
                    doc.converted_invoice_id = None;
                }
                Err(e)
            }
        }
    }

    fn check_edge<S: StatusGraph + HasStatusName>(
        entity_id: Uuid,
        current: S,
        next: S,
        operation: &'static str,
    ) -> Result<(), AppError> {
        if !current.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                entity_id,
                operation,
                current: current.status_name().to_string(),
            });
        }
        Ok(())
    }

    fn document_mut(
        &self,
        company_id: Uuid,
        document_id: Uuid,
    ) -> Result<dashmap::mapref::one::RefMut<'_, Uuid, FinancialDocument>, AppError> {
        let doc = self
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| not_found("document", document_id))?;
        if doc.company_id != company_id {
            return Err(not_found("document", document_id));
        }
        Ok(doc)
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// Append a payment and re-derive paid amount, balance and status
    /// from the full payment list. Overpayment is accepted and surfaced
    /// as a negative balance; clamping it would hide a reconciliation
    /// error from the caller.
    #[instrument(skip(self, input), fields(company_id = %company_id, document_id = %document_id))]
    pub fn record_payment(
        &self,
        company_id: Uuid,
        document_id: Uuid,
        input: RecordPayment,
    ) -> Result<FinancialDocument, AppError> {
        let timer = OPERATION_DURATION
            .with_label_values(&["record_payment"])
            .start_timer();

        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation(anyhow!(
                "payment amount must be positive"
            )));
        }

        let mut doc = self.document_mut(company_id, document_id)?;
        let Some(status) = doc.status.payable() else {
            return Err(AppError::BadRequest(anyhow!(
                "estimates do not accept payments"
            )));
        };
        if matches!(status, PayableStatus::Draft | PayableStatus::Cancelled) {
            return Err(AppError::InvalidTransition {
                entity_id: document_id,
                operation: "record_payment",
                current: status.as_str().to_string(),
            });
        }

        if let Some(ref currency) = input.currency {
            if currency != &doc.currency {
                return Err(AppError::CurrencyMismatch {
                    expected: doc.currency.clone(),
                    found: currency.clone(),
                });
            }
        }

        let amount = Money::from_major(input.amount, &doc.currency);
        let payment = Payment {
            payment_id: Uuid::new_v4(),
            amount,
            date: input.date,
            method: input.method,
            reference: input.reference,
            recorded_utc: Utc::now(),
        };

        PAYMENTS_TOTAL
            .with_label_values(&[payment.method.as_str()])
            .inc();
        PAYMENT_AMOUNT_TOTAL
            .with_label_values(&[doc.currency.as_str()])
            .inc_by(payment.amount.to_major().to_f64().unwrap_or(0.0));

        doc.payments.push(payment);

        let mut paid = Money::zero(&doc.currency);
        for p in &doc.payments {
            paid = paid.add(&p.amount)?;
        }
        let balance = doc.grand_total.subtract(&paid)?;
        let fully_paid = paid.compare(&doc.grand_total)? != Ordering::Less;

        doc.paid_amount = paid;
        doc.balance_due = balance;
        doc.status = DocumentStatus::Payable(if fully_paid {
            PayableStatus::Paid
        } else {
            PayableStatus::PartiallyPaid
        });
        if fully_paid && doc.paid_utc.is_none() {
            doc.paid_utc = Some(Utc::now());
        }

        timer.observe_duration();
        info!(
            paid_amount = %doc.paid_amount.to_major(),
            balance_due = %doc.balance_due.to_major(),
            "Payment recorded"
        );

        Ok(doc.clone())
    }

    /// Copy an existing document into a fresh draft issued today.
    #[instrument(skip(self), fields(company_id = %company_id, document_id = %document_id))]
    pub fn duplicate_document(
        &self,
        company_id: Uuid,
        document_id: Uuid,
        today: NaiveDate,
    ) -> Result<FinancialDocument, AppError> {
        let source = self.get_document(company_id, document_id)?;
        self.create_document(CreateDocument {
            company_id,
            doc_type: source.doc_type,
            invoice_kind: source.invoice_kind,
            counterparty_id: source.counterparty_id,
            issue_date: today,
            due_date: None,
            payment_terms: source.payment_terms,
            currency: source.currency.clone(),
            notes: source.notes.clone(),
            line_items: source.line_items.iter().map(LineItem::to_input).collect(),
            save_as_draft: true,
        })
    }

    /// The number the next create would receive; not a reservation.
    pub fn preview_number(
        &self,
        company_id: Uuid,
        doc_type: DocumentType,
        kind: Option<InvoiceKind>,
        on_date: NaiveDate,
    ) -> String {
        self.sequencer
            .preview_number(company_id, doc_type, kind, on_date)
    }

    // -------------------------------------------------------------------------
    // Recurring profiles
    // -------------------------------------------------------------------------

    /// Create a recurring profile. The template is validated through the
    /// calculator up front so a profile can never emit an invalid
    /// invoice later. The first run is due on the start date itself.
    #[instrument(skip(self, input), fields(company_id = %input.company_id))]
    pub fn create_profile(
        &self,
        input: CreateRecurringProfile,
    ) -> Result<RecurringProfile, AppError> {
        calculator::build_line_items(&input.line_items, &input.currency)?;

        if let Some(end) = input.end_date {
            if end < input.start_date {
                return Err(AppError::Validation(anyhow!(
                    "end date must not precede the start date"
                )));
            }
        }
        if input.max_occurrences == Some(0) {
            return Err(AppError::Validation(anyhow!(
                "max occurrences must be at least 1"
            )));
        }

        let profile = RecurringProfile {
            profile_id: Uuid::new_v4(),
            company_id: input.company_id,
            counterparty_id: input.counterparty_id,
            invoice_kind: input.invoice_kind,
            frequency: input.frequency,
            start_date: input.start_date,
            end_date: input.end_date,
            max_occurrences: input.max_occurrences,
            occurrence_count: 0,
            status: RecurringStatus::Active,
            next_run: input.start_date,
            last_run: None,
            line_items: input.line_items,
            currency: input.currency,
            payment_terms: input.payment_terms,
            auto_send: input.auto_send,
            notes: input.notes,
            created_utc: Utc::now(),
        };

        self.profiles.insert(profile.profile_id, profile.clone());
        info!(profile_id = %profile.profile_id, frequency = profile.frequency.as_str(), "Recurring profile created");
        Ok(profile)
    }

    pub fn get_profile(
        &self,
        company_id: Uuid,
        profile_id: Uuid,
    ) -> Result<RecurringProfile, AppError> {
        let profile = self
            .profiles
            .get(&profile_id)
            .ok_or_else(|| not_found("recurring profile", profile_id))?;
        if profile.company_id != company_id {
            return Err(not_found("recurring profile", profile_id));
        }
        Ok(profile.clone())
    }

    pub fn list_profiles(&self, company_id: Uuid) -> Vec<RecurringProfile> {
        let mut profiles: Vec<RecurringProfile> = self
            .profiles
            .iter()
            .filter(|entry| entry.company_id == company_id)
            .map(|entry| entry.value().clone())
            .collect();
        profiles.sort_by_key(|p| p.next_run);
        profiles
    }

    #[instrument(skip(self), fields(company_id = %company_id, profile_id = %profile_id))]
    pub fn pause_profile(
        &self,
        company_id: Uuid,
        profile_id: Uuid,
    ) -> Result<RecurringProfile, AppError> {
        let mut profile = self.profile_mut(company_id, profile_id)?;
        if profile.status != RecurringStatus::Active {
            return Err(AppError::InvalidTransition {
                entity_id: profile_id,
                operation: "pause",
                current: profile.status.as_str().to_string(),
            });
        }
        profile.status = RecurringStatus::Paused;
        Ok(profile.clone())
    }

    /// Resume a paused profile, rescheduling the next run one period
    /// from today rather than emitting a backlog of missed periods.
    #[instrument(skip(self), fields(company_id = %company_id, profile_id = %profile_id))]
    pub fn resume_profile(
        &self,
        company_id: Uuid,
        profile_id: Uuid,
        today: NaiveDate,
    ) -> Result<RecurringProfile, AppError> {
        let mut profile = self.profile_mut(company_id, profile_id)?;
        if profile.status != RecurringStatus::Paused {
            return Err(AppError::InvalidTransition {
                entity_id: profile_id,
                operation: "resume",
                current: profile.status.as_str().to_string(),
            });
        }
        let next_run = profile.frequency.advance(today);
        profile.status = RecurringStatus::Active;
        profile.next_run = next_run;
        Ok(profile.clone())
    }

    fn profile_mut(
        &self,
        company_id: Uuid,
        profile_id: Uuid,
    ) -> Result<dashmap::mapref::one::RefMut<'_, Uuid, RecurringProfile>, AppError> {
        let profile = self
            .profiles
            .get_mut(&profile_id)
            .ok_or_else(|| not_found("recurring profile", profile_id))?;
        if profile.company_id != company_id {
            return Err(not_found("recurring profile", profile_id));
        }
        Ok(profile)
    }
}

/// Helper so the generic edge check can name the current status in
/// errors without knowing the concrete graph.
pub trait HasStatusName {
    fn status_name(&self) -> &'static str;
}

impl HasStatusName for PayableStatus {
    fn status_name(&self) -> &'static str {
        self.as_str()
    }
}

impl HasStatusName for EstimateStatus {
    fn status_name(&self) -> &'static str {
        self.as_str()
    }
}

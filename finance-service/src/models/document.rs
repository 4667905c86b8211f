//! Financial document model shared by Invoices, Bills and Estimates.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    DocumentStatus, EstimateStatus, LineItem, LineItemInput, Money, Payment, PayableStatus,
};

/// Document type. Each type has its own status graph but shares the
/// calculation and numbering substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Bill,
    Estimate,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Bill => "bill",
            DocumentType::Estimate => "estimate",
        }
    }
}

/// Invoice subtype; selects the numbering series (INV- vs EXP-).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    Domestic,
    Export,
}

/// Payment terms; drive due-date derivation when the caller does not
/// supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTerms {
    DueOnReceipt,
    #[serde(rename = "net_7")]
    Net7,
    #[serde(rename = "net_15")]
    Net15,
    #[serde(rename = "net_30")]
    Net30,
    #[serde(rename = "net_45")]
    Net45,
    #[serde(rename = "net_60")]
    Net60,
    Custom,
}

impl PaymentTerms {
    /// Due date for a document issued on `issue_date`; `Custom` leaves
    /// the due date to the caller.
    pub fn due_date(&self, issue_date: NaiveDate) -> Option<NaiveDate> {
        let days = match self {
            PaymentTerms::DueOnReceipt => 0,
            PaymentTerms::Net7 => 7,
            PaymentTerms::Net15 => 15,
            PaymentTerms::Net30 => 30,
            PaymentTerms::Net45 => 45,
            PaymentTerms::Net60 => 60,
            PaymentTerms::Custom => return None,
        };
        Some(issue_date + Duration::days(days))
    }
}

/// A financial document: Invoice, Bill or Estimate.
///
/// Stored totals are always the output of the line-item calculator for
/// the current `line_items`; `balance_due` is `grand_total` minus the
/// payment sum and may go negative under overpayment.
#[derive(Debug, Clone)]
pub struct FinancialDocument {
    pub document_id: Uuid,
    pub company_id: Uuid,
    pub doc_type: DocumentType,
    pub invoice_kind: Option<InvoiceKind>,
    pub counterparty_id: Option<Uuid>,
    pub document_number: String,
    pub fiscal_year: String,
    pub issue_date: NaiveDate,
    /// Due date for payables, expiry date for estimates.
    pub due_date: Option<NaiveDate>,
    pub payment_terms: Option<PaymentTerms>,
    pub currency: String,
    pub status: DocumentStatus,
    pub line_items: Vec<LineItem>,
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub grand_total: Money,
    pub paid_amount: Money,
    pub balance_due: Money,
    pub payments: Vec<Payment>,
    pub notes: Option<String>,
    pub converted_to_invoice: bool,
    pub converted_invoice_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub sent_utc: Option<DateTime<Utc>>,
    pub paid_utc: Option<DateTime<Utc>>,
}

impl FinancialDocument {
    pub fn is_payable(&self) -> bool {
        matches!(self.doc_type, DocumentType::Invoice | DocumentType::Bill)
    }

    /// Display status as of `today`. `overdue` and date-based `expired`
    /// are derived here rather than persisted, so no sweep job is
    /// needed and the value is never stale.
    pub fn display_status(&self, today: NaiveDate) -> &'static str {
        match self.status {
            DocumentStatus::Payable(
                s @ (PayableStatus::Sent | PayableStatus::Viewed | PayableStatus::PartiallyPaid),
            ) => match self.due_date {
                Some(due) if today > due && self.balance_due.is_positive() => "overdue",
                _ => s.as_str(),
            },
            DocumentStatus::Estimate(
                s @ (EstimateStatus::Draft | EstimateStatus::Sent | EstimateStatus::Viewed),
            ) => match self.due_date {
                Some(expiry) if today > expiry && !self.converted_to_invoice => "expired",
                _ => s.as_str(),
            },
            s => s.as_str(),
        }
    }
}

/// Input for creating a document.
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub company_id: Uuid,
    pub doc_type: DocumentType,
    pub invoice_kind: Option<InvoiceKind>,
    pub counterparty_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub payment_terms: Option<PaymentTerms>,
    pub currency: String,
    pub notes: Option<String>,
    pub line_items: Vec<LineItemInput>,
    pub save_as_draft: bool,
}

/// Input for updating a document (draft-side only; rejected once money
/// has moved or an estimate has been converted).
#[derive(Debug, Clone, Default)]
pub struct UpdateDocument {
    pub counterparty_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_terms: Option<PaymentTerms>,
    pub notes: Option<String>,
    pub line_items: Option<Vec<LineItemInput>>,
}

/// Filter parameters for listing documents.
#[derive(Debug, Clone, Default)]
pub struct ListDocumentsFilter {
    pub doc_type: Option<DocumentType>,
    pub status: Option<String>,
    pub counterparty_id: Option<Uuid>,
}

/// Guarded lifecycle actions accepted by the transition endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentAction {
    MarkSent,
    MarkViewed,
    MarkPaid,
    Cancel,
    Accept,
    Reject,
    MarkExpired,
    ConvertToInvoice,
}

impl DocumentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentAction::MarkSent => "mark_sent",
            DocumentAction::MarkViewed => "mark_viewed",
            DocumentAction::MarkPaid => "mark_paid",
            DocumentAction::Cancel => "cancel",
            DocumentAction::Accept => "accept",
            DocumentAction::Reject => "reject",
            DocumentAction::MarkExpired => "mark_expired",
            DocumentAction::ConvertToInvoice => "convert_to_invoice",
        }
    }
}

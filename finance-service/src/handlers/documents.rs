//! Document endpoints: create, read, update, delete, transitions,
//! payments and duplication.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use finance_core::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::CompanyContext;
use crate::models::{
    CreateDocument, DocumentAction, DocumentType, FinancialDocument, InvoiceKind, LineItem,
    LineItemInput, ListDocumentsFilter, Money, Payment, PaymentTerms, UpdateDocument,
};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    pub doc_type: DocumentType,
    #[serde(default)]
    pub invoice_kind: Option<InvoiceKind>,
    #[serde(default)]
    pub counterparty_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_terms: Option<PaymentTerms>,
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub line_items: Vec<LineItemInput>,
    #[serde(default = "default_save_as_draft")]
    pub save_as_draft: bool,
}

fn default_save_as_draft() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub counterparty_id: Option<Uuid>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_terms: Option<PaymentTerms>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Option<Vec<LineItemInput>>,
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    #[serde(default)]
    pub doc_type: Option<DocumentType>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub counterparty_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub action: DocumentAction,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    pub date: NaiveDate,
    pub method: crate::models::PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Wire shape of a document. The `status` field is the display status
/// as of today, so `overdue` and date-based `expired` appear here even
/// though they are never persisted.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document_id: Uuid,
    pub company_id: Uuid,
    pub doc_type: DocumentType,
    pub invoice_kind: Option<InvoiceKind>,
    pub counterparty_id: Option<Uuid>,
    pub document_number: String,
    pub fiscal_year: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub payment_terms: Option<PaymentTerms>,
    pub currency: String,
    pub status: String,
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

impl DocumentResponse {
    pub fn from_document(doc: FinancialDocument, today: NaiveDate) -> Self {
        let status = doc.display_status(today).to_string();
        Self {
            document_id: doc.document_id,
            company_id: doc.company_id,
            doc_type: doc.doc_type,
            invoice_kind: doc.invoice_kind,
            counterparty_id: doc.counterparty_id,
            document_number: doc.document_number,
            fiscal_year: doc.fiscal_year,
            issue_date: doc.issue_date,
            due_date: doc.due_date,
            payment_terms: doc.payment_terms,
            currency: doc.currency,
            status,
            line_items: doc.line_items,
            subtotal: doc.subtotal,
            discount_total: doc.discount_total,
            tax_total: doc.tax_total,
            grand_total: doc.grand_total,
            paid_amount: doc.paid_amount,
            balance_due: doc.balance_due,
            payments: doc.payments,
            notes: doc.notes,
            converted_to_invoice: doc.converted_to_invoice,
            converted_invoice_id: doc.converted_invoice_id,
            created_utc: doc.created_utc,
            sent_utc: doc.sent_utc,
            paid_utc: doc.paid_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub total: usize,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub async fn create_document(
    State(state): State<AppState>,
    company: CompanyContext,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let document = state.repository.create_document(CreateDocument {
        company_id: company.company_id,
        doc_type: request.doc_type,
        invoice_kind: request.invoice_kind,
        counterparty_id: request.counterparty_id,
        issue_date: request.issue_date,
        due_date: request.due_date,
        payment_terms: request.payment_terms,
        currency: request.currency,
        notes: request.notes,
        line_items: request.line_items,
        save_as_draft: request.save_as_draft,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from_document(document, today())),
    ))
}

pub async fn list_documents(
    State(state): State<AppState>,
    company: CompanyContext,
    Query(params): Query<ListDocumentsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ListDocumentsFilter {
        doc_type: params.doc_type,
        status: params.status,
        counterparty_id: params.counterparty_id,
    };
    let on = today();
    let documents: Vec<DocumentResponse> = state
        .repository
        .list_documents(company.company_id, &filter)
        .into_iter()
        .map(|doc| DocumentResponse::from_document(doc, on))
        .collect();

    let total = documents.len();
    Ok(Json(DocumentListResponse { documents, total }))
}

pub async fn get_document(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = state
        .repository
        .get_document(company.company_id, document_id)?;
    Ok(Json(DocumentResponse::from_document(document, today())))
}

pub async fn update_document(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(document_id): Path<Uuid>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let document = state.repository.update_document(
        company.company_id,
        document_id,
        UpdateDocument {
            counterparty_id: request.counterparty_id,
            issue_date: request.issue_date,
            due_date: request.due_date,
            payment_terms: request.payment_terms,
            notes: request.notes,
            line_items: request.line_items,
        },
    )?;
    Ok(Json(DocumentResponse::from_document(document, today())))
}

pub async fn delete_document(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .repository
        .delete_document(company.company_id, document_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transition_document(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(document_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let on = today();
    let document =
        state
            .repository
            .transition(company.company_id, document_id, request.action, on)?;
    Ok(Json(DocumentResponse::from_document(document, on)))
}

pub async fn record_payment(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(document_id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let document = state.repository.record_payment(
        company.company_id,
        document_id,
        crate::models::RecordPayment {
            amount: request.amount,
            currency: request.currency,
            date: request.date,
            method: request.method,
            reference: request.reference,
        },
    )?;
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from_document(document, today())),
    ))
}

pub async fn duplicate_document(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let on = today();
    let document = state
        .repository
        .duplicate_document(company.company_id, document_id, on)?;
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from_document(document, on)),
    ))
}

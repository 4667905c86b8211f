//! Numbering preview endpoint.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use finance_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::middleware::CompanyContext;
use crate::models::{DocumentType, InvoiceKind};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub doc_type: DocumentType,
    #[serde(default)]
    pub invoice_kind: Option<InvoiceKind>,
    /// Date the number would be issued on; defaults to today. Only the
    /// fiscal year is derived from it.
    #[serde(default)]
    pub on_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub number: String,
}

/// The number the next create in this series would receive. Advisory
/// only: a concurrent create can take it first.
pub async fn preview_number(
    State(state): State<AppState>,
    company: CompanyContext,
    Query(params): Query<PreviewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let on_date = params.on_date.unwrap_or_else(|| Utc::now().date_naive());
    let number = state.repository.preview_number(
        company.company_id,
        params.doc_type,
        params.invoice_kind,
        on_date,
    );
    Ok(Json(PreviewResponse { number }))
}

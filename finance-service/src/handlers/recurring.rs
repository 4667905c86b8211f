//! Recurring profile endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use finance_core::error::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::middleware::CompanyContext;
use crate::models::{
    CreateRecurringProfile, Frequency, InvoiceKind, LineItemInput, PaymentTerms, RecurringProfile,
};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecurringProfileRequest {
    #[serde(default)]
    pub counterparty_id: Option<Uuid>,
    #[serde(default = "default_invoice_kind")]
    pub invoice_kind: InvoiceKind,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub max_occurrences: Option<u32>,
    pub line_items: Vec<LineItemInput>,
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
    #[serde(default = "default_payment_terms")]
    pub payment_terms: PaymentTerms,
    #[serde(default)]
    pub auto_send: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_invoice_kind() -> InvoiceKind {
    InvoiceKind::Domestic
}

fn default_payment_terms() -> PaymentTerms {
    PaymentTerms::Net30
}

#[derive(Debug, Deserialize)]
pub struct TickRequest {
    /// The date to evaluate schedules against; usually today, but an
    /// explicit date keeps ticks replayable.
    pub as_of: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct TickOutcomeResponse {
    pub profile_id: Uuid,
    pub status: String,
    pub next_run: NaiveDate,
    pub occurrence_count: u32,
    pub emitted_invoice_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub emitted: usize,
    pub outcomes: Vec<TickOutcomeResponse>,
}

#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub profiles: Vec<RecurringProfile>,
    pub total: usize,
}

pub async fn create_profile(
    State(state): State<AppState>,
    company: CompanyContext,
    Json(request): Json<CreateRecurringProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let profile = state.repository.create_profile(CreateRecurringProfile {
        company_id: company.company_id,
        counterparty_id: request.counterparty_id,
        invoice_kind: request.invoice_kind,
        frequency: request.frequency,
        start_date: request.start_date,
        end_date: request.end_date,
        max_occurrences: request.max_occurrences,
        line_items: request.line_items,
        currency: request.currency,
        payment_terms: request.payment_terms,
        auto_send: request.auto_send,
        notes: request.notes,
    })?;

    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn list_profiles(
    State(state): State<AppState>,
    company: CompanyContext,
) -> Result<impl IntoResponse, AppError> {
    let profiles = state.repository.list_profiles(company.company_id);
    let total = profiles.len();
    Ok(Json(ProfileListResponse { profiles, total }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(profile_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.repository.get_profile(company.company_id, profile_id)?;
    Ok(Json(profile))
}

pub async fn pause_profile(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(profile_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .repository
        .pause_profile(company.company_id, profile_id)?;
    Ok(Json(profile))
}

pub async fn resume_profile(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(profile_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let profile = state
        .repository
        .resume_profile(company.company_id, profile_id, today)?;
    Ok(Json(profile))
}

/// Run all due schedules for the company as of the given date.
pub async fn tick(
    State(state): State<AppState>,
    company: CompanyContext,
    Json(request): Json<TickRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcomes = state.scheduler.process_due(company.company_id, request.as_of);
    let emitted = outcomes
        .iter()
        .filter(|o| o.emitted_invoice_id.is_some())
        .count();

    let outcomes = outcomes
        .into_iter()
        .map(|o| TickOutcomeResponse {
            profile_id: o.profile.profile_id,
            status: o.profile.status.as_str().to_string(),
            next_run: o.profile.next_run,
            occurrence_count: o.profile.occurrence_count,
            emitted_invoice_id: o.emitted_invoice_id,
        })
        .collect();

    Ok(Json(TickResponse { emitted, outcomes }))
}

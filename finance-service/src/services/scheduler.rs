//! Recurring emission scheduler.
//!
//! A tick is driven by the caller (cron, admin endpoint, test) with an
//! explicit `as_of` date, so the engine itself stays clock-free and a
//! tick for any date can be replayed deterministically.

use anyhow::anyhow;
use chrono::NaiveDate;
use finance_core::error::AppError;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{
    CreateDocument, DocumentType, RecurringProfile, RecurringStatus,
};
use crate::services::metrics::{ERRORS_TOTAL, RECURRING_EMISSIONS_TOTAL};
use crate::services::repository::FinanceRepository;

/// Result of ticking one profile.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub profile: RecurringProfile,
    /// Set when this tick emitted an invoice; `None` when the profile
    /// was not due.
    pub emitted_invoice_id: Option<Uuid>,
}

/// Schedule state captured while reserving an emission, so a failed
/// invoice creation can restore the profile exactly.
struct Reservation {
    prev_next_run: NaiveDate,
    prev_last_run: Option<NaiveDate>,
    prev_status: RecurringStatus,
    input: CreateDocument,
}

#[derive(Clone)]
pub struct RecurringScheduler {
    repository: FinanceRepository,
}

impl RecurringScheduler {
    pub fn new(repository: FinanceRepository) -> Self {
        Self { repository }
    }

    /// Tick a single profile. At most one invoice is emitted per call:
    /// the schedule is advanced under the profile's entry lock before
    /// the invoice is created, so a concurrent tick for the same window
    /// observes the updated `next_run` and becomes a no-op. If creation
    /// fails the schedule is rolled back and the error surfaced.
    #[instrument(skip(self), fields(company_id = %company_id, profile_id = %profile_id, as_of = %as_of))]
    pub fn tick_profile(
        &self,
        company_id: Uuid,
        profile_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<TickOutcome, AppError> {
        let reservation = {
            let profiles = self.repository.profiles_map();
            let mut profile = profiles
                .get_mut(&profile_id)
                .ok_or_else(|| AppError::NotFound(anyhow!("recurring profile {} not found", profile_id)))?;
            if profile.company_id != company_id {
                return Err(AppError::NotFound(anyhow!(
                    "recurring profile {} not found",
                    profile_id
                )));
            }

            if profile.status != RecurringStatus::Active || as_of < profile.next_run {
                None
            } else {
                let reservation = Reservation {
                    prev_next_run: profile.next_run,
                    prev_last_run: profile.last_run,
                    prev_status: profile.status,
                    input: CreateDocument {
                        company_id,
                        doc_type: DocumentType::Invoice,
                        invoice_kind: Some(profile.invoice_kind),
                        counterparty_id: profile.counterparty_id,
                        issue_date: as_of,
                        due_date: None,
                        payment_terms: Some(profile.payment_terms),
                        currency: profile.currency.clone(),
                        notes: profile.notes.clone(),
                        line_items: profile.line_items.clone(),
                        save_as_draft: !profile.auto_send,
                    },
                };

                // Advance from the previous due date, never from the
                // tick time, so a late tick does not drift the schedule.
                let next_run = profile.frequency.advance(profile.next_run);
                profile.next_run = next_run;
                profile.last_run = Some(as_of);
                profile.occurrence_count += 1;

                let reached_max = profile
                    .max_occurrences
                    .map_or(false, |max| profile.occurrence_count >= max);
                let past_end = profile.end_date.map_or(false, |end| next_run > end);
                if reached_max || past_end {
                    profile.status = RecurringStatus::Completed;
                }

                Some(reservation)
            }
        };

        let Some(reservation) = reservation else {
            return Ok(TickOutcome {
                profile: self.repository.get_profile(company_id, profile_id)?,
                emitted_invoice_id: None,
            });
        };

        match self.repository.create_document(reservation.input) {
            Ok(invoice) => {
                let profile = self.repository.get_profile(company_id, profile_id)?;
                RECURRING_EMISSIONS_TOTAL
                    .with_label_values(&[profile.frequency.as_str()])
                    .inc();
                info!(
                    invoice_id = %invoice.document_id,
                    invoice_number = %invoice.document_number,
                    next_run = %profile.next_run,
                    occurrence = profile.occurrence_count,
                    "Recurring invoice emitted"
                );
                Ok(TickOutcome {
                    profile,
                    emitted_invoice_id: Some(invoice.document_id),
                })
            }
            Err(e) => {
                if let Some(mut profile) = self.repository.profiles_map().get_mut(&profile_id) {
                    profile.next_run = reservation.prev_next_run;
                    profile.last_run = reservation.prev_last_run;
                    profile.status = reservation.prev_status;
                    profile.occurrence_count = profile.occurrence_count.saturating_sub(1);
                }
                Err(e)
            }
        }
    }

    /// Tick every active profile of the company that is due as of the
    /// given date. One failing profile does not block the rest.
    #[instrument(skip(self), fields(company_id = %company_id, as_of = %as_of))]
    pub fn process_due(&self, company_id: Uuid, as_of: NaiveDate) -> Vec<TickOutcome> {
        let due: Vec<Uuid> = self
            .repository
            .profiles_map()
            .iter()
            .filter(|entry| {
                entry.company_id == company_id
                    && entry.status == RecurringStatus::Active
                    && entry.next_run <= as_of
            })
            .map(|entry| entry.profile_id)
            .collect();

        let mut outcomes = Vec::with_capacity(due.len());
        for profile_id in due {
            match self.tick_profile(company_id, profile_id, as_of) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    ERRORS_TOTAL.with_label_values(&["recurring_tick"]).inc();
                    warn!(profile_id = %profile_id, error = %e, "Recurring tick failed for profile");
                }
            }
        }
        outcomes
    }
}

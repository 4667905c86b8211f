//! Recurring billing profile model.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{InvoiceKind, LineItemInput, PaymentTerms};

/// Emission frequency of a recurring profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl Frequency {
    /// One period after `from`. Month-based frequencies clamp to the
    /// end of shorter months (Jan 31 + 1 month = Feb 28/29).
    pub fn advance(&self, from: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Weekly => from + Duration::weeks(1),
            Frequency::Biweekly => from + Duration::weeks(2),
            Frequency::Monthly => from + Months::new(1),
            Frequency::Quarterly => from + Months::new(3),
            Frequency::HalfYearly => from + Months::new(6),
            Frequency::Yearly => from + Months::new(12),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::HalfYearly => "half_yearly",
            Frequency::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringStatus {
    Active,
    Paused,
    Completed,
}

impl RecurringStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringStatus::Active => "active",
            RecurringStatus::Paused => "paused",
            RecurringStatus::Completed => "completed",
        }
    }
}

/// A template plus schedule that periodically materializes new Invoices
/// through the normal creation path.
#[derive(Debug, Clone, Serialize)]
pub struct RecurringProfile {
    pub profile_id: Uuid,
    pub company_id: Uuid,
    pub counterparty_id: Option<Uuid>,
    pub invoice_kind: InvoiceKind,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_occurrences: Option<u32>,
    pub occurrence_count: u32,
    pub status: RecurringStatus,
    /// The next date an emission is due. Advanced by one period from
    /// its previous value on each emission, never from the tick time,
    /// so delayed ticks do not drift the schedule.
    pub next_run: NaiveDate,
    pub last_run: Option<NaiveDate>,
    pub line_items: Vec<LineItemInput>,
    pub currency: String,
    pub payment_terms: PaymentTerms,
    /// When set, emitted invoices are created as `sent` rather than
    /// left in draft.
    pub auto_send: bool,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a recurring profile.
#[derive(Debug, Clone)]
pub struct CreateRecurringProfile {
    pub company_id: Uuid,
    pub counterparty_id: Option<Uuid>,
    pub invoice_kind: InvoiceKind,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_occurrences: Option<u32>,
    pub line_items: Vec<LineItemInput>,
    pub currency: String,
    pub payment_terms: PaymentTerms,
    pub auto_send: bool,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_advance_steps_one_month() {
        assert_eq!(
            Frequency::Monthly.advance(date(2025, 1, 15)),
            date(2025, 2, 15)
        );
    }

    #[test]
    fn monthly_advance_clamps_short_months() {
        assert_eq!(
            Frequency::Monthly.advance(date(2025, 1, 31)),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn weekly_and_yearly_advance() {
        assert_eq!(
            Frequency::Weekly.advance(date(2025, 12, 29)),
            date(2026, 1, 5)
        );
        assert_eq!(
            Frequency::Yearly.advance(date(2024, 2, 29)),
            date(2025, 2, 28)
        );
    }
}

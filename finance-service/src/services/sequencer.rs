//! Document numbering: per (company, series, fiscal year) counters.
//!
//! Allocation is exclusive: the map entry is held under its shard lock
//! while the counter advances, so two concurrent creates can never
//! observe the same value. `preview_number` never consumes.

use chrono::{Datelike, NaiveDate};
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{DocumentType, InvoiceKind};

/// Numbering sequencer. The fiscal-year start month and padding are
/// fixed at startup; changing them mid-deployment would collide series.
pub struct NumberSequencer {
    counters: DashMap<(Uuid, String), u64>,
    fiscal_year_start_month: u32,
    padding: usize,
}

impl NumberSequencer {
    pub fn new(fiscal_year_start_month: u32, padding: usize) -> Self {
        Self {
            counters: DashMap::new(),
            fiscal_year_start_month: fiscal_year_start_month.clamp(1, 12),
            padding,
        }
    }

    /// Series prefix. Export invoices get their own series so domestic
    /// and export numbering never interleave.
    pub fn prefix(doc_type: DocumentType, kind: Option<InvoiceKind>) -> &'static str {
        match (doc_type, kind) {
            (DocumentType::Invoice, Some(InvoiceKind::Export)) => "EXP",
            (DocumentType::Invoice, _) => "INV",
            (DocumentType::Bill, _) => "BIL",
            (DocumentType::Estimate, _) => "EST",
        }
    }

    /// Fiscal-year code for a date, e.g. `FY2526` for 2025-26 with an
    /// April start.
    pub fn fiscal_year(&self, date: NaiveDate) -> String {
        let start_year = if date.month() < self.fiscal_year_start_month {
            date.year() - 1
        } else {
            date.year()
        };
        format!("FY{:02}{:02}", start_year % 100, (start_year + 1) % 100)
    }

    fn format_number(&self, prefix: &str, fiscal_year: &str, sequence: u64) -> String {
        format!(
            "{}-{}-{:0width$}",
            prefix,
            fiscal_year,
            sequence,
            width = self.padding
        )
    }

    /// Allocate the next number in the series. Consumes the counter
    /// value even if the caller later discards the document; gaps are
    /// acceptable, duplicates are not.
    pub fn next_number(
        &self,
        company_id: Uuid,
        doc_type: DocumentType,
        kind: Option<InvoiceKind>,
        on_date: NaiveDate,
    ) -> (String, String) {
        let prefix = Self::prefix(doc_type, kind);
        let fiscal_year = self.fiscal_year(on_date);
        let key = (company_id, format!("{}_{}", prefix, fiscal_year));

        let mut entry = self.counters.entry(key).or_insert(0);
        *entry += 1;
        let sequence = *entry;
        drop(entry);

        (
            self.format_number(prefix, &fiscal_year, sequence),
            fiscal_year,
        )
    }

    /// The number that would be allocated next, without consuming it.
    /// Callers must not treat the preview as reserved.
    pub fn preview_number(
        &self,
        company_id: Uuid,
        doc_type: DocumentType,
        kind: Option<InvoiceKind>,
        on_date: NaiveDate,
    ) -> String {
        let prefix = Self::prefix(doc_type, kind);
        let fiscal_year = self.fiscal_year(on_date);
        let key = (company_id, format!("{}_{}", prefix, fiscal_year));
        let next = self.counters.get(&key).map(|v| *v + 1).unwrap_or(1);
        self.format_number(prefix, &fiscal_year, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fiscal_year_runs_april_to_march() {
        let seq = NumberSequencer::new(4, 4);
        assert_eq!(seq.fiscal_year(date(2025, 4, 1)), "FY2526");
        assert_eq!(seq.fiscal_year(date(2026, 3, 31)), "FY2526");
        assert_eq!(seq.fiscal_year(date(2026, 4, 1)), "FY2627");
    }

    #[test]
    fn sequences_are_scoped_per_company_and_series() {
        let seq = NumberSequencer::new(4, 4);
        let company_a = Uuid::new_v4();
        let company_b = Uuid::new_v4();
        let on = date(2025, 6, 1);

        let (a1, fy) = seq.next_number(company_a, DocumentType::Invoice, None, on);
        let (a2, _) = seq.next_number(company_a, DocumentType::Invoice, None, on);
        let (b1, _) = seq.next_number(company_b, DocumentType::Invoice, None, on);
        let (exp1, _) = seq.next_number(
            company_a,
            DocumentType::Invoice,
            Some(InvoiceKind::Export),
            on,
        );

        assert_eq!(fy, "FY2526");
        assert_eq!(a1, "INV-FY2526-0001");
        assert_eq!(a2, "INV-FY2526-0002");
        assert_eq!(b1, "INV-FY2526-0001");
        assert_eq!(exp1, "EXP-FY2526-0001");
    }

    #[test]
    fn preview_does_not_consume() {
        let seq = NumberSequencer::new(4, 4);
        let company = Uuid::new_v4();
        let on = date(2025, 6, 1);

        let preview = seq.preview_number(company, DocumentType::Estimate, None, on);
        assert_eq!(preview, "EST-FY2526-0001");
        let preview_again = seq.preview_number(company, DocumentType::Estimate, None, on);
        assert_eq!(preview_again, "EST-FY2526-0001");

        let (allocated, _) = seq.next_number(company, DocumentType::Estimate, None, on);
        assert_eq!(allocated, "EST-FY2526-0001");
        let after = seq.preview_number(company, DocumentType::Estimate, None, on);
        assert_eq!(after, "EST-FY2526-0002");
    }
}

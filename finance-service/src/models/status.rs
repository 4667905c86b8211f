//! Status graphs for the document state machine.
//!
//! Each document type carries a closed enum with a transition table; the
//! repository refuses any mutation that is not an edge of the graph, so
//! an illegal transition is a validation failure rather than a stray
//! string comparison.

/// A finite status graph. One mechanism shared by the payable and
/// estimate graphs.
pub trait StatusGraph: Copy + Eq + Sized + 'static {
    fn successors(self) -> &'static [Self];

    fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

/// Status of a payable document (Invoice or Bill).
///
/// `overdue` is intentionally absent: it is a derived display state,
/// recomputed on read from the due date and open balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayableStatus {
    Draft,
    Sent,
    Viewed,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl PayableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayableStatus::Draft => "draft",
            PayableStatus::Sent => "sent",
            PayableStatus::Viewed => "viewed",
            PayableStatus::PartiallyPaid => "partially_paid",
            PayableStatus::Paid => "paid",
            PayableStatus::Cancelled => "cancelled",
        }
    }
}

impl StatusGraph for PayableStatus {
    fn successors(self) -> &'static [Self] {
        use PayableStatus::*;
        match self {
            Draft => &[Sent, Cancelled],
            Sent => &[Viewed, PartiallyPaid, Paid, Cancelled],
            Viewed => &[PartiallyPaid, Paid],
            PartiallyPaid => &[Paid],
            Paid => &[],
            Cancelled => &[],
        }
    }
}

/// Status of an Estimate.
///
/// Conversion is a flag on the document, not a status: an accepted
/// estimate stays `accepted` and freezes once converted. Acceptance and
/// rejection are reachable directly from `sent` because counterparties
/// respond without a tracked viewing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    Draft,
    Sent,
    Viewed,
    Accepted,
    Rejected,
    Expired,
}

impl EstimateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateStatus::Draft => "draft",
            EstimateStatus::Sent => "sent",
            EstimateStatus::Viewed => "viewed",
            EstimateStatus::Accepted => "accepted",
            EstimateStatus::Rejected => "rejected",
            EstimateStatus::Expired => "expired",
        }
    }
}

impl StatusGraph for EstimateStatus {
    fn successors(self) -> &'static [Self] {
        use EstimateStatus::*;
        match self {
            Draft => &[Sent],
            Sent => &[Viewed, Accepted, Rejected, Expired],
            Viewed => &[Accepted, Rejected, Expired],
            Accepted => &[],
            Rejected => &[],
            Expired => &[],
        }
    }
}

/// Typed status for any document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Payable(PayableStatus),
    Estimate(EstimateStatus),
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Payable(s) => s.as_str(),
            DocumentStatus::Estimate(s) => s.as_str(),
        }
    }

    pub fn payable(&self) -> Option<PayableStatus> {
        match self {
            DocumentStatus::Payable(s) => Some(*s),
            DocumentStatus::Estimate(_) => None,
        }
    }

    pub fn estimate(&self) -> Option<EstimateStatus> {
        match self {
            DocumentStatus::Estimate(s) => Some(*s),
            DocumentStatus::Payable(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_and_paid_are_terminal() {
        assert!(PayableStatus::Cancelled.is_terminal());
        assert!(PayableStatus::Paid.is_terminal());
        assert!(!PayableStatus::Draft.is_terminal());
    }

    #[test]
    fn draft_cannot_jump_to_paid() {
        assert!(!PayableStatus::Draft.can_transition_to(PayableStatus::Paid));
        assert!(PayableStatus::Draft.can_transition_to(PayableStatus::Sent));
    }

    #[test]
    fn estimate_accepts_from_sent_or_viewed() {
        assert!(EstimateStatus::Sent.can_transition_to(EstimateStatus::Accepted));
        assert!(EstimateStatus::Viewed.can_transition_to(EstimateStatus::Accepted));
        assert!(!EstimateStatus::Draft.can_transition_to(EstimateStatus::Accepted));
        assert!(EstimateStatus::Rejected.is_terminal());
    }
}

//! Payment model. Payments are append-only: a correction is a new
//! adjustment entry, never a mutation of a recorded payment.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Cash,
    Cheque,
    Upi,
    Card,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
            PaymentMethod::Other => "other",
        }
    }
}

/// A recorded payment against a document.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub payment_id: Uuid,
    pub amount: Money,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub recorded_utc: DateTime<Utc>,
}

/// Input for recording a payment. The currency is optional; when given
/// it must match the document's currency.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPayment {
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

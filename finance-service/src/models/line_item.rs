//! Line item model for financial documents.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Money;

/// A billable line on a document, with its derived amounts. The derived
/// fields are never patched in place; they are recomputed through the
/// calculator whenever the document changes.
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub line_item_id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    pub rate: Money,
    /// Tax rate as a caller-supplied percentage, >= 0.
    pub tax_rate: Decimal,
    /// Discount percentage, 0..=100.
    pub discount_percent: Decimal,
    /// Opaque SAC/HSN classification code.
    pub classification_code: Option<String>,
    pub sort_order: i32,
    /// quantity x rate, pre-discount and pre-tax.
    pub amount: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    /// (amount - discount) + tax.
    pub total: Money,
}

impl LineItem {
    /// Re-derive the caller-facing input from a stored line, used when
    /// duplicating documents and converting estimates.
    pub fn to_input(&self) -> LineItemInput {
        LineItemInput {
            description: self.description.clone(),
            quantity: self.quantity,
            rate: self.rate.to_major(),
            tax_rate: self.tax_rate,
            discount_percent: self.discount_percent,
            classification_code: self.classification_code.clone(),
        }
    }
}

/// Caller-supplied line item, before derivation. Also serves as the
/// template entry stored on recurring profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub classification_code: Option<String>,
}

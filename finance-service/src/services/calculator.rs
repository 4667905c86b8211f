//! Line-item calculator: the single formula behind every document total.
//!
//! Both interactive creation/update and recurring emission funnel through
//! this module, so stored totals can never drift from the line items.

use anyhow::anyhow;
use finance_core::error::AppError;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{LineItem, LineItemInput, Money};

/// Aggregate totals for one document.
#[derive(Debug, Clone)]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub grand_total: Money,
}

/// Validate caller-supplied line items and derive the per-line amounts.
///
/// Mirrors the client-side filter ("description present and rate > 0")
/// but is enforced here because the client filter is not a security
/// boundary. An empty list is rejected: a document with zero billable
/// content cannot be finalized.
pub fn build_line_items(
    inputs: &[LineItemInput],
    currency: &str,
) -> Result<Vec<LineItem>, AppError> {
    if inputs.is_empty() {
        return Err(AppError::Validation(anyhow!(
            "document must have at least one line item"
        )));
    }

    let hundred = Decimal::from(100);
    let mut items = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        if input.description.trim().is_empty() {
            return Err(AppError::Validation(anyhow!(
                "line item {} has an empty description",
                index + 1
            )));
        }
        if input.rate <= Decimal::ZERO {
            return Err(AppError::Validation(anyhow!(
                "line item '{}' must have a positive rate",
                input.description
            )));
        }
        if input.quantity <= Decimal::ZERO {
            return Err(AppError::Validation(anyhow!(
                "line item '{}' must have a positive quantity",
                input.description
            )));
        }
        if input.tax_rate < Decimal::ZERO {
            return Err(AppError::Validation(anyhow!(
                "line item '{}' must have a non-negative tax rate",
                input.description
            )));
        }
        if input.discount_percent < Decimal::ZERO || input.discount_percent > hundred {
            return Err(AppError::Validation(anyhow!(
                "line item '{}' discount must be between 0 and 100 percent",
                input.description
            )));
        }

        let rate = Money::from_major(input.rate, currency);
        let amount = rate.multiply(input.quantity);
        let discount_amount = amount.percent_of(input.discount_percent);
        let taxable = amount.subtract(&discount_amount)?;
        let tax_amount = taxable.percent_of(input.tax_rate);
        let total = taxable.add(&tax_amount)?;

        items.push(LineItem {
            line_item_id: Uuid::new_v4(),
            description: input.description.trim().to_string(),
            quantity: input.quantity,
            rate,
            tax_rate: input.tax_rate,
            discount_percent: input.discount_percent,
            classification_code: input.classification_code.clone(),
            sort_order: index as i32,
            amount,
            discount_amount,
            tax_amount,
            total,
        });
    }

    Ok(items)
}

/// Sum per-line amounts into document totals. Pure, order-independent
/// and idempotent: the per-line amounts are already rounded, so the
/// sums are exact integer additions in minor units.
pub fn compute_totals(items: &[LineItem]) -> Result<DocumentTotals, AppError> {
    let currency = match items.first() {
        Some(first) => first.rate.currency(),
        None => {
            return Err(AppError::Validation(anyhow!(
                "document must have at least one line item"
            )))
        }
    };

    let mut subtotal = Money::zero(currency);
    let mut discount_total = Money::zero(currency);
    let mut tax_total = Money::zero(currency);
    let mut grand_total = Money::zero(currency);

    for item in items {
        subtotal = subtotal.add(&item.amount)?;
        discount_total = discount_total.add(&item.discount_amount)?;
        tax_total = tax_total.add(&item.tax_amount)?;
        grand_total = grand_total.add(&item.total)?;
    }

    Ok(DocumentTotals {
        subtotal,
        discount_total,
        tax_total,
        grand_total,
    })
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::purchase_order_entity::{PurchaseOrderPurpose, PurchaseOrderType};

/// Amount at which a direct service engagement needs a formal quotation.
/// A dashboard help text elsewhere still cites 10,000; this constant is the
/// authoritative value until product confirms which figure is correct.
pub const SERVICE_QUOTE_THRESHOLD: Decimal = dec!(5000);

/// Outcome of the quote requirement evaluation, including the human-readable
/// reasoning surfaced next to the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDecision {
    pub requires_quote: bool,
    pub reason: String,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_amount: Option<Decimal>,
}

/// Decides whether a purchase order of the given type and amount must go
/// through the quotation sub-process. Pure; the backing store re-derives the
/// same decision on every mutation, so the value held by callers is advisory.
pub fn evaluate_quote_requirement(
    po_type: PurchaseOrderType,
    total_amount: Decimal,
    po_purpose: Option<PurchaseOrderPurpose>,
) -> QuoteDecision {
    match po_type {
        PurchaseOrderType::DirectPurchase => QuoteDecision {
            requires_quote: false,
            reason: "Direct purchases are informal local buys and never require a quotation"
                .to_string(),
            recommendation: "Proceed to approval once the order details are complete".to_string(),
            threshold_amount: None,
        },
        PurchaseOrderType::DirectService => {
            if total_amount >= SERVICE_QUOTE_THRESHOLD {
                QuoteDecision {
                    requires_quote: true,
                    reason: format!(
                        "Direct services of {} or more require a formal quotation",
                        SERVICE_QUOTE_THRESHOLD
                    ),
                    recommendation:
                        "Collect at least two competing quotations before requesting approval"
                            .to_string(),
                    threshold_amount: Some(SERVICE_QUOTE_THRESHOLD),
                }
            } else {
                QuoteDecision {
                    requires_quote: false,
                    reason: format!(
                        "Direct services under {} can proceed without a quotation",
                        SERVICE_QUOTE_THRESHOLD
                    ),
                    recommendation: "Proceed to approval once the order details are complete"
                        .to_string(),
                    threshold_amount: Some(SERVICE_QUOTE_THRESHOLD),
                }
            }
        }
        PurchaseOrderType::SpecialOrder => {
            let funding_note = match po_purpose {
                Some(PurchaseOrderPurpose::WorkOrderInventory) => {
                    " (inventory-funded orders skip cash-approval gating but still document quotes)"
                }
                _ => "",
            };
            QuoteDecision {
                requires_quote: true,
                reason: format!(
                    "Special orders are formal supplier engagements and always require quotations{}",
                    funding_note
                ),
                recommendation:
                    "Collect at least two competing quotations and select a supplier".to_string(),
                threshold_amount: None,
            }
        }
    }
}

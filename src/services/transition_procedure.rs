use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::purchase_order_entity::{
    ActiveModel as PurchaseOrderActiveModel, Entity as PurchaseOrderEntity, PaymentMethod,
    PurchaseOrderPurpose, PurchaseOrderStatus, PurchaseOrderType,
};
use crate::services::quote_requirement::{evaluate_quote_requirement, QuoteDecision};

/// Result shape returned by the authoritative transition procedure.
/// `success = false` is a business rejection, not a transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureResult {
    pub success: bool,
    pub message: String,
}

impl ProcedureResult {
    pub fn advanced(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Rejection reasons the orchestrator knows how to compensate for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    PaymentDateInPast,
    QuotationMissing,
}

/// Classified view of a procedure result. Unknown rejections keep their
/// original message untouched so callers see exactly what the store said.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransitionOutcome {
    Advanced {
        message: String,
    },
    RejectedKnown {
        reason: RejectionReason,
        message: String,
    },
    RejectedUnknown {
        message: String,
    },
}

/// Sorts a procedure result into the outcome taxonomy. The store reports
/// rejections as prose, so recognition is by message content; anything that
/// does not match a known pattern stays unknown rather than being guessed at.
pub fn classify_procedure_result(result: ProcedureResult) -> TransitionOutcome {
    if result.success {
        return TransitionOutcome::Advanced {
            message: result.message,
        };
    }

    let lowered = result.message.to_lowercase();
    if lowered.contains("payment date") && lowered.contains("past") {
        TransitionOutcome::RejectedKnown {
            reason: RejectionReason::PaymentDateInPast,
            message: result.message,
        }
    } else if lowered.contains("quotation") {
        TransitionOutcome::RejectedKnown {
            reason: RejectionReason::QuotationMissing,
            message: result.message,
        }
    } else {
        TransitionOutcome::RejectedUnknown {
            message: result.message,
        }
    }
}

/// Legal next statuses for an order in the given position.
///
/// Inventory-funded special orders skip the quotation stage since no cash
/// approval gates them; every other path follows its type's chain.
pub fn next_statuses_for(
    current: PurchaseOrderStatus,
    po_type: PurchaseOrderType,
    po_purpose: PurchaseOrderPurpose,
) -> Vec<PurchaseOrderStatus> {
    use PurchaseOrderStatus::*;

    match po_type {
        PurchaseOrderType::DirectPurchase | PurchaseOrderType::DirectService => match current {
            Draft => vec![PendingApproval],
            PendingApproval => vec![Approved],
            Approved => vec![Purchased],
            Purchased => vec![ReceiptUploaded],
            ReceiptUploaded => vec![Validated],
            _ => vec![],
        },
        PurchaseOrderType::SpecialOrder => match current {
            Draft => {
                if po_purpose == PurchaseOrderPurpose::WorkOrderInventory {
                    vec![Quoted, PendingApproval]
                } else {
                    vec![Quoted]
                }
            }
            Quoted => vec![PendingApproval],
            PendingApproval => vec![Approved],
            Approved => vec![Ordered],
            Ordered => vec![Received],
            Received => vec![ReceiptUploaded],
            ReceiptUploaded => vec![Validated],
            _ => vec![],
        },
    }
}

/// The backing store's rule-enforcement surface. The workflow engine treats
/// these four capabilities as ground truth and never re-implements them.
#[async_trait]
pub trait TransitionProcedure: Send + Sync {
    /// Atomically validates and applies a status transition.
    /// Business rejections come back as `ProcedureResult { success: false }`;
    /// `Err` is reserved for store failures.
    async fn advance(
        &self,
        purchase_order_id: Uuid,
        new_status: PurchaseOrderStatus,
        actor_id: Uuid,
        notes: Option<String>,
    ) -> Result<ProcedureResult, ServiceError>;

    /// Capability query for the legal next statuses from a given position.
    fn valid_next_statuses(
        &self,
        current: PurchaseOrderStatus,
        po_type: PurchaseOrderType,
        po_purpose: PurchaseOrderPurpose,
    ) -> Vec<PurchaseOrderStatus>;

    /// Authoritative quote requirement ruling for a type/amount/purpose.
    fn requires_quotation(
        &self,
        po_type: PurchaseOrderType,
        total_amount: Decimal,
        po_purpose: Option<PurchaseOrderPurpose>,
    ) -> QuoteDecision;
}

/// Database-backed transition procedure.
///
/// Approval gating here checks the legacy `quotation_url` column only; the
/// newer list column is invisible to it. The workflow service compensates for
/// the resulting false rejections, so any change here must stay in step with
/// that repair path.
#[derive(Clone)]
pub struct DbTransitionProcedure {
    db: Arc<DatabaseConnection>,
}

impl DbTransitionProcedure {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransitionProcedure for DbTransitionProcedure {
    #[instrument(skip(self, notes), fields(purchase_order_id = %purchase_order_id, new_status = %new_status))]
    async fn advance(
        &self,
        purchase_order_id: Uuid,
        new_status: PurchaseOrderStatus,
        actor_id: Uuid,
        notes: Option<String>,
    ) -> Result<ProcedureResult, ServiceError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let order = PurchaseOrderEntity::find_by_id(purchase_order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!("Failed to fetch purchase order {}: {}", purchase_order_id, e);
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", purchase_order_id))
            })?;

        let allowed = self.valid_next_statuses(order.status, order.po_type, order.po_purpose);
        if !allowed.contains(&new_status) {
            return Ok(ProcedureResult::rejected(format!(
                "Cannot transition from '{}' to '{}' for a {} order",
                order.status, new_status, order.po_type
            )));
        }

        if new_status == PurchaseOrderStatus::Approved {
            if order.payment_method == Some(PaymentMethod::Transfer) {
                let today = Utc::now().date_naive();
                if let Some(max_date) = order.max_payment_date {
                    if max_date < today {
                        return Ok(ProcedureResult::rejected(format!(
                            "Maximum payment date {} is in the past",
                            max_date
                        )));
                    }
                }
            }

            let decision =
                self.requires_quotation(order.po_type, order.total_amount, Some(order.po_purpose));
            let legacy_quote_present = order
                .quotation_url
                .as_deref()
                .map(str::trim)
                .map_or(false, |url| !url.is_empty());
            if decision.requires_quote && !legacy_quote_present {
                return Ok(ProcedureResult::rejected(
                    "No quotation is on file for this order",
                ));
            }
        }

        let old_status = order.status;
        let total_amount = order.total_amount;
        let po_type = order.po_type;
        let po_purpose = order.po_purpose;

        let mut active: PurchaseOrderActiveModel = order.into();
        active.status = Set(new_status);
        // The stored flag is advisory; the ruling is re-derived on every mutation.
        active.requires_quote = Set(self
            .requires_quotation(po_type, total_amount, Some(po_purpose))
            .requires_quote);
        if new_status == PurchaseOrderStatus::Approved {
            active.authorized_by = Set(Some(actor_id));
            active.authorization_date = Set(Some(Utc::now()));
        }
        if let Some(notes) = notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        active.update(&txn).await.map_err(|e| {
            error!(
                "Failed to update purchase order {} status: {}",
                purchase_order_id, e
            );
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(
                "Failed to commit transition for purchase order {}: {}",
                purchase_order_id, e
            );
            ServiceError::DatabaseError(e)
        })?;

        info!(
            purchase_order_id = %purchase_order_id,
            old_status = %old_status,
            new_status = %new_status,
            "Purchase order transition applied"
        );

        Ok(ProcedureResult::advanced(format!(
            "Purchase order advanced to '{}'",
            new_status
        )))
    }

    fn valid_next_statuses(
        &self,
        current: PurchaseOrderStatus,
        po_type: PurchaseOrderType,
        po_purpose: PurchaseOrderPurpose,
    ) -> Vec<PurchaseOrderStatus> {
        next_statuses_for(current, po_type, po_purpose)
    }

    fn requires_quotation(
        &self,
        po_type: PurchaseOrderType,
        total_amount: Decimal,
        po_purpose: Option<PurchaseOrderPurpose>,
    ) -> QuoteDecision {
        evaluate_quote_requirement(po_type, total_amount, po_purpose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn classifies_past_payment_date_rejection() {
        let outcome = classify_procedure_result(ProcedureResult::rejected(
            "Maximum payment date 2024-01-15 is in the past",
        ));
        assert_matches!(
            outcome,
            TransitionOutcome::RejectedKnown {
                reason: RejectionReason::PaymentDateInPast,
                ..
            }
        );
    }

    #[test]
    fn classifies_missing_quotation_rejection() {
        let outcome = classify_procedure_result(ProcedureResult::rejected(
            "No quotation is on file for this order",
        ));
        assert_matches!(
            outcome,
            TransitionOutcome::RejectedKnown {
                reason: RejectionReason::QuotationMissing,
                ..
            }
        );
    }

    #[test]
    fn unrecognized_rejections_keep_their_message() {
        let outcome = classify_procedure_result(ProcedureResult::rejected(
            "Cannot transition from 'draft' to 'validated' for a direct_purchase order",
        ));
        assert_matches!(
            outcome,
            TransitionOutcome::RejectedUnknown { message } if message.contains("Cannot transition")
        );
    }

    #[test]
    fn successes_are_never_classified_as_rejections() {
        let outcome = classify_procedure_result(ProcedureResult::advanced(
            "Purchase order advanced to 'approved'",
        ));
        assert_matches!(outcome, TransitionOutcome::Advanced { .. });
    }

    #[test]
    fn direct_purchase_chain_is_linear() {
        use PurchaseOrderStatus::*;
        let purpose = PurchaseOrderPurpose::WorkOrderCash;
        let chain = [
            (Draft, vec![PendingApproval]),
            (PendingApproval, vec![Approved]),
            (Approved, vec![Purchased]),
            (Purchased, vec![ReceiptUploaded]),
            (ReceiptUploaded, vec![Validated]),
            (Validated, vec![]),
        ];
        for (from, expected) in chain {
            assert_eq!(
                next_statuses_for(from, PurchaseOrderType::DirectPurchase, purpose),
                expected,
                "from {}",
                from
            );
        }
    }

    #[test]
    fn special_order_chain_includes_quotation_and_receiving() {
        use PurchaseOrderStatus::*;
        let purpose = PurchaseOrderPurpose::WorkOrderCash;
        assert_eq!(
            next_statuses_for(Draft, PurchaseOrderType::SpecialOrder, purpose),
            vec![Quoted]
        );
        assert_eq!(
            next_statuses_for(Approved, PurchaseOrderType::SpecialOrder, purpose),
            vec![Ordered]
        );
        assert_eq!(
            next_statuses_for(Ordered, PurchaseOrderType::SpecialOrder, purpose),
            vec![Received]
        );
    }

    #[test]
    fn inventory_funded_special_orders_may_skip_quotation() {
        let allowed = next_statuses_for(
            PurchaseOrderStatus::Draft,
            PurchaseOrderType::SpecialOrder,
            PurchaseOrderPurpose::WorkOrderInventory,
        );
        assert!(allowed.contains(&PurchaseOrderStatus::PendingApproval));
        assert!(allowed.contains(&PurchaseOrderStatus::Quoted));
    }

    #[test]
    fn statuses_never_cycle_back() {
        use strum::IntoEnumIterator;
        for po_type in [
            PurchaseOrderType::DirectPurchase,
            PurchaseOrderType::DirectService,
            PurchaseOrderType::SpecialOrder,
        ] {
            for status in PurchaseOrderStatus::iter() {
                let allowed = next_statuses_for(
                    status,
                    po_type,
                    PurchaseOrderPurpose::WorkOrderCash,
                );
                assert!(
                    !allowed.contains(&status),
                    "{} must not loop on itself for {}",
                    status,
                    po_type
                );
            }
        }
    }
}

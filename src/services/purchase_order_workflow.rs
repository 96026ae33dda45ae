use std::sync::Arc;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::purchase_order_entity::{
    Model as PurchaseOrderModel, PurchaseOrderPurpose, PurchaseOrderStatus,
    QuotationSelectionStatus,
};
use crate::repositories::PurchaseOrderRepository;
use crate::services::transition_procedure::{
    classify_procedure_result, ProcedureResult, RejectionReason, TransitionOutcome,
    TransitionProcedure,
};
use crate::services::workflow_stages::describe_stage;

lazy_static! {
    static ref WORKFLOW_ADVANCES: IntCounter = IntCounter::new(
        "purchase_order_workflow_advances_total",
        "Total number of successful status transitions"
    )
    .expect("metric can be created");
    static ref WORKFLOW_REJECTIONS: IntCounter = IntCounter::new(
        "purchase_order_workflow_rejections_total",
        "Total number of transitions rejected by the procedure"
    )
    .expect("metric can be created");
    static ref APPROVAL_REPAIRS: IntCounter = IntCounter::new(
        "purchase_order_approval_repairs_total",
        "Total number of approvals applied via the repair path"
    )
    .expect("metric can be created");
}

/// Read-only projection returned by the workflow status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStatusResponse {
    pub purchase_order_id: Uuid,
    pub order_number: String,
    pub current_status: PurchaseOrderStatus,
    pub allowed_next_statuses: Vec<PurchaseOrderStatus>,
    pub requires_quote: bool,
    pub can_advance: bool,
    pub workflow_stage: String,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<AuthorizationSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationSnapshot {
    pub authorized_by: Uuid,
    pub authorization_date: DateTime<Utc>,
}

/// Orchestrates purchase order status transitions.
///
/// The transition procedure owns legality and the status write; this service
/// adds the pre-flight checks the procedure cannot see and repairs the two
/// rejection patterns known to be false positives. Everything else the
/// procedure says is final.
#[derive(Clone)]
pub struct PurchaseOrderWorkflowService {
    repository: Arc<PurchaseOrderRepository>,
    procedure: Arc<dyn TransitionProcedure>,
    event_sender: Arc<EventSender>,
}

impl PurchaseOrderWorkflowService {
    pub fn new(
        repository: Arc<PurchaseOrderRepository>,
        procedure: Arc<dyn TransitionProcedure>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            repository,
            procedure,
            event_sender,
        }
    }

    /// Requests a status transition for a purchase order.
    ///
    /// Pre-flight failures are hard stops returned as errors before any store
    /// call. Store rejections come back as `success = false` with the store's
    /// message unchanged, except for the two compensable patterns.
    #[instrument(skip(self, notes), fields(purchase_order_id = %purchase_order_id, new_status = %new_status))]
    pub async fn advance_workflow(
        &self,
        purchase_order_id: Uuid,
        new_status: PurchaseOrderStatus,
        actor_id: Uuid,
        notes: Option<String>,
    ) -> Result<ProcedureResult, ServiceError> {
        let order = self
            .repository
            .find_by_id(purchase_order_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Purchase order {} not found",
                    purchase_order_id
                ))
            })?;

        if new_status == PurchaseOrderStatus::PendingApproval {
            self.check_approval_preconditions(&order).await?;
        }

        let old_status = order.status;
        let result = self
            .procedure
            .advance(purchase_order_id, new_status, actor_id, notes)
            .await?;

        match classify_procedure_result(result) {
            TransitionOutcome::Advanced { message } => {
                WORKFLOW_ADVANCES.inc();
                self.emit_transition_events(purchase_order_id, old_status, new_status)
                    .await?;
                Ok(ProcedureResult::advanced(message))
            }
            TransitionOutcome::RejectedKnown { reason, message }
                if new_status == PurchaseOrderStatus::Approved =>
            {
                self.try_repair_approval(purchase_order_id, old_status, actor_id, reason, message)
                    .await
            }
            TransitionOutcome::RejectedKnown { message, .. }
            | TransitionOutcome::RejectedUnknown { message } => {
                WORKFLOW_REJECTIONS.inc();
                info!(
                    purchase_order_id = %purchase_order_id,
                    "Transition rejected by procedure: {}", message
                );
                Ok(ProcedureResult::rejected(message))
            }
        }
    }

    /// Checks the procedure cannot perform because it has no view of the
    /// quotation selection sub-process or the line item list.
    async fn check_approval_preconditions(
        &self,
        order: &PurchaseOrderModel,
    ) -> Result<(), ServiceError> {
        if order.po_purpose == PurchaseOrderPurpose::WorkOrderInventory {
            return Ok(());
        }
        if !order.quotation_selection_required {
            return Ok(());
        }

        match order.quotation_selection_status {
            QuotationSelectionStatus::Selected => {}
            QuotationSelectionStatus::PendingQuotations => {
                return Err(ServiceError::InvalidOperation(
                    "At least two quotations are required before requesting approval"
                        .to_string(),
                ));
            }
            QuotationSelectionStatus::PendingSelection => {
                return Err(ServiceError::InvalidOperation(
                    "A supplier must be selected from the collected quotations before requesting approval"
                        .to_string(),
                ));
            }
            _ => {
                return Err(ServiceError::InvalidOperation(
                    "Quotation selection must be completed before requesting approval"
                        .to_string(),
                ));
            }
        }

        let items = self.repository.get_items(order.id).await?;
        if items.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "At least one line item is required before requesting approval".to_string(),
            ));
        }

        Ok(())
    }

    /// Applies the narrow compensating approval for the two known
    /// false-positive rejections. Runs at most once per call and never
    /// re-enters the transition procedure.
    async fn try_repair_approval(
        &self,
        purchase_order_id: Uuid,
        old_status: PurchaseOrderStatus,
        actor_id: Uuid,
        reason: RejectionReason,
        message: String,
    ) -> Result<ProcedureResult, ServiceError> {
        match reason {
            RejectionReason::PaymentDateInPast => {
                // The payment-date rule only binds at creation time now;
                // approvals of older orders go through on purpose.
                warn!(
                    purchase_order_id = %purchase_order_id,
                    rejection = %message,
                    "Compensating payment-date rejection via repair approval"
                );
            }
            RejectionReason::QuotationMissing => {
                // Fresh read: the procedure checks the legacy singular column,
                // so a populated list form makes its rejection a false positive.
                let order = self
                    .repository
                    .find_by_id(purchase_order_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Purchase order {} not found",
                            purchase_order_id
                        ))
                    })?;

                if !order.has_quotation_evidence() {
                    WORKFLOW_REJECTIONS.inc();
                    info!(
                        purchase_order_id = %purchase_order_id,
                        "Quotation rejection confirmed; no evidence in either representation"
                    );
                    return Ok(ProcedureResult::rejected(message));
                }

                warn!(
                    purchase_order_id = %purchase_order_id,
                    rejection = %message,
                    "Quotation evidence present in list form; compensating via repair approval"
                );
            }
        }

        self.repository
            .apply_approval_repair(purchase_order_id, actor_id)
            .await?;
        APPROVAL_REPAIRS.inc();

        self.event_sender
            .send(Event::PurchaseOrderStatusChanged {
                purchase_order_id,
                old_status,
                new_status: PurchaseOrderStatus::Approved,
            })
            .await
            .map_err(ServiceError::EventError)?;
        self.event_sender
            .send(Event::PurchaseOrderApprovalRepaired {
                purchase_order_id,
                reason: message,
                authorized_by: actor_id,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ProcedureResult::advanced(
            "Purchase order approved via policy exception",
        ))
    }

    async fn emit_transition_events(
        &self,
        purchase_order_id: Uuid,
        old_status: PurchaseOrderStatus,
        new_status: PurchaseOrderStatus,
    ) -> Result<(), ServiceError> {
        self.event_sender
            .send(Event::PurchaseOrderStatusChanged {
                purchase_order_id,
                old_status,
                new_status,
            })
            .await
            .map_err(ServiceError::EventError)?;

        match new_status {
            PurchaseOrderStatus::Approved => {
                self.event_sender
                    .send(Event::PurchaseOrderApproved(purchase_order_id))
                    .await
                    .map_err(ServiceError::EventError)?;
            }
            PurchaseOrderStatus::Validated => {
                self.event_sender
                    .send(Event::PurchaseOrderValidated(purchase_order_id))
                    .await
                    .map_err(ServiceError::EventError)?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Read-only workflow position for a purchase order. Safe to call
    /// repeatedly; performs no mutation.
    #[instrument(skip(self), fields(purchase_order_id = %purchase_order_id))]
    pub async fn get_workflow_status(
        &self,
        purchase_order_id: Uuid,
    ) -> Result<WorkflowStatusResponse, ServiceError> {
        let order = self
            .repository
            .find_by_id(purchase_order_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Purchase order {} not found",
                    purchase_order_id
                ))
            })?;

        let allowed_next_statuses =
            self.procedure
                .valid_next_statuses(order.status, order.po_type, order.po_purpose);
        let stage = describe_stage(order.status, order.po_type);

        let authorization = match (order.authorized_by, order.authorization_date) {
            (Some(authorized_by), Some(authorization_date)) => Some(AuthorizationSnapshot {
                authorized_by,
                authorization_date,
            }),
            _ => None,
        };

        Ok(WorkflowStatusResponse {
            purchase_order_id: order.id,
            order_number: order.order_number,
            current_status: order.status,
            can_advance: !allowed_next_statuses.is_empty(),
            allowed_next_statuses,
            requires_quote: order.requires_quote,
            workflow_stage: stage.workflow_stage,
            recommendation: stage.recommendation,
            authorization,
        })
    }
}

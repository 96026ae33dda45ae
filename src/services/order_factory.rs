use std::sync::Arc;

use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::purchase_order_entity::{
    ActiveModel as PurchaseOrderActiveModel, Model as PurchaseOrderModel, PurchaseOrderPurpose,
    PurchaseOrderStatus, QuotationSelectionStatus,
};
use crate::models::purchase_order_item_entity::ActiveModel as ItemActiveModel;
use crate::repositories::PurchaseOrderRepository;
use crate::services::po_validation::{validate_create_request, CreatePurchaseOrderRequest};
use crate::services::quote_requirement::evaluate_quote_requirement;

lazy_static! {
    static ref PO_CREATIONS: IntCounter = IntCounter::new(
        "purchase_order_creations_total",
        "Total number of purchase orders created"
    )
    .expect("metric can be created");
    static ref PO_CREATION_FAILURES: IntCounter = IntCounter::new(
        "purchase_order_creation_failures_total",
        "Total number of rejected purchase order creation requests"
    )
    .expect("metric can be created");
}

/// Assembles and persists new purchase orders.
#[derive(Clone)]
pub struct PurchaseOrderFactory {
    repository: Arc<PurchaseOrderRepository>,
    event_sender: Arc<EventSender>,
}

/// Human-readable order number: `PO-` + the last six digits of the unix
/// timestamp + a three-digit random suffix. Collisions are unlikely at
/// expected volumes and the unique column constraint is the real guard.
fn generate_order_number() -> String {
    let stamp = Utc::now().timestamp().rem_euclid(1_000_000);
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("PO-{:06}-{:03}", stamp, suffix)
}

impl PurchaseOrderFactory {
    pub fn new(repository: Arc<PurchaseOrderRepository>, event_sender: Arc<EventSender>) -> Self {
        Self {
            repository,
            event_sender,
        }
    }

    /// Validates, assembles and persists a typed purchase order.
    ///
    /// The initial status comes from the quote requirement ruling: orders
    /// that need a quotation start in `draft`, everything else goes straight
    /// to `pending_approval`.
    #[instrument(skip(self, request), fields(actor_id = %actor_id))]
    pub async fn create_typed_purchase_order(
        &self,
        request: CreatePurchaseOrderRequest,
        actor_id: Uuid,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        let outcome = validate_create_request(&request);
        if !outcome.is_valid {
            PO_CREATION_FAILURES.inc();
            return Err(ServiceError::ValidationError(outcome.errors.join("; ")));
        }

        // The validator guarantees these parse.
        let po_type = request.parsed_po_type().ok_or_else(|| {
            ServiceError::InvalidInput("Purchase order type is required".to_string())
        })?;

        let po_purpose = match request.po_purpose.as_deref().map(str::trim) {
            None | Some("") => {
                if request.work_order_id.is_some() {
                    PurchaseOrderPurpose::WorkOrderCash
                } else {
                    PurchaseOrderPurpose::InventoryRestock
                }
            }
            Some(raw) => raw.parse::<PurchaseOrderPurpose>().map_err(|_| {
                ServiceError::InvalidInput(format!("Unknown purchase order purpose: {}", raw))
            })?,
        };

        let total_amount = request
            .total_amount
            .ok_or_else(|| ServiceError::InvalidInput("Total amount is required".to_string()))?;

        let decision = evaluate_quote_requirement(po_type, total_amount, Some(po_purpose));
        let initial_status = if decision.requires_quote {
            PurchaseOrderStatus::Draft
        } else {
            PurchaseOrderStatus::PendingApproval
        };
        let selection_status = if decision.requires_quote {
            QuotationSelectionStatus::PendingQuotations
        } else {
            QuotationSelectionStatus::NotRequired
        };

        let id = Uuid::new_v4();
        let order_number = generate_order_number();
        let now = Utc::now();

        let order = PurchaseOrderActiveModel {
            id: Set(id),
            order_number: Set(order_number.clone()),
            po_type: Set(po_type),
            po_purpose: Set(po_purpose),
            status: Set(initial_status),
            supplier: Set(request
                .supplier
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string()),
            service_provider: Set(request
                .service_provider
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)),
            total_amount: Set(total_amount),
            payment_method: Set(request.parsed_payment_method()),
            max_payment_date: Set(request.parsed_max_payment_date()),
            requires_quote: Set(decision.requires_quote),
            quotation_selection_required: Set(decision.requires_quote),
            quotation_selection_status: Set(selection_status),
            // Only the list column is written; the singular one stays legacy.
            quotation_url: Set(None),
            quotation_urls: Set(serde_json::json!(request.quotation_urls)),
            work_order_id: Set(request.work_order_id),
            plant_id: Set(request.plant_id),
            authorized_by: Set(None),
            authorization_date: Set(None),
            notes: Set(request.notes.clone()),
            created_by: Set(actor_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self.repository.create(order).await?;

        let items: Vec<ItemActiveModel> = request
            .items
            .iter()
            .map(|item| ItemActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(id),
                description: Set(item.description.clone()),
                quantity: Set(item.quantity),
                unit_cost: Set(item.unit_cost),
                total_cost: Set(item.unit_cost * Decimal::from(item.quantity)),
                created_at: Set(now),
            })
            .collect();
        self.repository.insert_items(items).await?;

        self.event_sender
            .send(Event::PurchaseOrderCreated(id))
            .await
            .map_err(ServiceError::EventError)?;

        PO_CREATIONS.inc();
        info!(
            purchase_order_id = %id,
            order_number = %order_number,
            po_type = %po_type,
            status = %initial_status,
            "Purchase order created"
        );

        Ok(created)
    }
}

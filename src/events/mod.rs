use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::purchase_order_entity::PurchaseOrderStatus;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Builds a bounded event channel pair.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Purchase order lifecycle
    PurchaseOrderCreated(Uuid),
    PurchaseOrderStatusChanged {
        purchase_order_id: Uuid,
        old_status: PurchaseOrderStatus,
        new_status: PurchaseOrderStatus,
    },
    PurchaseOrderApproved(Uuid),
    /// Approval applied through the policy-exception repair path rather than
    /// the authoritative transition procedure. Carries the rejection reason
    /// that was compensated so the audit trail stays complete.
    PurchaseOrderApprovalRepaired {
        purchase_order_id: Uuid,
        reason: String,
        authorized_by: Uuid,
    },
    PurchaseOrderValidated(Uuid),
}

// Define a trait for handling events. Handlers implementing this trait will process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

// Function to process incoming events and log them for downstream consumers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::PurchaseOrderCreated(id) => {
                info!(purchase_order_id = %id, "Purchase order created");
            }
            Event::PurchaseOrderStatusChanged {
                purchase_order_id,
                old_status,
                new_status,
            } => {
                info!(
                    purchase_order_id = %purchase_order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Purchase order status changed"
                );
            }
            Event::PurchaseOrderApproved(id) => {
                info!(purchase_order_id = %id, "Purchase order approved");
            }
            Event::PurchaseOrderApprovalRepaired {
                purchase_order_id,
                reason,
                authorized_by,
            } => {
                // Policy-exception audit entry; kept at warn so it stands out in review.
                tracing::warn!(
                    purchase_order_id = %purchase_order_id,
                    reason = %reason,
                    authorized_by = %authorized_by,
                    "Purchase order approved via repair path"
                );
            }
            Event::PurchaseOrderValidated(id) => {
                info!(purchase_order_id = %id, "Purchase order validated");
            }
        }
    }

    error!("Event processing loop terminated: channel closed");
}

use serde::{Deserialize, Serialize};

use crate::models::purchase_order_entity::{PurchaseOrderStatus, PurchaseOrderType};

/// Human-readable position of an order in its workflow, for UI consumption.
/// Pure presentation; nothing downstream branches on these strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageInfo {
    pub workflow_stage: String,
    pub recommendation: String,
}

impl StageInfo {
    fn new(stage: &str, recommendation: &str) -> Self {
        Self {
            workflow_stage: stage.to_string(),
            recommendation: recommendation.to_string(),
        }
    }
}

/// Maps a status/type pair to a stage label and a next-step hint.
pub fn describe_stage(status: PurchaseOrderStatus, po_type: PurchaseOrderType) -> StageInfo {
    use PurchaseOrderStatus::*;
    use PurchaseOrderType::*;

    match (status, po_type) {
        (Draft, SpecialOrder) => StageInfo::new(
            "Quotation collection",
            "Collect at least two competing quotations and select a supplier",
        ),
        (Draft, DirectService) => StageInfo::new(
            "Quotation collection",
            "Attach the service quotation, then request approval",
        ),
        (Draft, DirectPurchase) => StageInfo::new(
            "Preparation",
            "Complete the order details and request approval",
        ),
        (Quoted, _) => StageInfo::new(
            "Supplier selected",
            "Request approval to commit the order",
        ),
        (PendingApproval, _) => StageInfo::new(
            "Awaiting approval",
            "An authorized approver must review this order",
        ),
        (Approved, SpecialOrder) => StageInfo::new(
            "Approved",
            "Place the order with the selected supplier",
        ),
        (Approved, _) => StageInfo::new("Approved", "Carry out the purchase"),
        (Purchased, _) => StageInfo::new(
            "Purchased",
            "Upload the purchase receipt to continue",
        ),
        (Ordered, _) => StageInfo::new(
            "Ordered",
            "Confirm goods receipt when the delivery arrives",
        ),
        (Received, _) => StageInfo::new(
            "Goods received",
            "Upload the supplier receipt to continue",
        ),
        (ReceiptUploaded, _) => StageInfo::new(
            "Receipt under review",
            "Finance validates the receipt against the order",
        ),
        (Validated, _) => StageInfo::new(
            "Validated",
            "The order is complete; no further action is needed",
        ),
    }
}

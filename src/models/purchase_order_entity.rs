use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display, strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PurchaseOrderType {
    /// Informal/local purchase paid on the spot.
    #[sea_orm(string_value = "direct_purchase")]
    DirectPurchase,
    /// Service contracted directly with a provider.
    #[sea_orm(string_value = "direct_service")]
    DirectService,
    /// Formal supplier engagement with competing quotations.
    #[sea_orm(string_value = "special_order")]
    SpecialOrder,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display, strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PurchaseOrderPurpose {
    /// Cash-funded purchase attributed to a maintenance work order.
    #[sea_orm(string_value = "work_order_cash")]
    WorkOrderCash,
    /// Inventory-funded purchase attributed to a maintenance work order.
    #[sea_orm(string_value = "work_order_inventory")]
    WorkOrderInventory,
    /// Standalone plant-level inventory restock.
    #[sea_orm(string_value = "inventory_restock")]
    InventoryRestock,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display, strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PurchaseOrderStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "quoted")]
    Quoted,
    #[sea_orm(string_value = "pending_approval")]
    PendingApproval,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "purchased")]
    Purchased,
    #[sea_orm(string_value = "ordered")]
    Ordered,
    #[sea_orm(string_value = "received")]
    Received,
    #[sea_orm(string_value = "receipt_uploaded")]
    ReceiptUploaded,
    #[sea_orm(string_value = "validated")]
    Validated,
}

impl PurchaseOrderStatus {
    /// `validated` is the only terminal state; no transition leaves it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Validated)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display, strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "card")]
    Card,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display, strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuotationSelectionStatus {
    #[sea_orm(string_value = "not_required")]
    NotRequired,
    #[sea_orm(string_value = "pending_quotations")]
    PendingQuotations,
    #[sea_orm(string_value = "pending_selection")]
    PendingSelection,
    #[sea_orm(string_value = "selected")]
    Selected,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub po_type: PurchaseOrderType,
    pub po_purpose: PurchaseOrderPurpose,
    pub status: PurchaseOrderStatus,
    pub supplier: String,
    pub service_provider: Option<String>,
    pub total_amount: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub max_payment_date: Option<NaiveDate>,
    pub requires_quote: bool,
    pub quotation_selection_required: bool,
    pub quotation_selection_status: QuotationSelectionStatus,
    /// Legacy single-URL column. Read-folded into `quotation_urls`; never written.
    pub quotation_url: Option<String>,
    pub quotation_urls: Json,
    pub work_order_id: Option<Uuid>,
    pub plant_id: Option<Uuid>,
    pub authorized_by: Option<Uuid>,
    pub authorization_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Canonical quotation evidence: the `quotation_urls` array with the
    /// legacy singular column folded in as an implicit member when non-empty.
    pub fn quotation_evidence(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .quotation_urls
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        if let Some(legacy) = self.quotation_url.as_deref() {
            if !legacy.trim().is_empty() && !urls.iter().any(|u| u == legacy) {
                urls.push(legacy.to_string());
            }
        }

        urls
    }

    pub fn has_quotation_evidence(&self) -> bool {
        !self.quotation_evidence().is_empty()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::models::purchase_order_item_entity::Entity")]
    Items,
}

impl Related<crate::models::purchase_order_item_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

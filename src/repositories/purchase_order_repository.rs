use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::purchase_order_entity::{
    ActiveModel as PurchaseOrderActiveModel, Column, Entity as PurchaseOrder,
    Model as PurchaseOrderModel, PurchaseOrderStatus,
};
use crate::models::purchase_order_item_entity::{
    ActiveModel as ItemActiveModel, Entity as PurchaseOrderItem, Model as ItemModel,
};
use crate::repositories::Repository;

use super::BaseRepository;

/// Repository for purchase order persistence.
#[derive(Debug)]
pub struct PurchaseOrderRepository {
    base: BaseRepository,
}

impl PurchaseOrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PurchaseOrderModel>, ServiceError> {
        PurchaseOrder::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<PurchaseOrderModel>, ServiceError> {
        PurchaseOrder::find()
            .filter(Column::OrderNumber.eq(order_number))
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_all(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<PurchaseOrderModel>, u64), ServiceError> {
        let paginator = PurchaseOrder::find()
            .order_by_desc(Column::CreatedAt)
            .paginate(self.base.get_db(), page_size);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;

        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((orders, total))
    }

    pub async fn find_by_status(
        &self,
        status: PurchaseOrderStatus,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<PurchaseOrderModel>, u64), ServiceError> {
        let paginator = PurchaseOrder::find()
            .filter(Column::Status.eq(status))
            .order_by_desc(Column::CreatedAt)
            .paginate(self.base.get_db(), page_size);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;

        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((orders, total))
    }

    pub async fn find_by_work_order(
        &self,
        work_order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderModel>, ServiceError> {
        PurchaseOrder::find()
            .filter(Column::WorkOrderId.eq(work_order_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn create(
        &self,
        order: PurchaseOrderActiveModel,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        order
            .insert(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn insert_items(
        &self,
        items: Vec<ItemActiveModel>,
    ) -> Result<(), ServiceError> {
        if items.is_empty() {
            return Ok(());
        }
        PurchaseOrderItem::insert_many(items)
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(())
    }

    pub async fn get_items(
        &self,
        purchase_order_id: Uuid,
    ) -> Result<Vec<ItemModel>, ServiceError> {
        let order = self.find_by_id(purchase_order_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Purchase order {} not found",
                purchase_order_id
            ))
        })?;

        order
            .find_related(PurchaseOrderItem)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Narrow approval update used by the policy-exception repair path.
    ///
    /// Touches exactly four columns: status, authorized_by, authorization_date
    /// and updated_at. All other mutation goes through the transition
    /// procedure; widening this write needs a matching audit-trail change.
    #[instrument(skip(self), fields(purchase_order_id = %purchase_order_id, actor_id = %actor_id))]
    pub async fn apply_approval_repair(
        &self,
        purchase_order_id: Uuid,
        actor_id: Uuid,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        let order = self.find_by_id(purchase_order_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Purchase order {} not found",
                purchase_order_id
            ))
        })?;

        let mut active: PurchaseOrderActiveModel = order.into();
        active.status = Set(PurchaseOrderStatus::Approved);
        active.authorized_by = Set(Some(actor_id));
        active.authorization_date = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(
            purchase_order_id = %purchase_order_id,
            "Approval repair write applied"
        );

        Ok(updated)
    }
}

impl Repository for PurchaseOrderRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    repositories::PurchaseOrderRepository,
    services::{
        order_factory::PurchaseOrderFactory,
        purchase_order_workflow::PurchaseOrderWorkflowService,
        transition_procedure::{DbTransitionProcedure, TransitionProcedure},
    },
};

/// Factory for creating service instances with shared dependencies
pub struct ServiceFactory {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ServiceFactory {
    /// Creates a new service factory with the given dependencies
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates the purchase order repository
    pub fn purchase_order_repository(&self) -> Arc<PurchaseOrderRepository> {
        Arc::new(PurchaseOrderRepository::new(self.db_pool.clone()))
    }

    /// Creates the database-backed transition procedure
    pub fn transition_procedure(&self) -> Arc<dyn TransitionProcedure> {
        Arc::new(DbTransitionProcedure::new(self.db_pool.clone()))
    }

    /// Creates the purchase order factory service
    pub fn order_factory(&self) -> PurchaseOrderFactory {
        PurchaseOrderFactory::new(
            self.purchase_order_repository(),
            Arc::new(self.event_sender.clone()),
        )
    }

    /// Creates the workflow orchestration service
    pub fn workflow_service(&self) -> PurchaseOrderWorkflowService {
        PurchaseOrderWorkflowService::new(
            self.purchase_order_repository(),
            self.transition_procedure(),
            Arc::new(self.event_sender.clone()),
        )
    }

    /// Gets a reference to the database pool
    pub fn db_pool(&self) -> &Arc<DbPool> {
        &self.db_pool
    }

    /// Gets a reference to the event sender
    pub fn event_sender(&self) -> &EventSender {
        &self.event_sender
    }
}

/// Service container holding all service instances
#[derive(Clone)]
pub struct ServiceContainer {
    pub order_factory: Arc<PurchaseOrderFactory>,
    pub workflow: Arc<PurchaseOrderWorkflowService>,
    pub repository: Arc<PurchaseOrderRepository>,
}

impl ServiceContainer {
    /// Creates a new service container with all services initialized
    pub fn new(factory: &ServiceFactory) -> Self {
        Self {
            order_factory: Arc::new(factory.order_factory()),
            workflow: Arc::new(factory.workflow_service()),
            repository: factory.purchase_order_repository(),
        }
    }
}

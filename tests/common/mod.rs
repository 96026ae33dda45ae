#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use procurement_api::errors::ServiceError;
use procurement_api::events::{self, Event};
use procurement_api::migrator::Migrator;
use procurement_api::models::purchase_order_entity::{
    ActiveModel as PurchaseOrderActiveModel, Model as PurchaseOrderModel, PaymentMethod,
    PurchaseOrderPurpose, PurchaseOrderStatus, PurchaseOrderType, QuotationSelectionStatus,
};
use procurement_api::models::purchase_order_item_entity::ActiveModel as ItemActiveModel;
use procurement_api::repositories::PurchaseOrderRepository;
use procurement_api::services::po_validation::{
    CreatePurchaseOrderItem, CreatePurchaseOrderRequest,
};
use procurement_api::services::quote_requirement::{evaluate_quote_requirement, QuoteDecision};
use procurement_api::services::transition_procedure::{
    next_statuses_for, DbTransitionProcedure, ProcedureResult, TransitionProcedure,
};
use procurement_api::services::{PurchaseOrderFactory, PurchaseOrderWorkflowService};

/// Test harness backed by an in-memory SQLite database with the real schema.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub repository: Arc<PurchaseOrderRepository>,
    pub factory: PurchaseOrderFactory,
    pub workflow: PurchaseOrderWorkflowService,
    pub events: mpsc::Receiver<Event>,
}

async fn connect() -> Arc<DatabaseConnection> {
    // A single connection keeps every query on the same in-memory database.
    let mut opts = ConnectOptions::new("sqlite::memory:".to_owned());
    opts.max_connections(1).min_connections(1);

    let pool = Database::connect(opts)
        .await
        .expect("failed to open in-memory sqlite");
    Migrator::up(&pool, None)
        .await
        .expect("failed to run migrations");
    Arc::new(pool)
}

impl TestApp {
    /// Full stack wired against the database-backed transition procedure.
    pub async fn new() -> Self {
        let db = connect().await;
        let procedure: Arc<dyn TransitionProcedure> =
            Arc::new(DbTransitionProcedure::new(db.clone()));
        Self::assemble(db, procedure)
    }

    /// Stack whose transition procedure replays a fixed script of results,
    /// for exercising the orchestrator's rejection handling deterministically.
    pub async fn with_scripted_procedure(
        script: Vec<ProcedureResult>,
    ) -> (Self, Arc<ScriptedProcedure>) {
        let db = connect().await;
        let scripted = ScriptedProcedure::new(script);
        let app = Self::assemble(db, scripted.clone());
        (app, scripted)
    }

    fn assemble(db: Arc<DatabaseConnection>, procedure: Arc<dyn TransitionProcedure>) -> Self {
        let (event_sender, event_rx) = events::event_channel(64);
        let repository = Arc::new(PurchaseOrderRepository::new(db.clone()));
        let factory =
            PurchaseOrderFactory::new(repository.clone(), Arc::new(event_sender.clone()));
        let workflow = PurchaseOrderWorkflowService::new(
            repository.clone(),
            procedure,
            Arc::new(event_sender),
        );

        Self {
            db,
            repository,
            factory,
            workflow,
            events: event_rx,
        }
    }

    /// Drains every event currently buffered on the channel.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }
}

/// Transition procedure that replays pre-baked results and records each call.
pub struct ScriptedProcedure {
    results: Mutex<VecDeque<ProcedureResult>>,
    calls: Mutex<Vec<(Uuid, PurchaseOrderStatus)>>,
}

impl ScriptedProcedure {
    pub fn new(script: Vec<ProcedureResult>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub fn calls(&self) -> Vec<(Uuid, PurchaseOrderStatus)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl TransitionProcedure for ScriptedProcedure {
    async fn advance(
        &self,
        purchase_order_id: Uuid,
        new_status: PurchaseOrderStatus,
        _actor_id: Uuid,
        _notes: Option<String>,
    ) -> Result<ProcedureResult, ServiceError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((purchase_order_id, new_status));
        self.results
            .lock()
            .expect("results lock")
            .pop_front()
            .ok_or_else(|| ServiceError::InternalError("procedure script exhausted".to_string()))
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

/// Row template for inserting purchase orders directly, bypassing the factory,
/// so tests can start from any point in the workflow.
pub struct OrderSeed {
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
    pub quotation_url: Option<String>,
    pub quotation_urls: serde_json::Value,
    pub work_order_id: Option<Uuid>,
    pub plant_id: Option<Uuid>,
}

impl Default for OrderSeed {
    fn default() -> Self {
        Self {
            po_type: PurchaseOrderType::DirectPurchase,
            po_purpose: PurchaseOrderPurpose::WorkOrderCash,
            status: PurchaseOrderStatus::Draft,
            supplier: "Acme Industrial".to_string(),
            service_provider: None,
            total_amount: dec!(250),
            payment_method: Some(PaymentMethod::Cash),
            max_payment_date: None,
            requires_quote: false,
            quotation_selection_required: false,
            quotation_selection_status: QuotationSelectionStatus::NotRequired,
            quotation_url: None,
            quotation_urls: json!([]),
            work_order_id: Some(Uuid::new_v4()),
            plant_id: None,
        }
    }
}

impl OrderSeed {
    /// Special order sitting in the quotation sub-process.
    pub fn special_order() -> Self {
        Self {
            po_type: PurchaseOrderType::SpecialOrder,
            total_amount: dec!(12_000),
            requires_quote: true,
            quotation_selection_required: true,
            quotation_selection_status: QuotationSelectionStatus::PendingQuotations,
            ..Self::default()
        }
    }

    pub async fn insert(self, db: &DatabaseConnection) -> PurchaseOrderModel {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let suffix = id.simple().to_string();

        PurchaseOrderActiveModel {
            id: Set(id),
            order_number: Set(format!("PO-TEST-{}", &suffix[..12])),
            po_type: Set(self.po_type),
            po_purpose: Set(self.po_purpose),
            status: Set(self.status),
            supplier: Set(self.supplier),
            service_provider: Set(self.service_provider),
            total_amount: Set(self.total_amount),
            payment_method: Set(self.payment_method),
            max_payment_date: Set(self.max_payment_date),
            requires_quote: Set(self.requires_quote),
            quotation_selection_required: Set(self.quotation_selection_required),
            quotation_selection_status: Set(self.quotation_selection_status),
            quotation_url: Set(self.quotation_url),
            quotation_urls: Set(self.quotation_urls),
            work_order_id: Set(self.work_order_id),
            plant_id: Set(self.plant_id),
            authorized_by: Set(None),
            authorization_date: Set(None),
            notes: Set(None),
            created_by: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("failed to seed purchase order")
    }
}

/// Inserts a single line item for the given order.
pub async fn seed_item(db: &DatabaseConnection, purchase_order_id: Uuid) {
    ItemActiveModel {
        id: Set(Uuid::new_v4()),
        purchase_order_id: Set(purchase_order_id),
        description: Set("Bearing assembly".to_string()),
        quantity: Set(4),
        unit_cost: Set(dec!(25)),
        total_cost: Set(dec!(100)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("failed to seed line item");
}

/// Creation request that passes validation for a direct purchase.
pub fn direct_purchase_request() -> CreatePurchaseOrderRequest {
    CreatePurchaseOrderRequest {
        work_order_id: Some(Uuid::new_v4()),
        plant_id: None,
        po_type: Some("direct_purchase".to_string()),
        po_purpose: None,
        supplier: Some("Acme Industrial".to_string()),
        service_provider: None,
        total_amount: Some(dec!(250)),
        payment_method: Some("cash".to_string()),
        max_payment_date: None,
        items: vec![CreatePurchaseOrderItem {
            description: "Hex bolts M8".to_string(),
            quantity: 10,
            unit_cost: dec!(2.5),
        }],
        quotation_urls: vec![],
        notes: None,
    }
}

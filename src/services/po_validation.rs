use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::models::purchase_order_entity::{PaymentMethod, PurchaseOrderType};

/// Incoming request for creating a typed purchase order.
///
/// Classification fields arrive as raw strings so the validator can report
/// unknown variants alongside every other problem in one batch instead of
/// failing at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderRequest {
    pub work_order_id: Option<Uuid>,
    pub plant_id: Option<Uuid>,
    pub po_type: Option<String>,
    pub po_purpose: Option<String>,
    pub supplier: Option<String>,
    pub service_provider: Option<String>,
    pub total_amount: Option<Decimal>,
    pub payment_method: Option<String>,
    /// ISO date (`YYYY-MM-DD`); required when paying by transfer.
    pub max_payment_date: Option<String>,
    #[serde(default)]
    pub items: Vec<CreatePurchaseOrderItem>,
    #[serde(default)]
    pub quotation_urls: Vec<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderItem {
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_cost: Decimal,
}

impl CreatePurchaseOrderRequest {
    pub fn parsed_po_type(&self) -> Option<PurchaseOrderType> {
        self.po_type
            .as_deref()
            .and_then(|raw| PurchaseOrderType::from_str(raw.trim()).ok())
    }

    pub fn parsed_payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
            .as_deref()
            .and_then(|raw| PaymentMethod::from_str(raw.trim()).ok())
    }

    pub fn parsed_max_payment_date(&self) -> Option<NaiveDate> {
        self.max_payment_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
    }
}

/// Batch validation result: every applicable problem, never just the first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Structural and business validation of a creation request before any
/// persistence. No I/O, no side effects; errors accumulate in check order.
pub fn validate_create_request(request: &CreatePurchaseOrderRequest) -> ValidationOutcome {
    validate_create_request_on(request, Utc::now().date_naive())
}

fn validate_create_request_on(
    request: &CreatePurchaseOrderRequest,
    today: NaiveDate,
) -> ValidationOutcome {
    let mut errors = Vec::new();

    if request.work_order_id.is_none() && request.plant_id.is_none() {
        errors.push(
            "A purchase order must be linked to a work order or a plant".to_string(),
        );
    }

    let po_type = match request.po_type.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push("Purchase order type is required".to_string());
            None
        }
        Some(raw) => match PurchaseOrderType::from_str(raw) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.push(format!("Unknown purchase order type: {}", raw));
                None
            }
        },
    };

    if request
        .supplier
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .is_empty()
    {
        errors.push("Supplier is required".to_string());
    }

    match request.total_amount {
        Some(amount) if amount > Decimal::ZERO => {}
        _ => errors.push("Total amount must be greater than zero".to_string()),
    }

    if po_type == Some(PurchaseOrderType::DirectService)
        && request
            .service_provider
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
    {
        errors.push("Service provider is required for direct service orders".to_string());
    }

    let payment_method = match request.payment_method.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match PaymentMethod::from_str(raw) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.push(format!("Unknown payment method: {}", raw));
                None
            }
        },
    };

    if payment_method == Some(PaymentMethod::Transfer) {
        match request.max_payment_date.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(
                    "Maximum payment date is required for transfer payments".to_string(),
                );
            }
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Err(_) => {
                    errors.push(format!("Maximum payment date is not a valid date: {}", raw));
                }
                // Date-only comparison; time of day never matters here.
                Ok(date) if date < today => {
                    errors.push("Maximum payment date cannot be in the past".to_string());
                }
                Ok(_) => {}
            },
        }
    }

    ValidationOutcome::from_errors(errors)
}

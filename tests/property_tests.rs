//! Property-based tests for the workflow engine's pure core: quote gating,
//! rejection classification, chain progression and creation validation.

use proptest::prelude::*;
use proptest::sample::select;
use rust_decimal::Decimal;
use strum::IntoEnumIterator;
use uuid::Uuid;

use procurement_api::models::purchase_order_entity::{
    PurchaseOrderPurpose, PurchaseOrderStatus, PurchaseOrderType,
};
use procurement_api::services::po_validation::{
    validate_create_request, CreatePurchaseOrderRequest,
};
use procurement_api::services::quote_requirement::{
    evaluate_quote_requirement, SERVICE_QUOTE_THRESHOLD,
};
use procurement_api::services::transition_procedure::{
    classify_procedure_result, next_statuses_for, ProcedureResult, RejectionReason,
    TransitionOutcome,
};

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000, 0u32..100)
        .prop_map(|(dollars, cents)| Decimal::new(dollars * 100 + i64::from(cents), 2))
}

fn po_type_strategy() -> impl Strategy<Value = PurchaseOrderType> {
    select(PurchaseOrderType::iter().collect::<Vec<_>>())
}

fn purpose_strategy() -> impl Strategy<Value = PurchaseOrderPurpose> {
    select(PurchaseOrderPurpose::iter().collect::<Vec<_>>())
}

fn status_strategy() -> impl Strategy<Value = PurchaseOrderStatus> {
    select(PurchaseOrderStatus::iter().collect::<Vec<_>>())
}

fn base_request(total_amount: Decimal) -> CreatePurchaseOrderRequest {
    CreatePurchaseOrderRequest {
        work_order_id: Some(Uuid::new_v4()),
        plant_id: None,
        po_type: Some("direct_purchase".to_string()),
        po_purpose: None,
        supplier: Some("Acme Industrial".to_string()),
        service_provider: None,
        total_amount: Some(total_amount),
        payment_method: None,
        max_payment_date: None,
        items: vec![],
        quotation_urls: vec![],
        notes: None,
    }
}

// Property: the quote ruling depends only on type, amount and purpose, and the
// service threshold is the single amount-sensitive rule.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn direct_purchases_never_require_a_quote(
        amount in amount_strategy(),
        purpose in purpose_strategy(),
    ) {
        let decision = evaluate_quote_requirement(
            PurchaseOrderType::DirectPurchase,
            amount,
            Some(purpose),
        );
        prop_assert!(!decision.requires_quote);
    }

    #[test]
    fn direct_service_gating_matches_the_threshold_exactly(
        amount in amount_strategy(),
        purpose in purpose_strategy(),
    ) {
        let decision = evaluate_quote_requirement(
            PurchaseOrderType::DirectService,
            amount,
            Some(purpose),
        );
        prop_assert_eq!(decision.requires_quote, amount >= SERVICE_QUOTE_THRESHOLD);
        prop_assert_eq!(decision.threshold_amount, Some(SERVICE_QUOTE_THRESHOLD));
    }

    #[test]
    fn special_orders_always_require_a_quote(
        amount in amount_strategy(),
        purpose in purpose_strategy(),
    ) {
        let decision = evaluate_quote_requirement(
            PurchaseOrderType::SpecialOrder,
            amount,
            Some(purpose),
        );
        prop_assert!(decision.requires_quote);
    }
}

// Property: classification recognizes the two compensable patterns and keeps
// every message byte-for-byte intact.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn quotation_rejections_are_recognized(prefix in "[A-Za-z ]{0,40}") {
        prop_assume!(!prefix.to_lowercase().contains("payment date"));
        let message = format!("{}quotation missing", prefix);
        let outcome = classify_procedure_result(ProcedureResult::rejected(message.clone()));
        let ok = matches!(
            outcome,
            TransitionOutcome::RejectedKnown {
                reason: RejectionReason::QuotationMissing,
                message: m,
            } if m == message
        );
        prop_assert!(ok);
    }

    #[test]
    fn payment_date_rejections_win_over_quotation_matching(suffix in "[a-z ]{0,40}") {
        let message = format!("payment date is in the past {}", suffix);
        let outcome = classify_procedure_result(ProcedureResult::rejected(message.clone()));
        let ok = matches!(
            outcome,
            TransitionOutcome::RejectedKnown {
                reason: RejectionReason::PaymentDateInPast,
                message: m,
            } if m == message
        );
        prop_assert!(ok);
    }

    #[test]
    fn unmatched_rejections_stay_unknown_with_their_message(
        message in "[A-Za-z0-9 ]{1,80}",
    ) {
        let lowered = message.to_lowercase();
        prop_assume!(!lowered.contains("quotation"));
        prop_assume!(!(lowered.contains("payment date") && lowered.contains("past")));

        let outcome = classify_procedure_result(ProcedureResult::rejected(message.clone()));
        let ok = matches!(
            outcome,
            TransitionOutcome::RejectedUnknown { message: m } if m == message
        );
        prop_assert!(ok);
    }

    #[test]
    fn successful_results_are_never_reclassified(message in "[A-Za-z0-9 ]{1,80}") {
        let outcome = classify_procedure_result(ProcedureResult::advanced(message.clone()));
        let ok = matches!(
            outcome,
            TransitionOutcome::Advanced { message: m } if m == message
        );
        prop_assert!(ok);
    }
}

// Property: every chain walks forward to the terminal status in bounded steps
// and never revisits a status.
proptest! {
    #[test]
    fn chains_terminate_without_revisiting(
        start in status_strategy(),
        po_type in po_type_strategy(),
        purpose in purpose_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut current = start;
        let mut seen = vec![current];

        for _ in 0..PurchaseOrderStatus::iter().count() {
            let allowed = next_statuses_for(current, po_type, purpose);
            if allowed.is_empty() {
                break;
            }
            current = allowed[pick.index(allowed.len())];
            prop_assert!(!seen.contains(&current), "revisited {}", current);
            seen.push(current);
        }

        prop_assert!(
            next_statuses_for(current, po_type, purpose).is_empty(),
            "chain from {} did not terminate (stuck at {})",
            start,
            current
        );
        prop_assert!(current.is_terminal() || start == current || seen.len() > 1);
    }
}

// Property: creation validation accepts any positive amount on an otherwise
// complete request and rejects any non-positive amount.
proptest! {
    #[test]
    fn positive_amounts_pass_validation(amount in amount_strategy()) {
        prop_assume!(amount > Decimal::ZERO);
        let outcome = validate_create_request(&base_request(amount));
        prop_assert!(outcome.is_valid, "errors: {:?}", outcome.errors);
    }

    #[test]
    fn non_positive_amounts_fail_validation(dollars in 0i64..1_000_000) {
        let amount = Decimal::new(-dollars, 0);
        let outcome = validate_create_request(&base_request(amount));
        prop_assert!(!outcome.is_valid);
        prop_assert!(outcome
            .errors
            .iter()
            .any(|e| e.contains("greater than zero")));
    }
}

// Property: status labels round-trip through their wire form.
proptest! {
    #[test]
    fn status_strings_round_trip(status in status_strategy()) {
        use std::str::FromStr;
        let text = status.to_string();
        prop_assert_eq!(PurchaseOrderStatus::from_str(&text).unwrap(), status);
    }
}

//! End-to-end lifecycle tests against the store. Each scenario drives the
//! engines exactly the way the HTTP handlers do, asserting the envelope-level
//! outcomes; no network involved.

use rust_decimal_macros::dec;

use mandi_common::api::{
    AcceptSupplyRequest, AdvanceOrderRequest, CancelOrderRequest, CreateProductRequest,
    CreateSupplyRequest, OrderItemRequest, PlaceOrderRequest, SupplyActionRequest,
};
use mandi_common::error::MarketError;
use mandi_common::identity::{AggregatorId, ConsumerId, FarmerId};
use mandi_common::journey::JourneyStage;
use mandi_common::order::OrderStatus;
use mandi_common::payment::{PaymentMethod, PaymentStatus};
use mandi_common::supply::{MilletType, SupplyId};
use mandi_node::store::{payment_request, MarketStore, SupplyScope};

fn create_supply_request(millet: MilletType, qty: rust_decimal::Decimal) -> CreateSupplyRequest {
    CreateSupplyRequest {
        farmer_id: FarmerId("f-1".into()),
        farmer_name: "Lakshmi".into(),
        millet_type: millet,
        quantity_kg: qty,
        harvest_date: "2024-01-01".parse().unwrap(),
        packaging_date: "2024-01-03".parse().unwrap(),
        location: "Kolar".into(),
        farm_location: None,
    }
}

fn accept_request(aggregator: &str) -> AcceptSupplyRequest {
    AcceptSupplyRequest {
        aggregator_id: AggregatorId(aggregator.into()),
        aggregator_name: "Siri SHG".into(),
        quality_grade: "B".into(),
        collection_by: "Ravi".into(),
        collection_date: "2024-01-05".parse().unwrap(),
        expected_version: None,
    }
}

fn action_request(aggregator: &str) -> SupplyActionRequest {
    SupplyActionRequest {
        aggregator_id: AggregatorId(aggregator.into()),
        expected_version: None,
    }
}

fn product_from(supply: &SupplyId) -> CreateProductRequest {
    CreateProductRequest {
        supply_id: Some(supply.clone()),
        millet_type: MilletType::Ragi,
        quantity_kg: dec!(500),
        price_per_kg: dec!(90),
        quality_grade: "B".into(),
        packaging_date: "2024-01-03".parse().unwrap(),
        description: "Whole ragi, sorted and cleaned".into(),
    }
}

#[test]
fn scenario_a_supply_intake_to_listing() {
    let store = MarketStore::new();

    let id = store
        .create_supply(create_supply_request(MilletType::Ragi, dec!(500)))
        .unwrap();
    let snap = store.get_supply(&id).unwrap();
    assert_eq!(snap.supply.stage.name(), "pending");
    assert_eq!(snap.display_status, "pending");
    assert_eq!(snap.version, 1);

    store.accept_supply(&id, accept_request("shg-1")).unwrap();
    let snap = store.get_supply(&id).unwrap();
    assert_eq!(snap.supply.stage.name(), "accepted");
    assert_eq!(
        snap.supply.stage.acceptance().unwrap().grade.to_string(),
        "B"
    );
    assert_eq!(snap.version, 2);

    store
        .collect_supply(&id, action_request("shg-1"))
        .unwrap();
    let snap = store.get_supply(&id).unwrap();
    // Hand-off is a label change, not a stage change.
    assert_eq!(snap.supply.stage.name(), "accepted");
    assert_eq!(snap.display_status, "collected");

    store
        .complete_supply(&id, action_request("shg-1"))
        .unwrap();
    assert_eq!(store.get_supply(&id).unwrap().supply.stage.name(), "completed");

    let (product_id, code) = store.create_product(product_from(&id)).unwrap();
    assert!(!product_id.0.is_empty());
    let code = code.expect("supply-derived listing gets a traceability code");
    assert!(code.starts_with("MND-"));

    // Multiple listings from one completed supply are allowed.
    assert!(store.create_product(product_from(&id)).is_ok());

    // The code resolves back to the supply's journey.
    let trace = store.get_traceability(&code).unwrap();
    assert_eq!(trace.record.id, id);
    assert_eq!(trace.journey.len(), 4);
}

#[test]
fn scenario_b_complete_before_accept_fails() {
    let store = MarketStore::new();
    let id = store
        .create_supply(create_supply_request(MilletType::Ragi, dec!(500)))
        .unwrap();

    let err = store
        .complete_supply(&id, action_request("shg-1"))
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidTransition { .. }));
    assert_eq!(store.get_supply(&id).unwrap().supply.stage.name(), "pending");

    // Listing from a pending supply is equally rejected.
    let err = store.create_product(product_from(&id)).unwrap_err();
    assert!(matches!(err, MarketError::InvalidTransition { .. }));
}

#[test]
fn scenario_c_order_through_the_full_sequence() {
    let store = MarketStore::new();
    let (product_id, _) = store
        .create_product(CreateProductRequest {
            supply_id: None,
            millet_type: MilletType::Ragi,
            quantity_kg: dec!(100),
            price_per_kg: dec!(90),
            quality_grade: "A".into(),
            packaging_date: "2024-01-03".parse().unwrap(),
            description: String::new(),
        })
        .unwrap();

    let placed = store
        .place_order(PlaceOrderRequest {
            consumer_id: ConsumerId("c-1".into()),
            consumer_name: "Meera".into(),
            address: "12 MG Road, Bengaluru".into(),
            contact: "9999900000".into(),
            dropoff_location: "Indiranagar hub".into(),
            items: vec![OrderItemRequest {
                product_id: product_id.clone(),
                quantity_kg: dec!(2.5),
            }],
        })
        .unwrap();
    assert_eq!(placed.total_amount, dec!(225));
    assert!(placed.order_number.starts_with("ORD-"));

    let advance = AdvanceOrderRequest {
        aggregator_id: AggregatorId("shg-1".into()),
        next_status: None,
        expected_version: None,
    };
    let id = placed.order_id;
    assert_eq!(store.get_order(&id).unwrap().record.status, OrderStatus::OrderPlaced);
    assert_eq!(
        store.advance_order(&id, advance.clone()).unwrap(),
        OrderStatus::Confirmed
    );
    assert_eq!(
        store.advance_order(&id, advance.clone()).unwrap(),
        OrderStatus::PickedUp
    );
    assert_eq!(
        store.advance_order(&id, advance.clone()).unwrap(),
        OrderStatus::InTransit
    );
    assert_eq!(
        store.advance_order(&id, advance.clone()).unwrap(),
        OrderStatus::Delivered
    );

    let err = store.advance_order(&id, advance).unwrap_err();
    assert!(matches!(err, MarketError::AlreadyTerminal { .. }));

    // History is a prefix of the fixed sequence.
    let order = store.get_order(&id).unwrap().record;
    let statuses: Vec<OrderStatus> = order.history.iter().map(|h| h.status).collect();
    assert_eq!(statuses, OrderStatus::SEQUENCE.to_vec());
    assert_eq!(order.total_amount, dec!(225));
}

#[test]
fn scenario_d_journey_for_accepted_supply() {
    let store = MarketStore::new();
    let id = store
        .create_supply(CreateSupplyRequest {
            farmer_id: FarmerId("f-2".into()),
            farmer_name: "Gowri".into(),
            millet_type: MilletType::Foxtail,
            quantity_kg: dec!(120),
            harvest_date: "2023-11-15".parse().unwrap(),
            packaging_date: "2023-12-01".parse().unwrap(),
            location: "Tumakuru".into(),
            farm_location: None,
        })
        .unwrap();
    store
        .accept_supply(
            &id,
            AcceptSupplyRequest {
                aggregator_id: AggregatorId("shg-2".into()),
                aggregator_name: "Navodaya FPO".into(),
                quality_grade: "A".into(),
                collection_by: "Ramesh".into(),
                collection_date: "2023-12-05".parse().unwrap(),
                expected_version: None,
            },
        )
        .unwrap();

    let trace = store.get_traceability(&id.0).unwrap();
    let stages: Vec<JourneyStage> = trace.journey.iter().map(|p| p.stage).collect();
    assert_eq!(
        stages,
        vec![
            JourneyStage::Harvested,
            JourneyStage::Packaged,
            JourneyStage::Collected,
            JourneyStage::Verified
        ]
    );
    assert_eq!(trace.journey[2].actor, "Ramesh");

    // Deterministic: a second read yields the identical journey.
    assert_eq!(store.get_traceability(&id.0).unwrap().journey, trace.journey);
}

#[test]
fn payment_gate_follows_the_lifecycle() {
    let store = MarketStore::new();
    let farmer = FarmerId("f-1".into());
    let id = store
        .create_supply(create_supply_request(MilletType::Jowar, dec!(300)))
        .unwrap();

    // Pending: no grade, no price basis, no payout.
    let err = store
        .record_payment(payment_request(
            &farmer,
            dec!(4500),
            PaymentMethod::Cash,
            Some(&id),
        ))
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidTransition { .. }));
    assert_eq!(
        store.get_supply(&id).unwrap().supply.payment_status,
        PaymentStatus::Unpaid
    );

    store.accept_supply(&id, accept_request("shg-1")).unwrap();

    let err = store
        .record_payment(payment_request(
            &farmer,
            dec!(0),
            PaymentMethod::Cash,
            Some(&id),
        ))
        .unwrap_err();
    assert!(matches!(err, MarketError::Validation(_)));

    let payment_id = store
        .record_payment(payment_request(
            &farmer,
            dec!(4500),
            PaymentMethod::Online,
            Some(&id),
        ))
        .unwrap();
    let snap = store.get_supply(&id).unwrap();
    assert_eq!(snap.supply.payment_status, PaymentStatus::Paid);
    // Recording a payout never moves the lifecycle stage.
    assert_eq!(snap.supply.stage.name(), "accepted");

    let record = store.get_payment(&payment_id).unwrap();
    assert_eq!(record.amount, dec!(4500));
    assert_eq!(record.supply_id.as_ref(), Some(&id));

    // A second record is accepted as an additional/corrective payment.
    assert!(store
        .record_payment(payment_request(
            &farmer,
            dec!(100),
            PaymentMethod::Cash,
            Some(&id),
        ))
        .is_ok());

    // The wrong farmer cannot be paid against this supply.
    let err = store
        .record_payment(payment_request(
            &FarmerId("f-9".into()),
            dec!(4500),
            PaymentMethod::Cash,
            Some(&id),
        ))
        .unwrap_err();
    assert!(matches!(err, MarketError::Unauthorized(_)));
}

#[test]
fn role_scoped_supply_listing() {
    let store = MarketStore::new();
    let mine = store
        .create_supply(create_supply_request(MilletType::Ragi, dec!(500)))
        .unwrap();
    let other = store
        .create_supply(CreateSupplyRequest {
            farmer_id: FarmerId("f-2".into()),
            farmer_name: "Gowri".into(),
            ..create_supply_request(MilletType::Bajra, dec!(80))
        })
        .unwrap();
    store.accept_supply(&other, accept_request("shg-1")).unwrap();

    let farmer_view = store.list_supplies(SupplyScope::Farmer(FarmerId("f-1".into())));
    assert_eq!(farmer_view.len(), 1);
    assert_eq!(farmer_view[0].supply.id, mine);

    // Aggregator sees the unassigned pending pool plus its own assignments.
    let agg_view = store.list_supplies(SupplyScope::Aggregator(AggregatorId("shg-1".into())));
    assert_eq!(agg_view.len(), 2);
    let other_agg = store.list_supplies(SupplyScope::Aggregator(AggregatorId("shg-9".into())));
    assert_eq!(other_agg.len(), 1);
    assert_eq!(other_agg[0].supply.id, mine);

    assert_eq!(store.list_supplies(SupplyScope::All).len(), 2);
}

#[test]
fn order_validation_and_cancellation() {
    let store = MarketStore::new();
    let (product_id, _) = store
        .create_product(CreateProductRequest {
            supply_id: None,
            millet_type: MilletType::Kodo,
            quantity_kg: dec!(10),
            price_per_kg: dec!(120),
            quality_grade: "B".into(),
            packaging_date: "2024-02-01".parse().unwrap(),
            description: String::new(),
        })
        .unwrap();

    let base = PlaceOrderRequest {
        consumer_id: ConsumerId("c-1".into()),
        consumer_name: "Meera".into(),
        address: "12 MG Road".into(),
        contact: "9999900000".into(),
        dropoff_location: "hub".into(),
        items: vec![],
    };

    // Empty orders and oversize lines are rejected.
    assert!(matches!(
        store.place_order(base.clone()).unwrap_err(),
        MarketError::Validation(_)
    ));
    assert!(matches!(
        store
            .place_order(PlaceOrderRequest {
                items: vec![OrderItemRequest {
                    product_id: product_id.clone(),
                    quantity_kg: dec!(50),
                }],
                ..base.clone()
            })
            .unwrap_err(),
        MarketError::Validation(_)
    ));

    let placed = store
        .place_order(PlaceOrderRequest {
            items: vec![OrderItemRequest {
                product_id: product_id.clone(),
                quantity_kg: dec!(4),
            }],
            ..base.clone()
        })
        .unwrap();

    // Active orders claim quantity; cancellation releases it.
    assert_eq!(store.available_quantity(&product_id), dec!(6));
    store
        .cancel_order(&placed.order_id, CancelOrderRequest {
            expected_version: None,
        })
        .unwrap();
    assert_eq!(store.available_quantity(&product_id), dec!(10));
    assert_eq!(
        store.get_order(&placed.order_id).unwrap().record.status,
        OrderStatus::Cancelled
    );

    // Cancelled is absorbing.
    assert!(matches!(
        store
            .advance_order(
                &placed.order_id,
                AdvanceOrderRequest {
                    aggregator_id: AggregatorId("shg-1".into()),
                    next_status: None,
                    expected_version: None,
                }
            )
            .unwrap_err(),
        MarketError::AlreadyTerminal { .. }
    ));
}

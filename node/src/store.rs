//! In-memory record store — the single source of truth for supplies,
//! products, orders and payments.
//!
//! Every mutation runs under the record's entry lock, so concurrent
//! transitions on the same id are serialized: the loser of a race observes
//! the already-advanced stage and fails with `InvalidTransition`. Callers
//! that fetched a snapshot earlier can additionally pass the snapshot's
//! version; a mismatch fails with `Conflict` before anything is touched.
//! A transition either fully applies or fully fails.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Datelike, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use mandi_common::api::{
    AcceptSupplyRequest, AdvanceOrderRequest, CancelOrderRequest, CreateProductRequest,
    CreateSupplyRequest, PlaceOrderRequest, PlaceOrderResponse, RecordPaymentRequest,
    SupplyActionRequest, SupplySnapshot, TraceabilityResponse,
};
use mandi_common::error::MarketError;
use mandi_common::identity::{AggregatorId, AggregatorRef, ConsumerRef, FarmerId, FarmerRef};
use mandi_common::journey::reconstruct;
use mandi_common::order::{Order, OrderId, OrderItem, OrderStatus, StatusChange};
use mandi_common::payment::{ensure_payable, PaymentId, PaymentMethod, PaymentRecord, PaymentStatus};
use mandi_common::product::{generate_traceability_code, Product, ProductId};
use mandi_common::supply::{Acceptance, Grade, Supply, SupplyId, SupplyStage};

/// A record plus its mutation counter. The version bumps on every applied
/// transition and backs the optimistic `expected_version` precondition.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: u64,
    pub record: T,
}

/// Role-scoped view over the supply pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplyScope {
    All,
    /// The farmer's own submissions.
    Farmer(FarmerId),
    /// Unassigned pending supplies plus those assigned to this aggregator.
    Aggregator(AggregatorId),
}

#[derive(Default)]
pub struct MarketStore {
    supplies: DashMap<SupplyId, Versioned<Supply>>,
    products: DashMap<ProductId, Versioned<Product>>,
    orders: DashMap<OrderId, Versioned<Order>>,
    payments: DashMap<PaymentId, PaymentRecord>,
    /// Traceability code → source supply.
    trace_codes: DashMap<String, SupplyId>,
    order_seq: AtomicU64,
    trace_seq: AtomicU64,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Supply lifecycle ─────────────────────────────────────────────────

    pub fn create_supply(&self, req: CreateSupplyRequest) -> Result<SupplyId, MarketError> {
        if req.quantity_kg <= Decimal::ZERO {
            return Err(MarketError::Validation(
                "quantityKg must be positive".into(),
            ));
        }

        let now = Utc::now();
        let id = SupplyId(format!("sup-{}", Uuid::new_v4().simple()));
        let supply = Supply {
            id: id.clone(),
            millet_type: req.millet_type,
            quantity_kg: req.quantity_kg,
            harvest_date: req.harvest_date,
            packaging_date: req.packaging_date,
            location: req.location,
            farm_location: req.farm_location,
            farmer: FarmerRef {
                id: req.farmer_id,
                name: req.farmer_name,
            },
            aggregator: None,
            stage: SupplyStage::Pending,
            payment_status: PaymentStatus::Unpaid,
            journey_log: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        info!(supply = %id.0, millet = %supply.millet_type, "supply created");
        self.supplies.insert(
            id.clone(),
            Versioned {
                version: 1,
                record: supply,
            },
        );
        Ok(id)
    }

    pub fn list_supplies(&self, scope: SupplyScope) -> Vec<SupplySnapshot> {
        let mut snapshots: Vec<SupplySnapshot> = self
            .supplies
            .iter()
            .filter(|entry| match &scope {
                SupplyScope::All => true,
                SupplyScope::Farmer(farmer) => entry.record.farmer.id == *farmer,
                SupplyScope::Aggregator(agg) => match &entry.record.aggregator {
                    Some(assigned) => assigned.id == *agg,
                    None => matches!(entry.record.stage, SupplyStage::Pending),
                },
            })
            .map(|entry| snapshot(&entry))
            .collect();
        snapshots.sort_by(|a, b| {
            (a.supply.created_at, &a.supply.id.0).cmp(&(b.supply.created_at, &b.supply.id.0))
        });
        snapshots
    }

    pub fn get_supply(&self, id: &SupplyId) -> Result<SupplySnapshot, MarketError> {
        let entry = self
            .supplies
            .get(id)
            .ok_or_else(|| MarketError::not_found("supply", id.0.clone()))?;
        Ok(snapshot(&entry))
    }

    pub fn accept_supply(
        &self,
        id: &SupplyId,
        req: AcceptSupplyRequest,
    ) -> Result<(), MarketError> {
        let grade: Grade = req.quality_grade.parse()?;
        if req.collection_by.trim().is_empty() {
            return Err(MarketError::Validation("collectionBy is required".into()));
        }
        let acceptance = Acceptance {
            grade,
            collection_by: req.collection_by,
            collection_date: req.collection_date,
            handed_off: false,
        };
        let aggregator = AggregatorRef {
            id: req.aggregator_id,
            name: req.aggregator_name,
        };
        self.with_supply(id, req.expected_version, |supply| {
            supply.accept(acceptance, aggregator, Utc::now())
        })?;
        info!(supply = %id.0, grade = %grade, "supply accepted");
        Ok(())
    }

    pub fn collect_supply(
        &self,
        id: &SupplyId,
        req: SupplyActionRequest,
    ) -> Result<(), MarketError> {
        self.with_supply(id, req.expected_version, |supply| {
            require_assigned(supply, &req.aggregator_id, "collect")?;
            supply.collect(Utc::now())
        })?;
        info!(supply = %id.0, "supply hand-off recorded");
        Ok(())
    }

    pub fn complete_supply(
        &self,
        id: &SupplyId,
        req: SupplyActionRequest,
    ) -> Result<(), MarketError> {
        self.with_supply(id, req.expected_version, |supply| {
            require_assigned(supply, &req.aggregator_id, "complete")?;
            supply.complete(Utc::now())
        })?;
        info!(supply = %id.0, "supply completed");
        Ok(())
    }

    // ── Payment gate ─────────────────────────────────────────────────────

    /// Record a farmer payout. When a supply is referenced, the gate checks
    /// its stage (accepted or completed) and flips its payment status; the
    /// lifecycle stage itself is never touched. A second record against an
    /// already-paid supply is accepted as an additional/corrective payment.
    pub fn record_payment(&self, req: RecordPaymentRequest) -> Result<PaymentId, MarketError> {
        if let Some(supply_id) = &req.supply_id {
            self.with_supply(supply_id, None, |supply| {
                ensure_payable(&supply.stage, req.amount)?;
                if supply.farmer.id != req.farmer_id {
                    return Err(MarketError::Unauthorized(format!(
                        "supply '{}' belongs to a different farmer",
                        supply_id.0
                    )));
                }
                supply.payment_status = PaymentStatus::Paid;
                Ok(())
            })?;
        } else if req.amount <= Decimal::ZERO {
            return Err(MarketError::Validation(
                "payment amount must be positive".into(),
            ));
        }

        let id = PaymentId(format!("pay-{}", Uuid::new_v4().simple()));
        let record = PaymentRecord {
            id: id.clone(),
            supply_id: req.supply_id,
            farmer_id: req.farmer_id,
            amount: req.amount,
            method: req.payment_method,
            recorded_at: Utc::now(),
        };
        info!(payment = %id.0, amount = %record.amount, method = ?record.method, "payment recorded");
        self.payments.insert(id.clone(), record);
        Ok(id)
    }

    pub fn get_payment(&self, id: &PaymentId) -> Result<PaymentRecord, MarketError> {
        self.payments
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MarketError::not_found("payment", id.0.clone()))
    }

    // ── Product catalog ──────────────────────────────────────────────────

    /// Create a market listing, either derived from a completed supply or
    /// standalone. Listing from a supply that is not completed fails with
    /// `InvalidTransition`. Multiple listings from one supply are allowed.
    pub fn create_product(
        &self,
        req: CreateProductRequest,
    ) -> Result<(ProductId, Option<String>), MarketError> {
        let grade: Grade = req.quality_grade.parse()?;
        if req.quantity_kg <= Decimal::ZERO {
            return Err(MarketError::Validation(
                "quantityKg must be positive".into(),
            ));
        }
        if req.price_per_kg <= Decimal::ZERO {
            return Err(MarketError::Validation(
                "pricePerKg must be positive".into(),
            ));
        }

        let traceability_code = match &req.supply_id {
            Some(supply_id) => {
                let entry = self
                    .supplies
                    .get(supply_id)
                    .ok_or_else(|| MarketError::not_found("supply", supply_id.0.clone()))?;
                if !matches!(entry.record.stage, SupplyStage::Completed(_)) {
                    return Err(MarketError::invalid_transition(
                        entry.record.stage.name(),
                        "list a product from",
                    ));
                }
                let seq = self.trace_seq.fetch_add(1, Ordering::Relaxed) + 1;
                let code = generate_traceability_code(Utc::now().year(), seq);
                self.trace_codes.insert(code.clone(), supply_id.clone());
                Some(code)
            }
            None => None,
        };

        let id = ProductId(format!("prd-{}", Uuid::new_v4().simple()));
        let product = Product {
            id: id.clone(),
            millet_type: req.millet_type,
            quantity_kg: req.quantity_kg,
            price_per_kg: req.price_per_kg,
            grade,
            packaging_date: req.packaging_date,
            description: req.description,
            source_supply: req.supply_id,
            traceability_code: traceability_code.clone(),
            created_at: Utc::now(),
        };
        info!(product = %id.0, code = ?traceability_code, "product listed");
        self.products.insert(
            id.clone(),
            Versioned {
                version: 1,
                record: product,
            },
        );
        Ok((id, traceability_code))
    }

    pub fn list_products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .map(|entry| entry.record.clone())
            .collect();
        products.sort_by(|a, b| (a.created_at, &a.id.0).cmp(&(b.created_at, &b.id.0)));
        products
    }

    /// Quantity of a product not yet claimed by an active (non-cancelled)
    /// order.
    pub fn available_quantity(&self, product_id: &ProductId) -> Decimal {
        let total = self
            .products
            .get(product_id)
            .map(|entry| entry.record.quantity_kg)
            .unwrap_or(Decimal::ZERO);

        let claimed: Decimal = self
            .orders
            .iter()
            .filter(|entry| entry.record.status != OrderStatus::Cancelled)
            .flat_map(|entry| {
                entry
                    .record
                    .items
                    .iter()
                    .filter(|item| item.product_id == *product_id)
                    .map(|item| item.quantity_kg)
                    .collect::<Vec<_>>()
            })
            .sum();

        (total - claimed).max(Decimal::ZERO)
    }

    // ── Order lifecycle ──────────────────────────────────────────────────

    pub fn place_order(&self, req: PlaceOrderRequest) -> Result<PlaceOrderResponse, MarketError> {
        if req.items.is_empty() {
            return Err(MarketError::Validation(
                "an order needs at least one item".into(),
            ));
        }

        let mut items = Vec::with_capacity(req.items.len());
        let mut total = Decimal::ZERO;
        for line in &req.items {
            if line.quantity_kg <= Decimal::ZERO {
                return Err(MarketError::Validation(
                    "item quantityKg must be positive".into(),
                ));
            }
            let (price_per_kg, millet_type) = {
                let product = self
                    .products
                    .get(&line.product_id)
                    .ok_or_else(|| MarketError::not_found("product", line.product_id.0.clone()))?;
                (
                    product.record.price_per_kg,
                    product.record.millet_type.clone(),
                )
            };
            if line.quantity_kg > self.available_quantity(&line.product_id) {
                return Err(MarketError::Validation(format!(
                    "product '{}' has insufficient quantity available",
                    line.product_id.0
                )));
            }
            let line_total = line.quantity_kg * price_per_kg;
            items.push(OrderItem {
                product_id: line.product_id.clone(),
                millet_type,
                quantity_kg: line.quantity_kg,
                price_per_kg,
                line_total,
            });
            total += line_total;
        }

        let now = Utc::now();
        let id = OrderId(format!("ord-{}", Uuid::new_v4().simple()));
        let seq = self.order_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let order_number = format!("ORD-{}-{seq:06}", now.year());
        let order = Order {
            id: id.clone(),
            order_number: order_number.clone(),
            consumer: ConsumerRef {
                id: req.consumer_id,
                name: req.consumer_name,
                address: req.address,
                contact: req.contact,
            },
            items,
            total_amount: total,
            dropoff_location: req.dropoff_location,
            status: OrderStatus::OrderPlaced,
            history: vec![StatusChange {
                status: OrderStatus::OrderPlaced,
                at: now,
            }],
            created_at: now,
        };

        info!(order = %id.0, number = %order_number, total = %total, "order placed");
        self.orders.insert(
            id.clone(),
            Versioned {
                version: 1,
                record: order,
            },
        );
        Ok(PlaceOrderResponse {
            order_id: id,
            order_number,
            total_amount: total,
        })
    }

    pub fn get_order(&self, id: &OrderId) -> Result<Versioned<Order>, MarketError> {
        self.orders
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MarketError::not_found("order", id.0.clone()))
    }

    /// Advance the order exactly one step along the fulfilment sequence.
    /// A caller-supplied `nextStatus` is an assertion, not an instruction:
    /// when it disagrees with the computed next step the call fails with
    /// `Conflict` and nothing moves.
    pub fn advance_order(
        &self,
        id: &OrderId,
        req: AdvanceOrderRequest,
    ) -> Result<OrderStatus, MarketError> {
        let next = self.with_order(id, req.expected_version, |order| {
            if let Some(asserted) = req.next_status {
                if !order.status.is_terminal() && order.status.next() != Some(asserted) {
                    return Err(MarketError::Conflict(format!(
                        "nextStatus '{}' is not the step after '{}'",
                        asserted.wire_name(),
                        order.status.wire_name()
                    )));
                }
            }
            order.advance(Utc::now())
        })?;
        info!(order = %id.0, status = next.wire_name(), "order advanced");
        Ok(next)
    }

    pub fn cancel_order(&self, id: &OrderId, req: CancelOrderRequest) -> Result<(), MarketError> {
        self.with_order(id, req.expected_version, |order| order.cancel(Utc::now()))?;
        info!(order = %id.0, "order cancelled");
        Ok(())
    }

    // ── Traceability ─────────────────────────────────────────────────────

    /// Resolve a traceability code or a raw supply id and derive the
    /// journey. The reconstruction is advisory and reads a consistent
    /// snapshot only; nothing is locked or mutated.
    pub fn get_traceability(&self, key: &str) -> Result<TraceabilityResponse, MarketError> {
        let supply_id = self
            .trace_codes
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| SupplyId(key.to_string()));

        let supply = self
            .supplies
            .get(&supply_id)
            .map(|entry| entry.record.clone())
            .ok_or_else(|| MarketError::not_found("traceability record", key.to_string()))?;

        let journey = reconstruct(&supply);
        Ok(TraceabilityResponse {
            record: supply,
            journey,
        })
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn with_supply<R>(
        &self,
        id: &SupplyId,
        expected_version: Option<u64>,
        f: impl FnOnce(&mut Supply) -> Result<R, MarketError>,
    ) -> Result<R, MarketError> {
        let mut entry = self
            .supplies
            .get_mut(id)
            .ok_or_else(|| MarketError::not_found("supply", id.0.clone()))?;
        check_version(expected_version, entry.version)?;
        let out = f(&mut entry.record)?;
        entry.version += 1;
        Ok(out)
    }

    fn with_order<R>(
        &self,
        id: &OrderId,
        expected_version: Option<u64>,
        f: impl FnOnce(&mut Order) -> Result<R, MarketError>,
    ) -> Result<R, MarketError> {
        let mut entry = self
            .orders
            .get_mut(id)
            .ok_or_else(|| MarketError::not_found("order", id.0.clone()))?;
        check_version(expected_version, entry.version)?;
        let out = f(&mut entry.record)?;
        entry.version += 1;
        Ok(out)
    }
}

fn check_version(expected: Option<u64>, actual: u64) -> Result<(), MarketError> {
    match expected {
        Some(v) if v != actual => Err(MarketError::Conflict(format!(
            "expected version {v} but record is at {actual}"
        ))),
        _ => Ok(()),
    }
}

/// Transitions after acceptance belong to the assigned aggregator alone.
fn require_assigned(
    supply: &Supply,
    aggregator: &AggregatorId,
    action: &str,
) -> Result<(), MarketError> {
    match &supply.aggregator {
        Some(assigned) if assigned.id == *aggregator => Ok(()),
        Some(assigned) => Err(MarketError::Unauthorized(format!(
            "supply '{}' is assigned to aggregator '{}', not '{}'",
            supply.id.0, assigned.id.0, aggregator.0
        ))),
        None => Err(MarketError::invalid_transition(supply.stage.name(), action)),
    }
}

fn snapshot(versioned: &Versioned<Supply>) -> SupplySnapshot {
    SupplySnapshot {
        version: versioned.version,
        display_status: versioned.record.display_status().to_string(),
        supply: versioned.record.clone(),
    }
}

/// Convenience for building a `RecordPaymentRequest` in tests and tools.
pub fn payment_request(
    farmer: &FarmerId,
    amount: Decimal,
    method: PaymentMethod,
    supply: Option<&SupplyId>,
) -> RecordPaymentRequest {
    RecordPaymentRequest {
        farmer_id: farmer.clone(),
        amount,
        payment_method: method,
        supply_id: supply.cloned(),
    }
}

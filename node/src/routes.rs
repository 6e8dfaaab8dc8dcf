//! HTTP surface of the marketplace node. Handlers are thin: decode the
//! request, call the store, wrap the outcome in the uniform envelope.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use mandi_common::api::{
    AcceptSupplyRequest, AdvanceOrderRequest, ApiResponse, CancelOrderRequest,
    CreateProductRequest, CreateProductResponse, CreateSupplyRequest, CreateSupplyResponse,
    PlaceOrderRequest, PlaceOrderResponse, RecordPaymentRequest, RecordPaymentResponse,
    SupplyActionRequest, SupplySnapshot, TraceabilityResponse,
};
use mandi_common::error::MarketError;
use mandi_common::identity::{AggregatorId, FarmerId};
use mandi_common::order::{Order, OrderId};
use mandi_common::product::Product;
use mandi_common::supply::SupplyId;

use crate::store::{MarketStore, SupplyScope, Versioned};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MarketStore>,
}

pub fn router(store: Arc<MarketStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/supplies", post(create_supply).get(list_supplies))
        .route("/supplies/{id}/accept", post(accept_supply))
        .route("/supplies/{id}/collect", post(collect_supply))
        .route("/supplies/{id}/complete", post(complete_supply))
        .route("/payments", post(record_payment))
        .route("/products", post(create_product).get(list_products))
        .route("/orders", post(place_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/advance", post(advance_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/traceability/{key}", get(get_traceability))
        .layer(cors)
        .with_state(AppState { store })
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

/// Map an application error onto the envelope and the closest HTTP status.
/// Callers must still treat `success = false` as the authoritative signal.
fn failure<T>(err: MarketError) -> Reply<T> {
    let status = match &err {
        MarketError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MarketError::InvalidTransition { .. }
        | MarketError::AlreadyTerminal { .. }
        | MarketError::Conflict(_) => StatusCode::CONFLICT,
        MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
        MarketError::Unauthorized(_) => StatusCode::FORBIDDEN,
    };
    warn!(code = err.code(), error = %err, "request rejected");
    let mut errors = BTreeMap::new();
    errors.insert(err.code().to_string(), err.to_string());
    (status, Json(ApiResponse::fail(err.to_string(), Some(errors))))
}

fn reply<T>(result: Result<T, MarketError>, message: &str) -> Reply<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(message, data))),
        Err(err) => failure(err),
    }
}

async fn create_supply(
    State(state): State<AppState>,
    Json(req): Json<CreateSupplyRequest>,
) -> Reply<CreateSupplyResponse> {
    let result = state
        .store
        .create_supply(req)
        .map(|supply_id| CreateSupplyResponse { supply_id });
    reply(result, "supply created")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSuppliesQuery {
    farmer_id: Option<String>,
    aggregator_id: Option<String>,
}

async fn list_supplies(
    State(state): State<AppState>,
    Query(query): Query<ListSuppliesQuery>,
) -> Reply<Vec<SupplySnapshot>> {
    let scope = match (query.farmer_id, query.aggregator_id) {
        (Some(farmer), None) => SupplyScope::Farmer(FarmerId(farmer)),
        (None, Some(agg)) => SupplyScope::Aggregator(AggregatorId(agg)),
        (None, None) => SupplyScope::All,
        (Some(_), Some(_)) => {
            return failure(MarketError::Validation(
                "pass farmerId or aggregatorId, not both".into(),
            ))
        }
    };
    reply(Ok(state.store.list_supplies(scope)), "supplies listed")
}

async fn accept_supply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AcceptSupplyRequest>,
) -> Reply<SupplySnapshot> {
    let id = SupplyId(id);
    let result = state
        .store
        .accept_supply(&id, req)
        .and_then(|()| state.store.get_supply(&id));
    reply(result, "supply accepted")
}

async fn collect_supply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SupplyActionRequest>,
) -> Reply<SupplySnapshot> {
    let id = SupplyId(id);
    let result = state
        .store
        .collect_supply(&id, req)
        .and_then(|()| state.store.get_supply(&id));
    reply(result, "supply collected")
}

async fn complete_supply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SupplyActionRequest>,
) -> Reply<SupplySnapshot> {
    let id = SupplyId(id);
    let result = state
        .store
        .complete_supply(&id, req)
        .and_then(|()| state.store.get_supply(&id));
    reply(result, "supply completed")
}

async fn record_payment(
    State(state): State<AppState>,
    Json(req): Json<RecordPaymentRequest>,
) -> Reply<RecordPaymentResponse> {
    let result = state
        .store
        .record_payment(req)
        .map(|payment_id| RecordPaymentResponse { payment_id });
    reply(result, "payment recorded")
}

async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Reply<CreateProductResponse> {
    let result = state
        .store
        .create_product(req)
        .map(|(product_id, traceability_code)| CreateProductResponse {
            product_id,
            traceability_code,
        });
    reply(result, "product listed")
}

async fn list_products(State(state): State<AppState>) -> Reply<Vec<Product>> {
    reply(Ok(state.store.list_products()), "products listed")
}

async fn place_order(
    State(state): State<AppState>,
    Json(req): Json<PlaceOrderRequest>,
) -> Reply<PlaceOrderResponse> {
    reply(state.store.place_order(req), "order placed")
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderSnapshot {
    version: u64,
    #[serde(flatten)]
    order: Order,
}

async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> Reply<OrderSnapshot> {
    let result = state
        .store
        .get_order(&OrderId(id))
        .map(|Versioned { version, record }| OrderSnapshot {
            version,
            order: record,
        });
    reply(result, "order fetched")
}

async fn advance_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AdvanceOrderRequest>,
) -> Reply<OrderSnapshot> {
    let id = OrderId(id);
    let result = state.store.advance_order(&id, req).and_then(|_next| {
        state
            .store
            .get_order(&id)
            .map(|Versioned { version, record }| OrderSnapshot {
                version,
                order: record,
            })
    });
    reply(result, "order advanced")
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CancelOrderRequest>,
) -> Reply<OrderSnapshot> {
    let id = OrderId(id);
    let result = state.store.cancel_order(&id, req).and_then(|()| {
        state
            .store
            .get_order(&id)
            .map(|Versioned { version, record }| OrderSnapshot {
                version,
                order: record,
            })
    });
    reply(result, "order cancelled")
}

async fn get_traceability(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Reply<TraceabilityResponse> {
    reply(state.store.get_traceability(&key), "traceability fetched")
}

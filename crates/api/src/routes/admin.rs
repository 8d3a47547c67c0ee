//! Privileged operator commands and order reads.
//!
//! Authentication for these endpoints lives in the admin gateway in front of
//! this service.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use domain::CarrierKind;
use order_store::OrderStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::AppState;
use crate::routes::views::OrderView;

fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// GET /orders/{id} — load an order with its full status history.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orchestrator
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;

    Ok(Json(OrderView::from_order(&order)))
}

/// GET /orders — list all orders, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = state.orchestrator.list_orders().await?;
    Ok(Json(orders.iter().map(OrderView::from_order).collect()))
}

#[derive(Deserialize)]
pub struct ShipRequest {
    pub carrier: CarrierKind,
}

#[derive(Serialize)]
pub struct ShipResponse {
    pub carrier: String,
    pub tracking_id: String,
    pub provider_reference: Option<String>,
}

/// POST /orders/{id}/ship — book a shipment with the chosen carrier.
#[tracing::instrument(skip(state, req))]
pub async fn ship<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<ShipRequest>,
) -> Result<Json<ShipResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let outcome = state
        .orchestrator
        .create_shipment(order_id, req.carrier)
        .await?;

    Ok(Json(ShipResponse {
        carrier: outcome.carrier.to_string(),
        tracking_id: outcome.tracking_id,
        provider_reference: outcome.provider_reference,
    }))
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

/// POST /orders/{id}/cancel — cancel before dispatch.
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OrderView>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orchestrator.cancel(order_id, req.reason).await?;
    Ok(Json(OrderView::from_order(&order)))
}

/// POST /orders/{id}/deliver — mark a shipped order delivered.
#[tracing::instrument(skip(state))]
pub async fn deliver<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orchestrator.mark_delivered(order_id).await?;
    Ok(Json(OrderView::from_order(&order)))
}

//! Inbound payment gateway webhooks, one endpoint per gateway.
//!
//! Whatever the orchestrator decides — applied, duplicate, stale, or dropped
//! — the gateway gets a 2xx, because a non-2xx only makes the provider
//! replay the callback forever. Only verification failures (spoofing,
//! garbage) are rejected.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use domain::GatewayKind;
use gateways::SignatureHeaders;
use orchestrator::PaymentAck;
use order_store::OrderStore;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub ack: &'static str,
}

fn gateway_from_path(segment: &str) -> Option<GatewayKind> {
    match segment {
        "phonepe" => Some(GatewayKind::PhonePe),
        "razorpay" => Some(GatewayKind::Razorpay),
        "cashfree" => Some(GatewayKind::Cashfree),
        _ => None,
    }
}

fn signature_headers(headers: &HeaderMap) -> SignatureHeaders {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// POST /webhooks/{gateway} — verify and absorb a payment callback.
#[tracing::instrument(skip(state, headers, body), fields(gateway = %gateway))]
pub async fn receive<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let kind = gateway_from_path(&gateway)
        .ok_or_else(|| ApiError::NotFound(format!("unknown gateway {gateway}")))?;
    let verifier = state
        .gateways
        .get(kind)
        .ok_or_else(|| ApiError::NotFound(format!("no verifier configured for {kind}")))?;

    // Verification happens before any state is touched; a bad signature
    // never reaches the orchestrator.
    let outcome = verifier.verify(&body, &signature_headers(&headers)).await?;

    let ack = state.orchestrator.confirm_payment(&outcome).await?;
    let label = match ack {
        PaymentAck::Applied { .. } => "applied",
        PaymentAck::Duplicate { .. } => "duplicate",
        PaymentAck::Stale => "stale",
        PaymentAck::Dropped => "dropped",
    };

    Ok(Json(WebhookResponse {
        status: "ok",
        ack: label,
    }))
}

//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::{Address, Customer, CustomerId, GuestContact, Money, PaymentMode, ProductId};
use orchestrator::{CartLine, PlaceOrder};
use order_store::OrderStore;
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::AppState;
use crate::routes::views::OrderView;

#[derive(Deserialize)]
pub struct CheckoutItem {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Deserialize)]
pub struct GuestRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct CheckoutRequest {
    /// Registered customer reference; mutually exclusive with `guest`.
    pub customer_id: Option<String>,
    /// Guest identity; mutually exclusive with `customer_id`.
    pub guest: Option<GuestRequest>,
    pub items: Vec<CheckoutItem>,
    pub address: Address,
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub discount_paise: i64,
}

/// POST /checkout — place an order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let customer = match (req.customer_id, req.guest) {
        (Some(id), None) => {
            let uuid = uuid::Uuid::parse_str(&id)
                .map_err(|e| ApiError::BadRequest(format!("invalid customer_id: {e}")))?;
            Customer::Registered {
                customer_id: CustomerId::from_uuid(uuid),
            }
        }
        (None, Some(guest)) => Customer::Guest {
            contact: GuestContact {
                name: guest.name,
                email: guest.email,
                phone: guest.phone,
            },
        },
        _ => {
            return Err(ApiError::BadRequest(
                "exactly one of customer_id or guest must be provided".to_string(),
            ));
        }
    };

    let lines = req
        .items
        .into_iter()
        .map(|item| CartLine {
            product_id: ProductId::new(item.product_id),
            quantity: item.quantity,
            variant: item.variant,
        })
        .collect();

    let cmd = PlaceOrder {
        customer,
        lines,
        shipping_address: req.address,
        payment_mode: req.payment_mode,
        discount: Money::from_paise(req.discount_paise),
    };

    let order = state.orchestrator.place_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(OrderView::from_order(&order))))
}

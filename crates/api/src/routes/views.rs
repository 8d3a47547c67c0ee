//! Response views over the order aggregate.

use domain::{Customer, Order};
use serde::Serialize;

#[derive(Serialize)]
pub struct OrderItemView {
    pub product_id: String,
    pub title: String,
    pub unit_price_paise: i64,
    pub quantity: u32,
    pub variant: Option<String>,
}

#[derive(Serialize)]
pub struct HistoryEntryView {
    pub status: String,
    pub at: String,
    pub note: String,
}

#[derive(Serialize)]
pub struct PaymentRefView {
    pub gateway: String,
    pub transaction_id: String,
    pub provider_code: Option<String>,
}

#[derive(Serialize)]
pub struct ShipmentRefView {
    pub carrier: String,
    pub tracking_id: String,
    pub provider_reference: Option<String>,
}

/// The durable order contract other collaborators read from.
#[derive(Serialize)]
pub struct OrderView {
    pub order_id: String,
    pub status: String,
    pub payment_status: String,
    pub payment_mode: String,
    pub is_guest: bool,
    pub customer_id: Option<String>,
    pub items: Vec<OrderItemView>,
    pub total_paise: i64,
    pub discount_paise: i64,
    pub final_price_paise: i64,
    pub payment_ref: Option<PaymentRefView>,
    pub shipment_ref: Option<ShipmentRefView>,
    pub status_history: Vec<HistoryEntryView>,
    pub placed_at: String,
}

impl OrderView {
    pub fn from_order(order: &Order) -> Self {
        let customer_id = match order.customer() {
            Customer::Registered { customer_id } => Some(customer_id.to_string()),
            Customer::Guest { .. } => None,
        };

        Self {
            order_id: order.id().to_string(),
            status: order.status().to_string(),
            payment_status: order.payment_status().to_string(),
            payment_mode: order.payment_mode().to_string(),
            is_guest: order.is_guest(),
            customer_id,
            items: order
                .items()
                .iter()
                .map(|item| OrderItemView {
                    product_id: item.product_id.to_string(),
                    title: item.title.clone(),
                    unit_price_paise: item.unit_price.paise(),
                    quantity: item.quantity,
                    variant: item.variant.clone(),
                })
                .collect(),
            total_paise: order.total_price().paise(),
            discount_paise: order.discount().paise(),
            final_price_paise: order.final_price().paise(),
            payment_ref: order.payment_ref().map(|p| PaymentRefView {
                gateway: p.gateway.to_string(),
                transaction_id: p.transaction_id.clone(),
                provider_code: p.provider_code.clone(),
            }),
            shipment_ref: order.shipment_ref().map(|s| ShipmentRefView {
                carrier: s.carrier.to_string(),
                tracking_id: s.tracking_id.clone(),
                provider_reference: s.provider_reference.clone(),
            }),
            status_history: order
                .history()
                .entries()
                .iter()
                .map(|entry| HistoryEntryView {
                    status: entry.status.to_string(),
                    at: entry.at.to_rfc3339(),
                    note: entry.note.clone(),
                })
                .collect(),
            placed_at: order.placed_at().to_rfc3339(),
        }
    }
}

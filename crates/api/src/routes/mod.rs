//! HTTP route handlers.

pub mod admin;
pub mod checkout;
pub mod health;
pub mod metrics;
pub mod views;
pub mod webhooks;

use gateways::GatewayRegistry;
use orchestrator::OrderOrchestrator;
use order_store::OrderStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub orchestrator: OrderOrchestrator<S>,
    pub gateways: GatewayRegistry,
}

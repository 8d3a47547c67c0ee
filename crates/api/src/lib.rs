//! HTTP surface for the storefront order system.
//!
//! Wires the orchestrator, gateway verifiers, and carrier dispatchers into an
//! axum router with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use carriers::{
    CarrierRegistry, EkartDispatcher, HttpEkartApi, HttpShiprocketApi, ManualDispatcher,
    ShiprocketDispatcher,
};
use common::OrderSequence;
use gateways::{
    CashfreeVerifier, CodVerifier, GatewayRegistry, HttpCashfreeApi, PhonePeConfig,
    PhonePeVerifier, RazorpayConfig, RazorpayVerifier,
};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{
    CatalogProduct, InMemoryCatalog, InMemoryIdempotencyGuard, InMemoryStockLedger, LogNotifier,
    OrchestratorConfig, OrderOrchestrator,
};
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use domain::{Money, ProductId};
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checkout", post(routes::checkout::create::<S>))
        .route("/webhooks/{gateway}", post(routes::webhooks::receive::<S>))
        .route("/orders", get(routes::admin::list::<S>))
        .route("/orders/{id}", get(routes::admin::get::<S>))
        .route("/orders/{id}/ship", post(routes::admin::ship::<S>))
        .route("/orders/{id}/cancel", post(routes::admin::cancel::<S>))
        .route("/orders/{id}/deliver", post(routes::admin::deliver::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the gateway verifier registry from configuration.
pub fn build_gateway_registry(config: &Config, http: &reqwest::Client) -> GatewayRegistry {
    GatewayRegistry::new()
        .register(Arc::new(PhonePeVerifier::new(PhonePeConfig {
            salt_key: config.phonepe_salt_key.clone(),
            salt_index: config.phonepe_salt_index.clone(),
        })))
        .register(Arc::new(RazorpayVerifier::new(RazorpayConfig {
            webhook_secret: config.razorpay_webhook_secret.clone(),
        })))
        .register(Arc::new(CashfreeVerifier::new(HttpCashfreeApi::new(
            http.clone(),
            config.cashfree_base_url.clone(),
            config.cashfree_client_id.clone(),
            config.cashfree_client_secret.clone(),
        ))))
        .register(Arc::new(CodVerifier::new()))
}

/// Builds the carrier dispatcher registry from configuration.
pub fn build_carrier_registry(config: &Config, http: &reqwest::Client) -> CarrierRegistry {
    CarrierRegistry::new()
        .register(Arc::new(ShiprocketDispatcher::new(
            HttpShiprocketApi::new(
                http.clone(),
                config.shiprocket_base_url.clone(),
                config.shiprocket_email.clone(),
                config.shiprocket_password.clone(),
            ),
            config.shiprocket_pickup_location.clone(),
            config.shiprocket_default_hsn.clone(),
        )))
        .register(Arc::new(EkartDispatcher::new(HttpEkartApi::new(
            http.clone(),
            config.ekart_base_url.clone(),
            config.ekart_api_key.clone(),
        ))))
        .register(Arc::new(ManualDispatcher::new()))
}

/// Creates application state around a store, with in-memory stock, catalog,
/// and idempotency services, and a demo catalog seeded for development.
///
/// Returns the stock ledger and catalog handles so callers (and tests) can
/// seed them further.
pub async fn create_default_state<S: OrderStore + 'static>(
    store: S,
    config: &Config,
) -> (Arc<AppState<S>>, InMemoryStockLedger, InMemoryCatalog) {
    let http = reqwest::Client::new();

    let stock = InMemoryStockLedger::new();
    let catalog = InMemoryCatalog::new();
    seed_demo_catalog(&catalog, &stock).await;

    let next_seq = store
        .max_order_sequence()
        .await
        .map(|max| max + 1)
        .unwrap_or(1);

    let orchestrator = OrderOrchestrator::new(
        store,
        Arc::new(stock.clone()),
        Arc::new(InMemoryIdempotencyGuard::new()),
        Arc::new(catalog.clone()),
        Arc::new(LogNotifier::new()),
        build_carrier_registry(config, &http),
        Arc::new(OrderSequence::starting_at(next_seq)),
        OrchestratorConfig {
            pickup_pincode: config.pickup_pincode.clone(),
        },
    );

    let state = Arc::new(AppState {
        orchestrator,
        gateways: build_gateway_registry(config, &http),
    });

    (state, stock, catalog)
}

async fn seed_demo_catalog(catalog: &InMemoryCatalog, stock: &InMemoryStockLedger) {
    let products = [
        ("SKU-001", "Cotton Kurta", 49900i64, 25i64),
        ("SKU-002", "Silk Scarf", 29900, 40),
        ("SKU-003", "Handloom Saree", 189900, 10),
    ];
    for (sku, title, price, available) in products {
        catalog
            .put(CatalogProduct {
                product_id: ProductId::new(sku),
                title: title.to_string(),
                unit_price: Money::from_paise(price),
            })
            .await;
        stock.set_available(ProductId::new(sku), available).await;
    }
}

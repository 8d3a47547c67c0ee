//! Order lifecycle orchestration.
//!
//! The [`OrderOrchestrator`] owns the Order aggregate and drives it through
//! stock reservation, payment confirmation, shipment creation, delivery, and
//! cancellation. External callbacks arrive at-least-once and out of order;
//! the orchestrator keeps application state effectively-once with an
//! idempotency guard and per-order serialization, without distributed
//! transactions.

pub mod commands;
pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod services;

pub use commands::{CartLine, PlaceOrder};
pub use error::OrchestratorError;
pub use lock::OrderLocks;
pub use orchestrator::{OrderOrchestrator, OrchestratorConfig, PaymentAck};
pub use services::catalog::{CatalogProduct, CatalogService, InMemoryCatalog};
pub use services::idempotency::{Claim, IdempotencyGuard, InMemoryIdempotencyGuard, payment_key};
pub use services::notifier::{LogNotifier, Notifier, NotifyEvent};
pub use services::stock::{InMemoryStockLedger, StockError, StockLedger};

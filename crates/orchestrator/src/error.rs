//! Orchestrator error types.

use carriers::CarrierError;
use common::OrderId;
use domain::{CarrierKind, OrderError, ProductId};
use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur during order orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Bad input that will never succeed on retry.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A cart line references a product the catalog does not know.
    #[error("unknown product {product_id}")]
    UnknownProduct { product_id: ProductId },

    /// Not enough stock for the named product; nothing was reserved.
    #[error("product {product_id} is out of stock")]
    OutOfStock { product_id: ProductId },

    /// A domain rule rejected the transition.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Unknown order ID on a direct command.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// No dispatcher is registered for the requested carrier.
    #[error("no dispatcher registered for carrier {0}")]
    UnknownCarrier(CarrierKind),

    /// The carrier does not deliver to the destination; the order is left
    /// untouched for the operator to pick an alternative.
    #[error("{carrier} cannot deliver to pincode {pincode}")]
    Unserviceable {
        carrier: CarrierKind,
        pincode: String,
    },

    /// The carrier rejected the shipment request outright.
    #[error("{carrier} rejected the shipment: {detail}")]
    CarrierRejected {
        carrier: CarrierKind,
        detail: String,
    },

    /// A gateway or carrier was unreachable; the caller may retry, the
    /// orchestrator does not retry on its own.
    #[error("external service unavailable: {0}")]
    ExternalUnavailable(String),

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CarrierError> for OrchestratorError {
    fn from(err: CarrierError) -> Self {
        match err {
            CarrierError::Unserviceable { carrier, pincode } => {
                OrchestratorError::Unserviceable { carrier, pincode }
            }
            CarrierError::Rejected { carrier, detail } => {
                OrchestratorError::CarrierRejected { carrier, detail }
            }
            CarrierError::Unavailable { .. } | CarrierError::Malformed { .. } => {
                OrchestratorError::ExternalUnavailable(err.to_string())
            }
        }
    }
}

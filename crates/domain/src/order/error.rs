//! Order aggregate errors.

use thiserror::Error;

use super::{OrderStatus, PaymentMode, PaymentStatus};

/// Errors produced by order aggregate commands.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested transition is not allowed from the current state.
    #[error("cannot {action} an order in {current_state} state")]
    InvalidStateTransition {
        current_state: OrderStatus,
        action: &'static str,
    },

    /// The payment status change would violate monotonicity.
    #[error("payment status cannot change from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// The operation does not apply to this payment mode.
    #[error("operation requires {expected} payment mode")]
    PaymentModeMismatch { expected: PaymentMode },

    /// An order must contain at least one item.
    #[error("order has no items")]
    EmptyOrder,

    /// Item quantity must be at least 1.
    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// Unit price must be positive.
    #[error("invalid unit price for product {product_id}")]
    InvalidPrice { product_id: String },

    /// The discount would make the payable amount negative.
    #[error("discount {discount} exceeds order total {total}")]
    InvalidDiscount { discount: i64, total: i64 },

    /// A required address field is missing or malformed.
    #[error("invalid shipping address: {field}")]
    InvalidAddress { field: &'static str },

    /// Guest checkout requires an email address.
    #[error("guest checkout requires an email address")]
    GuestEmailRequired,

    /// The order already carries a shipment reference.
    #[error("order already has a shipment reference ({tracking_id})")]
    AlreadyShipped { tracking_id: String },
}

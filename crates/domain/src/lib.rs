//! Domain layer for the storefront order system.
//!
//! This crate provides the Order aggregate with its lifecycle state machine,
//! the append-only status-history audit trail, and the value objects shared
//! across the payment, shipping, and orchestration crates.

pub mod order;

pub use order::{
    Address, CarrierKind, Customer, CustomerId, GatewayKind, GuestContact, Money, Order,
    OrderError, OrderItem, OrderStatus, PaymentMode, PaymentRef, PaymentStatus, ProductId,
    ShipmentRef, StatusEntry, StatusHistory,
};

//! Order aggregate and supporting types.

mod aggregate;
mod error;
mod history;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use error::OrderError;
pub use history::{StatusEntry, StatusHistory};
pub use state::{OrderStatus, PaymentStatus};
pub use value_objects::{
    Address, CarrierKind, Customer, CustomerId, GatewayKind, GuestContact, Money, OrderItem,
    PaymentMode, PaymentRef, ProductId, ShipmentRef,
};

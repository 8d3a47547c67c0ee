//! Commands accepted by the orchestrator.

use domain::{Address, Customer, Money, PaymentMode, ProductId};
use serde::{Deserialize, Serialize};

/// One requested cart line; title and price are resolved against the catalog
/// at placement time, never supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<String>,
}

/// Command to place a new order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer: Customer,
    pub lines: Vec<CartLine>,
    pub shipping_address: Address,
    pub payment_mode: PaymentMode,
    pub discount: Money,
}

impl PlaceOrder {
    /// Convenience constructor with no discount.
    pub fn new(
        customer: Customer,
        lines: Vec<CartLine>,
        shipping_address: Address,
        payment_mode: PaymentMode,
    ) -> Self {
        Self {
            customer,
            lines,
            shipping_address,
            payment_mode,
            discount: Money::zero(),
        }
    }

    /// Sets the discount.
    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }
}

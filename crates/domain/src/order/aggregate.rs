//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, Version};
use serde::{Deserialize, Serialize};

use super::{
    Address, Customer, GatewayKind, Money, OrderError, OrderItem, OrderStatus, PaymentMode,
    PaymentRef, PaymentStatus, ProductId, ShipmentRef, StatusHistory,
};

/// Order aggregate root.
///
/// The single consistency boundary for an order: items, money, payment and
/// shipment references, lifecycle status, and the append-only status history.
/// All transitions go through the command methods below; each successful
/// transition appends exactly one history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Human-readable order identifier.
    id: OrderId,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Who placed the order.
    customer: Customer,

    /// Ordered lines with title/price snapshots.
    items: Vec<OrderItem>,

    /// Sum of line totals.
    total_price: Money,

    /// Discount applied at checkout.
    discount: Money,

    /// Amount payable: `total_price - discount`.
    final_price: Money,

    /// Where to ship.
    shipping_address: Address,

    /// Online gateway or cash on delivery.
    payment_mode: PaymentMode,

    /// Payment state, monotonic except paid -> refunded.
    payment_status: PaymentStatus,

    /// Lifecycle state.
    status: OrderStatus,

    /// Gateway transaction identifiers, set once payment completes.
    payment_ref: Option<PaymentRef>,

    /// Carrier tracking identifiers, set once a shipment is created.
    shipment_ref: Option<ShipmentRef>,

    /// Append-only audit trail.
    history: StatusHistory,

    /// When the order was placed.
    placed_at: DateTime<Utc>,
}

impl Order {
    /// Places a new order.
    ///
    /// Validates the cart, address, and customer identity, computes the
    /// totals, and records the initial `Pending` history entry. Returns an
    /// error without constructing anything if any check fails — no partial
    /// order ever exists.
    pub fn place(
        id: OrderId,
        customer: Customer,
        items: Vec<OrderItem>,
        shipping_address: Address,
        payment_mode: PaymentMode,
        discount: Money,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                });
            }
            if !item.unit_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    product_id: item.product_id.to_string(),
                });
            }
        }

        if let Customer::Guest { contact } = &customer
            && contact.email.trim().is_empty()
        {
            return Err(OrderError::GuestEmailRequired);
        }

        shipping_address.validate()?;

        let total_price = items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.line_total());

        if discount.is_negative() || discount > total_price {
            return Err(OrderError::InvalidDiscount {
                discount: discount.paise(),
                total: total_price.paise(),
            });
        }
        let final_price = total_price - discount;

        let mut history = StatusHistory::new();
        history.append(OrderStatus::Pending, "order created");

        Ok(Self {
            id,
            version: Version::initial(),
            customer,
            items,
            total_price,
            discount,
            final_price,
            shipping_address,
            payment_mode,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            payment_ref: None,
            shipment_ref: None,
            history,
            placed_at: Utc::now(),
        })
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the current store version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the store version. Called by the order store after a write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Returns the customer.
    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    /// Returns true for guest checkouts.
    pub fn is_guest(&self) -> bool {
        self.customer.is_guest()
    }

    /// Returns the order lines.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns `(product, quantity)` pairs for stock-ledger operations.
    pub fn quantities(&self) -> Vec<(ProductId, u32)> {
        self.items
            .iter()
            .map(|item| (item.product_id.clone(), item.quantity))
            .collect()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Returns the sum of line totals.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns the discount applied at checkout.
    pub fn discount(&self) -> Money {
        self.discount
    }

    /// Returns the amount payable.
    pub fn final_price(&self) -> Money {
        self.final_price
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    /// Returns the payment mode.
    pub fn payment_mode(&self) -> PaymentMode {
        self.payment_mode
    }

    /// Returns the payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the gateway transaction reference, if payment completed.
    pub fn payment_ref(&self) -> Option<&PaymentRef> {
        self.payment_ref.as_ref()
    }

    /// Returns the carrier tracking reference, if a shipment exists.
    pub fn shipment_ref(&self) -> Option<&ShipmentRef> {
        self.shipment_ref.as_ref()
    }

    /// Returns the status history.
    pub fn history(&self) -> &StatusHistory {
        &self.history
    }

    /// Returns when the order was placed.
    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods
impl Order {
    /// Records a successful online payment and moves the order to Processing.
    pub fn confirm_payment(&mut self, payment: PaymentRef) -> Result<(), OrderError> {
        if self.payment_mode != PaymentMode::Online {
            return Err(OrderError::PaymentModeMismatch {
                expected: PaymentMode::Online,
            });
        }
        if !self.status.can_confirm_payment() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "confirm payment for",
            });
        }
        self.set_payment_status(PaymentStatus::Paid)?;

        let note = format!(
            "payment confirmed via {} (txn {})",
            payment.gateway, payment.transaction_id
        );
        self.payment_ref = Some(payment);
        self.status = OrderStatus::Processing;
        self.history.append(OrderStatus::Processing, note);
        Ok(())
    }

    /// Records a declined online payment and cancels the order.
    ///
    /// A decline is an authentic business outcome, not an error: the payment
    /// status becomes `Failed` and the order is cancelled in one transition
    /// with a single history entry.
    pub fn decline_payment(&mut self, note: impl Into<String>) -> Result<(), OrderError> {
        if self.payment_mode != PaymentMode::Online {
            return Err(OrderError::PaymentModeMismatch {
                expected: PaymentMode::Online,
            });
        }
        if !self.status.can_confirm_payment() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "decline payment for",
            });
        }
        self.set_payment_status(PaymentStatus::Failed)?;
        self.status = OrderStatus::Cancelled;
        self.history.append(
            OrderStatus::Cancelled,
            format!("payment declined: {}", note.into()),
        );
        Ok(())
    }

    /// Commits a cash-on-delivery order straight to Processing.
    ///
    /// COD has no gateway to confirm against, so the order skips the payment
    /// window entirely. Collection happens at the doorstep.
    pub fn confirm_cash_on_delivery(&mut self) -> Result<(), OrderError> {
        if self.payment_mode != PaymentMode::Cod {
            return Err(OrderError::PaymentModeMismatch {
                expected: PaymentMode::Cod,
            });
        }
        if !self.status.can_confirm_payment() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "confirm cash on delivery for",
            });
        }
        self.set_payment_status(PaymentStatus::Paid)?;
        self.payment_ref = Some(PaymentRef {
            gateway: GatewayKind::Cod,
            transaction_id: format!("COD-{}", self.id),
            provider_code: None,
        });
        self.status = OrderStatus::Processing;
        self.history
            .append(OrderStatus::Processing, "cash on delivery confirmed");
        Ok(())
    }

    /// Attaches a confirmed carrier shipment and moves the order to Shipped.
    pub fn attach_shipment(&mut self, shipment: ShipmentRef) -> Result<(), OrderError> {
        if let Some(existing) = &self.shipment_ref {
            return Err(OrderError::AlreadyShipped {
                tracking_id: existing.tracking_id.clone(),
            });
        }
        if !self.status.can_ship() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "create a shipment for",
            });
        }

        let note = format!(
            "shipment created via {}, tracking {}",
            shipment.carrier, shipment.tracking_id
        );
        self.shipment_ref = Some(shipment);
        self.status = OrderStatus::Shipped;
        self.history.append(OrderStatus::Shipped, note);
        Ok(())
    }

    /// Marks the order delivered. Only valid from Shipped.
    pub fn mark_delivered(&mut self) -> Result<(), OrderError> {
        if !self.status.can_deliver() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "deliver",
            });
        }
        self.status = OrderStatus::Delivered;
        self.history.append(OrderStatus::Delivered, "order delivered");
        Ok(())
    }

    /// Cancels the order. Only valid from Pending or Processing.
    ///
    /// A paid order is marked refunded; the money movement itself is the
    /// gateway's concern, the status trail records the intent.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action: "cancel",
            });
        }
        if self.payment_status == PaymentStatus::Paid {
            self.set_payment_status(PaymentStatus::Refunded)?;
        }
        self.status = OrderStatus::Cancelled;
        self.history.append(
            OrderStatus::Cancelled,
            format!("cancelled: {}", reason.into()),
        );
        Ok(())
    }

    fn set_payment_status(&mut self, next: PaymentStatus) -> Result<(), OrderError> {
        if !self.payment_status.can_become(next) {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: next,
            });
        }
        self.payment_status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{CarrierKind, CustomerId, GuestContact};

    fn address() -> Address {
        Address {
            name: "Asha Rao".to_string(),
            line1: "12 MG Road".to_string(),
            line2: None,
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            phone: "9876543210".to_string(),
        }
    }

    fn items() -> Vec<OrderItem> {
        vec![
            OrderItem::new("SKU-001", "Cotton Kurta", Money::from_paise(49900), 2),
            OrderItem::new("SKU-002", "Silk Scarf", Money::from_paise(29900), 1),
        ]
    }

    fn place_online() -> Order {
        Order::place(
            OrderId::from_sequence(1),
            Customer::Registered {
                customer_id: CustomerId::new(),
            },
            items(),
            address(),
            PaymentMode::Online,
            Money::zero(),
        )
        .unwrap()
    }

    fn paid_ref() -> PaymentRef {
        PaymentRef {
            gateway: GatewayKind::Razorpay,
            transaction_id: "pay_ABC123".to_string(),
            provider_code: Some("captured".to_string()),
        }
    }

    fn shipment_ref() -> ShipmentRef {
        ShipmentRef {
            carrier: CarrierKind::Shiprocket,
            tracking_id: "SR-90001".to_string(),
            provider_reference: Some("12345".to_string()),
        }
    }

    #[test]
    fn place_computes_totals() {
        let order = place_online();
        assert_eq!(order.total_price().paise(), 2 * 49900 + 29900);
        assert_eq!(order.discount().paise(), 0);
        assert_eq!(order.final_price(), order.total_price());
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.history().len(), 1);
        assert_eq!(order.history().last().unwrap().note, "order created");
    }

    #[test]
    fn final_price_is_total_minus_discount() {
        let order = Order::place(
            OrderId::from_sequence(2),
            Customer::Registered {
                customer_id: CustomerId::new(),
            },
            items(),
            address(),
            PaymentMode::Online,
            Money::from_paise(10000),
        )
        .unwrap();
        assert_eq!(
            order.final_price().paise(),
            order.total_price().paise() - 10000
        );
        assert!(!order.final_price().is_negative());
    }

    #[test]
    fn place_rejects_empty_cart() {
        let result = Order::place(
            OrderId::from_sequence(3),
            Customer::Registered {
                customer_id: CustomerId::new(),
            },
            vec![],
            address(),
            PaymentMode::Online,
            Money::zero(),
        );
        assert!(matches!(result, Err(OrderError::EmptyOrder)));
    }

    #[test]
    fn place_rejects_zero_quantity() {
        let result = Order::place(
            OrderId::from_sequence(4),
            Customer::Registered {
                customer_id: CustomerId::new(),
            },
            vec![OrderItem::new(
                "SKU-001",
                "Cotton Kurta",
                Money::from_paise(49900),
                0,
            )],
            address(),
            PaymentMode::Online,
            Money::zero(),
        );
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn place_rejects_discount_over_total() {
        let result = Order::place(
            OrderId::from_sequence(5),
            Customer::Registered {
                customer_id: CustomerId::new(),
            },
            items(),
            address(),
            PaymentMode::Online,
            Money::from_rupees(100_000),
        );
        assert!(matches!(result, Err(OrderError::InvalidDiscount { .. })));
    }

    #[test]
    fn place_rejects_guest_without_email() {
        let result = Order::place(
            OrderId::from_sequence(6),
            Customer::Guest {
                contact: GuestContact {
                    name: "Asha".to_string(),
                    email: " ".to_string(),
                    phone: "9876543210".to_string(),
                },
            },
            items(),
            address(),
            PaymentMode::Online,
            Money::zero(),
        );
        assert!(matches!(result, Err(OrderError::GuestEmailRequired)));
    }

    #[test]
    fn place_rejects_bad_address() {
        let mut bad = address();
        bad.phone = "12345".to_string();
        let result = Order::place(
            OrderId::from_sequence(7),
            Customer::Registered {
                customer_id: CustomerId::new(),
            },
            items(),
            bad,
            PaymentMode::Online,
            Money::zero(),
        );
        assert!(matches!(
            result,
            Err(OrderError::InvalidAddress { field: "phone" })
        ));
    }

    #[test]
    fn confirm_payment_moves_to_processing() {
        let mut order = place_online();
        order.confirm_payment(paid_ref()).unwrap();

        assert_eq!(order.status(), OrderStatus::Processing);
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(
            order.payment_ref().unwrap().transaction_id,
            "pay_ABC123"
        );
        assert_eq!(order.history().len(), 2);
        assert_eq!(order.history().count_of(OrderStatus::Processing), 1);
    }

    #[test]
    fn confirm_payment_twice_fails() {
        let mut order = place_online();
        order.confirm_payment(paid_ref()).unwrap();
        let result = order.confirm_payment(paid_ref());
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));
        assert_eq!(order.history().len(), 2);
    }

    #[test]
    fn decline_payment_cancels_with_one_entry() {
        let mut order = place_online();
        order.decline_payment("insufficient funds").unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.payment_status(), PaymentStatus::Failed);
        assert_eq!(order.history().len(), 2);
        assert!(order.history().last().unwrap().note.contains("declined"));
    }

    #[test]
    fn cod_order_is_processing_immediately() {
        let mut order = Order::place(
            OrderId::from_sequence(8),
            Customer::Registered {
                customer_id: CustomerId::new(),
            },
            items(),
            address(),
            PaymentMode::Cod,
            Money::zero(),
        )
        .unwrap();
        order.confirm_cash_on_delivery().unwrap();

        assert_eq!(order.status(), OrderStatus::Processing);
        assert_ne!(order.payment_status(), PaymentStatus::Pending);
        assert!(order.payment_ref().unwrap().transaction_id.starts_with("COD-"));
    }

    #[test]
    fn cod_confirm_rejected_for_online_order() {
        let mut order = place_online();
        let result = order.confirm_cash_on_delivery();
        assert!(matches!(
            result,
            Err(OrderError::PaymentModeMismatch { .. })
        ));
    }

    #[test]
    fn full_lifecycle_reaches_delivered() {
        let mut order = place_online();
        order.confirm_payment(paid_ref()).unwrap();
        order.attach_shipment(shipment_ref()).unwrap();
        assert_eq!(order.status(), OrderStatus::Shipped);

        order.mark_delivered().unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert!(order.is_terminal());

        let statuses: Vec<_> = order.history().entries().iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Pending,
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
            ]
        );
    }

    #[test]
    fn cannot_ship_before_processing() {
        let mut order = place_online();
        let result = order.attach_shipment(shipment_ref());
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn cannot_deliver_before_shipped() {
        let mut order = place_online();
        order.confirm_payment(paid_ref()).unwrap();
        let result = order.mark_delivered();
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn attach_shipment_twice_reports_existing_tracking() {
        let mut order = place_online();
        order.confirm_payment(paid_ref()).unwrap();
        order.attach_shipment(shipment_ref()).unwrap();

        let result = order.attach_shipment(ShipmentRef {
            carrier: CarrierKind::Ekart,
            tracking_id: "EK-1".to_string(),
            provider_reference: None,
        });
        assert!(matches!(
            result,
            Err(OrderError::AlreadyShipped { tracking_id }) if tracking_id == "SR-90001"
        ));
        assert_eq!(order.history().count_of(OrderStatus::Shipped), 1);
    }

    #[test]
    fn cancel_paid_order_marks_refunded() {
        let mut order = place_online();
        order.confirm_payment(paid_ref()).unwrap();
        order.cancel("customer request").unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.payment_status(), PaymentStatus::Refunded);
    }

    #[test]
    fn cancel_pending_order_keeps_payment_pending() {
        let mut order = place_online();
        order.cancel("changed mind").unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn cannot_cancel_after_dispatch() {
        let mut order = place_online();
        order.confirm_payment(paid_ref()).unwrap();
        order.attach_shipment(shipment_ref()).unwrap();

        let result = order.cancel("too late");
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn quantities_lists_every_line() {
        let order = place_online();
        let quantities = order.quantities();
        assert_eq!(quantities.len(), 2);
        assert_eq!(quantities[0], (ProductId::new("SKU-001"), 2));
        assert_eq!(order.total_quantity(), 3);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut order = place_online();
        order.confirm_payment(paid_ref()).unwrap();

        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id(), order.id());
        assert_eq!(back.status(), OrderStatus::Processing);
        assert_eq!(back.history().len(), 2);
        assert_eq!(back.final_price(), order.final_price());
    }
}

//! The order lifecycle state machine driver.

use std::sync::Arc;

use common::{OrderId, OrderSequence};
use domain::{
    CarrierKind, Order, OrderError, OrderItem, OrderStatus, PaymentMode, PaymentRef,
    PaymentStatus, ProductId,
};
use gateways::PaymentOutcome;
use carriers::{CarrierRegistry, ShipmentOutcome, estimated_weight_grams};
use order_store::OrderStore;
use serde::{Deserialize, Serialize};

use crate::commands::PlaceOrder;
use crate::error::OrchestratorError;
use crate::lock::OrderLocks;
use crate::services::catalog::CatalogService;
use crate::services::idempotency::{Claim, IdempotencyGuard, payment_key};
use crate::services::notifier::{Notifier, NotifyEvent};
use crate::services::stock::{StockError, StockLedger};

/// Orchestrator settings that are deployment-specific.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pincode parcels ship from; used for serviceability checks.
    pub pickup_pincode: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            pickup_pincode: "110001".to_string(),
        }
    }
}

/// How a payment callback was absorbed.
///
/// Webhook handlers report all four shapes as success to the gateway —
/// an error response would only extend the provider's retry loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ack", rename_all = "snake_case")]
pub enum PaymentAck {
    /// The callback transitioned the order.
    Applied {
        order_status: OrderStatus,
        payment_status: PaymentStatus,
    },

    /// The callback's key was seen before; the recorded result is returned
    /// and no effect was re-applied.
    Duplicate {
        order_status: OrderStatus,
        payment_status: PaymentStatus,
    },

    /// The order exists but is past the payment window; acknowledged
    /// without mutating state.
    Stale,

    /// The callback referenced no known order; logged and dropped.
    Dropped,
}

impl PaymentAck {
    fn as_duplicate(self) -> Self {
        match self {
            PaymentAck::Applied {
                order_status,
                payment_status,
            } => PaymentAck::Duplicate {
                order_status,
                payment_status,
            },
            other => other,
        }
    }
}

/// Drives orders through their lifecycle.
///
/// Owns the Order aggregate exclusively: every transition happens under the
/// order's lock, external calls stay outside it, and each applied transition
/// appends exactly one status-history entry.
pub struct OrderOrchestrator<S: OrderStore> {
    store: S,
    stock: Arc<dyn StockLedger>,
    idempotency: Arc<dyn IdempotencyGuard>,
    catalog: Arc<dyn CatalogService>,
    notifier: Arc<dyn Notifier>,
    carriers: CarrierRegistry,
    sequence: Arc<OrderSequence>,
    locks: OrderLocks,
    config: OrchestratorConfig,
}

impl<S: OrderStore> OrderOrchestrator<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: S,
        stock: Arc<dyn StockLedger>,
        idempotency: Arc<dyn IdempotencyGuard>,
        catalog: Arc<dyn CatalogService>,
        notifier: Arc<dyn Notifier>,
        carriers: CarrierRegistry,
        sequence: Arc<OrderSequence>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            stock,
            idempotency,
            catalog,
            notifier,
            carriers,
            sequence,
            locks: OrderLocks::new(),
            config,
        }
    }

    /// Places a new order: snapshots the cart against the catalog, reserves
    /// stock optimistically, and persists the order in `Pending` (COD orders
    /// continue straight to `Processing`).
    ///
    /// All-or-nothing: any failure after the stock decrement releases the
    /// reservation before the error propagates.
    #[tracing::instrument(skip(self, cmd), fields(payment_mode = %cmd.payment_mode))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, OrchestratorError> {
        metrics::counter!("orders_place_attempts_total").increment(1);
        let started = std::time::Instant::now();

        // Cheap validations first, so nothing external is touched for input
        // that can never succeed.
        cmd.shipping_address.validate()?;
        if cmd.lines.is_empty() {
            return Err(OrchestratorError::Validation("cart is empty".to_string()));
        }

        // Live catalog read; titles and prices are snapshotted here and never
        // re-read.
        let mut items = Vec::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            if line.quantity == 0 {
                return Err(OrchestratorError::Validation(format!(
                    "quantity for {} must be at least 1",
                    line.product_id
                )));
            }
            let product = self.catalog.lookup(&line.product_id).await.ok_or_else(|| {
                OrchestratorError::UnknownProduct {
                    product_id: line.product_id.clone(),
                }
            })?;
            let mut item = OrderItem::new(
                line.product_id.clone(),
                product.title,
                product.unit_price,
                line.quantity,
            );
            if let Some(variant) = &line.variant {
                item = item.with_variant(variant.clone());
            }
            items.push(item);
        }

        let lines: Vec<(ProductId, u32)> = items
            .iter()
            .map(|item| (item.product_id.clone(), item.quantity))
            .collect();

        // Optimistic decrement at creation time, before payment, so the
        // payment window cannot oversell.
        self.stock.reserve_all(&lines).await.map_err(|e| {
            metrics::counter!("orders_out_of_stock_total").increment(1);
            match e {
                StockError::OutOfStock { product_id } => {
                    OrchestratorError::OutOfStock { product_id }
                }
            }
        })?;

        let order_id = self.sequence.next_id();
        let placed = Order::place(
            order_id,
            cmd.customer,
            items,
            cmd.shipping_address,
            cmd.payment_mode,
            cmd.discount,
        );

        let mut order = match placed {
            Ok(order) => order,
            Err(e) => {
                self.stock.release_all(&lines).await;
                return Err(e.into());
            }
        };

        if cmd.payment_mode == PaymentMode::Cod
            && let Err(e) = order.confirm_cash_on_delivery()
        {
            self.stock.release_all(&lines).await;
            return Err(e.into());
        }

        if let Err(e) = self.store.insert(&mut order).await {
            self.stock.release_all(&lines).await;
            return Err(e.into());
        }

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(%order_id, total = %order.final_price(), "order placed");

        self.notify(&order, NotifyEvent::OrderPlaced).await;
        Ok(order)
    }

    /// Applies a verified gateway outcome to its order.
    ///
    /// Idempotency-guarded on the gateway transaction id: a replayed callback
    /// returns the recorded ack without touching state. Unknown orders are
    /// logged and dropped rather than erroring into the gateway's retry loop.
    #[tracing::instrument(skip(self, outcome), fields(gateway = %outcome.gateway))]
    pub async fn confirm_payment(
        &self,
        outcome: &PaymentOutcome,
    ) -> Result<PaymentAck, OrchestratorError> {
        let Some(order_id) = outcome.order_id else {
            metrics::counter!("payments_dropped_total").increment(1);
            tracing::warn!(
                transaction_id = %outcome.transaction_id,
                "payment callback carried no order reference; dropped"
            );
            return Ok(PaymentAck::Dropped);
        };

        let key = payment_key(outcome.gateway, &outcome.transaction_id);
        let lock = self.locks.for_order(order_id);
        let _guard = lock.lock().await;

        match self.idempotency.begin(&key).await {
            Claim::Replayed(recorded) => {
                metrics::counter!("payments_replayed_total").increment(1);
                tracing::info!(%order_id, "replayed payment callback; returning recorded ack");
                let ack: PaymentAck = serde_json::from_value(recorded)?;
                return Ok(ack.as_duplicate());
            }
            Claim::InFlight => {
                // A previous attempt claimed the key but never recorded its
                // result. Under the per-order lock that attempt is no longer
                // running; report the order as it stands.
                metrics::counter!("payments_replayed_total").increment(1);
                return Ok(match self.store.get(order_id).await? {
                    Some(order) => PaymentAck::Duplicate {
                        order_status: order.status(),
                        payment_status: order.payment_status(),
                    },
                    None => PaymentAck::Dropped,
                });
            }
            Claim::New => {}
        }

        let Some(mut order) = self.store.get(order_id).await? else {
            metrics::counter!("payments_dropped_total").increment(1);
            tracing::warn!(%order_id, "payment callback for unknown order; dropped");
            let ack = PaymentAck::Dropped;
            self.idempotency
                .complete(&key, serde_json::to_value(&ack)?)
                .await;
            return Ok(ack);
        };

        if let Some(amount) = outcome.amount
            && amount != order.final_price()
        {
            // Applied anyway; the trail records the gateway's own figure and
            // reconciliation flags the mismatch downstream.
            tracing::warn!(
                %order_id,
                gateway_amount = amount.paise(),
                order_amount = order.final_price().paise(),
                "gateway-reported amount differs from order total"
            );
        }

        let ack = if outcome.success {
            let payment = PaymentRef {
                gateway: outcome.gateway,
                transaction_id: outcome.transaction_id.clone(),
                provider_code: outcome.provider_code.clone(),
            };
            match order.confirm_payment(payment) {
                Ok(()) => {
                    self.store.update(&mut order).await?;
                    metrics::counter!("payments_confirmed_total").increment(1);
                    tracing::info!(%order_id, "payment confirmed");
                    self.notify(&order, NotifyEvent::PaymentConfirmed).await;
                    PaymentAck::Applied {
                        order_status: order.status(),
                        payment_status: order.payment_status(),
                    }
                }
                Err(
                    OrderError::InvalidStateTransition { .. }
                    | OrderError::PaymentModeMismatch { .. }
                    | OrderError::InvalidPaymentTransition { .. },
                ) => {
                    tracing::warn!(
                        %order_id,
                        status = %order.status(),
                        "payment callback for order past its payment window"
                    );
                    PaymentAck::Stale
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            let reason = outcome
                .provider_code
                .clone()
                .unwrap_or_else(|| "declined by gateway".to_string());
            match order.decline_payment(reason) {
                Ok(()) => {
                    self.store.update(&mut order).await?;
                    self.stock.release_all(&order.quantities()).await;
                    metrics::counter!("payments_declined_total").increment(1);
                    tracing::info!(%order_id, "payment declined; order cancelled");
                    self.notify(&order, NotifyEvent::OrderCancelled).await;
                    PaymentAck::Applied {
                        order_status: order.status(),
                        payment_status: order.payment_status(),
                    }
                }
                Err(
                    OrderError::InvalidStateTransition { .. }
                    | OrderError::PaymentModeMismatch { .. }
                    | OrderError::InvalidPaymentTransition { .. },
                ) => PaymentAck::Stale,
                Err(e) => return Err(e.into()),
            }
        };

        self.idempotency
            .complete(&key, serde_json::to_value(&ack)?)
            .await;
        Ok(ack)
    }

    /// Books a shipment with the requested carrier and moves the order to
    /// `Shipped` once the carrier confirms.
    ///
    /// Idempotent per carrier: if the order already has a reference from this
    /// carrier, it is returned without buying another label. The carrier call
    /// itself happens outside the order lock.
    #[tracing::instrument(skip(self), fields(%order_id, carrier = %carrier))]
    pub async fn create_shipment(
        &self,
        order_id: OrderId,
        carrier: CarrierKind,
    ) -> Result<ShipmentOutcome, OrchestratorError> {
        let dispatcher = self
            .carriers
            .get(carrier)
            .ok_or(OrchestratorError::UnknownCarrier(carrier))?;

        let lock = self.locks.for_order(order_id);

        // Phase 1 under the lock: read state, run the guards, snapshot the
        // order for the carrier call.
        let order = {
            let _guard = lock.lock().await;
            let order = self
                .store
                .get(order_id)
                .await?
                .ok_or(OrchestratorError::NotFound(order_id))?;

            if let Some(existing) = order.shipment_ref()
                && existing.carrier == carrier
            {
                metrics::counter!("shipments_replayed_total").increment(1);
                return Ok(ShipmentOutcome::from_ref(existing));
            }
            if !order.status().can_ship() {
                return Err(OrderError::InvalidStateTransition {
                    current_state: order.status(),
                    action: "create a shipment for",
                }
                .into());
            }
            order.shipping_address().validate()?;
            order
        };

        // External calls happen without holding the order lock.
        let destination = order.shipping_address().pincode.clone();
        let weight = estimated_weight_grams(&order);
        let serviceable = dispatcher
            .check_serviceability(&self.config.pickup_pincode, &destination, weight)
            .await?;
        if !serviceable {
            metrics::counter!("shipments_unserviceable_total").increment(1);
            return Err(OrchestratorError::Unserviceable {
                carrier,
                pincode: destination,
            });
        }

        let outcome = dispatcher.create_shipment(&order).await?;

        // Phase 2 under the lock: re-read and commit the transition.
        {
            let _guard = lock.lock().await;
            let mut order = self
                .store
                .get(order_id)
                .await?
                .ok_or(OrchestratorError::NotFound(order_id))?;

            if let Some(existing) = order.shipment_ref() {
                // Another shipment landed while the carrier call was in
                // flight; keep the committed one and surface the duplicate.
                tracing::warn!(
                    %order_id,
                    committed = %existing.tracking_id,
                    duplicate = %outcome.tracking_id,
                    "shipment raced; a reference already exists"
                );
                return Ok(ShipmentOutcome::from_ref(existing));
            }

            order.attach_shipment(outcome.to_ref())?;
            self.store.update(&mut order).await?;

            metrics::counter!("shipments_created_total").increment(1);
            tracing::info!(%order_id, tracking = %outcome.tracking_id, "shipment created");
            self.notify(&order, NotifyEvent::OrderShipped).await;
        }

        Ok(outcome)
    }

    /// Marks a shipped order delivered.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<Order, OrchestratorError> {
        let lock = self.locks.for_order(order_id);
        let _guard = lock.lock().await;

        let mut order = self
            .store
            .get(order_id)
            .await?
            .ok_or(OrchestratorError::NotFound(order_id))?;

        order.mark_delivered()?;
        self.store.update(&mut order).await?;

        metrics::counter!("orders_delivered_total").increment(1);
        tracing::info!(%order_id, "order delivered");
        self.notify(&order, NotifyEvent::OrderDelivered).await;
        Ok(order)
    }

    /// Cancels an order from `Pending` or `Processing` and releases its
    /// stock reservation exactly once.
    ///
    /// Cancelling an already-cancelled order is a no-op, so retried cancel
    /// commands cannot double-release stock.
    #[tracing::instrument(skip(self, reason), fields(%order_id))]
    pub async fn cancel(
        &self,
        order_id: OrderId,
        reason: impl Into<String> + Send,
    ) -> Result<Order, OrchestratorError> {
        let lock = self.locks.for_order(order_id);
        let _guard = lock.lock().await;

        let mut order = self
            .store
            .get(order_id)
            .await?
            .ok_or(OrchestratorError::NotFound(order_id))?;

        if order.status() == OrderStatus::Cancelled {
            tracing::info!(%order_id, "cancel replayed on cancelled order; no-op");
            return Ok(order);
        }

        order.cancel(reason.into())?;
        self.store.update(&mut order).await?;
        self.stock.release_all(&order.quantities()).await;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled");
        self.notify(&order, NotifyEvent::OrderCancelled).await;
        Ok(order)
    }

    /// Loads an order by ID. Returns `None` if it does not exist.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, OrchestratorError> {
        Ok(self.store.get(order_id).await?)
    }

    /// Lists all orders, oldest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>, OrchestratorError> {
        Ok(self.store.list().await?)
    }

    async fn notify(&self, order: &Order, event: NotifyEvent) {
        let recipient = order
            .customer()
            .email()
            .map(str::to_string)
            .unwrap_or_else(|| format!("customer-of-{}", order.id()));
        let payload = serde_json::json!({
            "order_id": order.id().to_string(),
            "status": order.status().as_str(),
            "final_price_paise": order.final_price().paise(),
        });
        self.notifier.notify(event, &recipient, payload).await;
    }
}

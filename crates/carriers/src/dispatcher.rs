use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{CarrierKind, Order};

use crate::{CarrierError, ShipmentOutcome};

/// Capability shared by every logistics carrier.
#[async_trait]
pub trait ShipmentDispatcher: Send + Sync {
    /// Which carrier this dispatcher books with.
    fn kind(&self) -> CarrierKind;

    /// Returns whether the carrier delivers from `origin_pincode` to
    /// `dest_pincode` for a parcel of `weight_grams`.
    async fn check_serviceability(
        &self,
        origin_pincode: &str,
        dest_pincode: &str,
        weight_grams: u32,
    ) -> Result<bool, CarrierError>;

    /// Books a shipment for the order and returns the canonical outcome.
    async fn create_shipment(&self, order: &Order) -> Result<ShipmentOutcome, CarrierError>;
}

/// Dispatch table from carrier tag to dispatcher.
#[derive(Clone, Default)]
pub struct CarrierRegistry {
    dispatchers: HashMap<CarrierKind, Arc<dyn ShipmentDispatcher>>,
}

impl CarrierRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dispatcher under its own kind, replacing any previous one.
    pub fn register(mut self, dispatcher: Arc<dyn ShipmentDispatcher>) -> Self {
        self.dispatchers.insert(dispatcher.kind(), dispatcher);
        self
    }

    /// Looks up the dispatcher for a carrier.
    pub fn get(&self, kind: CarrierKind) -> Option<Arc<dyn ShipmentDispatcher>> {
        self.dispatchers.get(&kind).cloned()
    }
}

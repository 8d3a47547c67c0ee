//! Manual dispatch fallback.
//!
//! Used when no carrier integration fits — a parcel handed to a courier at
//! the counter. Always serviceable, and the reference it assigns is the
//! tracking id an operator writes on the docket.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use domain::{CarrierKind, Order};

use crate::{CarrierError, ShipmentOutcome, ShipmentDispatcher};

/// Dispatcher for hand-booked shipments.
#[derive(Debug, Default)]
pub struct ManualDispatcher {
    next: AtomicU32,
}

impl ManualDispatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShipmentDispatcher for ManualDispatcher {
    fn kind(&self) -> CarrierKind {
        CarrierKind::Manual
    }

    async fn check_serviceability(
        &self,
        _origin_pincode: &str,
        _dest_pincode: &str,
        _weight_grams: u32,
    ) -> Result<bool, CarrierError> {
        Ok(true)
    }

    async fn create_shipment(&self, _order: &Order) -> Result<ShipmentOutcome, CarrierError> {
        let seq = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ShipmentOutcome {
            carrier: CarrierKind::Manual,
            tracking_id: format!("MAN-{seq:04}"),
            provider_reference: None,
            label_url: None,
        })
    }
}

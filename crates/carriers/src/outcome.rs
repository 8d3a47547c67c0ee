use domain::{CarrierKind, ShipmentRef};
use serde::{Deserialize, Serialize};

/// Canonical, carrier-independent result of creating a shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentOutcome {
    /// Which carrier accepted the parcel.
    pub carrier: CarrierKind,

    /// The tracking identifier customers can follow.
    pub tracking_id: String,

    /// The carrier's own internal reference, when distinct from tracking.
    pub provider_reference: Option<String>,

    /// Label download URL, when the carrier produces one.
    pub label_url: Option<String>,
}

impl ShipmentOutcome {
    /// Converts the outcome into the reference stored on the order.
    pub fn to_ref(&self) -> ShipmentRef {
        ShipmentRef {
            carrier: self.carrier,
            tracking_id: self.tracking_id.clone(),
            provider_reference: self.provider_reference.clone(),
        }
    }

    /// Rebuilds an outcome from a stored reference (idempotent replays).
    pub fn from_ref(shipment: &ShipmentRef) -> Self {
        Self {
            carrier: shipment.carrier,
            tracking_id: shipment.tracking_id.clone(),
            provider_reference: shipment.provider_reference.clone(),
            label_url: None,
        }
    }
}

//! Ekart integration.
//!
//! Ekart books consignments rather than orders: one consignee block, a list
//! of goods rows, and the payment type. Serviceability is a plain pincode
//! lookup. The HTTP transport sits behind [`EkartApi`].

use async_trait::async_trait;
use domain::{CarrierKind, Order, PaymentMode};
use serde::{Deserialize, Serialize};

use crate::{CarrierError, ShipmentDispatcher, ShipmentOutcome, estimated_weight_grams};

/// One goods row in an Ekart consignment.
#[derive(Debug, Clone, Serialize)]
pub struct EkartGood {
    pub product_title: String,
    pub sku: String,
    pub quantity: u32,
    /// Declared value in paise.
    pub declared_value: i64,
}

/// Consignee block: the address split the way Ekart wants it.
#[derive(Debug, Clone, Serialize)]
pub struct EkartConsignee {
    pub name: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pin: String,
    pub primary_contact: String,
}

/// Ekart's consignment wire schema.
#[derive(Debug, Clone, Serialize)]
pub struct EkartConsignmentRequest {
    pub merchant_reference: String,
    pub payment_type: String,
    /// Amount to collect at the door, in paise. Zero for prepaid.
    pub collectable_amount: i64,
    pub weight_grams: u32,
    pub consignee: EkartConsignee,
    pub goods: Vec<EkartGood>,
}

/// Ekart's consignment response.
#[derive(Debug, Clone, Deserialize)]
pub struct EkartConsignmentResponse {
    pub tracking_id: String,
    #[serde(default)]
    pub consignment_reference: Option<String>,
}

/// Transport capability, injectable so tests never touch the network.
#[async_trait]
pub trait EkartApi: Send + Sync {
    async fn create_consignment(
        &self,
        request: &EkartConsignmentRequest,
    ) -> Result<EkartConsignmentResponse, CarrierError>;

    async fn pincode_serviceable(&self, pincode: &str) -> Result<bool, CarrierError>;
}

/// Dispatcher booking consignments through Ekart.
pub struct EkartDispatcher<A> {
    api: A,
}

impl<A> EkartDispatcher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Maps the canonical order into Ekart's wire schema.
    pub fn build_request(&self, order: &Order) -> EkartConsignmentRequest {
        let address = order.shipping_address();
        let goods = order
            .items()
            .iter()
            .map(|item| EkartGood {
                product_title: item.title.clone(),
                sku: item.product_id.to_string(),
                quantity: item.quantity,
                declared_value: item.line_total().paise(),
            })
            .collect();

        let address_line = match &address.line2 {
            Some(line2) => format!("{}, {line2}", address.line1),
            None => address.line1.clone(),
        };

        let (payment_type, collectable_amount) = match order.payment_mode() {
            PaymentMode::Cod => ("COD".to_string(), order.final_price().paise()),
            PaymentMode::Online => ("PREPAID".to_string(), 0),
        };

        EkartConsignmentRequest {
            merchant_reference: order.id().to_string(),
            payment_type,
            collectable_amount,
            weight_grams: estimated_weight_grams(order),
            consignee: EkartConsignee {
                name: address.name.clone(),
                address_line,
                city: address.city.clone(),
                state: address.state.clone(),
                pin: address.pincode.clone(),
                primary_contact: address.phone.clone(),
            },
            goods,
        }
    }
}

#[async_trait]
impl<A: EkartApi> ShipmentDispatcher for EkartDispatcher<A> {
    fn kind(&self) -> CarrierKind {
        CarrierKind::Ekart
    }

    async fn check_serviceability(
        &self,
        _origin_pincode: &str,
        dest_pincode: &str,
        _weight_grams: u32,
    ) -> Result<bool, CarrierError> {
        self.api.pincode_serviceable(dest_pincode).await
    }

    async fn create_shipment(&self, order: &Order) -> Result<ShipmentOutcome, CarrierError> {
        let request = self.build_request(order);
        let response = self.api.create_consignment(&request).await?;

        Ok(ShipmentOutcome {
            carrier: CarrierKind::Ekart,
            tracking_id: response.tracking_id,
            provider_reference: response.consignment_reference,
            label_url: None,
        })
    }
}

/// Transport over HTTP with an API-key header.
pub struct HttpEkartApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ServiceabilityBody {
    serviceable: bool,
}

impl HttpEkartApi {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn unavailable(detail: impl Into<String>) -> CarrierError {
        CarrierError::Unavailable {
            carrier: CarrierKind::Ekart,
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl EkartApi for HttpEkartApi {
    async fn create_consignment(
        &self,
        request: &EkartConsignmentRequest,
    ) -> Result<EkartConsignmentResponse, CarrierError> {
        let response = self
            .http
            .post(format!("{}/v2/shipments/create", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("create consignment: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "ekart rejected consignment request");
            return Err(CarrierError::Rejected {
                carrier: CarrierKind::Ekart,
                detail: format!("{status}: {detail}"),
            });
        }
        if !status.is_success() {
            return Err(Self::unavailable(format!(
                "create consignment returned {status}"
            )));
        }

        response.json().await.map_err(|e| CarrierError::Malformed {
            carrier: CarrierKind::Ekart,
            detail: e.to_string(),
        })
    }

    async fn pincode_serviceable(&self, pincode: &str) -> Result<bool, CarrierError> {
        let response = self
            .http
            .get(format!("{}/v2/serviceability/{}", self.base_url, pincode))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("serviceability: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(format!(
                "serviceability returned {}",
                response.status()
            )));
        }

        let body: ServiceabilityBody =
            response.json().await.map_err(|e| CarrierError::Malformed {
                carrier: CarrierKind::Ekart,
                detail: e.to_string(),
            })?;
        Ok(body.serviceable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OrderId;
    use domain::{Address, Customer, CustomerId, Money, OrderItem};

    struct StubApi;

    #[async_trait]
    impl EkartApi for StubApi {
        async fn create_consignment(
            &self,
            request: &EkartConsignmentRequest,
        ) -> Result<EkartConsignmentResponse, CarrierError> {
            Ok(EkartConsignmentResponse {
                tracking_id: format!("EK-{}", request.merchant_reference),
                consignment_reference: Some("CSG-77".to_string()),
            })
        }

        async fn pincode_serviceable(&self, pincode: &str) -> Result<bool, CarrierError> {
            Ok(pincode.starts_with('5'))
        }
    }

    fn order(mode: PaymentMode) -> Order {
        Order::place(
            OrderId::from_sequence(42),
            Customer::Registered {
                customer_id: CustomerId::new(),
            },
            vec![OrderItem::new(
                "SKU-001",
                "Cotton Kurta",
                Money::from_paise(49900),
                2,
            )],
            Address {
                name: "Asha Rao".to_string(),
                line1: "12 MG Road".to_string(),
                line2: Some("Near Metro".to_string()),
                city: "Bengaluru".to_string(),
                state: "Karnataka".to_string(),
                pincode: "560001".to_string(),
                phone: "9876543210".to_string(),
            },
            mode,
            Money::zero(),
        )
        .unwrap()
    }

    #[test]
    fn cod_order_collects_final_price() {
        let dispatcher = EkartDispatcher::new(StubApi);
        let request = dispatcher.build_request(&order(PaymentMode::Cod));

        assert_eq!(request.payment_type, "COD");
        assert_eq!(request.collectable_amount, 2 * 49900);
        assert_eq!(request.consignee.address_line, "12 MG Road, Near Metro");
        assert_eq!(request.weight_grams, 1000);
    }

    #[test]
    fn prepaid_order_collects_nothing() {
        let dispatcher = EkartDispatcher::new(StubApi);
        let request = dispatcher.build_request(&order(PaymentMode::Online));

        assert_eq!(request.payment_type, "PREPAID");
        assert_eq!(request.collectable_amount, 0);
    }

    #[tokio::test]
    async fn create_shipment_normalizes_response() {
        let dispatcher = EkartDispatcher::new(StubApi);
        let outcome = dispatcher
            .create_shipment(&order(PaymentMode::Online))
            .await
            .unwrap();

        assert_eq!(outcome.carrier, CarrierKind::Ekart);
        assert_eq!(outcome.tracking_id, "EK-ORD-000042");
        assert_eq!(outcome.provider_reference.as_deref(), Some("CSG-77"));
    }

    #[tokio::test]
    async fn serviceability_uses_destination_pincode() {
        let dispatcher = EkartDispatcher::new(StubApi);
        assert!(
            dispatcher
                .check_serviceability("110001", "560001", 1000)
                .await
                .unwrap()
        );
        assert!(
            !dispatcher
                .check_serviceability("110001", "400001", 1000)
                .await
                .unwrap()
        );
    }
}

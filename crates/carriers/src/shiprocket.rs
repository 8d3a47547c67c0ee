//! Shiprocket integration.
//!
//! Shiprocket wants the order flattened into its own wire schema: billing
//! fields split out of the address, per-item sku/hsn/price rows, and package
//! dimensions and weight. The HTTP transport sits behind [`ShiprocketApi`] so
//! tests exercise the mapping without a network.

use async_trait::async_trait;
use domain::{CarrierKind, Order, PaymentMode};
use serde::{Deserialize, Serialize};

use crate::{CarrierError, ShipmentDispatcher, ShipmentOutcome, estimated_weight_grams};

// Default carton for apparel-sized parcels, in centimetres.
const CARTON_LENGTH_CM: f64 = 30.0;
const CARTON_BREADTH_CM: f64 = 25.0;
const CARTON_HEIGHT_CM: f64 = 8.0;

/// One row in Shiprocket's order payload.
#[derive(Debug, Clone, Serialize)]
pub struct ShiprocketItem {
    pub name: String,
    pub sku: String,
    pub units: u32,
    /// Unit price in rupees.
    pub selling_price: f64,
    pub hsn: String,
}

/// Shiprocket's "create adhoc order" wire schema.
#[derive(Debug, Clone, Serialize)]
pub struct ShiprocketOrderRequest {
    pub order_id: String,
    pub order_date: String,
    pub pickup_location: String,
    pub billing_customer_name: String,
    pub billing_address: String,
    pub billing_address_2: Option<String>,
    pub billing_city: String,
    pub billing_pincode: String,
    pub billing_state: String,
    pub billing_country: String,
    pub billing_phone: String,
    pub shipping_is_billing: bool,
    pub order_items: Vec<ShiprocketItem>,
    pub payment_method: String,
    /// Invoice subtotal in rupees.
    pub sub_total: f64,
    pub length: f64,
    pub breadth: f64,
    pub height: f64,
    /// Parcel weight in kilograms.
    pub weight: f64,
}

/// Shiprocket's order-creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct ShiprocketOrderResponse {
    pub order_id: i64,
    pub shipment_id: i64,
    #[serde(default)]
    pub awb_code: Option<String>,
    #[serde(default)]
    pub label_url: Option<String>,
}

/// Transport capability, injectable so tests never touch the network.
#[async_trait]
pub trait ShiprocketApi: Send + Sync {
    async fn create_order(
        &self,
        request: &ShiprocketOrderRequest,
    ) -> Result<ShiprocketOrderResponse, CarrierError>;

    async fn serviceability(
        &self,
        pickup_pincode: &str,
        delivery_pincode: &str,
        weight_kg: f64,
        cod: bool,
    ) -> Result<bool, CarrierError>;
}

/// Dispatcher booking shipments through Shiprocket.
pub struct ShiprocketDispatcher<A> {
    api: A,
    pickup_location: String,
    default_hsn: String,
}

impl<A> ShiprocketDispatcher<A> {
    pub fn new(api: A, pickup_location: impl Into<String>, default_hsn: impl Into<String>) -> Self {
        Self {
            api,
            pickup_location: pickup_location.into(),
            default_hsn: default_hsn.into(),
        }
    }

    /// Maps the canonical order into Shiprocket's wire schema.
    pub fn build_request(&self, order: &Order) -> ShiprocketOrderRequest {
        let address = order.shipping_address();
        let items = order
            .items()
            .iter()
            .map(|item| ShiprocketItem {
                name: match &item.variant {
                    Some(variant) => format!("{} ({variant})", item.title),
                    None => item.title.clone(),
                },
                sku: item.product_id.to_string(),
                units: item.quantity,
                selling_price: item.unit_price.paise() as f64 / 100.0,
                hsn: self.default_hsn.clone(),
            })
            .collect();

        ShiprocketOrderRequest {
            order_id: order.id().to_string(),
            order_date: order.placed_at().format("%Y-%m-%d %H:%M").to_string(),
            pickup_location: self.pickup_location.clone(),
            billing_customer_name: address.name.clone(),
            billing_address: address.line1.clone(),
            billing_address_2: address.line2.clone(),
            billing_city: address.city.clone(),
            billing_pincode: address.pincode.clone(),
            billing_state: address.state.clone(),
            billing_country: "India".to_string(),
            billing_phone: address.phone.clone(),
            shipping_is_billing: true,
            order_items: items,
            payment_method: match order.payment_mode() {
                PaymentMode::Cod => "COD".to_string(),
                PaymentMode::Online => "Prepaid".to_string(),
            },
            sub_total: order.final_price().paise() as f64 / 100.0,
            length: CARTON_LENGTH_CM,
            breadth: CARTON_BREADTH_CM,
            height: CARTON_HEIGHT_CM,
            weight: estimated_weight_grams(order) as f64 / 1000.0,
        }
    }
}

#[async_trait]
impl<A: ShiprocketApi> ShipmentDispatcher for ShiprocketDispatcher<A> {
    fn kind(&self) -> CarrierKind {
        CarrierKind::Shiprocket
    }

    async fn check_serviceability(
        &self,
        origin_pincode: &str,
        dest_pincode: &str,
        weight_grams: u32,
    ) -> Result<bool, CarrierError> {
        self.api
            .serviceability(
                origin_pincode,
                dest_pincode,
                weight_grams as f64 / 1000.0,
                false,
            )
            .await
    }

    async fn create_shipment(&self, order: &Order) -> Result<ShipmentOutcome, CarrierError> {
        let request = self.build_request(order);
        let response = self.api.create_order(&request).await?;

        let tracking_id = response
            .awb_code
            .clone()
            .unwrap_or_else(|| format!("SR-{}", response.shipment_id));

        Ok(ShipmentOutcome {
            carrier: CarrierKind::Shiprocket,
            tracking_id,
            provider_reference: Some(response.order_id.to_string()),
            label_url: response.label_url,
        })
    }
}

/// Transport over HTTP with bearer-token login.
pub struct HttpShiprocketApi {
    http: reqwest::Client,
    base_url: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct ServiceabilityResponse {
    #[serde(default)]
    data: Option<ServiceabilityData>,
}

#[derive(Deserialize)]
struct ServiceabilityData {
    #[serde(default)]
    available_courier_companies: Vec<serde_json::Value>,
}

impl HttpShiprocketApi {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn unavailable(detail: impl Into<String>) -> CarrierError {
        CarrierError::Unavailable {
            carrier: CarrierKind::Shiprocket,
            detail: detail.into(),
        }
    }

    async fn login(&self) -> Result<String, CarrierError> {
        let response = self
            .http
            .post(format!("{}/v1/external/auth/login", self.base_url))
            .json(&serde_json::json!({
                "email": self.email,
                "password": self.password,
            }))
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("login: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(format!(
                "login returned {}",
                response.status()
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("login response: {e}")))?;
        Ok(login.token)
    }
}

#[async_trait]
impl ShiprocketApi for HttpShiprocketApi {
    async fn create_order(
        &self,
        request: &ShiprocketOrderRequest,
    ) -> Result<ShiprocketOrderResponse, CarrierError> {
        let token = self.login().await?;

        let response = self
            .http
            .post(format!("{}/v1/external/orders/create/adhoc", self.base_url))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("create order: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "shiprocket rejected shipment request");
            return Err(CarrierError::Rejected {
                carrier: CarrierKind::Shiprocket,
                detail: format!("{status}: {detail}"),
            });
        }
        if !status.is_success() {
            return Err(Self::unavailable(format!("create order returned {status}")));
        }

        response.json().await.map_err(|e| CarrierError::Malformed {
            carrier: CarrierKind::Shiprocket,
            detail: e.to_string(),
        })
    }

    async fn serviceability(
        &self,
        pickup_pincode: &str,
        delivery_pincode: &str,
        weight_kg: f64,
        cod: bool,
    ) -> Result<bool, CarrierError> {
        let token = self.login().await?;
        let weight = weight_kg.to_string();

        let response = self
            .http
            .get(format!(
                "{}/v1/external/courier/serviceability/",
                self.base_url
            ))
            .bearer_auth(token)
            .query(&[
                ("pickup_postcode", pickup_pincode),
                ("delivery_postcode", delivery_pincode),
                ("weight", weight.as_str()),
                ("cod", if cod { "1" } else { "0" }),
            ])
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("serviceability: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(format!(
                "serviceability returned {}",
                response.status()
            )));
        }

        let body: ServiceabilityResponse =
            response.json().await.map_err(|e| CarrierError::Malformed {
                carrier: CarrierKind::Shiprocket,
                detail: e.to_string(),
            })?;

        Ok(body
            .data
            .map(|d| !d.available_courier_companies.is_empty())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OrderId;
    use domain::{Address, Customer, CustomerId, Money, OrderItem};

    struct StubApi {
        serviceable: bool,
    }

    #[async_trait]
    impl ShiprocketApi for StubApi {
        async fn create_order(
            &self,
            request: &ShiprocketOrderRequest,
        ) -> Result<ShiprocketOrderResponse, CarrierError> {
            assert_eq!(request.billing_country, "India");
            Ok(ShiprocketOrderResponse {
                order_id: 7001,
                shipment_id: 9001,
                awb_code: Some("AWB123456".to_string()),
                label_url: None,
            })
        }

        async fn serviceability(
            &self,
            _pickup: &str,
            _delivery: &str,
            _weight_kg: f64,
            _cod: bool,
        ) -> Result<bool, CarrierError> {
            Ok(self.serviceable)
        }
    }

    fn order(mode: PaymentMode) -> Order {
        Order::place(
            OrderId::from_sequence(42),
            Customer::Registered {
                customer_id: CustomerId::new(),
            },
            vec![
                OrderItem::new("SKU-001", "Cotton Kurta", Money::from_paise(49900), 2)
                    .with_variant("XL"),
                OrderItem::new("SKU-002", "Silk Scarf", Money::from_paise(29900), 1),
            ],
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

    fn dispatcher(serviceable: bool) -> ShiprocketDispatcher<StubApi> {
        ShiprocketDispatcher::new(StubApi { serviceable }, "Primary", "6109")
    }

    #[test]
    fn build_request_maps_order_fields() {
        let dispatcher = dispatcher(true);
        let order = order(PaymentMode::Online);
        let request = dispatcher.build_request(&order);

        assert_eq!(request.order_id, "ORD-000042");
        assert_eq!(request.billing_customer_name, "Asha Rao");
        assert_eq!(request.billing_pincode, "560001");
        assert_eq!(request.payment_method, "Prepaid");
        assert_eq!(request.order_items.len(), 2);
        assert_eq!(request.order_items[0].name, "Cotton Kurta (XL)");
        assert_eq!(request.order_items[0].units, 2);
        assert_eq!(request.order_items[0].selling_price, 499.0);
        assert_eq!(request.order_items[0].hsn, "6109");
        // 3 units at 500 g each
        assert_eq!(request.weight, 1.5);
        assert_eq!(request.sub_total, 1297.0);
    }

    #[test]
    fn cod_order_maps_to_cod_payment_method() {
        let dispatcher = dispatcher(true);
        let request = dispatcher.build_request(&order(PaymentMode::Cod));
        assert_eq!(request.payment_method, "COD");
    }

    #[tokio::test]
    async fn create_shipment_prefers_awb_code() {
        let dispatcher = dispatcher(true);
        let outcome = dispatcher
            .create_shipment(&order(PaymentMode::Online))
            .await
            .unwrap();

        assert_eq!(outcome.carrier, CarrierKind::Shiprocket);
        assert_eq!(outcome.tracking_id, "AWB123456");
        assert_eq!(outcome.provider_reference.as_deref(), Some("7001"));
    }

    #[tokio::test]
    async fn serviceability_passes_through() {
        assert!(
            dispatcher(true)
                .check_serviceability("110001", "560001", 1500)
                .await
                .unwrap()
        );
        assert!(
            !dispatcher(false)
                .check_serviceability("110001", "560001", 1500)
                .await
                .unwrap()
        );
    }
}

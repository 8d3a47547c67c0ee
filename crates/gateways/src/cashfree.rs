//! Cashfree callback verification.
//!
//! Cashfree callbacks are not trusted directly: the webhook only names the
//! order, and the verifier asks Cashfree's order API for the authoritative
//! status over an OAuth-bearer session. A forged callback can therefore at
//! worst trigger a status query.

use async_trait::async_trait;
use common::OrderId;
use domain::{GatewayKind, Money};
use serde::Deserialize;

use crate::{GatewayError, PaymentOutcome, PaymentVerifier, SignatureHeaders};

const STATUS_PAID: &str = "PAID";
const STATUS_ACTIVE: &str = "ACTIVE";

/// Authoritative order status as reported by Cashfree's API.
#[derive(Debug, Clone, Deserialize)]
pub struct CashfreeOrderStatus {
    pub order_id: String,
    pub order_status: String,
    #[serde(default)]
    pub cf_payment_id: Option<String>,
    #[serde(default)]
    pub amount_paise: Option<i64>,
}

/// Status-query capability, injectable so tests never touch the network.
#[async_trait]
pub trait CashfreeStatusApi: Send + Sync {
    /// Fetches the authoritative status for a merchant order id.
    async fn order_status(&self, order_id: &str) -> Result<CashfreeOrderStatus, GatewayError>;
}

/// Verifier for Cashfree callbacks, generic over the status API.
pub struct CashfreeVerifier<C> {
    client: C,
}

#[derive(Deserialize)]
struct CallbackBody {
    #[serde(alias = "orderId")]
    order_id: String,
}

impl<C> CashfreeVerifier<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: CashfreeStatusApi> PaymentVerifier for CashfreeVerifier<C> {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Cashfree
    }

    async fn verify(
        &self,
        payload: &[u8],
        _headers: &SignatureHeaders,
    ) -> Result<PaymentOutcome, GatewayError> {
        let body: CallbackBody =
            serde_json::from_slice(payload).map_err(|e| GatewayError::Malformed {
                gateway: GatewayKind::Cashfree,
                detail: format!("callback body: {e}"),
            })?;

        let status = self.client.order_status(&body.order_id).await?;

        // A payment still in flight is neither captured nor declined; let the
        // gateway retry once it settles.
        if status.order_status == STATUS_ACTIVE {
            return Err(GatewayError::Unavailable {
                gateway: GatewayKind::Cashfree,
                detail: format!("order {} not settled yet", status.order_id),
            });
        }

        let transaction_id = status
            .cf_payment_id
            .clone()
            .unwrap_or_else(|| format!("cf-{}", status.order_id));

        Ok(PaymentOutcome {
            gateway: GatewayKind::Cashfree,
            success: status.order_status == STATUS_PAID,
            order_id: OrderId::parse(&status.order_id).ok(),
            transaction_id,
            provider_code: Some(status.order_status.clone()),
            amount: status.amount_paise.map(Money::from_paise),
            details: serde_json::json!({ "order_status": status.order_status }),
        })
    }
}

/// Status API over HTTP: obtains a bearer token, then queries the order.
pub struct HttpCashfreeApi {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct OrderResponse {
    order_id: String,
    order_status: String,
    #[serde(default)]
    cf_payment_id: Option<String>,
    #[serde(default)]
    order_amount: Option<f64>,
}

impl HttpCashfreeApi {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    fn unavailable(detail: impl Into<String>) -> GatewayError {
        GatewayError::Unavailable {
            gateway: GatewayKind::Cashfree,
            detail: detail.into(),
        }
    }

    async fn bearer_token(&self) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(format!("{}/pg/oauth/token", self.base_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("token request: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(format!(
                "token request returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("token response: {e}")))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl CashfreeStatusApi for HttpCashfreeApi {
    async fn order_status(&self, order_id: &str) -> Result<CashfreeOrderStatus, GatewayError> {
        let token = self.bearer_token().await?;

        let response = self
            .http
            .get(format!("{}/pg/orders/{}", self.base_url, order_id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("status query: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(format!(
                "status query returned {}",
                response.status()
            )));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("status response: {e}")))?;

        Ok(CashfreeOrderStatus {
            order_id: order.order_id,
            order_status: order.order_status,
            cf_payment_id: order.cf_payment_id,
            amount_paise: order.order_amount.map(|r| (r * 100.0).round() as i64),
        })
    }
}

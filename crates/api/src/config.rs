//! Application configuration loaded from environment variables.

/// Server and integration configuration with development defaults.
///
/// Reads from environment variables:
/// - `HOST` / `PORT` — bind address (default `0.0.0.0:3000`)
/// - `DATABASE_URL` — PostgreSQL order store; in-memory when unset
/// - `PICKUP_PINCODE` — warehouse pincode for serviceability checks
/// - `PHONEPE_SALT_KEY` / `PHONEPE_SALT_INDEX`
/// - `RAZORPAY_WEBHOOK_SECRET`
/// - `CASHFREE_BASE_URL` / `CASHFREE_CLIENT_ID` / `CASHFREE_CLIENT_SECRET`
/// - `SHIPROCKET_BASE_URL` / `SHIPROCKET_EMAIL` / `SHIPROCKET_PASSWORD` /
///   `SHIPROCKET_PICKUP_LOCATION` / `SHIPROCKET_DEFAULT_HSN`
/// - `EKART_BASE_URL` / `EKART_API_KEY`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub pickup_pincode: String,

    pub phonepe_salt_key: String,
    pub phonepe_salt_index: String,
    pub razorpay_webhook_secret: String,
    pub cashfree_base_url: String,
    pub cashfree_client_id: String,
    pub cashfree_client_secret: String,

    pub shiprocket_base_url: String,
    pub shiprocket_email: String,
    pub shiprocket_password: String,
    pub shiprocket_pickup_location: String,
    pub shiprocket_default_hsn: String,
    pub ekart_base_url: String,
    pub ekart_api_key: String,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// development defaults for everything but real credentials.
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL").ok(),
            pickup_pincode: env_or("PICKUP_PINCODE", "110001"),

            phonepe_salt_key: env_or("PHONEPE_SALT_KEY", "dev-salt"),
            phonepe_salt_index: env_or("PHONEPE_SALT_INDEX", "1"),
            razorpay_webhook_secret: env_or("RAZORPAY_WEBHOOK_SECRET", "dev-webhook-secret"),
            cashfree_base_url: env_or("CASHFREE_BASE_URL", "https://sandbox.cashfree.com"),
            cashfree_client_id: env_or("CASHFREE_CLIENT_ID", ""),
            cashfree_client_secret: env_or("CASHFREE_CLIENT_SECRET", ""),

            shiprocket_base_url: env_or(
                "SHIPROCKET_BASE_URL",
                "https://apiv2.shiprocket.in",
            ),
            shiprocket_email: env_or("SHIPROCKET_EMAIL", ""),
            shiprocket_password: env_or("SHIPROCKET_PASSWORD", ""),
            shiprocket_pickup_location: env_or("SHIPROCKET_PICKUP_LOCATION", "Primary"),
            shiprocket_default_hsn: env_or("SHIPROCKET_DEFAULT_HSN", "6109"),
            ekart_base_url: env_or("EKART_BASE_URL", "https://api.ekartlogistics.com"),
            ekart_api_key: env_or("EKART_API_KEY", ""),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            pickup_pincode: "110001".to_string(),
            phonepe_salt_key: "dev-salt".to_string(),
            phonepe_salt_index: "1".to_string(),
            razorpay_webhook_secret: "dev-webhook-secret".to_string(),
            cashfree_base_url: "https://sandbox.cashfree.com".to_string(),
            cashfree_client_id: String::new(),
            cashfree_client_secret: String::new(),
            shiprocket_base_url: "https://apiv2.shiprocket.in".to_string(),
            shiprocket_email: String::new(),
            shiprocket_password: String::new(),
            shiprocket_pickup_location: "Primary".to_string(),
            shiprocket_default_hsn: "6109".to_string(),
            ekart_base_url: "https://api.ekartlogistics.com".to_string(),
            ekart_api_key: String::new(),
        }
    }
}

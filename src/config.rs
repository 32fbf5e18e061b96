use std::str::FromStr;
use std::time::Duration;

use crate::domain::order::{FiscalPolicy, IdentifierError, PricingEngine};

// ============================================================================
// Application Configuration
// ============================================================================
//
// Read once at startup from the environment. Every value has a default so the
// binary starts locally with nothing set; gateway credentials are optional and
// only fail the calls that need them.
//
// ============================================================================

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_port: u16,
    /// `None` runs the service on the in-memory store.
    pub scylla: Option<ScyllaConfig>,
    pub pricing: PricingConfig,
    pub numbering: NumberingConfig,
    pub payment: PaymentConfig,
    pub carrier: CarrierConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub nodes: Vec<String>,
    pub keyspace: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub tax_rate_bps: u32,
    pub delivery_charge: u64,
    pub currency: String,
}

impl PricingConfig {
    pub fn engine(&self) -> PricingEngine {
        PricingEngine::new(self.tax_rate_bps, self.delivery_charge)
    }
}

#[derive(Debug, Clone)]
pub struct NumberingConfig {
    pub fiscal_start_month: u32,
    pub utc_offset_minutes: i32,
    pub channel: String,
    pub sequence_retry_attempts: u32,
}

impl NumberingConfig {
    pub fn policy(&self) -> Result<FiscalPolicy, IdentifierError> {
        FiscalPolicy::new(self.fiscal_start_month, self.utc_offset_minutes, self.channel.clone())
    }
}

#[derive(Clone)]
pub struct PaymentConfig {
    pub base_url: String,
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &self.key_secret.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Package dimensions sent with every carrier booking.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelDimensions {
    pub length_cm: f64,
    pub breadth_cm: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl Default for ParcelDimensions {
    fn default() -> Self {
        Self {
            length_cm: 30.0,
            breadth_cm: 25.0,
            height_cm: 5.0,
            weight_kg: 0.5,
        }
    }
}

#[derive(Clone)]
pub struct CarrierConfig {
    pub base_url: String,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Public tracking page; the tracking code is appended.
    pub tracking_url: String,
    pub token_ttl: Duration,
    pub token_margin: Duration,
    pub pickup_location: String,
    pub parcel: ParcelDimensions,
    pub timeout: Duration,
}

impl std::fmt::Debug for CarrierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("tracking_url", &self.tracking_url)
            .field("token_ttl", &self.token_ttl)
            .field("token_margin", &self.token_margin)
            .field("pickup_location", &self.pickup_location)
            .field("parcel", &self.parcel)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// `None` logs confirmations instead of publishing them.
    pub brokers: Option<String>,
    pub topic: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let external_timeout = Duration::from_secs(env_or("EXTERNAL_TIMEOUT_SECS", 15));

        let scylla = env_optional("SCYLLA_NODES").map(|nodes| ScyllaConfig {
            nodes: nodes
                .split(',')
                .map(str::trim)
                .filter(|node| !node.is_empty())
                .map(String::from)
                .collect(),
            keyspace: env_string("SCYLLA_KEYSPACE", "storefront"),
            request_timeout: external_timeout,
        });

        Self {
            http_port: env_or("HTTP_PORT", 8080),
            scylla,
            pricing: PricingConfig {
                tax_rate_bps: env_or("TAX_RATE_BPS", 1800),
                delivery_charge: env_or("DELIVERY_CHARGE", 0),
                currency: env_string("CURRENCY", "INR"),
            },
            numbering: NumberingConfig {
                fiscal_start_month: env_or("FISCAL_START_MONTH", 4),
                utc_offset_minutes: env_or("FISCAL_UTC_OFFSET_MINUTES", 330),
                channel: env_string("ORDER_CODE_CHANNEL", "W"),
                sequence_retry_attempts: env_or("SEQUENCE_RETRY_ATTEMPTS", 3),
            },
            payment: PaymentConfig {
                base_url: env_string("PAYMENT_BASE_URL", "https://api.razorpay.com"),
                key_id: env_optional("PAYMENT_KEY_ID"),
                key_secret: env_optional("PAYMENT_KEY_SECRET"),
                timeout: external_timeout,
            },
            carrier: CarrierConfig {
                base_url: env_string("CARRIER_BASE_URL", "https://apiv2.shiprocket.in"),
                email: env_optional("CARRIER_EMAIL"),
                password: env_optional("CARRIER_PASSWORD"),
                tracking_url: env_string("CARRIER_TRACKING_URL", "https://shiprocket.co/tracking/"),
                token_ttl: Duration::from_secs(env_or("CARRIER_TOKEN_TTL_SECS", 864_000)),
                token_margin: Duration::from_secs(env_or("CARRIER_TOKEN_MARGIN_SECS", 600)),
                pickup_location: env_string("PICKUP_LOCATION", "Primary"),
                parcel: ParcelDimensions {
                    length_cm: env_or("PARCEL_LENGTH_CM", 30.0),
                    breadth_cm: env_or("PARCEL_BREADTH_CM", 25.0),
                    height_cm: env_or("PARCEL_HEIGHT_CM", 5.0),
                    weight_kg: env_or("PARCEL_WEIGHT_KG", 0.5),
                },
                timeout: external_timeout,
            },
            notifications: NotificationConfig {
                brokers: env_optional("REDPANDA_BROKERS"),
                topic: env_string("NOTIFICATION_TOPIC", "order-confirmations"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let payment = PaymentConfig {
            base_url: "http://gateway".to_string(),
            key_id: Some("key_live_1".to_string()),
            key_secret: Some("very-secret".to_string()),
            timeout: Duration::from_secs(1),
        };
        let rendered = format!("{payment:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("very-secret"));
    }

    #[test]
    fn test_unparseable_value_falls_back_to_default() {
        std::env::set_var("STOREFRONT_TEST_BAD_NUMBER", "eighteen");
        assert_eq!(env_or("STOREFRONT_TEST_BAD_NUMBER", 1800u32), 1800);
        std::env::remove_var("STOREFRONT_TEST_BAD_NUMBER");
    }

    #[test]
    fn test_default_policy_is_valid() {
        let numbering = NumberingConfig {
            fiscal_start_month: 4,
            utc_offset_minutes: 330,
            channel: "W".to_string(),
            sequence_retry_attempts: 3,
        };
        assert_eq!(numbering.policy().unwrap().channel(), "W");
    }
}

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Instant;

use crate::config::PaymentConfig;
use crate::metrics::Metrics;

// ============================================================================
// Payment Gateway Adapter
// ============================================================================
//
// Creates payment intents sized to an order total and verifies the signature
// the gateway hands the buyer after checkout. The signature is
// HMAC-SHA256(key_secret, "{intent_id}|{payment_id}") in lowercase hex.
//
// No retries here; the orchestrator owns retry policy.
//
// ============================================================================

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway credentials are not configured")]
    MissingCredentials,

    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
}

/// Gateway-side handle for an authorized-but-unconfirmed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    /// Public key id the checkout widget needs to open the intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an intent for `amount` minor units. `receipt` is the order's
    /// human code and doubles as the idempotency reference.
    async fn create_intent(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Constant-time check of the buyer-supplied signature.
    fn verify_signature(
        &self,
        intent_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, PaymentError>;
}

/// Hex signature the gateway produces for a completed payment.
pub fn sign_payment(intent_id: &str, payment_id: &str, secret: &str) -> Result<String, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::MissingCredentials)?;
    mac.update(format!("{intent_id}|{payment_id}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compare `signature` against the expected HMAC without leaking timing.
pub fn verify_payment_signature(
    intent_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &str,
) -> bool {
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{intent_id}|{payment_id}").as_bytes());
    mac.verify_slice(&provided).is_ok()
}

#[derive(Serialize)]
struct CreateIntentRequest<'a> {
    amount: u64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct CreateIntentResponse {
    id: String,
    amount: u64,
    currency: String,
}

pub struct HttpPaymentGateway {
    client: reqwest::Client,
    config: PaymentConfig,
    metrics: Arc<Metrics>,
}

impl HttpPaymentGateway {
    pub fn new(config: PaymentConfig, metrics: Arc<Metrics>) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::GatewayUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            config,
            metrics,
        })
    }

    fn credentials(&self) -> Result<(&str, &str), PaymentError> {
        match (&self.config.key_id, &self.config.key_secret) {
            (Some(key_id), Some(secret)) => Ok((key_id.as_str(), secret.as_str())),
            _ => Err(PaymentError::MissingCredentials),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_intent(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let (key_id, secret) = self.credentials()?;
        let url = format!("{}/v1/orders", self.config.base_url.trim_end_matches('/'));

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .basic_auth(key_id, Some(secret))
            .json(&CreateIntentRequest {
                amount,
                currency,
                receipt,
            })
            .send()
            .await;
        self.metrics.observe_external("payment", started);

        let response = response.map_err(|e| {
            tracing::warn!(error = %e, receipt = %receipt, "Payment gateway request failed");
            PaymentError::GatewayUnavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), receipt = %receipt, "Payment gateway rejected intent");
            return Err(PaymentError::GatewayUnavailable(format!("gateway returned {status}")));
        }

        let body: CreateIntentResponse = response.json().await.map_err(|e| {
            PaymentError::GatewayUnavailable(format!("malformed intent response: {e}"))
        })?;

        if body.amount != amount {
            return Err(PaymentError::GatewayUnavailable(format!(
                "intent amount {} does not match requested {}",
                body.amount, amount
            )));
        }

        tracing::info!(intent_id = %body.id, receipt = %receipt, amount, "Created payment intent");

        Ok(PaymentIntent {
            id: body.id,
            amount: body.amount,
            currency: body.currency,
            key_id: Some(key_id.to_string()),
        })
    }

    fn verify_signature(
        &self,
        intent_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, PaymentError> {
        let (_, secret) = self.credentials()?;
        Ok(verify_payment_signature(intent_id, payment_id, signature, secret))
    }
}

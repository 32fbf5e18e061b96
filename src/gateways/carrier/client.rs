use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::request::{ShipmentRequest, WireShipmentRequest};
use super::response::{decode_tracking, CreateShipmentResponse, TrackingSnapshot};
use super::token::TokenCache;
use super::{CarrierError, ShippingCarrier};
use crate::config::CarrierConfig;
use crate::domain::order::Shipment;
use crate::metrics::Metrics;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

fn unavailable(error: reqwest::Error) -> CarrierError {
    CarrierError::Unavailable(error.to_string())
}

/// HTTP client for the shipping carrier.
///
/// Owns its token cache; a `401` on any call drops the token that was used
/// and retries once with a fresh one.
pub struct HttpCarrierClient {
    client: reqwest::Client,
    config: CarrierConfig,
    tokens: TokenCache,
    metrics: Arc<Metrics>,
}

impl HttpCarrierClient {
    pub fn new(config: CarrierConfig, metrics: Arc<Metrics>) -> Result<Self, CarrierError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(unavailable)?;

        Ok(Self {
            client,
            tokens: TokenCache::new(config.token_ttl, config.token_margin),
            config,
            metrics,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Cached bearer token, logging in when it is missing or near expiry.
    pub async fn authenticate(&self) -> Result<String, CarrierError> {
        self.tokens.get_or_refresh(|| self.login()).await
    }

    async fn login(&self) -> Result<String, CarrierError> {
        let (Some(email), Some(password)) = (&self.config.email, &self.config.password) else {
            return Err(CarrierError::MissingCredentials);
        };

        let started = Instant::now();
        let response = self
            .client
            .post(self.url("/v1/external/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await;
        self.metrics.observe_external("carrier_auth", started);
        let response = response.map_err(unavailable)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(CarrierError::Unauthorized),
            status if status.is_server_error() => {
                return Err(CarrierError::Unavailable(format!("login returned {status}")))
            }
            status => {
                return Err(CarrierError::Rejected {
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                })
            }
        }

        let login: LoginResponse = response.json().await.map_err(|_| {
            CarrierError::UnrecognizedCarrierResponse("login response had no token".to_string())
        })?;

        self.metrics.carrier_token_refresh.inc();
        tracing::info!("Authenticated with carrier");
        Ok(login.token)
    }

    /// Send an authenticated request, retrying once on `401` with a new token.
    async fn send_authorized<F>(&self, target: &str, build: F) -> Result<Vec<u8>, CarrierError>
    where
        F: Fn(&str) -> reqwest::RequestBuilder,
    {
        let mut refreshed = false;

        loop {
            let token = self.authenticate().await?;

            let started = Instant::now();
            let response = build(&token).bearer_auth(&token).send().await;
            self.metrics.observe_external(target, started);
            let response = response.map_err(unavailable)?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                self.tokens.invalidate(&token).await;
                if refreshed {
                    return Err(CarrierError::Unauthorized);
                }
                tracing::warn!(target = %target, "Carrier token rejected, re-authenticating");
                refreshed = true;
                continue;
            }

            let body = response.bytes().await.map_err(unavailable)?;
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(CarrierError::Unavailable(format!("{target} returned {status}")));
            }
            if !status.is_success() {
                return Err(CarrierError::Rejected {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                });
            }

            return Ok(body.to_vec());
        }
    }
}

#[async_trait]
impl ShippingCarrier for HttpCarrierClient {
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, CarrierError> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(CarrierError::IncompleteShipmentRequest { missing });
        }

        let body = WireShipmentRequest::new(request, &self.config.pickup_location, &self.config.parcel);
        let url = self.url("/v1/external/orders/create/adhoc");

        let raw = self
            .send_authorized("carrier_create", |_| self.client.post(&url).json(&body))
            .await?;

        let shipment = CreateShipmentResponse::decode(&raw)?.into_shipment(&self.config.tracking_url)?;

        tracing::info!(
            order_ref = %request.order_ref,
            tracking_code = %shipment.carrier_tracking_code,
            carrier = %shipment.carrier_name,
            "Carrier accepted shipment"
        );
        Ok(shipment)
    }

    async fn track(&self, tracking_code: &str) -> Result<TrackingSnapshot, CarrierError> {
        let mut url = reqwest::Url::parse(&self.url("/v1/external/courier/track/awb"))
            .map_err(|e| CarrierError::Unavailable(format!("invalid carrier base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CarrierError::Unavailable("carrier base url cannot carry a path".to_string()))?
            .push(tracking_code);

        let raw = self
            .send_authorized("carrier_track", |_| self.client.get(url.clone()))
            .await?;

        decode_tracking(tracking_code, &raw)
    }
}

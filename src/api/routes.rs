use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::identity::CurrentUser;
use crate::domain::order::HumanCode;
use crate::error::CheckoutError;
use crate::metrics::{health_handler, metrics_handler, Metrics};
use crate::services::{CreateOrderRequest, OrderLifecycle, OrderLookup, TrackingService, VerifyPaymentRequest};

/// Shared state handed to every handler.
pub struct AppState {
    pub lifecycle: OrderLifecycle,
    pub tracking: TrackingService,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/orders", web::post().to(create_order))
        .route("/orders/tracking", web::get().to(track_by_code))
        .route("/orders/{id}/verify-payment", web::post().to(verify_payment))
        .route("/orders/{id}/pending", web::delete().to(cancel_pending))
        .route("/orders/{id}/shipment", web::post().to(request_shipment))
        .route("/orders/{id}/tracking", web::get().to(track_by_id))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

/// Register application state and routes on an `App`.
pub fn app_data(state: Arc<AppState>, metrics: Arc<Metrics>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::from(state))
            .app_data(web::Data::new(metrics));
        configure(cfg);
    }
}

fn ok(message: &str, body: serde_json::Value) -> HttpResponse {
    let mut payload = serde_json::json!({ "success": true, "message": message });
    if let (Some(target), serde_json::Value::Object(extra)) = (payload.as_object_mut(), body) {
        target.extend(extra);
    }
    HttpResponse::Ok().json(payload)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, CheckoutError> {
    serde_json::to_value(value).map_err(|e| CheckoutError::GatewayUnavailable(e.to_string()))
}

async fn create_order(
    state: web::Data<AppState>,
    user: CurrentUser,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, CheckoutError> {
    let created = state.lifecycle.create_order(user.id(), request.into_inner()).await?;
    Ok(ok("Order placed", to_json(&created)?))
}

async fn verify_payment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    request: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, CheckoutError> {
    let order = state
        .lifecycle
        .verify_payment(user.id(), path.into_inner(), request.into_inner())
        .await?;
    Ok(ok("Payment verified", serde_json::json!({ "order": to_json(&order)? })))
}

async fn cancel_pending(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CheckoutError> {
    state.lifecycle.cancel_pending(user.id(), path.into_inner()).await?;
    Ok(ok("Pending order cancelled", serde_json::json!({})))
}

async fn request_shipment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CheckoutError> {
    let shipment = state
        .lifecycle
        .request_shipment(&user.caller(), path.into_inner())
        .await?;
    Ok(ok("Shipment booked", serde_json::json!({ "shipment": to_json(&shipment)? })))
}

async fn track_by_id(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CheckoutError> {
    let view = state
        .tracking
        .track(user.id(), OrderLookup::Id(path.into_inner()))
        .await?;
    Ok(ok("Tracking loaded", to_json(&view)?))
}

#[derive(Deserialize)]
struct CodeQuery {
    code: String,
}

async fn track_by_code(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<CodeQuery>,
) -> Result<HttpResponse, CheckoutError> {
    let code = HumanCode::parse(&query.code)
        .ok_or_else(|| CheckoutError::Validation("Unknown order code format".to_string()))?;
    let view = state.tracking.track(user.id(), OrderLookup::Code(code)).await?;
    Ok(ok("Tracking loaded", to_json(&view)?))
}

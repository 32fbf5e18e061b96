use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ParcelDimensions;
use crate::domain::order::{AddressSnapshot, Order, PaymentMethod};

/// Carrier-neutral shipment request built from an order and its address.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRequest {
    /// The order's human code; the carrier's idempotency reference.
    pub order_ref: String,
    pub order_date: DateTime<Utc>,
    pub address: AddressSnapshot,
    pub items: Vec<ShipmentItem>,
    pub payment_method: PaymentMethod,
    pub sub_total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentItem {
    pub name: String,
    pub sku: String,
    pub units: u32,
    pub selling_price: u64,
}

impl ShipmentRequest {
    pub fn from_order(order: &Order, address: &AddressSnapshot) -> Self {
        let items = order
            .line_items
            .iter()
            .map(|item| ShipmentItem {
                name: item.title.clone(),
                sku: match &item.color_variant {
                    Some(color) => format!("{}-{}", item.product_ref, color),
                    None => item.product_ref.clone(),
                },
                units: item.quantity,
                selling_price: item.unit_price,
            })
            .collect();

        Self {
            order_ref: order.human_code.as_str().to_string(),
            order_date: order.created_at,
            address: address.clone(),
            items,
            payment_method: order.payment_method,
            sub_total: order.pricing.total(),
        }
    }

    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let address = &self.address;
        [
            ("customer_name", &address.customer_name),
            ("address", &address.line1),
            ("city", &address.city),
            ("pincode", &address.pincode),
            ("state", &address.state),
            ("country", &address.country),
            ("email", &address.email),
            ("phone", &address.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

fn major_units(minor: u64) -> f64 {
    minor as f64 / 100.0
}

#[derive(Serialize)]
struct WireItem<'a> {
    name: &'a str,
    sku: &'a str,
    units: u32,
    selling_price: f64,
}

/// Body of the carrier's ad-hoc order endpoint.
#[derive(Serialize)]
pub(crate) struct WireShipmentRequest<'a> {
    order_id: &'a str,
    order_date: String,
    pickup_location: &'a str,
    billing_customer_name: &'a str,
    billing_last_name: &'a str,
    billing_address: &'a str,
    billing_address_2: &'a str,
    billing_city: &'a str,
    billing_pincode: &'a str,
    billing_state: &'a str,
    billing_country: &'a str,
    billing_email: &'a str,
    billing_phone: &'a str,
    shipping_is_billing: bool,
    order_items: Vec<WireItem<'a>>,
    payment_method: &'static str,
    sub_total: f64,
    length: f64,
    breadth: f64,
    height: f64,
    weight: f64,
}

impl<'a> WireShipmentRequest<'a> {
    pub(crate) fn new(
        request: &'a ShipmentRequest,
        pickup_location: &'a str,
        parcel: &ParcelDimensions,
    ) -> Self {
        let address = &request.address;
        Self {
            order_id: &request.order_ref,
            order_date: request.order_date.format("%Y-%m-%d %H:%M").to_string(),
            pickup_location,
            billing_customer_name: &address.customer_name,
            billing_last_name: "",
            billing_address: &address.line1,
            billing_address_2: address.line2.as_deref().unwrap_or(""),
            billing_city: &address.city,
            billing_pincode: &address.pincode,
            billing_state: &address.state,
            billing_country: &address.country,
            billing_email: &address.email,
            billing_phone: &address.phone,
            shipping_is_billing: true,
            order_items: request
                .items
                .iter()
                .map(|item| WireItem {
                    name: &item.name,
                    sku: &item.sku,
                    units: item.units,
                    selling_price: major_units(item.selling_price),
                })
                .collect(),
            payment_method: match request.payment_method {
                PaymentMethod::CashOnDelivery => "COD",
                PaymentMethod::Online => "Prepaid",
            },
            sub_total: major_units(request.sub_total),
            length: parcel.length_cm,
            breadth: parcel.breadth_cm,
            height: parcel.height_cm,
            weight: parcel.weight_kg,
        }
    }
}

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CarrierError;
use crate::domain::order::Shipment;

// ============================================================================
// Carrier Response Decoding
// ============================================================================
//
// A successful booking arrives either as a flat object or wrapped in a
// `{ status, data }` envelope. Both are decoded into one explicit union and
// matched exhaustively; anything else is `UnrecognizedCarrierResponse`.
//
// ============================================================================

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}

/// Booking fields shared by both response shapes.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BookedShipment {
    #[serde(deserialize_with = "string_or_number")]
    shipment_id: String,
    #[serde(alias = "awb", alias = "tracking_code", deserialize_with = "string_or_number")]
    awb_code: String,
    #[serde(default, alias = "courier", deserialize_with = "optional_text")]
    courier_name: Option<String>,
    #[serde(default, alias = "shipment_status", deserialize_with = "optional_text")]
    status: Option<String>,
    #[serde(default, alias = "pickup_date", deserialize_with = "optional_text")]
    pickup_scheduled_date: Option<String>,
    #[serde(default, alias = "etd", alias = "edd", deserialize_with = "optional_text")]
    expected_delivery_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreateShipmentResponse {
    Enveloped {
        #[allow(dead_code)]
        status: Value,
        data: BookedShipment,
    },
    Flat(BookedShipment),
}

impl CreateShipmentResponse {
    pub(crate) fn decode(body: &[u8]) -> Result<Self, CarrierError> {
        serde_json::from_slice(body).map_err(|_| {
            CarrierError::UnrecognizedCarrierResponse(
                "booking matched neither the flat nor the enveloped shape".to_string(),
            )
        })
    }

    /// Normalize either shape into the persisted shipment record.
    pub(crate) fn into_shipment(self, tracking_url_base: &str) -> Result<Shipment, CarrierError> {
        let booked = match self {
            CreateShipmentResponse::Enveloped { data, .. } => data,
            CreateShipmentResponse::Flat(booked) => booked,
        };

        let tracking_code = booked.awb_code.trim().to_string();
        if tracking_code.is_empty() {
            return Err(CarrierError::UnrecognizedCarrierResponse(
                "booking carried no tracking code".to_string(),
            ));
        }

        Ok(Shipment {
            tracking_url: format!("{tracking_url_base}{tracking_code}"),
            carrier_tracking_code: tracking_code,
            carrier_name: booked.courier_name.unwrap_or_default(),
            carrier_shipment_id: booked.shipment_id,
            status: booked.status.unwrap_or_else(|| "BOOKED".to_string()),
            pickup_date: booked.pickup_scheduled_date,
            delivery_estimate: booked.expected_delivery_date,
        })
    }
}

// ============================================================================
// Tracking
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingActivity {
    pub date: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
}

/// Live status of a shipment as reported by the carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSnapshot {
    pub tracking_code: String,
    pub current_status: String,
    pub estimated_delivery: Option<String>,
    pub tracking_url: Option<String>,
    pub activities: Vec<TrackingActivity>,
}

#[derive(Deserialize)]
struct TrackEntry {
    #[serde(default, deserialize_with = "optional_text")]
    current_status: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    edd: Option<String>,
}

#[derive(Deserialize)]
struct ActivityEntry {
    #[serde(default, deserialize_with = "optional_text")]
    date: Option<String>,
    #[serde(default, alias = "status", deserialize_with = "optional_text")]
    activity: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    location: Option<String>,
}

#[derive(Deserialize)]
struct TrackingData {
    #[serde(default)]
    shipment_track: Option<Vec<TrackEntry>>,
    #[serde(default)]
    shipment_track_activities: Option<Vec<ActivityEntry>>,
    #[serde(default, deserialize_with = "optional_text")]
    track_url: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    etd: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    error: Option<String>,
}

#[derive(Deserialize)]
struct TrackResponse {
    tracking_data: TrackingData,
}

pub(crate) fn decode_tracking(tracking_code: &str, body: &[u8]) -> Result<TrackingSnapshot, CarrierError> {
    let response: TrackResponse = serde_json::from_slice(body).map_err(|_| {
        CarrierError::UnrecognizedCarrierResponse("tracking response had no tracking_data".to_string())
    })?;
    let data = response.tracking_data;

    if let Some(error) = data.error {
        return Err(CarrierError::TrackingUnavailable(error));
    }

    let latest = data.shipment_track.and_then(|entries| entries.into_iter().next());
    let (current_status, edd) = match latest {
        Some(entry) => (entry.current_status, entry.edd),
        None => (None, None),
    };

    let activities = data
        .shipment_track_activities
        .unwrap_or_default()
        .into_iter()
        .map(|entry| TrackingActivity {
            date: entry.date,
            status: entry.activity,
            location: entry.location,
        })
        .collect::<Vec<_>>();

    let current_status = current_status
        .or_else(|| activities.first().and_then(|activity| activity.status.clone()))
        .ok_or_else(|| CarrierError::TrackingUnavailable("no tracking status yet".to_string()))?;

    Ok(TrackingSnapshot {
        tracking_code: tracking_code.to_string(),
        current_status,
        estimated_delivery: edd.or(data.etd),
        tracking_url: data.track_url,
        activities,
    })
}

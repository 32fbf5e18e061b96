use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::order::{IdentifierError, OrderError, PricingError};
use crate::gateways::{CarrierError, CollaboratorError, PaymentError};
use crate::store::RepositoryError;

// ============================================================================
// Checkout Error Taxonomy
// ============================================================================
//
// Every component error collapses into one of these at the service boundary.
// `Display` carries internal detail for logs; `user_message` is the only text
// a caller ever sees.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Caller is not authenticated")]
    Unauthenticated,

    #[error("Caller does not own this order")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Payment signature mismatch")]
    SignatureMismatch,

    #[error("Carrier error: {0}")]
    Carrier(String),

    #[error("Order sequence conflict: {0}")]
    SequenceConflict(String),

    #[error("State precondition failed: {0}")]
    StatePrecondition(String),
}

impl CheckoutError {
    /// Caller-facing message. Never includes identifiers or upstream detail.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Validation(message) | CheckoutError::StatePrecondition(message) => {
                message.clone()
            }
            CheckoutError::Unauthenticated => "Please sign in to continue".to_string(),
            CheckoutError::Unauthorized => "You do not have access to this order".to_string(),
            CheckoutError::NotFound(what) => format!("{what} not found"),
            CheckoutError::GatewayUnavailable(_) => {
                "The service is temporarily unavailable, please try again".to_string()
            }
            CheckoutError::SignatureMismatch => {
                "Payment could not be verified, please start checkout again".to_string()
            }
            CheckoutError::Carrier(_) => {
                "Our shipping partner could not process the request".to_string()
            }
            CheckoutError::SequenceConflict(_) => {
                "The order could not be placed right now, please try again".to_string()
            }
        }
    }
}

impl ResponseError for CheckoutError {
    fn status_code(&self) -> StatusCode {
        match self {
            CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckoutError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CheckoutError::Unauthorized => StatusCode::FORBIDDEN,
            CheckoutError::NotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CheckoutError::SignatureMismatch => StatusCode::PAYMENT_REQUIRED,
            CheckoutError::Carrier(_) => StatusCode::BAD_GATEWAY,
            CheckoutError::SequenceConflict(_) => StatusCode::SERVICE_UNAVAILABLE,
            CheckoutError::StatePrecondition(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "success": false,
            "message": self.user_message(),
        }))
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<OrderError> for CheckoutError {
    fn from(error: OrderError) -> Self {
        match error {
            OrderError::EmptyItems | OrderError::InvalidQuantity(_) => {
                CheckoutError::Validation(error.to_string())
            }
            OrderError::AlreadyPaid => CheckoutError::StatePrecondition("Order is already paid".to_string()),
            OrderError::NotCancellable(_) => {
                CheckoutError::StatePrecondition("Only unpaid orders can be cancelled".to_string())
            }
            OrderError::NotPaid(_) => {
                CheckoutError::StatePrecondition("Order must be paid before it can ship".to_string())
            }
            OrderError::NotAwaitingPayment(_) | OrderError::InvalidStatusTransition { .. } => {
                CheckoutError::StatePrecondition(
                    "This action is not allowed for the order's current state".to_string(),
                )
            }
            OrderError::NotInitialized => CheckoutError::GatewayUnavailable(error.to_string()),
        }
    }
}

impl From<PricingError> for CheckoutError {
    fn from(error: PricingError) -> Self {
        match error {
            PricingError::Overflow => CheckoutError::Validation("Order amount is too large".to_string()),
            other => CheckoutError::Validation(other.to_string()),
        }
    }
}

impl From<RepositoryError> for CheckoutError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => CheckoutError::NotFound("Order"),
            RepositoryError::PreconditionFailed { .. } => CheckoutError::StatePrecondition(
                "The order changed while this request was processed".to_string(),
            ),
            RepositoryError::DuplicateCode(_) | RepositoryError::SequenceConflict(_) => {
                CheckoutError::SequenceConflict(error.to_string())
            }
            RepositoryError::Corrupt(_) | RepositoryError::Backend(_) => {
                CheckoutError::GatewayUnavailable(error.to_string())
            }
        }
    }
}

impl From<IdentifierError> for CheckoutError {
    fn from(error: IdentifierError) -> Self {
        match error {
            IdentifierError::SequenceConflict | IdentifierError::SequenceExhausted { .. } => {
                CheckoutError::SequenceConflict(error.to_string())
            }
            IdentifierError::InvalidPolicy(_) => CheckoutError::GatewayUnavailable(error.to_string()),
        }
    }
}

impl From<PaymentError> for CheckoutError {
    fn from(error: PaymentError) -> Self {
        CheckoutError::GatewayUnavailable(error.to_string())
    }
}

impl From<CarrierError> for CheckoutError {
    fn from(error: CarrierError) -> Self {
        match error {
            CarrierError::IncompleteShipmentRequest { ref missing } => CheckoutError::Validation(format!(
                "Delivery address is incomplete: {}",
                missing.join(", ")
            )),
            other => CheckoutError::Carrier(other.to_string()),
        }
    }
}

impl From<CollaboratorError> for CheckoutError {
    fn from(error: CollaboratorError) -> Self {
        match error {
            CollaboratorError::NotFound(_) => CheckoutError::NotFound("Resource"),
            CollaboratorError::Unavailable { .. } => CheckoutError::GatewayUnavailable(error.to_string()),
        }
    }
}

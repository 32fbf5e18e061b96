pub mod carrier;
pub mod collaborators;
pub mod local;
pub mod payment;

pub use carrier::{
    CarrierError, HttpCarrierClient, ShipmentItem, ShipmentRequest, ShippingCarrier, TrackingActivity,
    TrackingSnapshot,
};
pub use collaborators::{
    AddressBook, CartStore, Catalog, CollaboratorError, NotificationSender, OrderSummary, Promotions,
};
pub use local::{
    InMemoryAddressBook, InMemoryCartStore, InMemoryCatalog, InMemoryNotificationSender,
    InMemoryPromotions,
};
pub use payment::{
    sign_payment, verify_payment_signature, HttpPaymentGateway, PaymentError, PaymentGateway,
    PaymentIntent,
};

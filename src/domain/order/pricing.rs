use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::errors::PricingError;
use super::value_objects::{CartLine, LineItem};

// ============================================================================
// Pricing Engine
// ============================================================================
//
// Pure and synchronous. Catalog prices are resolved by the caller beforehand;
// the engine never trusts a total supplied from outside.
//
// ============================================================================

const BPS_DENOMINATOR: u64 = 10_000;

/// Authoritative catalog price for a product, in minor currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPrice {
    pub title: String,
    pub offer_price: u64,
    pub list_price: u64,
}

/// Monetary breakdown of an order.
///
/// The total is always derived; deserialization rejects records whose total
/// disagrees with the breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PricingRecord")]
pub struct Pricing {
    subtotal: u64,
    tax_amount: u64,
    delivery_charge: u64,
    discount: u64,
    total: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricingRecord {
    subtotal: u64,
    tax_amount: u64,
    delivery_charge: u64,
    discount: u64,
    total: u64,
}

impl TryFrom<PricingRecord> for Pricing {
    type Error = PricingError;

    fn try_from(record: PricingRecord) -> Result<Self, Self::Error> {
        let pricing = Pricing::compose(
            record.subtotal,
            record.tax_amount,
            record.delivery_charge,
            record.discount,
        )?;
        if pricing.total != record.total {
            return Err(PricingError::TotalMismatch {
                expected: pricing.total,
                supplied: record.total,
            });
        }
        Ok(pricing)
    }
}

impl Pricing {
    fn compose(
        subtotal: u64,
        tax_amount: u64,
        delivery_charge: u64,
        discount: u64,
    ) -> Result<Self, PricingError> {
        let limit = subtotal.checked_add(tax_amount).ok_or(PricingError::Overflow)?;
        if discount > limit {
            return Err(PricingError::DiscountTooLarge { discount, limit });
        }
        let total = (limit - discount)
            .checked_add(delivery_charge)
            .ok_or(PricingError::Overflow)?;

        Ok(Self {
            subtotal,
            tax_amount,
            delivery_charge,
            discount,
            total,
        })
    }

    /// Rebuild a breakdown for records written before the breakdown was stored.
    /// Only the amount charged was kept, tax-inclusive, with no delivery charge
    /// or discount.
    pub fn reconstruct_from_amount(amount: u64, tax_rate_bps: u32) -> Self {
        let denominator = BPS_DENOMINATOR + u64::from(tax_rate_bps);
        let subtotal = ((u128::from(amount) * u128::from(BPS_DENOMINATOR)
            + u128::from(denominator) / 2)
            / u128::from(denominator)) as u64;

        Self {
            subtotal,
            tax_amount: amount - subtotal,
            delivery_charge: 0,
            discount: 0,
            total: amount,
        }
    }

    pub fn subtotal(&self) -> u64 {
        self.subtotal
    }

    pub fn tax_amount(&self) -> u64 {
        self.tax_amount
    }

    pub fn delivery_charge(&self) -> u64 {
        self.delivery_charge
    }

    pub fn discount(&self) -> u64 {
        self.discount
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Line items and pricing computed for a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub items: Vec<LineItem>,
    pub pricing: Pricing,
}

#[derive(Debug, Clone, Copy)]
pub struct PricingEngine {
    tax_rate_bps: u32,
    delivery_charge: u64,
}

impl PricingEngine {
    pub fn new(tax_rate_bps: u32, delivery_charge: u64) -> Self {
        Self {
            tax_rate_bps,
            delivery_charge,
        }
    }

    pub fn tax_rate_bps(&self) -> u32 {
        self.tax_rate_bps
    }

    /// Price the cart against resolved catalog prices.
    ///
    /// `discount` comes from the promotion collaborator and must not exceed
    /// subtotal plus tax.
    pub fn price(
        &self,
        cart: &[CartLine],
        prices: &HashMap<String, CatalogPrice>,
        discount: u64,
    ) -> Result<PricedCart, PricingError> {
        if cart.is_empty() {
            return Err(PricingError::EmptyCart);
        }

        let mut items = Vec::with_capacity(cart.len());
        let mut subtotal: u64 = 0;

        for line in cart {
            if line.quantity == 0 {
                return Err(PricingError::InvalidQuantity(line.product_ref.clone()));
            }
            let price = prices
                .get(&line.product_ref)
                .ok_or_else(|| PricingError::InvalidLineItem(line.product_ref.clone()))?;

            let line_total = price
                .offer_price
                .checked_mul(u64::from(line.quantity))
                .ok_or(PricingError::Overflow)?;
            subtotal = subtotal.checked_add(line_total).ok_or(PricingError::Overflow)?;

            items.push(LineItem {
                product_ref: line.product_ref.clone(),
                quantity: line.quantity,
                color_variant: line.color_variant.clone(),
                title: price.title.clone(),
                unit_price: price.offer_price,
            });
        }

        let tax_amount = subtotal
            .checked_mul(u64::from(self.tax_rate_bps))
            .ok_or(PricingError::Overflow)?
            / BPS_DENOMINATOR;

        let pricing = Pricing::compose(subtotal, tax_amount, self.delivery_charge, discount)?;

        Ok(PricedCart { items, pricing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(entries: &[(&str, u64)]) -> HashMap<String, CatalogPrice> {
        entries
            .iter()
            .map(|(product, price)| {
                (
                    product.to_string(),
                    CatalogPrice {
                        title: format!("Product {product}"),
                        offer_price: *price,
                        list_price: price + 100,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_single_line_scenario() {
        let engine = PricingEngine::new(1800, 0);
        let priced = engine
            .price(&[CartLine::new("P1", 1)], &catalog(&[("P1", 999)]), 0)
            .unwrap();

        assert_eq!(priced.pricing.subtotal(), 999);
        assert_eq!(priced.pricing.tax_amount(), 179);
        assert_eq!(priced.pricing.delivery_charge(), 0);
        assert_eq!(priced.pricing.discount(), 0);
        assert_eq!(priced.pricing.total(), 1178);
        assert_eq!(priced.items[0].title, "Product P1");
    }

    #[test]
    fn test_total_identity_holds_with_delivery_and_discount() {
        let engine = PricingEngine::new(1800, 4900);
        let cart = vec![CartLine::new("P1", 2), CartLine::new("P2", 3).with_color("red")];
        let priced = engine
            .price(&cart, &catalog(&[("P1", 1299), ("P2", 450)]), 500)
            .unwrap();
        let p = priced.pricing;

        assert_eq!(p.subtotal(), 2 * 1299 + 3 * 450);
        assert_eq!(p.tax_amount(), p.subtotal() * 18 / 100);
        assert_eq!(
            p.total(),
            p.subtotal() + p.tax_amount() + p.delivery_charge() - p.discount()
        );
        assert_eq!(priced.items[1].color_variant.as_deref(), Some("red"));
    }

    #[test]
    fn test_unknown_product_is_rejected() {
        let engine = PricingEngine::new(1800, 0);
        let result = engine.price(&[CartLine::new("GHOST", 1)], &catalog(&[("P1", 10)]), 0);

        assert!(matches!(result, Err(PricingError::InvalidLineItem(ref p)) if p == "GHOST"));
    }

    #[test]
    fn test_empty_cart_and_zero_quantity_rejected() {
        let engine = PricingEngine::new(1800, 0);
        assert!(matches!(
            engine.price(&[], &catalog(&[]), 0),
            Err(PricingError::EmptyCart)
        ));
        assert!(matches!(
            engine.price(&[CartLine::new("P1", 0)], &catalog(&[("P1", 10)]), 0),
            Err(PricingError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_discount_cannot_exceed_subtotal_plus_tax() {
        let engine = PricingEngine::new(1800, 0);
        let result = engine.price(&[CartLine::new("P1", 1)], &catalog(&[("P1", 100)]), 119);

        assert!(matches!(
            result,
            Err(PricingError::DiscountTooLarge { discount: 119, limit: 118 })
        ));
    }

    #[test]
    fn test_deserialization_rejects_tampered_total() {
        let json = r#"{"subtotal":999,"taxAmount":179,"deliveryCharge":0,"discount":0,"total":1}"#;
        assert!(serde_json::from_str::<Pricing>(json).is_err());

        let json = r#"{"subtotal":999,"taxAmount":179,"deliveryCharge":0,"discount":0,"total":1178}"#;
        let pricing: Pricing = serde_json::from_str(json).unwrap();
        assert_eq!(pricing.total(), 1178);
    }

    #[test]
    fn test_legacy_reconstruction() {
        let pricing = Pricing::reconstruct_from_amount(1178, 1800);

        assert_eq!(pricing.subtotal(), 998);
        assert_eq!(pricing.tax_amount(), 180);
        assert_eq!(pricing.total(), 1178);
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::catalogue::{ProductCatalogue, ProductCode};
use crate::errors::DomainError;

/// A promotional discount evaluated against the basket's current items.
pub trait Offer: Send + Sync {
    /// Label used in conflict reports and pricing traces.
    fn describe(&self) -> String;

    fn calculate_discount(
        &self,
        items: &[ProductCode],
        catalogue: &ProductCatalogue,
    ) -> Result<Decimal, DomainError>;

    /// Product code this offer claims exclusively, if any. Two offers
    /// claiming the same code cannot coexist in one basket.
    fn claimed_code(&self) -> Option<&ProductCode> {
        None
    }

    fn conflicts_with(&self, other: &dyn Offer) -> bool {
        match (self.claimed_code(), other.claimed_code()) {
            (Some(own), Some(theirs)) => own == theirs,
            _ => false,
        }
    }
}

/// Discounts every second unit of one product code by a fixed percentage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDiscountOffer {
    product_code: ProductCode,
    discount_percentage: Decimal,
}

impl PairDiscountOffer {
    pub fn new(
        product_code: impl Into<String>,
        discount_percentage: Decimal,
    ) -> Result<Self, DomainError> {
        let product_code = ProductCode::new(product_code)?;
        if discount_percentage < Decimal::ZERO || discount_percentage > Decimal::ONE {
            return Err(DomainError::DiscountPercentageOutOfRange(discount_percentage));
        }
        Ok(Self { product_code, discount_percentage })
    }

    pub fn product_code(&self) -> &ProductCode {
        &self.product_code
    }

    pub fn discount_percentage(&self) -> Decimal {
        self.discount_percentage
    }
}

/// Buy one red widget, get the second half price.
impl Default for PairDiscountOffer {
    fn default() -> Self {
        Self {
            product_code: ProductCode("R01".to_owned()),
            discount_percentage: Decimal::new(50, 2),
        }
    }
}

impl Offer for PairDiscountOffer {
    fn describe(&self) -> String {
        let percent = (self.discount_percentage * Decimal::ONE_HUNDRED).normalize();
        format!("PairDiscountOffer({percent}%)")
    }

    fn calculate_discount(
        &self,
        items: &[ProductCode],
        catalogue: &ProductCatalogue,
    ) -> Result<Decimal, DomainError> {
        let count = items.iter().filter(|code| **code == self.product_code).count();
        let pairs = count / 2;
        if pairs == 0 {
            return Ok(Decimal::ZERO);
        }
        let Some(price) = catalogue.lookup(self.product_code.as_str()) else {
            return Ok(Decimal::ZERO);
        };
        let discount = Decimal::from(pairs as u64) * price * self.discount_percentage;
        Ok(discount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    fn claimed_code(&self) -> Option<&ProductCode> {
        Some(&self.product_code)
    }
}

/// Fails when more than one offer claims the same product code. Runs over
/// the whole candidate list, independent of any basket.
pub fn validate_offer_collection(offers: &[Arc<dyn Offer>]) -> Result<(), DomainError> {
    let mut claims: BTreeMap<ProductCode, Vec<String>> = BTreeMap::new();
    for offer in offers {
        if let Some(code) = offer.claimed_code() {
            claims.entry(code.clone()).or_default().push(offer.describe());
        }
    }

    for (code, descriptions) in claims {
        if descriptions.len() > 1 {
            return Err(DomainError::ConflictingOffers {
                code,
                offers: descriptions.join(" and "),
            });
        }
    }

    Ok(())
}

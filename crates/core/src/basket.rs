use std::cell::RefCell;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::catalogue::{ProductCatalogue, ProductCode};
use crate::delivery::{DeliveryChargeRules, DeliveryPolicy};
use crate::errors::DomainError;
use crate::offers::{validate_offer_collection, Offer, PairDiscountOffer};
use crate::pricing::{price_items, PricingBreakdown};

/// A shopping basket bound to immutable, shareable collaborators. Owns its
/// item list; memoizes the last successful breakdown until the next
/// mutation.
pub struct Basket {
    catalogue: Arc<ProductCatalogue>,
    delivery: Option<Arc<dyn DeliveryPolicy>>,
    offers: Vec<Arc<dyn Offer>>,
    items: Vec<ProductCode>,
    memo: RefCell<Option<PricingBreakdown>>,
}

impl Basket {
    /// Offer conflicts are rejected here, not at pricing time.
    pub fn new(
        catalogue: Arc<ProductCatalogue>,
        delivery: Option<Arc<dyn DeliveryPolicy>>,
        offers: Vec<Arc<dyn Offer>>,
    ) -> Result<Self, DomainError> {
        validate_offer_collection(&offers)?;
        Ok(Self { catalogue, delivery, offers, items: Vec::new(), memo: RefCell::new(None) })
    }

    /// Basket wired with the standard widget catalogue, tiered delivery
    /// charges, and the red-widget pair offer.
    pub fn standard() -> Self {
        Self {
            catalogue: Arc::new(ProductCatalogue::default()),
            delivery: Some(Arc::new(DeliveryChargeRules::default())),
            offers: vec![Arc::new(PairDiscountOffer::default())],
            items: Vec::new(),
            memo: RefCell::new(None),
        }
    }

    pub fn add(&mut self, code: &str) -> Result<(), DomainError> {
        let code = ProductCode::new(code)?;
        if !self.catalogue.contains(code.as_str()) {
            return Err(DomainError::UnknownProductCode(code));
        }
        self.items.push(code);
        *self.memo.get_mut() = None;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        *self.memo.get_mut() = None;
    }

    pub fn items(&self) -> &[ProductCode] {
        &self.items
    }

    pub fn total(&self) -> Result<Decimal, DomainError> {
        Ok(self.breakdown()?.total)
    }

    /// Only successful breakdowns are memoized; errors recompute.
    pub fn breakdown(&self) -> Result<PricingBreakdown, DomainError> {
        if let Some(memoized) = self.memo.borrow().as_ref() {
            return Ok(memoized.clone());
        }

        let breakdown =
            price_items(&self.items, &self.catalogue, self.delivery.as_deref(), &self.offers)?;
        self.memo.replace(Some(breakdown.clone()));
        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::Basket;
    use crate::catalogue::{ProductCatalogue, ProductCode};
    use crate::delivery::DeliveryChargeRules;
    use crate::errors::DomainError;
    use crate::offers::{Offer, PairDiscountOffer};

    fn total_of(codes: &[&str]) -> Decimal {
        let mut basket = Basket::standard();
        for code in codes {
            basket.add(code).expect("catalogue code");
        }
        basket.total().expect("total computes")
    }

    #[test]
    fn prices_green_and_blue_widgets_with_small_order_delivery() {
        assert_eq!(total_of(&["B01", "G01"]), Decimal::new(3785, 2));
    }

    #[test]
    fn prices_a_red_pair_with_discount_below_free_delivery() {
        // 65.90 - 16.48 = 49.42, which stays in the 4.95 delivery band.
        assert_eq!(total_of(&["R01", "R01"]), Decimal::new(5437, 2));
    }

    #[test]
    fn prices_mixed_red_green_into_mid_delivery_band() {
        assert_eq!(total_of(&["R01", "G01"]), Decimal::new(6085, 2));
    }

    #[test]
    fn large_mixed_basket_earns_free_delivery_after_discount() {
        assert_eq!(total_of(&["B01", "B01", "R01", "R01", "R01"]), Decimal::new(9827, 2));
    }

    #[test]
    fn empty_basket_totals_zero() {
        let basket = Basket::standard();
        assert_eq!(basket.total().expect("total computes"), Decimal::ZERO);
        assert!(basket.items().is_empty());
    }

    #[test]
    fn add_appends_in_order_and_rejects_unknown_codes() {
        let mut basket = Basket::standard();
        basket.add("R01").expect("known code");
        basket.add("B01").expect("known code");
        let codes: Vec<&str> = basket.items().iter().map(ProductCode::as_str).collect();
        assert_eq!(codes, vec!["R01", "B01"]);

        let unknown = basket.add("X99").expect_err("unknown code should fail");
        assert_eq!(unknown, DomainError::UnknownProductCode(ProductCode("X99".to_owned())));
        assert_eq!(basket.items().len(), 2);

        let blank = basket.add("   ").expect_err("blank code should fail");
        assert_eq!(blank, DomainError::EmptyProductCode);
    }

    #[test]
    fn total_is_idempotent_between_mutations() {
        let mut basket = Basket::standard();
        basket.add("R01").expect("known code");
        basket.add("R01").expect("known code");
        let first = basket.total().expect("total computes");
        let second = basket.total().expect("total computes");
        assert_eq!(first, second);
    }

    #[test]
    fn memoized_total_is_recomputed_after_add_and_clear() {
        let mut basket = Basket::standard();
        basket.add("B01").expect("known code");
        assert_eq!(basket.total().expect("total"), Decimal::new(1290, 2));

        basket.add("G01").expect("known code");
        assert_eq!(basket.total().expect("total"), Decimal::new(3785, 2));

        basket.clear();
        assert_eq!(basket.total().expect("total"), Decimal::ZERO);
        assert!(basket.items().is_empty());
    }

    #[test]
    fn clear_and_readd_round_trips_to_the_same_total() {
        let mut basket = Basket::standard();
        for code in ["B01", "B01", "R01", "R01", "R01"] {
            basket.add(code).expect("known code");
        }
        let original = basket.total().expect("total computes");

        basket.clear();
        for code in ["B01", "B01", "R01", "R01", "R01"] {
            basket.add(code).expect("known code");
        }
        assert_eq!(basket.total().expect("total computes"), original);
    }

    #[test]
    fn construction_rejects_conflicting_pair_offers() {
        let offers: Vec<Arc<dyn Offer>> = vec![
            Arc::new(PairDiscountOffer::new("R01", Decimal::new(50, 2)).expect("valid")),
            Arc::new(PairDiscountOffer::new("R01", Decimal::new(70, 2)).expect("valid")),
        ];
        let error = Basket::new(
            Arc::new(ProductCatalogue::default()),
            Some(Arc::new(DeliveryChargeRules::default())),
            offers,
        )
        .expect_err("conflicting offers should fail at construction");
        assert!(matches!(error, DomainError::ConflictingOffers { .. }));
    }

    #[test]
    fn basket_without_delivery_policy_charges_no_delivery() {
        let mut basket = Basket::new(
            Arc::new(ProductCatalogue::default()),
            None,
            vec![Arc::new(PairDiscountOffer::default())],
        )
        .expect("valid basket");
        basket.add("B01").expect("known code");
        assert_eq!(basket.total().expect("total"), Decimal::new(795, 2));
    }

    #[test]
    fn custom_catalogue_without_offers_prices_plainly() {
        let catalogue = ProductCatalogue::new([
            ("A01", Decimal::new(1000, 2)),
            ("B02", Decimal::new(2000, 2)),
        ])
        .expect("valid catalogue");
        let mut basket = Basket::new(
            Arc::new(catalogue),
            Some(Arc::new(DeliveryChargeRules::default())),
            Vec::new(),
        )
        .expect("valid basket");
        basket.add("A01").expect("known code");
        basket.add("B02").expect("known code");
        // 30.00 subtotal is below 50, so delivery is 4.95.
        assert_eq!(basket.total().expect("total"), Decimal::new(3495, 2));
    }

    #[test]
    fn collaborators_are_shareable_across_baskets() {
        let catalogue = Arc::new(ProductCatalogue::default());
        let rules: Arc<DeliveryChargeRules> = Arc::new(DeliveryChargeRules::default());
        let offer: Arc<dyn Offer> = Arc::new(PairDiscountOffer::default());

        let mut first =
            Basket::new(catalogue.clone(), Some(rules.clone()), vec![offer.clone()])
                .expect("valid basket");
        let mut second =
            Basket::new(catalogue, Some(rules), vec![offer]).expect("valid basket");

        first.add("R01").expect("known code");
        second.add("R01").expect("known code");
        second.add("R01").expect("known code");

        assert_eq!(first.total().expect("total"), Decimal::new(3790, 2));
        assert_eq!(second.total().expect("total"), Decimal::new(5437, 2));
    }
}

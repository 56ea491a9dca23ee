use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::catalogue::{ProductCatalogue, ProductCode};
use crate::delivery::DeliveryPolicy;
use crate::errors::DomainError;
use crate::offers::Offer;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub steps: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub delivery_cost: Decimal,
    pub total: Decimal,
    pub trace: PricingTrace,
}

/// Prices an item sequence: subtotal, aggregated offer discounts, delivery
/// cost looked up against the post-discount amount, final total rounded to
/// two decimals (midpoint away from zero).
pub fn price_items(
    items: &[ProductCode],
    catalogue: &ProductCatalogue,
    delivery: Option<&dyn DeliveryPolicy>,
    offers: &[Arc<dyn Offer>],
) -> Result<PricingBreakdown, DomainError> {
    let mut steps = Vec::new();

    let mut subtotal = Decimal::ZERO;
    for code in items {
        subtotal += catalogue
            .lookup(code.as_str())
            .ok_or_else(|| DomainError::UnknownProductCode(code.clone()))?;
    }
    steps.push(PricingTraceStep {
        stage: "subtotal".to_string(),
        detail: format!("{} item(s)", items.len()),
        amount: subtotal,
    });

    let mut discount_total = Decimal::ZERO;
    for offer in offers {
        let discount = offer.calculate_discount(items, catalogue)?;
        if !discount.is_zero() {
            steps.push(PricingTraceStep {
                stage: "discount".to_string(),
                detail: offer.describe(),
                amount: discount,
            });
        }
        discount_total += discount;
    }
    if discount_total < Decimal::ZERO {
        return Err(DomainError::NegativeDiscount(discount_total));
    }

    let delivery_cost = if items.is_empty() {
        Decimal::ZERO
    } else {
        match delivery {
            Some(policy) => policy.calculate_cost(subtotal - discount_total)?,
            None => Decimal::ZERO,
        }
    };
    steps.push(PricingTraceStep {
        stage: "delivery".to_string(),
        detail: "tier for post-discount amount".to_string(),
        amount: delivery_cost,
    });

    let total = (subtotal - discount_total + delivery_cost)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    steps.push(PricingTraceStep {
        stage: "total".to_string(),
        detail: "subtotal - discounts + delivery".to_string(),
        amount: total,
    });

    Ok(PricingBreakdown {
        subtotal,
        discount_total,
        delivery_cost,
        total,
        trace: PricingTrace { steps },
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::price_items;
    use crate::catalogue::{ProductCatalogue, ProductCode};
    use crate::delivery::{DeliveryChargeRules, DeliveryPolicy};
    use crate::errors::DomainError;
    use crate::offers::{Offer, PairDiscountOffer};

    struct FixedCredit(Decimal);

    impl Offer for FixedCredit {
        fn describe(&self) -> String {
            "FixedCredit".to_owned()
        }

        fn calculate_discount(
            &self,
            _items: &[ProductCode],
            _catalogue: &ProductCatalogue,
        ) -> Result<Decimal, DomainError> {
            Ok(self.0)
        }
    }

    fn items(codes: &[&str]) -> Vec<ProductCode> {
        codes.iter().map(|code| ProductCode((*code).to_owned())).collect()
    }

    fn default_offers() -> Vec<Arc<dyn Offer>> {
        vec![Arc::new(PairDiscountOffer::default())]
    }

    #[test]
    fn empty_items_price_to_zero_with_no_delivery() {
        let catalogue = ProductCatalogue::default();
        let rules = DeliveryChargeRules::default();
        let breakdown = price_items(&[], &catalogue, Some(&rules), &default_offers())
            .expect("empty basket prices");
        assert_eq!(breakdown.subtotal, Decimal::ZERO);
        assert_eq!(breakdown.delivery_cost, Decimal::ZERO);
        assert_eq!(breakdown.total, Decimal::ZERO);
    }

    #[test]
    fn absent_delivery_policy_means_zero_delivery_cost() {
        let catalogue = ProductCatalogue::default();
        let breakdown = price_items(&items(&["B01"]), &catalogue, None, &default_offers())
            .expect("prices without delivery policy");
        assert_eq!(breakdown.delivery_cost, Decimal::ZERO);
        assert_eq!(breakdown.total, Decimal::new(795, 2));
    }

    #[test]
    fn negative_aggregate_discount_fails() {
        let catalogue = ProductCatalogue::default();
        let rules = DeliveryChargeRules::default();
        let offers: Vec<Arc<dyn Offer>> =
            vec![Arc::new(FixedCredit(Decimal::new(-100, 2)))];
        let error = price_items(&items(&["B01"]), &catalogue, Some(&rules), &offers)
            .expect_err("negative discount must fail");
        assert_eq!(error, DomainError::NegativeDiscount(Decimal::new(-100, 2)));
    }

    #[test]
    fn opposing_offers_cancel_without_failing() {
        let catalogue = ProductCatalogue::default();
        let rules = DeliveryChargeRules::default();
        let offers: Vec<Arc<dyn Offer>> = vec![
            Arc::new(FixedCredit(Decimal::new(-100, 2))),
            Arc::new(FixedCredit(Decimal::new(100, 2))),
        ];
        let breakdown = price_items(&items(&["B01"]), &catalogue, Some(&rules), &offers)
            .expect("zero aggregate discount is fine");
        assert_eq!(breakdown.discount_total, Decimal::ZERO);
    }

    #[test]
    fn discount_larger_than_subtotal_fails_in_delivery_lookup() {
        let catalogue = ProductCatalogue::default();
        let rules = DeliveryChargeRules::default();
        let offers: Vec<Arc<dyn Offer>> =
            vec![Arc::new(FixedCredit(Decimal::new(100_000, 2)))];
        let error = price_items(&items(&["B01"]), &catalogue, Some(&rules), &offers)
            .expect_err("post-discount amount went negative");
        assert!(matches!(error, DomainError::NegativeOrderTotal(_)));
    }

    #[test]
    fn trace_records_every_stage() {
        let catalogue = ProductCatalogue::default();
        let rules = DeliveryChargeRules::default();
        let breakdown = price_items(
            &items(&["R01", "R01"]),
            &catalogue,
            Some(&rules),
            &default_offers(),
        )
        .expect("prices");

        let stages: Vec<&str> =
            breakdown.trace.steps.iter().map(|step| step.stage.as_str()).collect();
        assert_eq!(stages, vec!["subtotal", "discount", "delivery", "total"]);
        assert_eq!(breakdown.trace.steps[1].detail, "PairDiscountOffer(50%)");
        assert_eq!(breakdown.trace.steps[1].amount, Decimal::new(1648, 2));
    }

    #[test]
    fn breakdown_serializes_with_string_decimals() {
        let catalogue = ProductCatalogue::default();
        let rules = DeliveryChargeRules::default();
        let breakdown =
            price_items(&items(&["B01", "G01"]), &catalogue, Some(&rules), &[]).expect("prices");
        let json = serde_json::to_value(&breakdown).expect("serializes");
        assert_eq!(json["subtotal"], "32.90");
        assert_eq!(json["total"], "37.85");
    }
}

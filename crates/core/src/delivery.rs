use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTier {
    pub minimum_order_amount: Decimal,
    pub delivery_cost: Decimal,
}

pub trait DeliveryPolicy: Send + Sync {
    fn calculate_cost(&self, order_total: Decimal) -> Result<Decimal, DomainError>;
}

/// Threshold-based delivery charge table. Tier selection is by threshold,
/// not declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryChargeRules {
    tiers: Vec<DeliveryTier>,
}

impl DeliveryChargeRules {
    pub fn new(tiers: Vec<DeliveryTier>) -> Result<Self, DomainError> {
        if tiers.is_empty() {
            return Err(DomainError::EmptyDeliveryTiers);
        }
        for (index, tier) in tiers.iter().enumerate() {
            if tier.minimum_order_amount < Decimal::ZERO {
                return Err(DomainError::NegativeTierThreshold {
                    index,
                    amount: tier.minimum_order_amount,
                });
            }
            if tier.delivery_cost < Decimal::ZERO {
                return Err(DomainError::NegativeTierCost { index, cost: tier.delivery_cost });
            }
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[DeliveryTier] {
        &self.tiers
    }
}

/// Free delivery from 90.00, 2.95 from 50.00, 4.95 below that.
impl Default for DeliveryChargeRules {
    fn default() -> Self {
        Self {
            tiers: vec![
                DeliveryTier {
                    minimum_order_amount: Decimal::new(9000, 2),
                    delivery_cost: Decimal::ZERO,
                },
                DeliveryTier {
                    minimum_order_amount: Decimal::new(5000, 2),
                    delivery_cost: Decimal::new(295, 2),
                },
                DeliveryTier {
                    minimum_order_amount: Decimal::ZERO,
                    delivery_cost: Decimal::new(495, 2),
                },
            ],
        }
    }
}

impl DeliveryPolicy for DeliveryChargeRules {
    fn calculate_cost(&self, order_total: Decimal) -> Result<Decimal, DomainError> {
        if order_total < Decimal::ZERO {
            return Err(DomainError::NegativeOrderTotal(order_total));
        }

        // The tightest-fitting tier wins: largest threshold the total meets.
        Ok(self
            .tiers
            .iter()
            .filter(|tier| order_total >= tier.minimum_order_amount)
            .max_by_key(|tier| tier.minimum_order_amount)
            .map(|tier| tier.delivery_cost)
            .unwrap_or(Decimal::ZERO))
    }
}

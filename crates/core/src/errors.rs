use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalogue::ProductCode;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("catalogue must contain at least one product")]
    EmptyCatalogue,
    #[error("price for product `{code}` cannot be negative: {price}")]
    NegativePrice { code: ProductCode, price: Decimal },
    #[error("price for product `{code}` must be positive")]
    ZeroPrice { code: ProductCode },
    #[error("product code cannot be empty")]
    EmptyProductCode,
    #[error("product `{0}` is not in the catalogue")]
    UnknownProductCode(ProductCode),
    #[error("delivery charge table must contain at least one tier")]
    EmptyDeliveryTiers,
    #[error("delivery tier {index}: minimum order amount cannot be negative: {amount}")]
    NegativeTierThreshold { index: usize, amount: Decimal },
    #[error("delivery tier {index}: delivery cost cannot be negative: {cost}")]
    NegativeTierCost { index: usize, cost: Decimal },
    #[error("order total cannot be negative: {0}")]
    NegativeOrderTotal(Decimal),
    #[error("discount percentage must be between 0 and 1, got {0}")]
    DiscountPercentageOutOfRange(Decimal),
    #[error(
        "multiple offers target product `{code}`: {offers}; only one offer per product is allowed"
    )]
    ConflictingOffers { code: ProductCode, offers: String },
    #[error("aggregate discount cannot be negative: {0}")]
    NegativeDiscount(Decimal),
}

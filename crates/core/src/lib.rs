pub mod basket;
pub mod catalogue;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod offers;
pub mod pricing;

pub use basket::Basket;
pub use catalogue::{ProductCatalogue, ProductCode};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};
pub use delivery::{DeliveryChargeRules, DeliveryPolicy, DeliveryTier};
pub use errors::DomainError;
pub use offers::{validate_offer_collection, Offer, PairDiscountOffer};
pub use pricing::{price_items, PricingBreakdown, PricingTrace, PricingTraceStep};

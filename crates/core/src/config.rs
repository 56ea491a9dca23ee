use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::basket::Basket;
use crate::catalogue::ProductCatalogue;
use crate::delivery::{DeliveryChargeRules, DeliveryTier};
use crate::errors::DomainError;
use crate::offers::{validate_offer_collection, Offer, PairDiscountOffer};

pub const CONFIG_PATH_ENV: &str = "TALLY_CONFIG";
pub const LOG_LEVEL_ENV: &str = "TALLY_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "TALLY_LOG_FORMAT";
pub const DEFAULT_CONFIG_PATH: &str = "tally.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalogue: ProductCatalogue,
    pub delivery: DeliveryChargeRules,
    pub offers: Vec<PairDiscountOffer>,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Programmatic overrides beat environment, which beats the file, which
/// beats built-in defaults.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(#[from] DomainError),
}

/// On-disk schema. Prices and percentages are TOML strings so no float
/// ever enters the money path.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    catalogue: Option<BTreeMap<String, Decimal>>,
    delivery: Option<Vec<FileDeliveryTier>>,
    offers: Option<Vec<FileOffer>>,
    #[serde(default)]
    logging: FileLogging,
}

#[derive(Debug, Deserialize)]
struct FileDeliveryTier {
    minimum_order_amount: Decimal,
    delivery_cost: Decimal,
}

#[derive(Debug, Deserialize)]
struct FileOffer {
    product_code: String,
    discount_percentage: Decimal,
}

#[derive(Debug, Default, Deserialize)]
struct FileLogging {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let file = read_file_config(&options)?;
        let overrides = env_overrides(options.overrides)?;
        Self::from_parts(file, overrides)
    }

    /// A basket wired from the loaded sections. Collaborators are cloned
    /// into fresh `Arc`s, so baskets from the same config share nothing
    /// mutable.
    pub fn basket(&self) -> Result<Basket, DomainError> {
        let offers = self
            .offers
            .iter()
            .map(|offer| Arc::new(offer.clone()) as Arc<dyn Offer>)
            .collect();
        Basket::new(
            Arc::new(self.catalogue.clone()),
            Some(Arc::new(self.delivery.clone())),
            offers,
        )
    }

    fn from_parts(file: FileConfig, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let catalogue = match file.catalogue {
            Some(products) => ProductCatalogue::new(products)?,
            None => ProductCatalogue::default(),
        };

        let delivery = match file.delivery {
            Some(tiers) => DeliveryChargeRules::new(
                tiers
                    .into_iter()
                    .map(|tier| DeliveryTier {
                        minimum_order_amount: tier.minimum_order_amount,
                        delivery_cost: tier.delivery_cost,
                    })
                    .collect(),
            )?,
            None => DeliveryChargeRules::default(),
        };

        let offers = match file.offers {
            Some(entries) => {
                let mut offers = Vec::with_capacity(entries.len());
                for entry in entries {
                    offers.push(PairDiscountOffer::new(
                        entry.product_code,
                        entry.discount_percentage,
                    )?);
                }
                // Conflicts surface at load, not at first pricing.
                let as_dyn: Vec<Arc<dyn Offer>> = offers
                    .iter()
                    .map(|offer| Arc::new(offer.clone()) as Arc<dyn Offer>)
                    .collect();
                validate_offer_collection(&as_dyn)?;
                offers
            }
            None => vec![PairDiscountOffer::default()],
        };

        let logging = LoggingConfig {
            level: overrides
                .log_level
                .or(file.logging.level)
                .unwrap_or_else(|| "info".to_string()),
            format: overrides.log_format.or(file.logging.format).unwrap_or(LogFormat::Compact),
        };

        Ok(Self { catalogue, delivery, offers, logging })
    }
}

fn read_file_config(options: &LoadOptions) -> Result<FileConfig, ConfigError> {
    let (path, explicit) = match &options.config_path {
        Some(path) => (path.clone(), true),
        None => match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        },
    };

    if !path.exists() {
        if explicit || options.require_file {
            return Err(ConfigError::MissingConfigFile(path));
        }
        return Ok(FileConfig::default());
    }

    let raw = fs::read_to_string(&path)
        .map_err(|source| ConfigError::ReadFile { path: path.clone(), source })?;
    toml::from_str(&raw).map_err(|source| ConfigError::ParseFile { path, source })
}

fn env_overrides(mut overrides: ConfigOverrides) -> Result<ConfigOverrides, ConfigError> {
    if overrides.log_level.is_none() {
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            if !level.trim().is_empty() {
                overrides.log_level = Some(level);
            }
        }
    }

    if overrides.log_format.is_none() {
        if let Ok(format) = env::var(LOG_FORMAT_ENV) {
            let parsed = format.parse().map_err(|()| ConfigError::InvalidEnvOverride {
                key: LOG_FORMAT_ENV.to_string(),
                value: format.clone(),
            })?;
            overrides.log_format = Some(parsed);
        }
    }

    Ok(overrides)
}

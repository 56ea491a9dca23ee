use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tally_core::config::{
    AppConfig, LoadOptions, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, LOG_FORMAT_ENV, LOG_LEVEL_ENV,
};
use tally_core::offers::Offer;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "catalogue",
        &format!("{} product(s)", config.catalogue.products().len()),
        field_source("catalogue", None, config_file_doc.as_ref(), config_file_path.as_deref()),
    ));
    for (code, price) in config.catalogue.products() {
        lines.push(format!("    {code} = {price}"));
    }

    lines.push(render_line(
        "delivery",
        &format!("{} tier(s)", config.delivery.tiers().len()),
        field_source("delivery", None, config_file_doc.as_ref(), config_file_path.as_deref()),
    ));
    for tier in config.delivery.tiers() {
        lines.push(format!("    >= {} costs {}", tier.minimum_order_amount, tier.delivery_cost));
    }

    lines.push(render_line(
        "offers",
        &format!("{} offer(s)", config.offers.len()),
        field_source("offers", None, config_file_doc.as_ref(), config_file_path.as_deref()),
    ));
    for offer in &config.offers {
        lines.push(format!("    {} on {}", offer.describe(), offer.product_code()));
    }

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            Some(LOG_LEVEL_ENV),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            Some(LOG_FORMAT_ENV),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        return None;
    }

    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default.exists() {
        return Some(default);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

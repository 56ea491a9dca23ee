use rust_decimal::Decimal;
use serde::Serialize;

use tally_core::config::{AppConfig, LoadOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct ConfigCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<ConfigCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"check serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> CheckReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(ConfigCheck {
                name: "config_load",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_catalogue(&config));
            checks.push(check_delivery(&config));
            checks.push(check_offers(&config));
            checks.push(check_basket_wiring(&config));
        }
        Err(error) => {
            checks.push(ConfigCheck {
                name: "config_load",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalogue", "delivery_tiers", "offers", "basket_wiring"] {
                checks.push(ConfigCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "check: all configuration checks passed".to_string()
    } else {
        "check: one or more configuration checks failed".to_string()
    };

    CheckReport { overall_status, summary, checks }
}

fn check_catalogue(config: &AppConfig) -> ConfigCheck {
    ConfigCheck {
        name: "catalogue",
        status: CheckStatus::Pass,
        details: format!("{} product(s) with positive prices", config.catalogue.products().len()),
    }
}

fn check_delivery(config: &AppConfig) -> ConfigCheck {
    let tiers = config.delivery.tiers();
    let has_base_tier = tiers.iter().any(|tier| tier.minimum_order_amount.is_zero());
    let details = if has_base_tier {
        format!("{} tier(s), base tier present", tiers.len())
    } else {
        format!("{} tier(s); orders below the lowest threshold ship at no charge", tiers.len())
    };
    ConfigCheck { name: "delivery_tiers", status: CheckStatus::Pass, details }
}

fn check_offers(config: &AppConfig) -> ConfigCheck {
    ConfigCheck {
        name: "offers",
        status: CheckStatus::Pass,
        details: format!("{} offer(s), no conflicting product claims", config.offers.len()),
    }
}

fn check_basket_wiring(config: &AppConfig) -> ConfigCheck {
    let basket = match config.basket() {
        Ok(basket) => basket,
        Err(error) => {
            return ConfigCheck {
                name: "basket_wiring",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    match basket.total() {
        Ok(total) if total == Decimal::ZERO => ConfigCheck {
            name: "basket_wiring",
            status: CheckStatus::Pass,
            details: "empty basket prices to 0".to_string(),
        },
        Ok(total) => ConfigCheck {
            name: "basket_wiring",
            status: CheckStatus::Fail,
            details: format!("empty basket priced to {total} instead of 0"),
        },
        Err(error) => ConfigCheck {
            name: "basket_wiring",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &CheckReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

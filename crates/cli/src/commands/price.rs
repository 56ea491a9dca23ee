use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::CommandResult;
use tally_core::config::{AppConfig, LoadOptions};
use tally_core::pricing::PricingBreakdown;

#[derive(Debug, Serialize)]
struct PriceReport<'a> {
    command: &'static str,
    status: &'static str,
    items: &'a [String],
    subtotal: Decimal,
    discount_total: Decimal,
    delivery_cost: Decimal,
    total: Decimal,
    trace: Vec<TraceLine>,
}

#[derive(Debug, Serialize)]
struct TraceLine {
    stage: String,
    detail: String,
    amount: Decimal,
}

pub fn run(codes: &[String], json: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("price", "config_validation", error.to_string(), 2);
        }
    };

    let mut basket = match config.basket() {
        Ok(basket) => basket,
        Err(error) => {
            return CommandResult::failure("price", "basket_setup", error.to_string(), 2);
        }
    };

    for code in codes {
        if let Err(error) = basket.add(code) {
            return CommandResult::failure("price", "invalid_product_code", error.to_string(), 1);
        }
    }

    let breakdown = match basket.breakdown() {
        Ok(breakdown) => breakdown,
        Err(error) => return CommandResult::failure("price", "pricing", error.to_string(), 1),
    };

    tracing::info!(
        event_name = "pricing.basket.totalled",
        item_count = codes.len(),
        total = %breakdown.total,
        "basket priced"
    );

    let output =
        if json { render_json(codes, &breakdown) } else { render_human(codes, &breakdown) };
    CommandResult { exit_code: 0, output }
}

fn render_json(codes: &[String], breakdown: &PricingBreakdown) -> String {
    let report = PriceReport {
        command: "price",
        status: "ok",
        items: codes,
        subtotal: breakdown.subtotal,
        discount_total: breakdown.discount_total,
        delivery_cost: breakdown.delivery_cost,
        total: breakdown.total,
        trace: breakdown
            .trace
            .steps
            .iter()
            .map(|step| TraceLine {
                stage: step.stage.clone(),
                detail: step.detail.clone(),
                amount: step.amount,
            })
            .collect(),
    };

    serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"price\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

fn render_human(codes: &[String], breakdown: &PricingBreakdown) -> String {
    let mut lines = vec![format!("items ({}): {}", codes.len(), codes.join(", "))];
    lines.push(format!("subtotal   {:>10}", breakdown.subtotal));
    lines.push(format!("discounts  {:>10}", breakdown.discount_total));
    lines.push(format!("delivery   {:>10}", breakdown.delivery_cost));
    lines.push(format!("total      {:>10}", breakdown.total));
    lines.join("\n")
}

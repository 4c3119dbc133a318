//! Output Formatting
//!
//! Utilities for formatting CLI output in various formats.

use crate::commands::OutputFormat;
use crate::handler::EvaluationReport;
use ndr_core::{EnginePolicy, RtoCostPolicy};
use serde::Serialize;

/// Print as JSON
fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error formatting JSON: {}", e),
    }
}

/// Print an offline evaluation
pub fn print_report(report: &EvaluationReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table | OutputFormat::Plain => {
            println!("NDR Evaluation");
            println!("==============");
            print_row("Order:", report.order_id.as_str());
            print_row("Reason:", report.reason.as_str());
            print_row("Verdict:", report.verdict.kind().as_str());
            if let Some(validation) = &report.validation {
                let distance = validation
                    .gps_distance_meters
                    .map(|d| format!("{}m", d))
                    .unwrap_or_else(|| "-".to_string());
                print_row("GPS distance:", &distance);
                print_row("GPS valid:", &validation.gps_valid.to_string());
                print_row("Call valid:", &validation.call_valid.to_string());
            }
            print_separator();
            print_row("Order value:", &report.cost_impact.order_value.to_string());
            print_row("Delivery cost:", &report.cost_impact.delivery_cost.to_string());
            print_row("RTO cost:", &report.cost_impact.potential_rto_cost.to_string());
            print_row("Total risk:", &report.cost_impact.total_risk.to_string());

            let violations = report.verdict.violations();
            if !violations.is_empty() {
                println!();
                println!("Violations:");
                for violation in violations {
                    println!("  - {}", violation);
                }
            }
        }
    }
}

/// Print the effective policy
pub fn print_policy(policy: &EnginePolicy, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(policy),
        OutputFormat::Table | OutputFormat::Plain => {
            println!("Engine Policy");
            println!("=============");
            print_row("Max GPS distance:", &format!("{}m", policy.proof.max_gps_distance_meters));
            print_row("Min call duration:", &format!("{}s", policy.proof.min_call_duration_secs));
            print_row("Delivery cost:", &policy.cost.default_delivery_cost.to_string());
            let rto = match &policy.cost.rto_cost {
                RtoCostPolicy::Flat(amount) => amount.to_string(),
                RtoCostPolicy::PercentOfOrderValue(pct) => format!("{}% of order value", pct),
            };
            print_row("RTO cost:", &rto);
            print_row(
                "Resolution TTL:",
                &format!("{}m", policy.resolution.default_ttl_minutes),
            );
            print_row(
                "Accepted reasons:",
                &policy
                    .accepted_reasons
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            print_row(
                "RTO rate alert:",
                &format!("> {}%", policy.alerts.rto_rate_threshold_pct),
            );
            print_row(
                "Suspicious alert:",
                &format!(
                    "> {} NDRs, high above ratio {}",
                    policy.alerts.suspicious_count_threshold, policy.alerts.high_watermark
                ),
            );
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{}", message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{}", message);
}

/// Print a table row
pub fn print_row(key: &str, value: &str) {
    println!("{:<20} {}", key, value);
}

/// Print a separator line
pub fn print_separator() {
    println!("{}", "-".repeat(40));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_policy_formats() {
        let policy = EnginePolicy::default();
        print_policy(&policy, OutputFormat::Table);
        print_policy(&policy, OutputFormat::Json);
    }

    #[test]
    fn test_print_row_format() {
        print_row("Key", "Value");
    }
}

//! Command Handlers
//!
//! Handler functions for CLI commands.

use crate::commands::{
    config::ConfigCommands, evaluate::EvaluateCommands, Cli, Commands, OutputFormat,
};
use crate::error::{CliError, CliResult};
use crate::output;
use ndr_core::{
    parse_reply, CostEstimator, CostImpact, DeliveryAttempt, EnginePolicy, NdrClassifier,
    NdrReasonCode, OrderId, OrderInfo, ProofBundle, ProofValidation, ReplyIntent, Verdict,
};
use ndr_engine::NdrEngine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> CliResult<()> {
    let policy = load_policy(cli.policy.as_deref())?;

    match cli.command {
        Commands::Start {
            host,
            port,
            sweep_interval_secs,
        } => handle_start(policy, host, port, sweep_interval_secs).await,
        Commands::Evaluate(cmd) => handle_evaluate(&policy, cmd, cli.format),
        Commands::Config(cmd) => handle_config(policy, cmd, cli.format),
    }
}

/// Load and validate the policy, or the defaults when no file is given
pub fn load_policy(path: Option<&Path>) -> CliResult<EnginePolicy> {
    let Some(path) = path else {
        return Ok(EnginePolicy::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|e| {
        CliError::config(format!("cannot read policy file {}: {}", path.display(), e))
    })?;
    Ok(EnginePolicy::from_json_str(&raw)?)
}

/// Handle starting the API server
async fn handle_start(
    policy: EnginePolicy,
    host: String,
    port: u16,
    sweep_interval_secs: u64,
) -> CliResult<()> {
    if sweep_interval_secs == 0 {
        return Err(CliError::invalid_arg("sweep interval must be positive"));
    }

    let engine = Arc::new(NdrEngine::new(policy)?);
    let api_config = ndr_api::ApiConfig {
        listen_addr: format!("{}:{}", host, port),
        ..Default::default()
    };

    info!(
        listen = %api_config.listen_addr,
        sweep_interval_secs,
        "Starting NDR service"
    );

    ndr_api::init_metrics(&ndr_api::MetricsConfig::from_env()).map_err(CliError::server)?;

    let sweeper = spawn_sweeper(engine.clone(), Duration::from_secs(sweep_interval_secs));
    let state = ndr_api::AppState::with_config(api_config, engine);
    let result = ndr_api::start_server(state).await;
    sweeper.abort();

    result.map_err(|e| CliError::server(format!("server stopped: {}", e)))
}

/// Periodically escalate expired resolution windows
fn spawn_sweeper(engine: Arc<NdrEngine>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match engine.sweep_expired(engine.now()).await {
                Ok(escalated) if !escalated.is_empty() => {
                    info!(count = escalated.len(), "Escalated expired resolution windows");
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "Resolution sweep failed"),
            }
        }
    })
}

// ============================================
// Offline evaluation
// ============================================

/// Input for an offline NDR evaluation
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationInput {
    pub order: OrderInfo,
    pub attempt: DeliveryAttempt,
    #[serde(default)]
    pub proof: Option<ProofBundle>,
}

/// Verdict and exposure for one attempt
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub order_id: OrderId,
    pub reason: NdrReasonCode,
    #[serde(flatten)]
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ProofValidation>,
    pub cost_impact: CostImpact,
}

/// Classify and cost one attempt under `policy`
pub fn evaluate(policy: &EnginePolicy, input: EvaluationInput) -> CliResult<EvaluationReport> {
    let EvaluationInput {
        order,
        mut attempt,
        proof,
    } = input;
    if attempt.sequence == 0 {
        attempt.sequence = 1;
    }
    let proof = proof.map(|mut p| {
        if p.required_location.is_none() {
            p.required_location = order.registered_coordinates;
        }
        p
    });

    let classification =
        NdrClassifier::from_policy(policy).classify(&order.order_id, &attempt, proof.as_ref())?;
    let cost_impact = CostEstimator::new(policy.cost.clone())
        .estimate(&order, &classification.verdict)?;

    Ok(EvaluationReport {
        order_id: order.order_id,
        reason: classification.reason,
        verdict: classification.verdict,
        validation: classification.validation,
        cost_impact,
    })
}

fn handle_evaluate(
    policy: &EnginePolicy,
    cmd: EvaluateCommands,
    format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        EvaluateCommands::Ndr { input } => {
            let raw = std::fs::read_to_string(&input)?;
            let input: EvaluationInput = serde_json::from_str(&raw)?;
            let report = evaluate(policy, input)?;
            output::print_report(&report, format);
        }
        EvaluateCommands::Reply { text } => {
            let intent = parse_reply(&text);
            let description = match intent {
                ReplyIntent::Action(action) => format!(
                    "{} (follow-up: {})",
                    action,
                    action.follow_up_template()
                ),
                ReplyIntent::Help => "HELP".to_string(),
                ReplyIntent::Unrecognised => "UNRECOGNISED (clarification sent)".to_string(),
            };
            output::print_info(&description);
        }
    }
    Ok(())
}

// ============================================
// Config
// ============================================

fn handle_config(policy: EnginePolicy, cmd: ConfigCommands, format: OutputFormat) -> CliResult<()> {
    match cmd {
        ConfigCommands::Show => {
            output::print_policy(&policy, format);
        }
        ConfigCommands::Check { file } => {
            if let Some(file) = file {
                load_policy(Some(&file))?;
            }
            output::print_success("Policy is valid");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndr_core::VerdictKind;
    use rust_decimal::Decimal;
    use std::io::Write;

    fn input_json(proof: serde_json::Value) -> String {
        serde_json::json!({
            "order": {
                "order_id": "ORD-1",
                "seller_id": "SELLER-1",
                "carrier": "Delhivery",
                "destination": "560001",
                "customer_phone": "+919876543210",
                "order_value": "1499",
                "registered_coordinates": {"latitude": 12.9716, "longitude": 77.5946},
                "created_at": "2024-01-03T10:00:00Z"
            },
            "attempt": {
                "attempted_at": "2024-01-03T12:00:00Z",
                "event_code": "NDR",
                "ndr_reason": "CUSTOMER_UNAVAILABLE"
            },
            "proof": proof
        })
        .to_string()
    }

    #[test]
    fn test_load_policy_defaults_without_file() {
        let policy = load_policy(None).unwrap();
        assert_eq!(policy, EnginePolicy::default());
    }

    #[test]
    fn test_load_policy_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"proof": {{"max_gps_distance_meters": 500}}}}"#).unwrap();

        let policy = load_policy(Some(file.path())).unwrap();
        assert_eq!(policy.proof.max_gps_distance_meters, 500);
        assert_eq!(policy.proof.min_call_duration_secs, 10);
    }

    #[test]
    fn test_load_policy_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"resolution": {{"default_ttl_minutes": 0}}}}"#).unwrap();

        let err = load_policy(Some(file.path())).unwrap_err();
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn test_load_policy_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_policy(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_evaluate_far_gps_short_call() {
        let raw = input_json(serde_json::json!({
            "provided_location": {"latitude": 12.975647, "longitude": 77.5946},
            "call_log": {"duration_secs": 8, "outcome": "NO_RESPONSE"},
            "submitted_at": "2024-01-03T12:01:00Z"
        }));
        let input: EvaluationInput = serde_json::from_str(&raw).unwrap();

        let report = evaluate(&EnginePolicy::default(), input).unwrap();
        assert_eq!(report.verdict.kind(), VerdictKind::Suspicious);
        assert_eq!(
            report.verdict.violations(),
            [
                "GPS location 450m from delivery address (max: 200m)".to_string(),
                "Call duration 8s (min: 10s)".to_string(),
            ]
        );
        assert_eq!(report.cost_impact.total_risk, Decimal::new(250, 0));
    }

    #[test]
    fn test_evaluate_without_proof_is_unverified() {
        let raw = input_json(serde_json::Value::Null);
        let input: EvaluationInput = serde_json::from_str(&raw).unwrap();

        let report = evaluate(&EnginePolicy::default(), input).unwrap();
        assert_eq!(report.verdict.kind(), VerdictKind::Unverified);
        assert!(report.validation.is_none());
    }
}

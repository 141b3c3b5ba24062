//! Prometheus metrics for application observability.
//!
//! Metrics are exposed via a dedicated HTTP listener (default port 9090).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `mod_guard_rejections_total` - Calls rejected by a guard (labels: guard, code)
//! - `mod_procedure_calls_total` - Procedure authorizations (labels: procedure, outcome = admitted|rejected)
//! - `mod_reflections_created_total` - Reflections recorded (label: tier)
//! - `mod_signin_failures_total` - Failed sign-ins (label: reason)
//!
//! Recording functions are no-ops until [`init_metrics`] installs the
//! exporter, so tests can call them freely.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const GUARD_REJECTIONS_TOTAL: &str = "mod_guard_rejections_total";
    pub const PROCEDURE_CALLS_TOTAL: &str = "mod_procedure_calls_total";
    pub const REFLECTIONS_CREATED_TOTAL: &str = "mod_reflections_created_total";
    pub const SIGNIN_FAILURES_TOTAL: &str = "mod_signin_failures_total";
}

/// Initialize the Prometheus metrics exporter.
///
/// Starts the Prometheus HTTP listener on `metrics_addr` and registers
/// metric descriptions.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::GUARD_REJECTIONS_TOTAL,
        "Total number of calls rejected by an authorization guard"
    );
    describe_counter!(
        names::PROCEDURE_CALLS_TOTAL,
        "Total number of procedure authorizations by outcome"
    );
    describe_counter!(
        names::REFLECTIONS_CREATED_TOTAL,
        "Total number of reflections recorded"
    );
    describe_counter!(
        names::SIGNIN_FAILURES_TOTAL,
        "Total number of failed sign-in attempts"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

pub fn record_guard_rejection(guard: &'static str, code: &'static str) {
    counter!(names::GUARD_REJECTIONS_TOTAL, "guard" => guard, "code" => code).increment(1);
}

pub fn record_procedure_call(procedure: &'static str, outcome: &'static str) {
    counter!(names::PROCEDURE_CALLS_TOTAL, "procedure" => procedure, "outcome" => outcome)
        .increment(1);
}

pub fn record_reflection_created(tier: &'static str) {
    counter!(names::REFLECTIONS_CREATED_TOTAL, "tier" => tier).increment(1);
}

pub fn record_signin_failure(reason: &'static str) {
    counter!(names::SIGNIN_FAILURES_TOTAL, "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These only verify the recorders are safe to call without an exporter.

    #[test]
    fn test_record_guard_rejection() {
        record_guard_rejection("not_demo", "FORBIDDEN");
    }

    #[test]
    fn test_record_procedure_call() {
        record_procedure_call("write", "rejected");
    }

    #[test]
    fn test_record_reflection_created() {
        record_reflection_created("free");
    }

    #[test]
    fn test_record_signin_failure() {
        record_signin_failure("bad_password");
    }
}

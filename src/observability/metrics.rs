use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::domain::{RuleOutcome, Verdict, VerdictDetail};

/// Metrics registry for the admission service.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Validation requests by verdict
    pub validations_total: AtomicU64,
    pub validations_accepted: AtomicU64,
    pub validations_rejected: AtomicU64,

    /// Rule outcomes
    pub rules_evaluated_total: AtomicU64,
    pub rules_failed_total: AtomicU64,
    pub rules_errored_total: AtomicU64,

    /// Fee computations
    pub fees_computed_total: AtomicU64,
    pub fee_errors_total: AtomicU64,

    /// Request latency buckets
    pub latency_under_1ms: AtomicU64,
    pub latency_1_5ms: AtomicU64,
    pub latency_5_10ms: AtomicU64,
    pub latency_10_50ms: AtomicU64,
    pub latency_50_100ms: AtomicU64,
    pub latency_over_100ms: AtomicU64,

    /// Contract registry reloads
    pub contract_reloads_total: AtomicU64,
    pub contract_reload_errors: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub validations: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub rules_evaluated: u64,
    pub rules_failed: u64,
    pub rules_errored: u64,
    pub fees_computed: u64,
    pub fee_errors: u64,
    pub contract_reloads: u64,
    pub contract_reload_errors: u64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record a validation verdict and its rule outcomes.
    pub fn record_validation(&self, detail: &VerdictDetail) {
        self.validations_total.fetch_add(1, Ordering::Relaxed);

        match detail.verdict {
            Verdict::Accept => self.validations_accepted.fetch_add(1, Ordering::Relaxed),
            Verdict::Reject => self.validations_rejected.fetch_add(1, Ordering::Relaxed),
        };

        for outcome in &detail.outcomes {
            self.record_rule(outcome);
        }
    }

    fn record_rule(&self, outcome: &RuleOutcome) {
        self.rules_evaluated_total.fetch_add(1, Ordering::Relaxed);
        if !outcome.passed {
            self.rules_failed_total.fetch_add(1, Ordering::Relaxed);
        }
        if outcome.eval_error().is_some() {
            self.rules_errored_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_fee(&self, success: bool) {
        self.fees_computed_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.fee_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record request latency.
    pub fn record_latency(&self, start: Instant) {
        let micros = start.elapsed().as_micros() as u64;

        let bucket = if micros < 1000 {
            &self.latency_under_1ms
        } else if micros < 5000 {
            &self.latency_1_5ms
        } else if micros < 10000 {
            &self.latency_5_10ms
        } else if micros < 50000 {
            &self.latency_10_50ms
        } else if micros < 100000 {
            &self.latency_50_100ms
        } else {
            &self.latency_over_100ms
        };
        bucket.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reload(&self, success: bool) {
        if success {
            self.contract_reloads_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.contract_reload_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            validations: self.validations_total.load(Ordering::Relaxed),
            accepted: self.validations_accepted.load(Ordering::Relaxed),
            rejected: self.validations_rejected.load(Ordering::Relaxed),
            rules_evaluated: self.rules_evaluated_total.load(Ordering::Relaxed),
            rules_failed: self.rules_failed_total.load(Ordering::Relaxed),
            rules_errored: self.rules_errored_total.load(Ordering::Relaxed),
            fees_computed: self.fees_computed_total.load(Ordering::Relaxed),
            fee_errors: self.fee_errors_total.load(Ordering::Relaxed),
            contract_reloads: self.contract_reloads_total.load(Ordering::Relaxed),
            contract_reload_errors: self.contract_reload_errors.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format, with registry gauges.
    pub fn to_prometheus(&self, uptime_secs: u64, contracts_loaded: usize) -> String {
        let s = self.snapshot();
        format!(
            r#"# HELP txadmit_uptime_seconds Application uptime in seconds
# TYPE txadmit_uptime_seconds counter
txadmit_uptime_seconds {}

# HELP txadmit_contracts Number of contracts loaded
# TYPE txadmit_contracts gauge
txadmit_contracts {}

# HELP txadmit_validations_total Total number of validation requests
# TYPE txadmit_validations_total counter
txadmit_validations_total {}

# HELP txadmit_validations Validation requests by verdict
# TYPE txadmit_validations counter
txadmit_validations{{verdict="accept"}} {}
txadmit_validations{{verdict="reject"}} {}

# HELP txadmit_rules_evaluated_total Total rule evaluations
# TYPE txadmit_rules_evaluated_total counter
txadmit_rules_evaluated_total {}

# HELP txadmit_rules_failed_total Rules that did not pass
# TYPE txadmit_rules_failed_total counter
txadmit_rules_failed_total {}

# HELP txadmit_rules_errored_total Rules that failed on an evaluation error
# TYPE txadmit_rules_errored_total counter
txadmit_rules_errored_total {}

# HELP txadmit_fees_computed_total Fee computations
# TYPE txadmit_fees_computed_total counter
txadmit_fees_computed_total {}

# HELP txadmit_fee_errors_total Fee computations rejected for invalid inputs
# TYPE txadmit_fee_errors_total counter
txadmit_fee_errors_total {}

# HELP txadmit_request_latency_bucket Request latency histogram
# TYPE txadmit_request_latency_bucket counter
txadmit_request_latency_bucket{{le="0.001"}} {}
txadmit_request_latency_bucket{{le="0.005"}} {}
txadmit_request_latency_bucket{{le="0.01"}} {}
txadmit_request_latency_bucket{{le="0.05"}} {}
txadmit_request_latency_bucket{{le="0.1"}} {}
txadmit_request_latency_bucket{{le="+Inf"}} {}

# HELP txadmit_contract_reloads_total Contract registry reloads
# TYPE txadmit_contract_reloads_total counter
txadmit_contract_reloads_total {}

# HELP txadmit_contract_reload_errors_total Contract registry reload errors
# TYPE txadmit_contract_reload_errors_total counter
txadmit_contract_reload_errors_total {}
"#,
            uptime_secs,
            contracts_loaded,
            s.validations,
            s.accepted,
            s.rejected,
            s.rules_evaluated,
            s.rules_failed,
            s.rules_errored,
            s.fees_computed,
            s.fee_errors,
            self.latency_under_1ms.load(Ordering::Relaxed),
            self.latency_1_5ms.load(Ordering::Relaxed),
            self.latency_5_10ms.load(Ordering::Relaxed),
            self.latency_10_50ms.load(Ordering::Relaxed),
            self.latency_50_100ms.load(Ordering::Relaxed),
            self.latency_over_100ms.load(Ordering::Relaxed),
            s.contract_reloads,
            s.contract_reload_errors,
        )
    }
}

/// Records elapsed time into the latency buckets when dropped.
pub struct TimingGuard<'a> {
    registry: &'a MetricsRegistry,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(registry: &'a MetricsRegistry) -> Self {
        TimingGuard {
            registry,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for TimingGuard<'a> {
    fn drop(&mut self) {
        self.registry.record_latency(self.start);
    }
}

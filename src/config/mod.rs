use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::interpreter::EvalLimits;

/// Admission service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "txadmit")]
#[command(about = "Transaction admission: contract conditions and fees")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "TXADMIT_LISTEN_ADDR")]
    pub listen_addr: String,

    /// Path to contract registry YAML file
    #[arg(long, default_value = "contracts.yaml", env = "TXADMIT_CONTRACTS_PATH")]
    pub contracts_path: PathBuf,

    /// Contract registry reload check interval in seconds
    #[arg(long, default_value = "30", env = "TXADMIT_CONTRACTS_RELOAD_SECS")]
    pub contracts_reload_secs: u64,

    /// Latency budget in milliseconds for the validation endpoint
    #[arg(long, default_value = "100", env = "TXADMIT_LATENCY_BUDGET_MS")]
    pub latency_budget_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false", env = "TXADMIT_LOG_JSON")]
    pub log_json: bool,

    /// Maximum evaluation steps per rule expression
    #[arg(long, default_value = "10000", env = "TXADMIT_MAX_EVAL_STEPS")]
    pub max_eval_steps: u32,

    /// Maximum expression nesting depth
    #[arg(long, default_value = "64", env = "TXADMIT_MAX_EVAL_DEPTH")]
    pub max_eval_depth: u32,

    /// Maximum size of a value built by a rule expression
    #[arg(long, default_value = "1048576", env = "TXADMIT_MAX_VALUE_SIZE")]
    pub max_value_size: usize,

    /// Request timeout in milliseconds
    #[arg(long, default_value = "1000", env = "TXADMIT_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Maximum concurrent requests
    #[arg(long, default_value = "1024", env = "TXADMIT_MAX_CONCURRENCY")]
    pub max_concurrency: usize,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "TXADMIT_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value = "30", env = "TXADMIT_SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    pub fn contracts_reload_interval(&self) -> Duration {
        Duration::from_secs(self.contracts_reload_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Per-expression evaluation bounds.
    pub fn eval_limits(&self) -> EvalLimits {
        EvalLimits {
            max_steps: self.max_eval_steps,
            max_depth: self.max_eval_depth,
            max_value_size: self.max_value_size,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let limits = EvalLimits::default();
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            contracts_path: PathBuf::from("contracts.yaml"),
            contracts_reload_secs: 30,
            latency_budget_ms: 100,
            log_level: "info".to_string(),
            log_json: false,
            max_eval_steps: limits.max_steps,
            max_eval_depth: limits.max_depth,
            max_value_size: limits.max_value_size,
            request_timeout_ms: 1000,
            max_concurrency: 1024,
            graceful_shutdown: true,
            shutdown_timeout_secs: 30,
        }
    }
}

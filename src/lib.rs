pub mod api;
pub mod conditions;
pub mod config;
pub mod contract;
pub mod domain;
pub mod error;
pub mod fee;
pub mod interpreter;
pub mod observability;
pub mod validation;

pub use conditions::{evaluate_rule_set, ConditionBlock, Rule};
pub use config::Config;
pub use contract::{Contract, ContractRegistry};
pub use domain::{EvaluationContext, Transaction, Value, Verdict, VerdictDetail};
pub use error::{ConfigError, EvalError};
pub use fee::{compute_fee, FeeAmount, FeeInputs, FeePrice};
pub use interpreter::{evaluate, EvalLimits, Expr, Library};
pub use validation::{ValidationEvent, Validator};

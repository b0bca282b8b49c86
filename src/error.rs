use serde::Serialize;
use thiserror::Error;

use crate::domain::ConditionKind;

/// Errors raised while loading a contract or preparing fee inputs.
///
/// These are fatal: a contract that fails to load never runs, and fee
/// inputs that fail validation are a caller bug.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("contract {0} has no inherit condition")]
    MissingInherit(String),

    #[error("{0} trigger configured without a matching condition")]
    MissingCondition(ConditionKind),

    #[error("{0} condition declared without a matching trigger")]
    UnexpectedCondition(ConditionKind),

    #[error("unknown property `{property}` in {kind} condition")]
    UnknownProperty {
        kind: ConditionKind,
        property: String,
    },

    #[error("reference to unbound name `{name}` in {kind} condition")]
    UnboundReference { kind: ConditionKind, name: String },

    #[error("unknown transaction field `{field}` in {kind} condition")]
    UnknownField { kind: ConditionKind, field: String },

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("invalid hex value: {0}")]
    InvalidHex(String),

    #[error("invalid fee inputs: {0}")]
    InvalidFeeInputs(String),

    #[error("duplicate contract address {0}")]
    DuplicateContract(String),
}

/// Errors raised while evaluating one expression.
///
/// Scoped to a single rule: the rule set evaluator turns every one of them
/// into a failed rule, never into a crash.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "message", rename_all = "snake_case")]
pub enum EvalError {
    #[error("undefined reference `{0}`")]
    UndefinedReference(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("resource limit exceeded: {0}")]
    ResourceExceeded(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),
}

impl EvalError {
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        EvalError::TypeMismatch(message.into())
    }
}

use serde::Serialize;

use super::Value;
use crate::error::EvalError;

/// Where a rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOrigin {
    /// Written by the contract author
    Explicit,
    /// Synthesized for a property the inherit block leaves out
    Implicit,
}

/// Shape a rule resolved to once its result type was known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleShape {
    /// Bare literal value
    Literal,
    /// Expression that produced a boolean
    BooleanExpr,
    /// Expression compared against the subject's property
    ValueExpr,
}

/// Why a rule failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Failure {
    /// Boolean rule evaluated to false
    False,
    /// Produced value differs from the subject's property
    Mismatch {
        expected: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        actual: Option<Value>,
    },
    /// Expression could not be evaluated
    Error { error: EvalError },
}

/// Diagnostic record for one evaluated rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    /// Property the rule constrains
    pub property: String,

    pub origin: RuleOrigin,

    /// Resolved shape (absent when evaluation failed before a result)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<RuleShape>,

    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl RuleOutcome {
    /// Passing rule.
    #[inline]
    pub fn pass(property: impl Into<String>, origin: RuleOrigin, shape: RuleShape) -> Self {
        RuleOutcome {
            property: property.into(),
            origin,
            shape: Some(shape),
            passed: true,
            failure: None,
        }
    }

    /// Rule whose boolean result was false.
    pub fn rejected(property: impl Into<String>, origin: RuleOrigin, shape: RuleShape) -> Self {
        RuleOutcome {
            property: property.into(),
            origin,
            shape: Some(shape),
            passed: false,
            failure: Some(Failure::False),
        }
    }

    /// Rule whose value did not match the subject's property.
    pub fn mismatch(
        property: impl Into<String>,
        origin: RuleOrigin,
        shape: RuleShape,
        expected: Value,
        actual: Option<Value>,
    ) -> Self {
        RuleOutcome {
            property: property.into(),
            origin,
            shape: Some(shape),
            passed: false,
            failure: Some(Failure::Mismatch { expected, actual }),
        }
    }

    /// Rule that failed closed on an evaluation error.
    pub fn error(property: impl Into<String>, origin: RuleOrigin, error: EvalError) -> Self {
        RuleOutcome {
            property: property.into(),
            origin,
            shape: None,
            passed: false,
            failure: Some(Failure::Error { error }),
        }
    }

    /// Evaluation error behind the failure, if any.
    pub fn eval_error(&self) -> Option<&EvalError> {
        match &self.failure {
            Some(Failure::Error { error }) => Some(error),
            _ => None,
        }
    }
}

use serde::{Deserialize, Deserializer};

use crate::domain::{EvaluationContext, RuleOrigin, RuleOutcome, RuleShape, Value};
use crate::interpreter::{evaluate, EvalLimits, Expr, Library};

/// Expression tags recognised when reading a rule from a contract file.
const EXPR_TAGS: &[&str] = &[
    "literal", "ref", "call", "not", "binary", "if", "let", "list", "map",
];

/// One constraint on a property of the subject transaction.
///
/// Whether an expression acts as a boolean check or as an expected value is
/// only known once it has been evaluated, so `Expression` covers both.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Bare value written in the contract
    Literal(Value),
    /// Expression whose result type decides how it is applied
    Expression(Expr),
    /// Expression always compared with the subject's property
    ValueExpr(Expr),
}

impl<'de> Deserialize<'de> for Rule {
    /// A single-key map whose key is an expression tag is an expression;
    /// anything else is a literal.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;

        let tagged = matches!(
            &raw,
            serde_json::Value::Object(map)
                if map.len() == 1 && map.keys().all(|k| EXPR_TAGS.contains(&k.as_str()))
        );
        if !tagged {
            return Ok(Rule::Literal(Value::from_json(&raw)));
        }

        match serde_json::from_value::<Expr>(raw).map_err(serde::de::Error::custom)? {
            Expr::Literal(value) => Ok(Rule::Literal(value)),
            expr => Ok(Rule::Expression(expr)),
        }
    }
}

/// Rule bound to its property, ready to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub property: String,
    pub rule: Rule,
    pub origin: RuleOrigin,
}

impl CompiledRule {
    pub fn new(property: impl Into<String>, rule: Rule, origin: RuleOrigin) -> Self {
        CompiledRule {
            property: property.into(),
            rule,
            origin,
        }
    }

    /// Evaluate the rule. Never fails: evaluation errors reject the rule.
    pub fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        library: &Library,
        limits: EvalLimits,
    ) -> RuleOutcome {
        match &self.rule {
            Rule::Literal(Value::Bool(true)) => {
                RuleOutcome::pass(&self.property, self.origin, RuleShape::Literal)
            }
            Rule::Literal(Value::Bool(false)) => {
                RuleOutcome::rejected(&self.property, self.origin, RuleShape::Literal)
            }
            Rule::Literal(expected) => self.compare(ctx, expected.clone(), RuleShape::Literal),
            Rule::Expression(expr) => match evaluate(expr, ctx, library, limits, None) {
                Ok(Value::Bool(true)) => {
                    RuleOutcome::pass(&self.property, self.origin, RuleShape::BooleanExpr)
                }
                Ok(Value::Bool(false)) => {
                    RuleOutcome::rejected(&self.property, self.origin, RuleShape::BooleanExpr)
                }
                Ok(expected) => self.compare(ctx, expected, RuleShape::ValueExpr),
                Err(err) => self.failed(err),
            },
            Rule::ValueExpr(expr) => match evaluate(expr, ctx, library, limits, None) {
                Ok(expected) => self.compare(ctx, expected, RuleShape::ValueExpr),
                Err(err) => self.failed(err),
            },
        }
    }

    fn compare(&self, ctx: &EvaluationContext<'_>, expected: Value, shape: RuleShape) -> RuleOutcome {
        match ctx.subject_field(&self.property) {
            Some(actual) if *actual == expected => {
                RuleOutcome::pass(&self.property, self.origin, shape)
            }
            actual => RuleOutcome::mismatch(
                &self.property,
                self.origin,
                shape,
                expected,
                actual.cloned(),
            ),
        }
    }

    fn failed(&self, err: crate::error::EvalError) -> RuleOutcome {
        tracing::debug!(property = %self.property, error = %err, "rule evaluation failed");
        RuleOutcome::error(&self.property, self.origin, err)
    }
}

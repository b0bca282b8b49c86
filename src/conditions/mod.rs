//! Condition blocks and the rule set evaluator.

pub mod defaults;
pub mod rule;

pub use defaults::with_inherit_defaults;
pub use rule::{CompiledRule, Rule};

use std::collections::BTreeMap;

use crate::domain::transaction::is_field;
use crate::domain::{ConditionKind, EvaluationContext, RuleOrigin, VerdictDetail};
use crate::error::ConfigError;
use crate::interpreter::{apply_sugar, check_expr, EvalLimits, Library};

/// Compiled condition block of a contract.
///
/// Built once at load time: properties are checked against the schema,
/// argument sugar is applied, references are validated and, for inherit
/// blocks, implicit rules are added. Evaluation then has nothing left to
/// resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionBlock {
    kind: ConditionKind,
    rules: Vec<CompiledRule>,
}

impl ConditionBlock {
    pub fn compile(
        kind: ConditionKind,
        source: &BTreeMap<String, Rule>,
        library: &Library,
    ) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(source.len());

        for (property, rule) in source {
            if !is_field(property) {
                return Err(ConfigError::UnknownProperty {
                    kind,
                    property: property.clone(),
                });
            }

            let rule = match rule {
                Rule::Expression(expr) => {
                    let expr = apply_sugar(expr.clone(), kind, property, library);
                    check_expr(&expr, kind, library)?;
                    Rule::Expression(expr)
                }
                Rule::ValueExpr(expr) => {
                    check_expr(expr, kind, library)?;
                    Rule::ValueExpr(expr.clone())
                }
                Rule::Literal(value) => Rule::Literal(value.clone()),
            };
            rules.push(CompiledRule::new(property.as_str(), rule, RuleOrigin::Explicit));
        }

        if kind == ConditionKind::Inherit {
            rules = with_inherit_defaults(rules);
        }

        Ok(ConditionBlock { kind, rules })
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Evaluate every rule of `block` and combine them with AND.
///
/// All rules run even after a failure so the diagnostics are complete; the
/// verdict does not depend on rule order.
pub fn evaluate_rule_set(
    block: &ConditionBlock,
    ctx: &EvaluationContext<'_>,
    library: &Library,
    limits: EvalLimits,
) -> VerdictDetail {
    let outcomes = block
        .rules
        .iter()
        .map(|rule| rule.evaluate(ctx, library, limits))
        .collect();

    VerdictDetail::from_outcomes(block.kind, outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChainSnapshot, ConsensusEnv, Transaction, Verdict, TRANSACTION_FIELDS};
    use crate::interpreter::{BinaryOp, Expr};

    fn block(kind: ConditionKind, yaml: &str) -> Result<ConditionBlock, ConfigError> {
        let source: BTreeMap<String, Rule> = serde_yaml::from_str(yaml).unwrap();
        ConditionBlock::compile(kind, &source, &Library::standard())
    }

    fn inherit_verdict(block: &ConditionBlock, previous: &Transaction, next: &Transaction) -> VerdictDetail {
        let chain = ChainSnapshot::new();
        let env = ConsensusEnv::new(0, &chain);
        let ctx = EvaluationContext::inherit(previous, next, &env);
        evaluate_rule_set(block, &ctx, &Library::standard(), EvalLimits::default())
    }

    #[test]
    fn test_unknown_property_rejected() {
        let err = block(ConditionKind::Transaction, "colour: true").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProperty { .. }));
    }

    #[test]
    fn test_unbound_reference_rejected_at_load() {
        let err = block(
            ConditionKind::Transaction,
            "content: { binary: [eq, { ref: next.content }, { literal: x }] }",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnboundReference { .. }));
    }

    #[test]
    fn test_sugar_applied_at_load() {
        let compiled = block(
            ConditionKind::Inherit,
            "content: { binary: [eq, { call: { function: String.size } }, { literal: 5 }] }",
        )
        .unwrap();

        let rule = compiled
            .rules()
            .iter()
            .find(|r| r.property == "content")
            .unwrap();
        assert_eq!(
            rule.rule,
            Rule::Expression(Expr::binary(
                BinaryOp::Eq,
                Expr::call("String", "size", vec![Expr::field("next", "content")]),
                Expr::literal(5i64),
            ))
        );
    }

    #[test]
    fn test_inherit_block_gets_defaults() {
        let compiled = block(ConditionKind::Inherit, "content: true").unwrap();
        assert_eq!(compiled.len(), TRANSACTION_FIELDS.len());

        let compiled = block(ConditionKind::Transaction, "content: true").unwrap();
        assert_eq!(compiled.len(), 1);
    }

    #[test]
    fn test_empty_inherit_closes_chain() {
        let compiled = block(ConditionKind::Inherit, "{}").unwrap();
        let previous = Transaction {
            content: "a".to_string(),
            ..Default::default()
        };
        let next = Transaction {
            content: "b".to_string(),
            ..Default::default()
        };

        let detail = inherit_verdict(&compiled, &previous, &next);
        assert_eq!(detail.verdict, Verdict::Reject);
        assert_eq!(detail.failures().count(), 1);
        assert_eq!(detail.failures().next().map(|o| o.property.as_str()), Some("content"));

        let detail = inherit_verdict(&compiled, &previous, &previous.clone());
        assert_eq!(detail.verdict, Verdict::Accept);
    }

    #[test]
    fn test_all_rules_evaluated_after_failure() {
        let compiled = block(ConditionKind::Inherit, "content: false\ncode: false").unwrap();
        let tx = Transaction::default();

        let detail = inherit_verdict(&compiled, &tx, &tx);
        assert_eq!(detail.outcomes.len(), TRANSACTION_FIELDS.len());
        assert_eq!(detail.failures().count(), 2);
    }
}

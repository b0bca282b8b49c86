use super::rule::{CompiledRule, Rule};
use crate::domain::{RuleOrigin, TRANSACTION_FIELDS};
use crate::interpreter::Expr;

/// Add an implicit `previous.<field> == next.<field>` rule for every schema
/// field the inherit block leaves out.
///
/// An inherit block therefore only relaxes the fields it names; everything
/// else must carry over unchanged from one chain transaction to the next.
pub fn with_inherit_defaults(mut rules: Vec<CompiledRule>) -> Vec<CompiledRule> {
    for field in TRANSACTION_FIELDS {
        if rules.iter().any(|rule| rule.property == *field) {
            continue;
        }
        rules.push(CompiledRule::new(
            *field,
            Rule::ValueExpr(Expr::field("previous", field)),
            RuleOrigin::Implicit,
        ));
    }
    rules
}

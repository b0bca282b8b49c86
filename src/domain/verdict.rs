use serde::{Deserialize, Serialize};
use std::fmt;

use super::outcome::RuleOutcome;
use super::ConditionKind;

/// Admission outcome with severity ordering.
///
/// When several rules are combined, the most severe verdict wins, which
/// makes the combination a logical AND over the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Verdict {
    /// Transaction admissible
    Accept = 0,
    /// Transaction rejected
    Reject = 1,
}

impl Verdict {
    /// Verdict for a single rule.
    #[inline]
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Verdict::Accept
        } else {
            Verdict::Reject
        }
    }

    /// Returns the more severe of two verdicts.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }

    #[inline]
    pub fn is_accepted(&self) -> bool {
        *self == Verdict::Accept
    }
}

impl Default for Verdict {
    fn default() -> Self {
        Verdict::Accept
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accept => write!(f, "ACCEPT"),
            Verdict::Reject => write!(f, "REJECT"),
        }
    }
}

/// Verdict of one condition block together with per-rule diagnostics.
///
/// Only `verdict` is consensus relevant; the outcomes are informational.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictDetail {
    pub kind: ConditionKind,
    pub verdict: Verdict,
    pub outcomes: Vec<RuleOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl VerdictDetail {
    /// Aggregate exhaustively evaluated rule outcomes.
    pub fn from_outcomes(kind: ConditionKind, outcomes: Vec<RuleOutcome>) -> Self {
        let verdict = outcomes
            .iter()
            .fold(Verdict::Accept, |acc, o| acc.max(Verdict::from_passed(o.passed)));

        VerdictDetail {
            kind,
            verdict,
            outcomes,
            note: None,
        }
    }

    /// Rejection for an event the contract declares no condition for.
    pub fn without_condition(kind: ConditionKind) -> Self {
        VerdictDetail {
            kind,
            verdict: Verdict::Reject,
            outcomes: Vec::new(),
            note: Some(format!("contract declares no {kind} condition")),
        }
    }

    #[inline]
    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    /// Outcomes of the rules that failed.
    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    /// Outcome recorded for a property, if any.
    pub fn outcome(&self, property: &str) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.property == property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outcome::{RuleOrigin, RuleShape};

    #[test]
    fn test_verdict_ordering() {
        assert!(Verdict::Accept < Verdict::Reject);
        assert_eq!(Verdict::Accept.max(Verdict::Reject), Verdict::Reject);
        assert_eq!(Verdict::Accept.max(Verdict::Accept), Verdict::Accept);
    }

    #[test]
    fn test_verdict_serialization() {
        let json = serde_json::to_string(&Verdict::Reject).unwrap();
        assert_eq!(json, "\"REJECT\"");

        let parsed: Verdict = serde_json::from_str("\"ACCEPT\"").unwrap();
        assert_eq!(parsed, Verdict::Accept);
    }

    #[test]
    fn test_empty_outcomes_accept() {
        let detail = VerdictDetail::from_outcomes(ConditionKind::Transaction, vec![]);
        assert!(detail.is_accepted());
    }

    #[test]
    fn test_single_failure_rejects() {
        let detail = VerdictDetail::from_outcomes(
            ConditionKind::Inherit,
            vec![
                RuleOutcome::pass("content", RuleOrigin::Explicit, RuleShape::Literal),
                RuleOutcome::rejected("code", RuleOrigin::Implicit, RuleShape::BooleanExpr),
            ],
        );

        assert_eq!(detail.verdict, Verdict::Reject);
        assert_eq!(detail.failures().count(), 1);
        assert_eq!(detail.outcome("code").map(|o| o.passed), Some(false));
    }

    #[test]
    fn test_without_condition_rejects() {
        let detail = VerdictDetail::without_condition(ConditionKind::Oracle);
        assert!(!detail.is_accepted());
        assert!(detail.note.unwrap().contains("oracle"));
    }
}

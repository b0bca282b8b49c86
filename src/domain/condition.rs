use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of condition block a contract declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Rules the contract's own next transaction must satisfy
    Inherit,
    /// Rules a triggering transaction must satisfy
    Transaction,
    /// Rules an oracle update must satisfy
    Oracle,
}

impl ConditionKind {
    /// Name of the binding whose properties the rules constrain.
    pub fn subject(&self) -> &'static str {
        match self {
            ConditionKind::Inherit => "next",
            ConditionKind::Transaction | ConditionKind::Oracle => "transaction",
        }
    }

    /// Names bound in the evaluation context for this kind.
    pub fn bindings(&self) -> [&'static str; 2] {
        match self {
            ConditionKind::Inherit => ["previous", "next"],
            ConditionKind::Transaction | ConditionKind::Oracle => ["contract", "transaction"],
        }
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings().contains(&name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Inherit => "inherit",
            ConditionKind::Transaction => "transaction",
            ConditionKind::Oracle => "oracle",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

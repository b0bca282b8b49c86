pub mod condition;
pub mod context;
pub mod outcome;
pub mod transaction;
pub mod value;
pub mod verdict;

pub use condition::ConditionKind;
pub use context::{Balance, ChainSnapshot, ChainView, ConsensusEnv, EvaluationContext, TokenBalance};
pub use outcome::{Failure, RuleOrigin, RuleOutcome, RuleShape};
pub use transaction::{
    Address, HexBytes, TokenTransfer, Transaction, TransactionType, UcoTransfer,
    TRANSACTION_FIELDS, UCO_DECIMALS,
};
pub use value::Value;
pub use verdict::{Verdict, VerdictDetail};

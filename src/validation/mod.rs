//! Transaction validation pipeline.
//!
//! `SelectBlock -> BuildContext -> Evaluate -> Verdict`: pick the condition
//! block matching the event, bind the transactions involved, run the rule
//! set and return the verdict with its diagnostics.

use std::sync::Arc;
use tracing::debug;

use crate::conditions::evaluate_rule_set;
use crate::contract::Contract;
use crate::domain::{ConditionKind, ConsensusEnv, EvaluationContext, Transaction, VerdictDetail};
use crate::interpreter::{EvalLimits, Library};

/// Event that asks a contract's conditions for a verdict.
#[derive(Debug, Clone, Copy)]
pub enum ValidationEvent<'t> {
    /// New transaction appended to the contract's own chain
    ChainContinuation {
        previous: &'t Transaction,
        next: &'t Transaction,
    },
    /// Transaction sent to the contract by another chain
    TransactionCall {
        contract: &'t Transaction,
        transaction: &'t Transaction,
    },
    /// Oracle update delivered to the contract
    OracleCall {
        contract: &'t Transaction,
        transaction: &'t Transaction,
    },
}

impl<'t> ValidationEvent<'t> {
    /// Condition block that governs this event.
    pub fn kind(&self) -> ConditionKind {
        match self {
            ValidationEvent::ChainContinuation { .. } => ConditionKind::Inherit,
            ValidationEvent::TransactionCall { .. } => ConditionKind::Transaction,
            ValidationEvent::OracleCall { .. } => ConditionKind::Oracle,
        }
    }

    /// Transaction the verdict is about.
    pub fn subject(&self) -> &'t Transaction {
        match *self {
            ValidationEvent::ChainContinuation { next, .. } => next,
            ValidationEvent::TransactionCall { transaction, .. }
            | ValidationEvent::OracleCall { transaction, .. } => transaction,
        }
    }

    fn context<'a>(&self, env: &ConsensusEnv<'a>) -> EvaluationContext<'a> {
        match *self {
            ValidationEvent::ChainContinuation { previous, next } => {
                EvaluationContext::inherit(previous, next, env)
            }
            ValidationEvent::TransactionCall {
                contract,
                transaction,
            } => EvaluationContext::transaction(contract, transaction, env),
            ValidationEvent::OracleCall {
                contract,
                transaction,
            } => EvaluationContext::oracle(contract, transaction, env),
        }
    }
}

/// Runs contract conditions against validation events.
///
/// Holds only read-only state, so one validator can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct Validator {
    library: Arc<Library>,
    limits: EvalLimits,
}

impl Validator {
    pub fn new(library: Arc<Library>, limits: EvalLimits) -> Self {
        Validator { library, limits }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    pub fn validate(
        &self,
        contract: &Contract,
        event: &ValidationEvent<'_>,
        env: &ConsensusEnv<'_>,
    ) -> VerdictDetail {
        let kind = event.kind();

        let Some(block) = contract.block(kind) else {
            debug!(
                contract = %contract.address(),
                kind = %kind,
                "No condition block for event"
            );
            return VerdictDetail::without_condition(kind);
        };

        let ctx = event.context(env);
        let detail = evaluate_rule_set(block, &ctx, &self.library, self.limits);

        debug!(
            contract = %contract.address(),
            kind = %kind,
            verdict = %detail.verdict,
            rules = detail.outcomes.len(),
            failed = detail.failures().count(),
            "Conditions evaluated"
        );

        detail
    }
}

impl Default for Validator {
    fn default() -> Self {
        Validator::new(Arc::new(Library::standard()), EvalLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractDefinition;
    use crate::domain::{
        Address, ChainSnapshot, HexBytes, UcoTransfer, Value, Verdict, TRANSACTION_FIELDS,
    };
    use crate::interpreter::{evaluate, inject_argument, Expr};

    fn contract(yaml: &str) -> Contract {
        let definition: ContractDefinition = serde_yaml::from_str(yaml).unwrap();
        Contract::compile(&definition, &Library::standard()).unwrap()
    }

    fn continuation(contract: &Contract, previous: &Transaction, next: &Transaction) -> VerdictDetail {
        let chain = ChainSnapshot::new();
        let env = ConsensusEnv::new(next.timestamp, &chain);
        Validator::default().validate(
            contract,
            &ValidationEvent::ChainContinuation { previous, next },
            &env,
        )
    }

    fn call(contract: &Contract, contract_tx: &Transaction, transaction: &Transaction) -> VerdictDetail {
        let chain = ChainSnapshot::new();
        let env = ConsensusEnv::new(transaction.timestamp, &chain);
        Validator::default().validate(
            contract,
            &ValidationEvent::TransactionCall {
                contract: contract_tx,
                transaction,
            },
            &env,
        )
    }

    fn addr(byte: u8) -> Address {
        HexBytes::new(vec![0, byte])
    }

    const TIMESTAMP_CONTRACT: &str = r#"
address: "00ab"
triggers: [transaction]
conditions:
  inherit:
    content: true
    timestamp: { binary: [lt, { ref: next.timestamp }, { literal: 1677598185 }] }
  transaction: {}
"#;

    #[test]
    fn test_timestamp_inherit_scenario() {
        let contract = contract(TIMESTAMP_CONTRACT);
        let previous = Transaction {
            content: "v1".to_string(),
            timestamp: 1_677_597_000,
            ..Default::default()
        };

        let early = Transaction {
            timestamp: 1_677_598_000,
            content: "v2".to_string(),
            ..previous.clone()
        };
        let detail = continuation(&contract, &previous, &early);
        assert_eq!(detail.verdict, Verdict::Accept);

        let late = Transaction {
            timestamp: 1_677_598_200,
            ..early.clone()
        };
        let detail = continuation(&contract, &previous, &late);
        assert_eq!(detail.verdict, Verdict::Reject);
        let failed: Vec<_> = detail.failures().map(|o| o.property.as_str()).collect();
        assert_eq!(failed, vec!["timestamp"]);
    }

    #[test]
    fn test_empty_transaction_block_accepts_anything() {
        let contract = contract(TIMESTAMP_CONTRACT);
        let contract_tx = Transaction::default();
        let transaction = Transaction {
            content: "anything".to_string(),
            uco_transfers: vec![UcoTransfer {
                to: addr(1),
                amount: 42,
            }],
            ..Default::default()
        };

        let detail = call(&contract, &contract_tx, &transaction);
        assert_eq!(detail.verdict, Verdict::Accept);
        assert!(detail.outcomes.is_empty());
    }

    #[test]
    fn test_empty_inherit_block_rejects_any_change() {
        let contract = contract("address: \"00ab\"\nconditions: { inherit: {} }");
        let previous = Transaction {
            code: "actions do end".to_string(),
            ..Default::default()
        };

        for field in ["content", "code", "timestamp", "uco_transfers"] {
            let mut next = previous.clone();
            match field {
                "content" => next.content = "changed".to_string(),
                "code" => next.code = "changed".to_string(),
                "timestamp" => next.timestamp += 1,
                _ => next.uco_transfers.push(UcoTransfer {
                    to: addr(2),
                    amount: 1,
                }),
            }

            let detail = continuation(&contract, &previous, &next);
            assert_eq!(detail.verdict, Verdict::Reject, "change of {field} accepted");
            assert_eq!(detail.failures().count(), 1);
        }

        let detail = continuation(&contract, &previous, &previous.clone());
        assert_eq!(detail.verdict, Verdict::Accept);
        assert_eq!(detail.outcomes.len(), TRANSACTION_FIELDS.len());
    }

    #[test]
    fn test_equality_law_for_value_results() {
        let contract = contract(
            r#"
address: "00ab"
triggers: [transaction]
conditions:
  inherit: {}
  transaction:
    content: { call: { function: String.to_lowercase, args: [{ literal: "HELLO" }] } }
    timestamp: { binary: [add, { literal: 1000 }, { literal: 1 }] }
    uco_transfers: { map: { "0001": { literal: 1.5 } } }
"#,
        );
        let contract_tx = Transaction::default();

        let matching = Transaction {
            content: "hello".to_string(),
            timestamp: 1001,
            uco_transfers: vec![UcoTransfer {
                to: addr(1),
                amount: 150_000_000,
            }],
            ..Default::default()
        };
        let detail = call(&contract, &contract_tx, &matching);
        assert_eq!(detail.verdict, Verdict::Accept, "{detail:?}");

        let different = Transaction {
            content: "Hello".to_string(),
            timestamp: 1002,
            uco_transfers: vec![UcoTransfer {
                to: addr(1),
                amount: 150_000_001,
            }],
            ..Default::default()
        };
        let detail = call(&contract, &contract_tx, &different);
        assert_eq!(detail.verdict, Verdict::Reject);
        assert_eq!(detail.failures().count(), 3);
    }

    #[test]
    fn test_sugar_equivalence() {
        let sugared = contract(
            r#"
address: "00ab"
conditions:
  inherit:
    content: { binary: [eq, { call: { function: String.size } }, { literal: 5 }] }
"#,
        );
        let explicit = contract(
            r#"
address: "00ab"
conditions:
  inherit:
    content: { binary: [eq, { call: { function: String.size, args: [{ ref: next.content }] } }, { literal: 5 }] }
"#,
        );
        let previous = Transaction::default();

        for content in ["hello", "hi"] {
            let next = Transaction {
                content: content.to_string(),
                ..Default::default()
            };
            assert_eq!(
                continuation(&sugared, &previous, &next).verdict,
                continuation(&explicit, &previous, &next).verdict
            );
        }

        // runtime injection gives the same value as the explicit argument
        let chain = ChainSnapshot::new();
        let env = ConsensusEnv::new(0, &chain);
        let next = Transaction {
            content: "hello".to_string(),
            ..Default::default()
        };
        let ctx = EvaluationContext::inherit(&previous, &next, &env);
        let library = Library::standard();
        let short = Expr::call("String", "size", vec![]);
        let injected = evaluate(
            &short,
            &ctx,
            &library,
            EvalLimits::default(),
            Some(Value::from("hello")),
        )
        .unwrap();
        let rewritten = inject_argument(short, Value::from("hello"), &library);
        assert_eq!(injected, Value::from(5i64));
        assert_eq!(
            evaluate(&rewritten, &ctx, &library, EvalLimits::default(), None).unwrap(),
            injected
        );
    }

    #[test]
    fn test_sugar_equivalence_on_collections() {
        let sugared = contract(
            r#"
address: "00ab"
triggers: [transaction]
conditions:
  inherit: {}
  transaction:
    uco_transfers: { binary: [gt, { call: { function: Map.size } }, { literal: 0 }] }
    authorized_keys: { call: { function: List.in?, args: [{ literal: "0001" }] } }
"#,
        );
        let explicit = contract(
            r#"
address: "00ab"
triggers: [transaction]
conditions:
  inherit: {}
  transaction:
    uco_transfers: { binary: [gt, { call: { function: Map.size, args: [{ ref: transaction.uco_transfers }] } }, { literal: 0 }] }
    authorized_keys: { call: { function: List.in?, args: [{ ref: transaction.authorized_keys }, { literal: "0001" }] } }
"#,
        );
        let contract_tx = Transaction::default();

        let paying = Transaction {
            uco_transfers: vec![UcoTransfer {
                to: addr(0xab),
                amount: 100_000_000,
            }],
            authorized_keys: vec![addr(1)],
            ..Default::default()
        };
        let detail = call(&sugared, &contract_tx, &paying);
        assert!(detail.is_accepted());
        assert_eq!(detail, call(&explicit, &contract_tx, &paying));

        let empty = Transaction::default();
        let detail = call(&sugared, &contract_tx, &empty);
        assert_eq!(detail.verdict, Verdict::Reject);
        assert_eq!(detail.failures().count(), 2);
        assert_eq!(detail, call(&explicit, &contract_tx, &empty));
    }

    #[test]
    fn test_event_without_block_rejects() {
        let contract = contract("address: \"00ab\"\nconditions: { inherit: {} }");
        let tx = Transaction::default();

        let detail = call(&contract, &tx, &tx);
        assert_eq!(detail.verdict, Verdict::Reject);
        assert!(detail.outcomes.is_empty());
        assert!(detail.note.is_some());
    }

    #[test]
    fn test_validation_is_pure() {
        let contract = contract(TIMESTAMP_CONTRACT);
        let previous = Transaction::default();
        let next = Transaction {
            timestamp: 1_677_598_200,
            ..Default::default()
        };

        let first = continuation(&contract, &previous, &next);
        let second = continuation(&contract, &previous, &next);
        assert_eq!(first, second);
    }

    #[test]
    fn test_chain_lookup_in_transaction_condition() {
        let contract = contract(
            r#"
address: "00ab"
triggers: [transaction]
conditions:
  inherit: {}
  transaction:
    genesis_address: { binary: [eq, { call: { function: Chain.get_genesis_address, args: [{ ref: transaction.address }] } }, { literal: "00FF" }] }
"#,
        );
        let chain = ChainSnapshot::new().with_genesis("0001", "00FF");
        let env = ConsensusEnv::new(0, &chain);
        let contract_tx = Transaction::default();
        let transaction = Transaction {
            address: addr(1),
            ..Default::default()
        };

        let detail = Validator::default().validate(
            &contract,
            &ValidationEvent::TransactionCall {
                contract: &contract_tx,
                transaction: &transaction,
            },
            &env,
        );
        assert_eq!(detail.verdict, Verdict::Accept);
    }
}

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt::Debug;

use super::transaction::amount_to_decimal;
use super::{ConditionKind, Transaction, Value};

/// Read-only view over chain data the `Chain` library answers from.
///
/// Implementations must be fully materialized before evaluation starts:
/// lookups never block and never reach the network.
pub trait ChainView: Send + Sync + Debug {
    /// Genesis address of the chain containing `address`.
    fn genesis_address(&self, address: &str) -> Option<String>;

    /// Address of the first transaction of the chain containing `address`.
    fn first_transaction_address(&self, address: &str) -> Option<String>;

    /// Genesis public key of the chain owning `public_key`.
    fn genesis_public_key(&self, public_key: &str) -> Option<String>;

    /// Unspent balance held by `address`.
    fn balance(&self, address: &str) -> Option<Balance>;
}

/// Token holding within a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token_address: String,
    #[serde(default)]
    pub token_id: u32,
    pub amount: u64,
}

/// Unspent balance of an address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub uco: u64,
    #[serde(default)]
    pub tokens: Vec<TokenBalance>,
}

impl Balance {
    /// Expression form: `{"uco": n, "tokens": {"ADDR:ID": n}}`.
    pub fn to_value(&self) -> Value {
        let mut tokens: BTreeMap<String, u128> = BTreeMap::new();
        for token in &self.tokens {
            let key = format!("{}:{}", token.token_address.to_uppercase(), token.token_id);
            let total = tokens.entry(key).or_default();
            *total = total.saturating_add(token.amount as u128);
        }

        Value::Map(BTreeMap::from([
            ("uco".to_string(), amount_to_decimal(self.uco as u128)),
            (
                "tokens".to_string(),
                Value::Map(
                    tokens
                        .into_iter()
                        .map(|(k, v)| (k, amount_to_decimal(v)))
                        .collect(),
                ),
            ),
        ]))
    }
}

/// In-memory chain view populated by the caller before validation.
///
/// Keys are hex strings; lookups are case-insensitive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainSnapshot {
    #[serde(default)]
    pub genesis_addresses: BTreeMap<String, String>,
    #[serde(default)]
    pub first_addresses: BTreeMap<String, String>,
    #[serde(default)]
    pub genesis_public_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub balances: BTreeMap<String, Balance>,
}

impl ChainSnapshot {
    pub fn new() -> Self {
        ChainSnapshot::default()
    }

    pub fn with_genesis(mut self, address: &str, genesis: &str) -> Self {
        self.genesis_addresses
            .insert(address.to_uppercase(), genesis.to_uppercase());
        self
    }

    pub fn with_first_address(mut self, address: &str, first: &str) -> Self {
        self.first_addresses
            .insert(address.to_uppercase(), first.to_uppercase());
        self
    }

    pub fn with_genesis_public_key(mut self, public_key: &str, genesis: &str) -> Self {
        self.genesis_public_keys
            .insert(public_key.to_uppercase(), genesis.to_uppercase());
        self
    }

    pub fn with_balance(mut self, address: &str, balance: Balance) -> Self {
        self.balances.insert(address.to_uppercase(), balance);
        self
    }

    fn lookup<'m, V>(map: &'m BTreeMap<String, V>, key: &str) -> Option<&'m V> {
        map.get(key)
            .or_else(|| map.get(key.to_uppercase().as_str()))
    }
}

impl ChainView for ChainSnapshot {
    fn genesis_address(&self, address: &str) -> Option<String> {
        Self::lookup(&self.genesis_addresses, address).map(|s| s.to_uppercase())
    }

    fn first_transaction_address(&self, address: &str) -> Option<String> {
        Self::lookup(&self.first_addresses, address).map(|s| s.to_uppercase())
    }

    fn genesis_public_key(&self, public_key: &str) -> Option<String> {
        Self::lookup(&self.genesis_public_keys, public_key).map(|s| s.to_uppercase())
    }

    fn balance(&self, address: &str) -> Option<Balance> {
        Self::lookup(&self.balances, address).cloned()
    }
}

/// Consensus-agreed inputs shared by every rule of one validation.
#[derive(Debug, Clone, Copy)]
pub struct ConsensusEnv<'a> {
    /// Validation timestamp agreed by the validating nodes (unix seconds)
    pub timestamp: i64,
    pub chain: &'a dyn ChainView,
}

impl<'a> ConsensusEnv<'a> {
    pub fn new(timestamp: i64, chain: &'a dyn ChainView) -> Self {
        ConsensusEnv { timestamp, chain }
    }
}

/// Names bound while evaluating one condition block.
///
/// Built once per validation call from fully materialized transactions and
/// never modified afterwards.
#[derive(Debug)]
pub struct EvaluationContext<'a> {
    kind: ConditionKind,
    bindings: SmallVec<[(&'static str, Value); 2]>,
    timestamp: i64,
    chain: &'a dyn ChainView,
}

impl<'a> EvaluationContext<'a> {
    /// Context for an inherit condition: `previous` and `next`.
    pub fn inherit(previous: &Transaction, next: &Transaction, env: &ConsensusEnv<'a>) -> Self {
        Self::bind(ConditionKind::Inherit, previous, next, env)
    }

    /// Context for a transaction condition: `contract` and `transaction`.
    pub fn transaction(
        contract: &Transaction,
        transaction: &Transaction,
        env: &ConsensusEnv<'a>,
    ) -> Self {
        Self::bind(ConditionKind::Transaction, contract, transaction, env)
    }

    /// Context for an oracle condition: `contract` and `transaction`.
    pub fn oracle(contract: &Transaction, transaction: &Transaction, env: &ConsensusEnv<'a>) -> Self {
        Self::bind(ConditionKind::Oracle, contract, transaction, env)
    }

    fn bind(
        kind: ConditionKind,
        first: &Transaction,
        second: &Transaction,
        env: &ConsensusEnv<'a>,
    ) -> Self {
        let [first_name, second_name] = kind.bindings();
        let mut bindings = SmallVec::new();
        bindings.push((first_name, first.to_value()));
        bindings.push((second_name, second.to_value()));

        EvaluationContext {
            kind,
            bindings,
            timestamp: env.timestamp,
            chain: env.chain,
        }
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    /// Value bound to a context name.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value)
    }

    /// Actual value of `property` on the subject transaction.
    pub fn subject_field(&self, property: &str) -> Option<&Value> {
        self.lookup(self.kind.subject())
            .and_then(Value::as_map)
            .and_then(|fields| fields.get(property))
    }

    /// Consensus timestamp, the only notion of "now" available to rules.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn chain(&self) -> &'a dyn ChainView {
        self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HexBytes;

    #[test]
    fn test_inherit_bindings() {
        let chain = ChainSnapshot::new();
        let env = ConsensusEnv::new(1_700_000_000, &chain);
        let previous = Transaction {
            content: "old".to_string(),
            ..Default::default()
        };
        let next = Transaction {
            content: "new".to_string(),
            ..Default::default()
        };

        let ctx = EvaluationContext::inherit(&previous, &next, &env);

        assert_eq!(ctx.kind(), ConditionKind::Inherit);
        assert_eq!(ctx.subject_field("content"), Some(&Value::from("new")));
        assert!(ctx.lookup("previous").is_some());
        assert!(ctx.lookup("contract").is_none());
        assert_eq!(ctx.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_transaction_subject_is_trigger() {
        let chain = ChainSnapshot::new();
        let env = ConsensusEnv::new(0, &chain);
        let contract = Transaction::default();
        let trigger = Transaction {
            address: HexBytes::new(vec![0xAB]),
            ..Default::default()
        };

        let ctx = EvaluationContext::transaction(&contract, &trigger, &env);

        assert_eq!(ctx.subject_field("address"), Some(&Value::from("AB")));
    }

    #[test]
    fn test_snapshot_lookup_is_case_insensitive() {
        let chain = ChainSnapshot::new().with_genesis("00ab", "00ff");
        assert_eq!(chain.genesis_address("00AB"), Some("00FF".to_string()));
        assert_eq!(chain.genesis_address("00ab"), Some("00FF".to_string()));
        assert_eq!(chain.genesis_address("0001"), None);
    }

    #[test]
    fn test_balance_value() {
        let balance = Balance {
            uco: 250_000_000,
            tokens: vec![TokenBalance {
                token_address: "00aa".to_string(),
                token_id: 0,
                amount: 100_000_000,
            }],
        };

        let value = balance.to_value();
        let map = value.as_map().unwrap();
        assert_eq!(map["uco"], Value::Number(rust_decimal::Decimal::new(25, 1)));
        assert_eq!(map["tokens"].as_map().unwrap()["00AA:0"], Value::from(1i64));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ChainSnapshot, ConditionKind, Transaction};
use crate::fee::FeePrice;
use crate::validation::ValidationEvent;

/// Request body that cannot be turned into a validation event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("`{field}` is required for {kind} validation")]
    MissingTransaction {
        kind: ConditionKind,
        field: &'static str,
    },
}

/// Request to validate a transaction against a contract's conditions.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// Contract address (hex)
    pub contract: String,

    /// Which condition block applies
    pub event: ConditionKind,

    /// Consensus timestamp; defaults to the subject transaction's timestamp
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Inherit: last transaction of the contract chain
    #[serde(default)]
    pub previous: Option<Transaction>,

    /// Inherit: candidate next transaction
    #[serde(default)]
    pub next: Option<Transaction>,

    /// Transaction/oracle: latest contract transaction
    #[serde(default)]
    pub contract_tx: Option<Transaction>,

    /// Transaction/oracle: triggering transaction
    #[serde(default)]
    pub transaction: Option<Transaction>,

    /// Chain data available to `Chain.*` functions
    #[serde(default)]
    pub chain: ChainSnapshot,
}

impl ValidateRequest {
    /// Build the validation event from the transactions supplied.
    pub fn event(&self) -> Result<ValidationEvent<'_>, RequestError> {
        let kind = self.event;
        Ok(match self.event {
            ConditionKind::Inherit => ValidationEvent::ChainContinuation {
                previous: require(kind, &self.previous, "previous")?,
                next: require(kind, &self.next, "next")?,
            },
            ConditionKind::Transaction => ValidationEvent::TransactionCall {
                contract: require(kind, &self.contract_tx, "contract_tx")?,
                transaction: require(kind, &self.transaction, "transaction")?,
            },
            ConditionKind::Oracle => ValidationEvent::OracleCall {
                contract: require(kind, &self.contract_tx, "contract_tx")?,
                transaction: require(kind, &self.transaction, "transaction")?,
            },
        })
    }

    /// Timestamp rules see through `Time.now()`.
    ///
    /// Never read from the local clock: without an explicit value the
    /// subject transaction's own timestamp is used.
    pub fn consensus_timestamp(&self, event: &ValidationEvent<'_>) -> i64 {
        self.timestamp
            .map(|t| t.timestamp())
            .unwrap_or_else(|| event.subject().timestamp)
    }
}

fn require<'r>(
    kind: ConditionKind,
    tx: &'r Option<Transaction>,
    field: &'static str,
) -> Result<&'r Transaction, RequestError> {
    tx.as_ref()
        .ok_or(RequestError::MissingTransaction { kind, field })
}

/// Request to price a transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct FeeRequest {
    pub transaction: Transaction,

    /// Number of nodes that will store the transaction
    pub replicas: u32,

    /// Exchange rate in UCO per USD from the oracle
    pub price: FeePrice,
}

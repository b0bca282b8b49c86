use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::Value;
use crate::error::ConfigError;

/// Number of decimals of the UCO currency: amounts are stored in 10^-8 UCO.
pub const UCO_DECIMALS: u32 = 8;

/// Schema fields a condition block may constrain.
///
/// Inherit conditions synthesize an equality rule for every field listed
/// here that the block does not mention.
pub const TRANSACTION_FIELDS: &[&str] = &[
    "address",
    "genesis_address",
    "previous_address",
    "previous_public_key",
    "previous_signature",
    "origin_signature",
    "type",
    "version",
    "timestamp",
    "content",
    "code",
    "secrets",
    "authorized_keys",
    "uco_transfers",
    "token_transfers",
    "recipients",
];

/// Check whether a name is part of the transaction schema.
pub fn is_field(name: &str) -> bool {
    TRANSACTION_FIELDS.contains(&name)
}

/// Binary data (addresses, keys, signatures), hex encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexBytes(Vec<u8>);

/// Chain address.
pub type Address = HexBytes;

impl HexBytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        HexBytes(bytes.into())
    }

    /// Parse a hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        hex::decode(s)
            .map(HexBytes)
            .map_err(|e| ConfigError::InvalidHex(format!("{s}: {e}")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Upper-case hex form, as seen by condition expressions.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl TryFrom<String> for HexBytes {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        HexBytes::from_hex(&s)
    }
}

impl From<HexBytes> for String {
    fn from(bytes: HexBytes) -> Self {
        bytes.to_hex()
    }
}

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Transaction type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[default]
    Transfer,
    Token,
    Hosting,
    Data,
    Contract,
    Keychain,
    KeychainAccess,
    Node,
    NodeSharedSecrets,
    Origin,
    Oracle,
    OracleSummary,
    CodeProposal,
    CodeApproval,
    NodeRewards,
    MintRewards,
    Beacon,
    BeaconSummary,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Transfer => "transfer",
            TransactionType::Token => "token",
            TransactionType::Hosting => "hosting",
            TransactionType::Data => "data",
            TransactionType::Contract => "contract",
            TransactionType::Keychain => "keychain",
            TransactionType::KeychainAccess => "keychain_access",
            TransactionType::Node => "node",
            TransactionType::NodeSharedSecrets => "node_shared_secrets",
            TransactionType::Origin => "origin",
            TransactionType::Oracle => "oracle",
            TransactionType::OracleSummary => "oracle_summary",
            TransactionType::CodeProposal => "code_proposal",
            TransactionType::CodeApproval => "code_approval",
            TransactionType::NodeRewards => "node_rewards",
            TransactionType::MintRewards => "mint_rewards",
            TransactionType::Beacon => "beacon",
            TransactionType::BeaconSummary => "beacon_summary",
        }
    }

    /// Types issued by the network itself.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TransactionType::Node
                | TransactionType::NodeSharedSecrets
                | TransactionType::Origin
                | TransactionType::Oracle
                | TransactionType::OracleSummary
                | TransactionType::CodeProposal
                | TransactionType::CodeApproval
                | TransactionType::NodeRewards
                | TransactionType::MintRewards
                | TransactionType::Beacon
                | TransactionType::BeaconSummary
        )
    }

    /// Types managing user keychains.
    pub fn is_keychain(&self) -> bool {
        matches!(
            self,
            TransactionType::Keychain | TransactionType::KeychainAccess
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UCO movement to a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UcoTransfer {
    pub to: Address,
    /// Amount in 10^-8 UCO
    pub amount: u64,
}

/// Token movement to a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub to: Address,
    pub token_address: Address,
    #[serde(default)]
    pub token_id: u32,
    /// Amount in 10^-8 token units
    pub amount: u64,
}

/// Transaction as produced upstream by construction and signing.
///
/// The engine only reads it; nothing here mutates a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub address: Address,

    #[serde(default)]
    pub genesis_address: Address,

    #[serde(default)]
    pub previous_address: Address,

    #[serde(default)]
    pub previous_public_key: HexBytes,

    #[serde(default)]
    pub previous_signature: HexBytes,

    #[serde(default)]
    pub origin_signature: HexBytes,

    #[serde(rename = "type", default)]
    pub tx_type: TransactionType,

    #[serde(default = "default_version")]
    pub version: u32,

    /// Unix timestamp (seconds) of the validation stamp
    #[serde(default)]
    pub timestamp: i64,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub secrets: Vec<HexBytes>,

    /// Public keys authorized to decrypt the secrets
    #[serde(default)]
    pub authorized_keys: Vec<HexBytes>,

    #[serde(default)]
    pub uco_transfers: Vec<UcoTransfer>,

    #[serde(default)]
    pub token_transfers: Vec<TokenTransfer>,

    /// Contracts this transaction triggers
    #[serde(default)]
    pub recipients: Vec<Address>,
}

fn default_version() -> u32 {
    1
}

/// Amount in smallest units as a UCO-denominated number.
pub fn amount_to_decimal(units: u128) -> Value {
    i128::try_from(units)
        .ok()
        .and_then(|units| Decimal::try_from_i128_with_scale(units, UCO_DECIMALS).ok())
        .map_or(Value::Nil, |d| Value::Number(d.normalize()))
}

fn hex_list(items: &[HexBytes]) -> Value {
    Value::List(items.iter().map(|b| Value::String(b.to_hex())).collect())
}

impl Transaction {
    /// Value of one schema field as seen by condition expressions.
    pub fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "address" => Value::String(self.address.to_hex()),
            "genesis_address" => Value::String(self.genesis_address.to_hex()),
            "previous_address" => Value::String(self.previous_address.to_hex()),
            "previous_public_key" => Value::String(self.previous_public_key.to_hex()),
            "previous_signature" => Value::String(self.previous_signature.to_hex()),
            "origin_signature" => Value::String(self.origin_signature.to_hex()),
            "type" => Value::from(self.tx_type.as_str()),
            "version" => Value::from(self.version as u64),
            "timestamp" => Value::from(self.timestamp),
            "content" => Value::String(self.content.clone()),
            "code" => Value::String(self.code.clone()),
            "secrets" => hex_list(&self.secrets),
            "authorized_keys" => hex_list(&self.authorized_keys),
            "uco_transfers" => self.uco_transfers_value(),
            "token_transfers" => self.token_transfers_value(),
            "recipients" => hex_list(&self.recipients),
            _ => return None,
        };
        Some(value)
    }

    /// Full mapping from field name to value.
    pub fn to_value(&self) -> Value {
        Value::Map(
            TRANSACTION_FIELDS
                .iter()
                .filter_map(|name| self.field(name).map(|v| (name.to_string(), v)))
                .collect(),
        )
    }

    /// Distinct destinations across UCO and token transfers.
    pub fn transfer_destinations(&self) -> BTreeSet<&Address> {
        self.uco_transfers
            .iter()
            .map(|t| &t.to)
            .chain(self.token_transfers.iter().map(|t| &t.to))
            .collect()
    }

    fn uco_transfers_value(&self) -> Value {
        let mut totals: BTreeMap<String, u128> = BTreeMap::new();
        for transfer in &self.uco_transfers {
            let total = totals.entry(transfer.to.to_hex()).or_default();
            *total = total.saturating_add(transfer.amount as u128);
        }

        Value::Map(
            totals
                .into_iter()
                .map(|(to, amount)| (to, amount_to_decimal(amount)))
                .collect(),
        )
    }

    fn token_transfers_value(&self) -> Value {
        let mut by_recipient: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for transfer in &self.token_transfers {
            let entry = Value::Map(BTreeMap::from([
                (
                    "token_address".to_string(),
                    Value::String(transfer.token_address.to_hex()),
                ),
                ("token_id".to_string(), Value::from(transfer.token_id as u64)),
                (
                    "amount".to_string(),
                    amount_to_decimal(transfer.amount as u128),
                ),
            ]));
            by_recipient
                .entry(transfer.to.to_hex())
                .or_default()
                .push(entry);
        }

        Value::Map(
            by_recipient
                .into_iter()
                .map(|(to, transfers)| (to, Value::List(transfers)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        HexBytes::new(vec![0, byte])
    }

    #[test]
    fn test_hex_roundtrip_normalizes_case() {
        let bytes = HexBytes::from_hex("00abCD").unwrap();
        assert_eq!(bytes.to_hex(), "00ABCD");
        assert!(HexBytes::from_hex("zz").is_err());
    }

    #[test]
    fn test_every_schema_field_resolves() {
        let tx = Transaction::default();
        for name in TRANSACTION_FIELDS {
            assert!(tx.field(name).is_some(), "missing field {name}");
        }
        assert!(tx.field("nonexistent").is_none());
    }

    #[test]
    fn test_uco_transfers_are_summed_per_recipient() {
        let tx = Transaction {
            uco_transfers: vec![
                UcoTransfer { to: addr(1), amount: 150_000_000 },
                UcoTransfer { to: addr(1), amount: 50_000_000 },
                UcoTransfer { to: addr(2), amount: 1 },
            ],
            ..Default::default()
        };

        let value = tx.field("uco_transfers").unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["0001"], Value::from(2i64));
        assert_eq!(map["0002"], Value::Number(Decimal::new(1, 8)));
    }

    #[test]
    fn test_token_transfers_grouped_by_recipient() {
        let tx = Transaction {
            token_transfers: vec![TokenTransfer {
                to: addr(3),
                token_address: addr(9),
                token_id: 0,
                amount: 100_000_000,
            }],
            ..Default::default()
        };

        let value = tx.field("token_transfers").unwrap();
        let transfers = value.as_map().unwrap()["0003"].as_list().unwrap();
        assert_eq!(transfers.len(), 1);
        assert_eq!(
            transfers[0].as_map().unwrap()["token_address"],
            Value::from("0009")
        );
    }

    #[test]
    fn test_transfer_destinations_are_distinct() {
        let tx = Transaction {
            uco_transfers: vec![UcoTransfer { to: addr(1), amount: 1 }],
            token_transfers: vec![TokenTransfer {
                to: addr(1),
                token_address: addr(9),
                token_id: 0,
                amount: 1,
            }],
            ..Default::default()
        };

        assert_eq!(tx.transfer_destinations().len(), 1);
    }

    #[test]
    fn test_transaction_deserialization() {
        let json = r#"{
            "address": "0000ab",
            "type": "token",
            "timestamp": 1677598000,
            "content": "{\"type\":\"fungible\"}",
            "uco_transfers": [{"to": "0001", "amount": 100}]
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.tx_type, TransactionType::Token);
        assert_eq!(tx.version, 1);
        assert_eq!(tx.address.to_hex(), "0000AB");
        assert_eq!(tx.uco_transfers[0].amount, 100);
    }

    #[test]
    fn test_type_classification() {
        assert!(TransactionType::Beacon.is_network());
        assert!(TransactionType::KeychainAccess.is_keychain());
        assert!(!TransactionType::Transfer.is_network());
        assert!(!TransactionType::Token.is_keychain());
    }
}

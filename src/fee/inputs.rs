use serde::{Deserialize, Serialize};

use crate::domain::{Transaction, TransactionType, UCO_DECIMALS};
use crate::error::ConfigError;

/// What a token transaction mints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenMint {
    Fungible,
    NonFungible { utxo_count: u64 },
}

impl TokenMint {
    /// Read the token definition carried in a token transaction's content.
    ///
    /// Non-fungible tokens mint one UTXO per collection item, or one per
    /// whole unit of supply when no collection is given. Content that is
    /// not a token definition mints nothing.
    pub fn from_content(content: &str) -> Option<TokenMint> {
        let definition: serde_json::Value = serde_json::from_str(content).ok()?;

        match definition.get("type")?.as_str()? {
            "fungible" => Some(TokenMint::Fungible),
            "non-fungible" | "non_fungible" => {
                let collection = definition
                    .get("collection")
                    .and_then(serde_json::Value::as_array)
                    .map(Vec::len)
                    .unwrap_or(0);

                let utxo_count = if collection > 0 {
                    collection as u64
                } else {
                    let supply = definition.get("supply")?.as_u64()?;
                    supply / 10u64.pow(UCO_DECIMALS)
                };
                Some(TokenMint::NonFungible { utxo_count })
            }
            _ => None,
        }
    }
}

/// Everything the fee depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeInputs {
    /// Encoded transaction size in bytes
    pub byte_size: u64,
    /// Number of nodes storing the transaction
    pub replica_count: u32,
    /// Distinct transfer destinations
    pub recipient_count: u32,
    pub tx_type: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenMint>,
}

impl FeeInputs {
    /// Derive the inputs from a transaction stored on `replica_count` nodes.
    pub fn from_transaction(tx: &Transaction, replica_count: u32) -> Result<Self, ConfigError> {
        let encoded = serde_json::to_vec(tx)
            .map_err(|e| ConfigError::InvalidFeeInputs(format!("transaction encoding: {e}")))?;

        let token = if tx.tx_type == TransactionType::Token {
            TokenMint::from_content(&tx.content)
        } else {
            None
        };

        Ok(FeeInputs {
            byte_size: encoded.len() as u64,
            replica_count,
            recipient_count: tx.transfer_destinations().len() as u32,
            tx_type: tx.tx_type,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HexBytes, TokenTransfer, UcoTransfer};

    #[test]
    fn test_token_mint_from_content() {
        assert_eq!(
            TokenMint::from_content(r#"{"type": "fungible", "supply": 100000000000}"#),
            Some(TokenMint::Fungible)
        );
        assert_eq!(
            TokenMint::from_content(r#"{"type": "non-fungible", "supply": 1000000000}"#),
            Some(TokenMint::NonFungible { utxo_count: 10 })
        );
        assert_eq!(
            TokenMint::from_content(
                r#"{"type": "non-fungible", "supply": 300000000, "collection": [{}, {}, {}]}"#
            ),
            Some(TokenMint::NonFungible { utxo_count: 3 })
        );
        assert_eq!(TokenMint::from_content("not json"), None);
        assert_eq!(TokenMint::from_content(r#"{"type": "other"}"#), None);
    }

    #[test]
    fn test_inputs_from_transaction() {
        let to = HexBytes::new(vec![0, 1]);
        let tx = Transaction {
            tx_type: TransactionType::Transfer,
            uco_transfers: vec![
                UcoTransfer {
                    to: to.clone(),
                    amount: 1,
                },
                UcoTransfer {
                    to: HexBytes::new(vec![0, 2]),
                    amount: 1,
                },
            ],
            token_transfers: vec![TokenTransfer {
                to,
                token_address: HexBytes::new(vec![0, 9]),
                token_id: 0,
                amount: 1,
            }],
            ..Default::default()
        };

        let inputs = FeeInputs::from_transaction(&tx, 5).unwrap();

        assert_eq!(inputs.replica_count, 5);
        assert_eq!(inputs.recipient_count, 2);
        assert_eq!(inputs.token, None);
        assert_eq!(inputs.byte_size, serde_json::to_vec(&tx).unwrap().len() as u64);
    }

    #[test]
    fn test_token_content_only_read_for_token_type() {
        let content = r#"{"type": "fungible", "supply": 100}"#.to_string();
        let data = Transaction {
            tx_type: TransactionType::Data,
            content: content.clone(),
            ..Default::default()
        };
        let token = Transaction {
            tx_type: TransactionType::Token,
            content,
            ..Default::default()
        };

        assert_eq!(FeeInputs::from_transaction(&data, 1).unwrap().token, None);
        assert_eq!(
            FeeInputs::from_transaction(&token, 1).unwrap().token,
            Some(TokenMint::Fungible)
        );
    }
}

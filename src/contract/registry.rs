use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::definition::{Contract, ContractDefinition};
use crate::error::ConfigError;
use crate::interpreter::Library;

/// Registry file as read from disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryDocument {
    #[serde(rename = "registry_version")]
    pub version: String,
    #[serde(default)]
    pub contracts: Vec<ContractDefinition>,
}

/// Compiled contracts indexed by upper-case hex address.
///
/// Immutable once built; hot reload replaces the whole registry.
#[derive(Debug, Clone)]
pub struct ContractRegistry {
    version: String,
    contracts: BTreeMap<String, Arc<Contract>>,
}

impl ContractRegistry {
    /// Compile every contract of a registry document.
    pub fn from_document(document: &RegistryDocument, library: &Library) -> Result<Self, ConfigError> {
        let mut contracts = BTreeMap::new();

        for definition in &document.contracts {
            let contract = Contract::compile(definition, library)?;
            let key = contract.address().to_hex();
            if contracts.contains_key(&key) {
                return Err(ConfigError::DuplicateContract(key));
            }
            contracts.insert(key, Arc::new(contract));
        }

        Ok(ContractRegistry {
            version: document.version.clone(),
            contracts,
        })
    }

    /// Registry without contracts, served until a first load succeeds.
    pub fn empty() -> Self {
        ContractRegistry {
            version: "0".to_string(),
            contracts: BTreeMap::new(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Contract at `address` (hex, any case).
    pub fn get(&self, address: &str) -> Option<Arc<Contract>> {
        self.contracts.get(&address.to_uppercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

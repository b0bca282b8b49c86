use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::registry::{ContractRegistry, RegistryDocument};
use crate::error::ConfigError;
use crate::interpreter::Library;

/// Errors that can occur while loading the contract registry.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Contract error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Read and check a registry document without compiling it.
pub fn load_document(path: impl AsRef<Path>) -> Result<RegistryDocument, LoadError> {
    let content = fs::read_to_string(path)?;
    let document: RegistryDocument = serde_yaml::from_str(&content)?;

    if document.version.trim().is_empty() {
        return Err(LoadError::Validation(
            "Registry version cannot be empty".to_string(),
        ));
    }

    Ok(document)
}

/// Loads and compiles the contract registry file.
#[derive(Debug, Clone)]
pub struct ContractLoader {
    path: String,
    library: Arc<Library>,
}

impl ContractLoader {
    pub fn new(path: impl Into<String>, library: Arc<Library>) -> Self {
        ContractLoader {
            path: path.into(),
            library,
        }
    }

    /// Load and compile every contract.
    pub fn load(&self) -> Result<ContractRegistry, LoadError> {
        let document = load_document(&self.path)?;
        Ok(ContractRegistry::from_document(&document, &self.library)?)
    }

    /// Registry version on disk, without compiling.
    pub fn peek_version(&self) -> Result<String, LoadError> {
        load_document(&self.path).map(|document| document.version)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

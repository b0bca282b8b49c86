//! Contract registry: loading, compilation and hot reload.

pub mod definition;
pub mod hot_reload;
pub mod loader;
pub mod registry;

pub use definition::{ConditionSources, Contract, ContractDefinition, Trigger};
pub use hot_reload::ContractWatcher;
pub use loader::{load_document, ContractLoader, LoadError};
pub use registry::{ContractRegistry, RegistryDocument};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::conditions::{ConditionBlock, Rule};
use crate::domain::{Address, ConditionKind};
use crate::error::ConfigError;
use crate::interpreter::Library;

/// What can make a contract run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Incoming transaction naming the contract as recipient
    Transaction,
    /// New oracle data published
    Oracle,
    /// Fixed point in time (unix seconds)
    Datetime(i64),
    /// Recurring schedule (cron expression)
    Interval(String),
}

/// Condition blocks as written in the contract file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionSources {
    #[serde(default)]
    pub inherit: Option<BTreeMap<String, Rule>>,
    #[serde(default)]
    pub transaction: Option<BTreeMap<String, Rule>>,
    #[serde(default)]
    pub oracle: Option<BTreeMap<String, Rule>>,
}

/// Contract entry of the registry file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractDefinition {
    pub address: Address,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub conditions: ConditionSources,
}

/// Contract with its condition blocks compiled.
#[derive(Debug, Clone)]
pub struct Contract {
    address: Address,
    triggers: Vec<Trigger>,
    inherit: ConditionBlock,
    transaction: Option<ConditionBlock>,
    oracle: Option<ConditionBlock>,
}

impl Contract {
    /// Compile a definition, enforcing that every trigger has its condition
    /// block and every block its trigger.
    pub fn compile(definition: &ContractDefinition, library: &Library) -> Result<Self, ConfigError> {
        let sources = &definition.conditions;

        let inherit = sources
            .inherit
            .as_ref()
            .ok_or_else(|| ConfigError::MissingInherit(definition.address.to_hex()))?;
        let inherit = ConditionBlock::compile(ConditionKind::Inherit, inherit, library)?;

        let transaction = Self::triggered_block(
            ConditionKind::Transaction,
            definition.triggers.contains(&Trigger::Transaction),
            sources.transaction.as_ref(),
            library,
        )?;
        let oracle = Self::triggered_block(
            ConditionKind::Oracle,
            definition.triggers.contains(&Trigger::Oracle),
            sources.oracle.as_ref(),
            library,
        )?;

        Ok(Contract {
            address: definition.address.clone(),
            triggers: definition.triggers.clone(),
            inherit,
            transaction,
            oracle,
        })
    }

    fn triggered_block(
        kind: ConditionKind,
        triggered: bool,
        source: Option<&BTreeMap<String, Rule>>,
        library: &Library,
    ) -> Result<Option<ConditionBlock>, ConfigError> {
        match (triggered, source) {
            (true, Some(rules)) => ConditionBlock::compile(kind, rules, library).map(Some),
            (true, None) => Err(ConfigError::MissingCondition(kind)),
            (false, Some(_)) => Err(ConfigError::UnexpectedCondition(kind)),
            (false, None) => Ok(None),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Condition block for `kind`, if the contract declares one.
    pub fn block(&self, kind: ConditionKind) -> Option<&ConditionBlock> {
        match kind {
            ConditionKind::Inherit => Some(&self.inherit),
            ConditionKind::Transaction => self.transaction.as_ref(),
            ConditionKind::Oracle => self.oracle.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(yaml: &str) -> ContractDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_compile_full_contract() {
        let def = definition(
            r#"
address: "00ab"
triggers: [transaction, { datetime: 1700000000 }]
conditions:
  inherit:
    content: true
  transaction: {}
"#,
        );

        let contract = Contract::compile(&def, &Library::standard()).unwrap();

        assert_eq!(contract.address().to_hex(), "00AB");
        assert_eq!(contract.triggers()[1], Trigger::Datetime(1_700_000_000));
        assert!(contract.block(ConditionKind::Transaction).unwrap().is_empty());
        assert!(contract.block(ConditionKind::Oracle).is_none());
    }

    #[test]
    fn test_missing_inherit() {
        let def = definition("address: \"00ab\"\nconditions: {}");
        let err = Contract::compile(&def, &Library::standard()).unwrap_err();
        assert_eq!(err, ConfigError::MissingInherit("00AB".to_string()));
    }

    #[test]
    fn test_trigger_without_condition() {
        let def = definition(
            r#"
address: "00ab"
triggers: [oracle]
conditions:
  inherit: {}
"#,
        );
        let err = Contract::compile(&def, &Library::standard()).unwrap_err();
        assert_eq!(err, ConfigError::MissingCondition(ConditionKind::Oracle));
    }

    #[test]
    fn test_condition_without_trigger() {
        let def = definition(
            r#"
address: "00ab"
conditions:
  inherit: {}
  transaction: {}
"#,
        );
        let err = Contract::compile(&def, &Library::standard()).unwrap_err();
        assert_eq!(err, ConfigError::UnexpectedCondition(ConditionKind::Transaction));
    }

    #[test]
    fn test_interval_trigger() {
        let def = definition(
            r#"
address: "00ab"
triggers: [{ interval: "0 * * * *" }]
conditions:
  inherit: {}
"#,
        );
        let contract = Contract::compile(&def, &Library::standard()).unwrap();
        assert_eq!(contract.triggers(), &[Trigger::Interval("0 * * * *".to_string())]);
    }
}

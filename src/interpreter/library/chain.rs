use super::{arg_str, Arity, LibraryModule};
use crate::domain::{EvaluationContext, Value};
use crate::error::EvalError;

/// `Chain` namespace, answered from the context's [`ChainView`].
///
/// Unknown addresses yield `nil` (or an empty balance) rather than an
/// error, so a missing lookup fails a comparison instead of the rule.
///
/// [`ChainView`]: crate::domain::ChainView
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainModule;

fn optional(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Nil)
}

impl LibraryModule for ChainModule {
    fn name(&self) -> &'static str {
        "Chain"
    }

    fn arity(&self, function: &str) -> Option<Arity> {
        match function {
            "get_genesis_address"
            | "get_first_transaction_address"
            | "get_genesis_public_key"
            | "get_balance" => Some(Arity::exactly(1)),
            _ => None,
        }
    }

    fn call(
        &self,
        function: &str,
        args: &[Value],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Value, EvalError> {
        let chain = ctx.chain();
        match function {
            "get_genesis_address" => {
                let address = arg_str("Chain.get_genesis_address", args, 0)?;
                Ok(optional(chain.genesis_address(address)))
            }
            "get_first_transaction_address" => {
                let address = arg_str("Chain.get_first_transaction_address", args, 0)?;
                Ok(optional(chain.first_transaction_address(address)))
            }
            "get_genesis_public_key" => {
                let key = arg_str("Chain.get_genesis_public_key", args, 0)?;
                Ok(optional(chain.genesis_public_key(key)))
            }
            "get_balance" => {
                let address = arg_str("Chain.get_balance", args, 0)?;
                Ok(chain.balance(address).unwrap_or_default().to_value())
            }
            other => Err(EvalError::UndefinedReference(format!("Chain.{other}"))),
        }
    }
}

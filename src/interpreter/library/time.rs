use super::{Arity, LibraryModule};
use crate::domain::{EvaluationContext, Value};
use crate::error::EvalError;

/// `Time` namespace.
///
/// `Time.now()` answers with the consensus timestamp carried by the
/// evaluation context, never with the local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeModule;

impl LibraryModule for TimeModule {
    fn name(&self) -> &'static str {
        "Time"
    }

    fn arity(&self, function: &str) -> Option<Arity> {
        match function {
            "now" => Some(Arity::exactly(0)),
            _ => None,
        }
    }

    fn call(
        &self,
        function: &str,
        _args: &[Value],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Value, EvalError> {
        match function {
            "now" => Ok(Value::from(ctx.timestamp())),
            other => Err(EvalError::UndefinedReference(format!("Time.{other}"))),
        }
    }
}

use rust_decimal::Decimal;
use std::str::FromStr;

use super::{arg_number, arg_str, Arity, LibraryModule};
use crate::domain::{EvaluationContext, Value};
use crate::error::EvalError;

/// `String` namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringModule;

impl LibraryModule for StringModule {
    fn name(&self) -> &'static str {
        "String"
    }

    fn arity(&self, function: &str) -> Option<Arity> {
        match function {
            "size" | "to_number" | "from_number" | "to_uppercase" | "to_lowercase" => {
                Some(Arity::exactly(1))
            }
            "in?" | "starts_with?" | "ends_with?" => Some(Arity::exactly(2)),
            _ => None,
        }
    }

    fn call(
        &self,
        function: &str,
        args: &[Value],
        _ctx: &EvaluationContext<'_>,
    ) -> Result<Value, EvalError> {
        match function {
            "size" => Ok(Value::from(arg_str("String.size", args, 0)?.chars().count())),
            "in?" => {
                let haystack = arg_str("String.in?", args, 0)?;
                let needle = arg_str("String.in?", args, 1)?;
                Ok(Value::Bool(haystack.contains(needle)))
            }
            "starts_with?" => {
                let s = arg_str("String.starts_with?", args, 0)?;
                let prefix = arg_str("String.starts_with?", args, 1)?;
                Ok(Value::Bool(s.starts_with(prefix)))
            }
            "ends_with?" => {
                let s = arg_str("String.ends_with?", args, 0)?;
                let suffix = arg_str("String.ends_with?", args, 1)?;
                Ok(Value::Bool(s.ends_with(suffix)))
            }
            "to_number" => {
                let s = arg_str("String.to_number", args, 0)?;
                Ok(Decimal::from_str(s.trim()).map_or(Value::Nil, Value::Number))
            }
            "from_number" => {
                let n = arg_number("String.from_number", args, 0)?;
                Ok(Value::String(n.normalize().to_string()))
            }
            "to_uppercase" => Ok(Value::String(
                arg_str("String.to_uppercase", args, 0)?.to_uppercase(),
            )),
            "to_lowercase" => Ok(Value::String(
                arg_str("String.to_lowercase", args, 0)?.to_lowercase(),
            )),
            other => Err(EvalError::UndefinedReference(format!("String.{other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::library::with_test_context;

    #[test]
    fn test_size_counts_characters() {
        with_test_context(|ctx| {
            assert_eq!(
                StringModule.call("size", &[Value::from("héllo")], ctx).unwrap(),
                Value::from(5i64)
            );
        });
    }

    #[test]
    fn test_predicates() {
        with_test_context(|ctx| {
            let s = Value::from("hello world");
            assert_eq!(
                StringModule.call("in?", &[s.clone(), Value::from("lo w")], ctx).unwrap(),
                Value::Bool(true)
            );
            assert_eq!(
                StringModule
                    .call("starts_with?", &[s.clone(), Value::from("hello")], ctx)
                    .unwrap(),
                Value::Bool(true)
            );
            assert_eq!(
                StringModule.call("ends_with?", &[s, Value::from("hello")], ctx).unwrap(),
                Value::Bool(false)
            );
        });
    }

    #[test]
    fn test_number_conversions() {
        with_test_context(|ctx| {
            assert_eq!(
                StringModule.call("to_number", &[Value::from(" 12.50 ")], ctx).unwrap(),
                Value::Number(Decimal::new(125, 1))
            );
            assert_eq!(
                StringModule.call("to_number", &[Value::from("abc")], ctx).unwrap(),
                Value::Nil
            );
            assert_eq!(
                StringModule
                    .call("from_number", &[Value::Number(Decimal::new(1250, 2))], ctx)
                    .unwrap(),
                Value::from("12.5")
            );
        });
    }

    #[test]
    fn test_case_conversion() {
        with_test_context(|ctx| {
            assert_eq!(
                StringModule.call("to_uppercase", &[Value::from("00ab")], ctx).unwrap(),
                Value::from("00AB")
            );
        });
    }
}

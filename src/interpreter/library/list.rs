use super::{arg_index, arg_list, Arity, LibraryModule};
use crate::domain::{EvaluationContext, Value};
use crate::error::EvalError;

/// `List` namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListModule;

impl LibraryModule for ListModule {
    fn name(&self) -> &'static str {
        "List"
    }

    fn arity(&self, function: &str) -> Option<Arity> {
        match function {
            "size" | "empty?" => Some(Arity::exactly(1)),
            "at" | "in?" | "concat" | "append" => Some(Arity::exactly(2)),
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
            "size" => Ok(Value::from(arg_list("List.size", args, 0)?.len())),
            "empty?" => Ok(Value::Bool(arg_list("List.empty?", args, 0)?.is_empty())),
            "at" => {
                let list = arg_list("List.at", args, 0)?;
                let index = arg_index("List.at", args, 1)?;
                Ok(list.get(index).cloned().unwrap_or_default())
            }
            "in?" => Ok(Value::Bool(arg_list("List.in?", args, 0)?.contains(&args[1]))),
            "concat" => {
                let mut items = arg_list("List.concat", args, 0)?.to_vec();
                items.extend_from_slice(arg_list("List.concat", args, 1)?);
                Ok(Value::List(items))
            }
            "append" => {
                let mut items = arg_list("List.append", args, 0)?.to_vec();
                items.push(args[1].clone());
                Ok(Value::List(items))
            }
            other => Err(EvalError::UndefinedReference(format!("List.{other}"))),
        }
    }
}

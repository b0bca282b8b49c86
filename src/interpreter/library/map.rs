use super::{arg_map, arg_str, Arity, LibraryModule};
use crate::domain::{EvaluationContext, Value};
use crate::error::EvalError;

/// `Map` namespace. Maps are values: `set` and `delete` return new maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapModule;

impl LibraryModule for MapModule {
    fn name(&self) -> &'static str {
        "Map"
    }

    fn arity(&self, function: &str) -> Option<Arity> {
        match function {
            "size" | "keys" | "values" => Some(Arity::exactly(1)),
            "get" => Some(Arity::range(2, 3)),
            "delete" => Some(Arity::exactly(2)),
            "set" => Some(Arity::exactly(3)),
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
            "size" => Ok(Value::from(arg_map("Map.size", args, 0)?.len())),
            "keys" => Ok(Value::List(
                arg_map("Map.keys", args, 0)?
                    .keys()
                    .map(|k| Value::String(k.clone()))
                    .collect(),
            )),
            "values" => Ok(Value::List(
                arg_map("Map.values", args, 0)?.values().cloned().collect(),
            )),
            "get" => {
                let map = arg_map("Map.get", args, 0)?;
                let key = arg_str("Map.get", args, 1)?;
                let default = args.get(2).cloned().unwrap_or_default();
                Ok(map.get(key).cloned().unwrap_or(default))
            }
            "set" => {
                let mut map = arg_map("Map.set", args, 0)?.clone();
                let key = arg_str("Map.set", args, 1)?;
                map.insert(key.to_string(), args[2].clone());
                Ok(Value::Map(map))
            }
            "delete" => {
                let mut map = arg_map("Map.delete", args, 0)?.clone();
                map.remove(arg_str("Map.delete", args, 1)?);
                Ok(Value::Map(map))
            }
            other => Err(EvalError::UndefinedReference(format!("Map.{other}"))),
        }
    }
}

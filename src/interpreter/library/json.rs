use super::{arg_str, Arity, LibraryModule};
use crate::domain::{EvaluationContext, Value};
use crate::error::EvalError;

/// `Json` namespace.
///
/// Encoding is canonical (sorted keys, compact) so the same value always
/// produces the same text on every node.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModule;

/// One step of a JSONPath expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Parse the supported JSONPath subset: `$`, `.key`, `['key']`, `[n]`.
fn parse_path(path: &str) -> Result<Vec<Segment>, EvalError> {
    let invalid = || EvalError::type_mismatch(format!("invalid JSON path `{path}`"));

    let rest = path.trim().strip_prefix('$').ok_or_else(invalid)?;
    let chars: Vec<char> = rest.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != '.' && chars[end] != '[' {
                    end += 1;
                }
                if end == start {
                    return Err(invalid());
                }
                segments.push(Segment::Key(chars[start..end].iter().collect()));
                i = end;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .map(|p| p + i)
                    .ok_or_else(invalid)?;
                let inner: String = chars[i + 1..close].iter().collect();
                let quoted = inner
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')));

                match quoted {
                    Some(key) => segments.push(Segment::Key(key.to_string())),
                    None => {
                        let index = inner.trim().parse::<usize>().map_err(|_| invalid())?;
                        segments.push(Segment::Index(index));
                    }
                }
                i = close + 1;
            }
            _ => return Err(invalid()),
        }
    }

    Ok(segments)
}

fn select<'j>(document: &'j serde_json::Value, path: &[Segment]) -> Option<&'j serde_json::Value> {
    path.iter().try_fold(document, |node, segment| match segment {
        Segment::Key(key) => node.as_object().and_then(|o| o.get(key)),
        Segment::Index(index) => node.as_array().and_then(|a| a.get(*index)),
    })
}

fn parse_document(function: &str, text: &str) -> Result<serde_json::Value, EvalError> {
    serde_json::from_str(text)
        .map_err(|e| EvalError::type_mismatch(format!("{function}: invalid JSON: {e}")))
}

impl LibraryModule for JsonModule {
    fn name(&self) -> &'static str {
        "Json"
    }

    fn arity(&self, function: &str) -> Option<Arity> {
        match function {
            "to_string" | "parse" | "is_valid?" => Some(Arity::exactly(1)),
            "path_extract" | "path_match?" => Some(Arity::exactly(2)),
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
            "to_string" => Ok(Value::String(args[0].to_json_string())),
            "parse" => {
                let text = arg_str("Json.parse", args, 0)?;
                Ok(Value::from_json(&parse_document("Json.parse", text)?))
            }
            "is_valid?" => {
                let text = arg_str("Json.is_valid?", args, 0)?;
                Ok(Value::Bool(
                    serde_json::from_str::<serde_json::Value>(text).is_ok(),
                ))
            }
            "path_extract" => {
                let text = arg_str("Json.path_extract", args, 0)?;
                let path = parse_path(arg_str("Json.path_extract", args, 1)?)?;
                let document = parse_document("Json.path_extract", text)?;

                Ok(match select(&document, &path) {
                    None => Value::Nil,
                    Some(serde_json::Value::String(s)) => Value::String(s.clone()),
                    Some(other) => Value::String(Value::from_json(other).to_json_string()),
                })
            }
            "path_match?" => {
                let text = arg_str("Json.path_match?", args, 0)?;
                let path = parse_path(arg_str("Json.path_match?", args, 1)?)?;
                let document = parse_document("Json.path_match?", text)?;
                Ok(Value::Bool(select(&document, &path).is_some()))
            }
            other => Err(EvalError::UndefinedReference(format!("Json.{other}"))),
        }
    }
}

use super::ast::Expr;
use super::library::Library;
use crate::domain::transaction::is_field;
use crate::domain::ConditionKind;
use crate::error::ConfigError;

/// Load-time validation of an expression for a block of `kind`.
///
/// Rejects references to names the block does not bind, unknown
/// transaction fields and unknown built-ins, so none of these can surface
/// while a transaction is being validated.
pub fn check_expr(expr: &Expr, kind: ConditionKind, library: &Library) -> Result<(), ConfigError> {
    let mut locals = Vec::new();
    walk(expr, kind, library, &mut locals)
}

fn walk<'e>(
    expr: &'e Expr,
    kind: ConditionKind,
    library: &Library,
    locals: &mut Vec<&'e str>,
) -> Result<(), ConfigError> {
    match expr {
        Expr::Literal(_) => Ok(()),
        Expr::Ref(reference) => {
            if locals.iter().any(|local| *local == reference.root) {
                return Ok(());
            }
            if !kind.is_bound(&reference.root) {
                return Err(ConfigError::UnboundReference {
                    kind,
                    name: reference.root.clone(),
                });
            }
            match reference.fields.first() {
                Some(field) if !is_field(field) => Err(ConfigError::UnknownField {
                    kind,
                    field: field.clone(),
                }),
                _ => Ok(()),
            }
        }
        Expr::Call(call) => {
            if library.arity(&call.function).is_none() {
                return Err(ConfigError::UnknownFunction(call.function.to_string()));
            }
            call.args
                .iter()
                .try_for_each(|arg| walk(arg, kind, library, locals))
        }
        Expr::Not(inner) => walk(inner, kind, library, locals),
        Expr::Binary(_, lhs, rhs) => {
            walk(lhs, kind, library, locals)?;
            walk(rhs, kind, library, locals)
        }
        Expr::If(cond, then, otherwise) => {
            walk(cond, kind, library, locals)?;
            walk(then, kind, library, locals)?;
            walk(otherwise, kind, library, locals)
        }
        Expr::Let(name, value, body) => {
            walk(value, kind, library, locals)?;
            locals.push(name);
            let result = walk(body, kind, library, locals);
            locals.pop();
            result
        }
        Expr::List(items) => items
            .iter()
            .try_for_each(|item| walk(item, kind, library, locals)),
        Expr::Map(entries) => entries
            .values()
            .try_for_each(|item| walk(item, kind, library, locals)),
    }
}

//! Implicit first argument for built-in calls.
//!
//! In a rule such as `content: {call: {function: String.size}}` the call
//! is missing its first argument. The rewrite fills it with the subject's
//! value for the rule's property (`next.content` in an inherit block), so
//! that the rule reads like `String.size(next.content)`.

use super::ast::{Call, Expr, Reference};
use super::library::Library;
use crate::domain::transaction::is_field;
use crate::domain::{ConditionKind, Value};

/// Rewrite `expr` for a rule on `property`, injecting
/// `<subject>.<property>` into every call that is one argument short.
///
/// Properties outside the transaction schema are left untouched.
pub fn apply_sugar(expr: Expr, kind: ConditionKind, property: &str, library: &Library) -> Expr {
    if !is_field(property) {
        return expr;
    }
    let subject = Reference::new(kind.subject(), vec![property.to_string()]);
    rewrite(expr, &Expr::Ref(subject), library)
}

/// Same rewrite with an already evaluated first argument.
pub fn inject_argument(expr: Expr, value: Value, library: &Library) -> Expr {
    rewrite(expr, &Expr::Literal(value), library)
}

fn rewrite(expr: Expr, first: &Expr, library: &Library) -> Expr {
    match expr {
        Expr::Call(call) => Expr::Call(complete(call, first, library)),
        Expr::Not(inner) => Expr::Not(Box::new(rewrite(*inner, first, library))),
        Expr::Binary(op, lhs, rhs) => Expr::Binary(
            op,
            Box::new(rewrite(*lhs, first, library)),
            Box::new(rewrite(*rhs, first, library)),
        ),
        Expr::If(cond, then, otherwise) => Expr::If(
            Box::new(rewrite(*cond, first, library)),
            Box::new(rewrite(*then, first, library)),
            Box::new(rewrite(*otherwise, first, library)),
        ),
        Expr::Let(name, value, body) => {
            let value = rewrite(*value, first, library);
            // a local named like the subject hides it inside the body
            let shadowed = matches!(first, Expr::Ref(r) if r.root == name);
            let body = if shadowed {
                *body
            } else {
                rewrite(*body, first, library)
            };
            Expr::Let(name, Box::new(value), Box::new(body))
        }
        other => other,
    }
}

/// Arguments of a call are never rewritten themselves.
fn complete(mut call: Call, first: &Expr, library: &Library) -> Call {
    let Some(arity) = library.arity(&call.function) else {
        return call;
    };
    let given = call.args.len();
    if given < arity.min && arity.accepts(given + 1) {
        call.args.insert(0, first.clone());
    }
    call
}

use rust_decimal::Decimal;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::ast::{BinaryOp, Call, Expr, Reference};
use super::library::Library;
use super::sugar::inject_argument;
use crate::domain::{EvaluationContext, Value};
use crate::error::EvalError;

/// Bounds on the work a single expression may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalLimits {
    /// Maximum number of evaluated nodes
    pub max_steps: u32,
    /// Maximum nesting depth reached during evaluation
    pub max_depth: u32,
    /// Maximum [`Value::footprint`] of any value built during evaluation
    pub max_value_size: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        EvalLimits {
            max_steps: 10_000,
            max_depth: 64,
            max_value_size: 1 << 20,
        }
    }
}

/// Evaluate `expr` against `ctx`.
///
/// When `injected` is set, calls missing their first argument receive it
/// before evaluation (see [`inject_argument`]).
pub fn evaluate(
    expr: &Expr,
    ctx: &EvaluationContext<'_>,
    library: &Library,
    limits: EvalLimits,
    injected: Option<Value>,
) -> Result<Value, EvalError> {
    let mut evaluator = Evaluator::new(library, ctx, limits);
    match injected {
        Some(value) => evaluator.eval(&inject_argument(expr.clone(), value, library)),
        None => evaluator.eval(expr),
    }
}

/// Tree-walking evaluator for one expression.
///
/// Owns the step counter and the `let` scope; the context and the library
/// are only borrowed, so evaluators are cheap to create per rule.
#[derive(Debug)]
pub struct Evaluator<'e, 'a> {
    library: &'e Library,
    ctx: &'e EvaluationContext<'a>,
    limits: EvalLimits,
    steps: u32,
    depth: u32,
    locals: Vec<(String, Value)>,
}

impl<'e, 'a> Evaluator<'e, 'a> {
    pub fn new(library: &'e Library, ctx: &'e EvaluationContext<'a>, limits: EvalLimits) -> Self {
        Evaluator {
            library,
            ctx,
            limits,
            steps: 0,
            depth: 0,
            locals: Vec::new(),
        }
    }

    /// Nodes evaluated so far.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(EvalError::ResourceExceeded(format!(
                "more than {} evaluation steps",
                self.limits.max_steps
            )));
        }

        self.depth += 1;
        if self.depth > self.limits.max_depth {
            self.depth -= 1;
            return Err(EvalError::ResourceExceeded(format!(
                "nesting deeper than {}",
                self.limits.max_depth
            )));
        }

        let result = self
            .eval_node(expr)
            .and_then(|value| self.check_size(expr, value));
        self.depth -= 1;
        result
    }

    /// Reject oversized values produced by nodes that can build new data.
    /// References only copy values that already exist in the context.
    fn check_size(&self, expr: &Expr, value: Value) -> Result<Value, EvalError> {
        let builds = matches!(
            expr,
            Expr::Binary(..) | Expr::Call(_) | Expr::List(_) | Expr::Map(_)
        );
        if builds && value.footprint() > self.limits.max_value_size {
            return Err(EvalError::ResourceExceeded(format!(
                "value larger than {} units",
                self.limits.max_value_size
            )));
        }
        Ok(value)
    }

    fn eval_node(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Ref(reference) => self.resolve(reference),
            Expr::Call(call) => self.call(call),
            Expr::Not(inner) => {
                let value = self.eval(inner)?;
                Ok(Value::Bool(!expect_bool("not", &value)?))
            }
            Expr::Binary(op, lhs, rhs) => self.binary(*op, lhs, rhs),
            Expr::If(cond, then, otherwise) => {
                let value = self.eval(cond)?;
                if expect_bool("if", &value)? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Let(name, value, body) => {
                let bound = self.eval(value)?;
                self.locals.push((name.clone(), bound));
                let result = self.eval(body);
                self.locals.pop();
                result
            }
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Map(entries) => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.eval(item)?)))
                .collect::<Result<BTreeMap<_, _>, EvalError>>()
                .map(Value::Map),
        }
    }

    fn resolve(&self, reference: &Reference) -> Result<Value, EvalError> {
        let root = self
            .locals
            .iter()
            .rev()
            .find(|(name, _)| *name == reference.root)
            .map(|(_, value)| value)
            .or_else(|| self.ctx.lookup(&reference.root))
            .ok_or_else(|| EvalError::UndefinedReference(reference.root.clone()))?;

        let mut current = root;
        for field in &reference.fields {
            current = match current {
                Value::Map(map) => map
                    .get(field)
                    .ok_or_else(|| EvalError::UndefinedReference(reference.to_string()))?,
                other => {
                    return Err(EvalError::type_mismatch(format!(
                        "cannot read `{field}` of a {} in `{reference}`",
                        other.type_name()
                    )))
                }
            };
        }
        Ok(current.clone())
    }

    fn call(&mut self, call: &Call) -> Result<Value, EvalError> {
        let mut args: SmallVec<[Value; 4]> = SmallVec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval(arg)?);
        }
        self.library.call(&call.function, &args, self.ctx)
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, EvalError> {
        // boolean operators short-circuit
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let decisive = op == BinaryOp::Or;
                let left = self.eval(lhs)?;
                if expect_bool(op.symbol(), &left)? == decisive {
                    return Ok(Value::Bool(decisive));
                }
                let right = self.eval(rhs)?;
                Ok(Value::Bool(expect_bool(op.symbol(), &right)?))
            }
            _ => {
                let left = self.eval(lhs)?;
                let right = self.eval(rhs)?;
                apply_binary(op, left, right)
            }
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt => compare(op, &left, &right).map(|o| Value::Bool(o == Ordering::Less)),
        BinaryOp::Le => compare(op, &left, &right).map(|o| Value::Bool(o != Ordering::Greater)),
        BinaryOp::Gt => compare(op, &left, &right).map(|o| Value::Bool(o == Ordering::Greater)),
        BinaryOp::Ge => compare(op, &left, &right).map(|o| Value::Bool(o != Ordering::Less)),
        BinaryOp::And => Ok(Value::Bool(
            expect_bool("and", &left)? && expect_bool("and", &right)?,
        )),
        BinaryOp::Or => Ok(Value::Bool(
            expect_bool("or", &left)? || expect_bool("or", &right)?,
        )),
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => arithmetic(op, &left, &right, Decimal::checked_sub),
        BinaryOp::Mul => arithmetic(op, &left, &right, Decimal::checked_mul),
        BinaryOp::Div => {
            if right.as_number().is_some_and(|n| n.is_zero()) {
                return Err(EvalError::Arithmetic("division by zero".to_string()));
            }
            arithmetic(op, &left, &right, Decimal::checked_div)
        }
    }
}

fn expect_bool(operator: &str, value: &Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| {
        EvalError::type_mismatch(format!(
            "`{operator}` expects a boolean, got {}",
            value.type_name()
        ))
    })
}

fn operand_mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::type_mismatch(format!(
        "cannot apply `{}` to {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(operand_mismatch(op, left, right)),
    }
}

fn add(left: Value, right: Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            Ok(Value::String(a))
        }
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (left, right) => arithmetic(BinaryOp::Add, &left, &right, Decimal::checked_add),
    }
}

fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    apply: fn(Decimal, Decimal) -> Option<Decimal>,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => apply(*a, *b)
            .map(Value::Number)
            .ok_or_else(|| EvalError::Arithmetic(format!("overflow in `{}`", op.symbol()))),
        _ => Err(operand_mismatch(op, left, right)),
    }
}

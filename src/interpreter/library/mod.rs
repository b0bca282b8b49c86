pub mod chain;
pub mod json;
pub mod list;
pub mod map;
pub mod string;
pub mod time;

pub use chain::ChainModule;
pub use json::JsonModule;
pub use list::ListModule;
pub use map::MapModule;
pub use string::StringModule;
pub use time::TimeModule;

use ahash::AHashMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use super::ast::FunctionName;
use crate::domain::{EvaluationContext, Value};
use crate::error::EvalError;

/// Version of the built-in function set. Bumped whenever a function is
/// added or its behaviour changes, since every node must agree on it.
pub const LIBRARY_VERSION: u32 = 1;

/// Accepted argument counts of a built-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Arity { min: n, max: n }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Arity { min, max }
    }

    #[inline]
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

/// One namespace of built-in functions (`Map`, `Json`, ...).
///
/// Implementations are stateless and deterministic: the result depends
/// only on the arguments and on the consensus inputs of the context.
pub trait LibraryModule: Send + Sync + Debug {
    /// Namespace name as written in expressions.
    fn name(&self) -> &'static str;

    /// Arity of `function`, or `None` if the module does not define it.
    fn arity(&self, function: &str) -> Option<Arity>;

    /// Invoke `function`. Arity has already been checked by the caller.
    fn call(
        &self,
        function: &str,
        args: &[Value],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Value, EvalError>;
}

/// Registry of built-in modules, read-only once built.
#[derive(Debug, Clone)]
pub struct Library {
    modules: AHashMap<&'static str, Arc<dyn LibraryModule>>,
    version: u32,
}

impl Library {
    /// Library without any module.
    pub fn empty() -> Self {
        Library {
            modules: AHashMap::new(),
            version: LIBRARY_VERSION,
        }
    }

    /// The standard built-in set.
    pub fn standard() -> Self {
        let mut library = Library::empty();
        library.register(Arc::new(TimeModule));
        library.register(Arc::new(MapModule));
        library.register(Arc::new(ListModule));
        library.register(Arc::new(StringModule));
        library.register(Arc::new(JsonModule));
        library.register(Arc::new(ChainModule));
        library
    }

    /// Add or replace a module.
    pub fn register(&mut self, module: Arc<dyn LibraryModule>) {
        self.modules.insert(module.name(), module);
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Arity of a function, `None` when unknown.
    pub fn arity(&self, function: &FunctionName) -> Option<Arity> {
        self.modules
            .get(function.module.as_str())
            .and_then(|m| m.arity(&function.name))
    }

    /// Call a function after checking it exists and accepts `args`.
    pub fn call(
        &self,
        function: &FunctionName,
        args: &[Value],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Value, EvalError> {
        let module = self
            .modules
            .get(function.module.as_str())
            .ok_or_else(|| EvalError::UndefinedReference(function.to_string()))?;
        let arity = module
            .arity(&function.name)
            .ok_or_else(|| EvalError::UndefinedReference(function.to_string()))?;

        if !arity.accepts(args.len()) {
            return Err(EvalError::type_mismatch(format!(
                "{function} expects {} to {} arguments, got {}",
                arity.min,
                arity.max,
                args.len()
            )));
        }

        module.call(&function.name, args, ctx)
    }
}

impl Default for Library {
    fn default() -> Self {
        Library::standard()
    }
}

fn mismatch(function: &str, position: usize, expected: &str, got: &Value) -> EvalError {
    EvalError::type_mismatch(format!(
        "{function}: argument {} must be a {expected}, got {}",
        position + 1,
        got.type_name()
    ))
}

pub(crate) fn arg_map<'v>(
    function: &str,
    args: &'v [Value],
    position: usize,
) -> Result<&'v BTreeMap<String, Value>, EvalError> {
    let value = &args[position];
    value
        .as_map()
        .ok_or_else(|| mismatch(function, position, "map", value))
}

pub(crate) fn arg_list<'v>(
    function: &str,
    args: &'v [Value],
    position: usize,
) -> Result<&'v [Value], EvalError> {
    let value = &args[position];
    value
        .as_list()
        .ok_or_else(|| mismatch(function, position, "list", value))
}

pub(crate) fn arg_str<'v>(
    function: &str,
    args: &'v [Value],
    position: usize,
) -> Result<&'v str, EvalError> {
    let value = &args[position];
    value
        .as_str()
        .ok_or_else(|| mismatch(function, position, "string", value))
}

pub(crate) fn arg_number(
    function: &str,
    args: &[Value],
    position: usize,
) -> Result<Decimal, EvalError> {
    let value = &args[position];
    value
        .as_number()
        .ok_or_else(|| mismatch(function, position, "number", value))
}

/// Non-negative integer argument usable as an index.
pub(crate) fn arg_index(
    function: &str,
    args: &[Value],
    position: usize,
) -> Result<usize, EvalError> {
    let n = arg_number(function, args, position)?;
    if !n.fract().is_zero() || n.is_sign_negative() {
        return Err(mismatch(function, position, "non-negative integer", &args[position]));
    }
    n.to_usize()
        .ok_or_else(|| mismatch(function, position, "non-negative integer", &args[position]))
}

/// Run `f` with an inherit context over default transactions.
#[cfg(test)]
pub(crate) fn with_test_context<R>(f: impl FnOnce(&EvaluationContext<'_>) -> R) -> R {
    use crate::domain::{ChainSnapshot, ConsensusEnv, Transaction};

    let chain = ChainSnapshot::new();
    let env = ConsensusEnv::new(0, &chain);
    let tx = Transaction::default();
    let ctx = EvaluationContext::inherit(&tx, &tx, &env);
    f(&ctx)
}

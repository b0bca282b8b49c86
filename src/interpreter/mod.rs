//! Sandboxed evaluation of condition expressions.
//!
//! Expressions can only read the evaluation context and call the closed set
//! of built-ins in [`library`]. There is no I/O, no clock and no randomness,
//! and every evaluation is bounded by [`EvalLimits`].

pub mod ast;
pub mod check;
pub mod eval;
pub mod library;
pub mod sugar;

pub use crate::error::EvalError;
pub use ast::{BinaryOp, Call, Expr, FunctionName, Reference};
pub use check::check_expr;
pub use eval::{evaluate, EvalLimits, Evaluator};
pub use library::{Arity, Library, LibraryModule, LIBRARY_VERSION};
pub use sugar::{apply_sugar, inject_argument};

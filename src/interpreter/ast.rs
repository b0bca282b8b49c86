use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::Value;
use crate::error::ConfigError;

/// Dotted property path such as `next.timestamp` or `contract.content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference {
    pub root: String,
    pub fields: Vec<String>,
}

impl Reference {
    pub fn new(root: impl Into<String>, fields: Vec<String>) -> Self {
        Reference {
            root: root.into(),
            fields,
        }
    }

    /// Parse a dotted path; every segment must be a non-empty identifier.
    pub fn parse(path: &str) -> Result<Self, ConfigError> {
        let mut segments = path.split('.');
        let root = segments.next().unwrap_or_default();
        let fields: Vec<String> = segments.map(str::to_string).collect();

        let valid = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '?')
        };
        if !valid(root) || !fields.iter().all(|f| valid(f)) {
            return Err(ConfigError::InvalidExpression(format!(
                "malformed reference `{path}`"
            )));
        }

        Ok(Reference::new(root, fields))
    }
}

impl TryFrom<String> for Reference {
    type Error = ConfigError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        Reference::parse(&path)
    }
}

impl From<Reference> for String {
    fn from(reference: Reference) -> Self {
        reference.to_string()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for field in &self.fields {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}

/// Namespaced built-in function name, e.g. `Map.size`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FunctionName {
    pub module: String,
    pub name: String,
}

impl FunctionName {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        FunctionName {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl TryFrom<String> for FunctionName {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.split_once('.') {
            Some((module, name)) if !module.is_empty() && !name.is_empty() => {
                Ok(FunctionName::new(module, name))
            }
            _ => Err(ConfigError::InvalidExpression(format!(
                "function name `{s}` is not of the form Module.function"
            ))),
        }
    }
}

impl From<FunctionName> for String {
    fn from(name: FunctionName) -> Self {
        name.to_string()
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Built-in function call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub function: FunctionName,
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Condition expression.
///
/// Parsed once when a contract is loaded and shared read-only by every
/// evaluation; it carries no evaluation state.
///
/// The serialized form is externally tagged, for instance
/// `{binary: [lt, {ref: next.timestamp}, {literal: 1677598185}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Literal(Value),
    Ref(Reference),
    Call(Call),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Let(String, Box<Expr>, Box<Expr>),
    List(Vec<Expr>),
    Map(BTreeMap<String, Expr>),
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Reference `root.field`.
    pub fn field(root: &str, field: &str) -> Self {
        Expr::Ref(Reference::new(root, vec![field.to_string()]))
    }

    /// Reference to a bare name (context binding or local).
    pub fn var(name: &str) -> Self {
        Expr::Ref(Reference::new(name, Vec::new()))
    }

    pub fn call(module: &str, name: &str, args: Vec<Expr>) -> Self {
        Expr::Call(Call {
            function: FunctionName::new(module, name),
            args,
        })
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    pub fn if_else(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::If(Box::new(cond), Box::new(then), Box::new(otherwise))
    }

    pub fn let_in(name: &str, value: Expr, body: Expr) -> Self {
        Expr::Let(name.to_string(), Box::new(value), Box::new(body))
    }
}

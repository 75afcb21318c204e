//! Host value model and result builders
//!
//! `Value` is the shape host values take when they cross this boundary. A
//! host runtime maps its own tagged values onto it before dispatch and back
//! afterwards.
use std::sync::Arc;

use crate::interface::errnos::{SysError, SysResult};
use crate::interface::file::Handle;

#[derive(Debug, Clone)]
pub enum Value {
    /// "no value"
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Sym(String),
    List(Vec<Value>),
    Handle(Arc<Handle>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Sym(_) => "symbol",
            Value::List(_) => "list",
            Value::Handle(_) => "handle",
        }
    }

    /// Everything except `None` and `Bool(false)` counts as true, as in Lisp.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::None | Value::Bool(false))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Sym(a), Value::Sym(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // handles are equal only to themselves
            (Value::Handle(a), Value::Handle(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Value {
        Value::Int(i as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

/// Ordered, append-only list under construction.
#[derive(Debug, Default)]
pub struct ResultList {
    items: Vec<Value>,
}

impl ResultList {
    pub fn new() -> ResultList {
        ResultList::default()
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn finish(self) -> Value {
        Value::List(self.items)
    }
}

/// Two related results travelling together, e.g. (pid, status).
pub fn pair(first: Value, second: Value) -> Value {
    Value::List(vec![first, second])
}

/// Flattening into the "false on failure" convention older hosts expect.
pub trait HostResult {
    /// OS failures become `Bool(false)`. Dispatch and marshaling errors stay
    /// errors since the host has to raise them itself.
    fn into_host_value(self) -> SysResult<Value>;
}

impl HostResult for SysResult<Value> {
    fn into_host_value(self) -> SysResult<Value> {
        match self {
            Ok(value) => Ok(value),
            Err(SysError::Os(_)) => Ok(Value::Bool(false)),
            Err(e) => Err(e),
        }
    }
}

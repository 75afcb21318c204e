// ---------- Test helper functions ----------
#![allow(dead_code)]
use std::path::Path;

use hostposix::{dispatch, posix_start, Session, SysResult, Value};

/// Start the layer the way a host does. Safe to call from every test.
pub fn start() -> Session {
    posix_start(0).unwrap()
}

/// Dispatch by name, the only entry point a host uses.
pub fn call(session: &Session, name: &str, args: &[Value]) -> SysResult<Value> {
    dispatch(session, name, args)
}

pub fn s(text: &str) -> Value {
    Value::from(text)
}

pub fn p(path: &Path) -> Value {
    Value::from(path.to_str().unwrap())
}

pub fn error_code(session: &Session) -> i64 {
    call(session, "sys.error-code", &[]).unwrap().as_int().unwrap()
}

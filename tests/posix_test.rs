// The environment, cwd and the handler table are process-wide, so these run
// one at a time under `serial_test`.
use std::collections::HashSet;
use std::fs;

use serial_test::serial;

use hostposix::{Errno, HostResult, SysError, Value};
mod common;
use common::*;

// ---------- [Directories] ----------
#[test]
#[serial]
fn make_dir_then_remove_dir_restores_parent() {
    let session = start();
    let tmp = tempfile::tempdir().unwrap();
    let before = call(&session, "sys.list-dir", &[p(tmp.path())]).unwrap();

    let dir = tmp.path().join("roundtrip");
    assert_eq!(
        call(&session, "sys.make-dir", &[p(&dir), Value::Int(0o700)]),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        call(&session, "sys.list-dir", &[p(tmp.path())]),
        Ok(Value::List(vec![s("roundtrip")]))
    );
    assert_eq!(call(&session, "sys.remove-dir", &[p(&dir)]), Ok(Value::Bool(true)));

    let after = call(&session, "sys.list-dir", &[p(tmp.path())]).unwrap();
    assert_eq!(before, after);
}

#[test]
#[serial]
fn list_dir_is_sorted() {
    let session = start();
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("b.txt"), b"").unwrap();
    fs::write(tmp.path().join("a.txt"), b"").unwrap();

    assert_eq!(
        call(&session, "sys.list-dir", &[p(tmp.path())]),
        Ok(Value::List(vec![s("a.txt"), s("b.txt")]))
    );
}

#[test]
#[serial]
fn current_dir_follows_change_dir() {
    let session = start();
    let tmp = tempfile::tempdir().unwrap();
    let previous = call(&session, "sys.current-dir", &[]).unwrap();

    call(&session, "sys.change-dir", &[p(tmp.path())]).unwrap();
    let cwd = call(&session, "sys.current-dir", &[]).unwrap();
    assert_eq!(cwd, p(&fs::canonicalize(tmp.path()).unwrap()));

    call(&session, "sys.change-dir", &[previous]).unwrap();
}

// ---------- [Environment] ----------
#[test]
#[serial]
fn env_get_unset_then_set() {
    let session = start();
    let name = s("HOSTPOSIX_IT_VAR");
    std::env::remove_var("HOSTPOSIX_IT_VAR");

    assert_eq!(call(&session, "sys.env-get", &[name.clone()]), Ok(Value::None));
    assert_eq!(
        call(&session, "sys.env-set", &[name.clone(), s("exact value"), Value::Bool(true)]),
        Ok(Value::Bool(true))
    );
    assert_eq!(call(&session, "sys.env-get", &[name]), Ok(s("exact value")));
    std::env::remove_var("HOSTPOSIX_IT_VAR");
}

#[test]
#[serial]
fn env_set_without_overwrite_keeps_first_value() {
    let session = start();
    let name = s("HOSTPOSIX_IT_KEEP");
    std::env::remove_var("HOSTPOSIX_IT_KEEP");

    assert_eq!(
        call(&session, "sys.env-set", &[name.clone(), s("v1"), Value::Bool(false)]),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        call(&session, "sys.env-set", &[name.clone(), s("v2"), Value::Bool(false)]),
        Ok(Value::Bool(false))
    );
    assert_eq!(call(&session, "sys.env-get", &[name]), Ok(s("v1")));
    std::env::remove_var("HOSTPOSIX_IT_KEEP");
}

// ---------- [Randomness] ----------
#[test]
#[serial]
fn random_bounded_stays_in_range() {
    let session = start();
    let mut seen = HashSet::new();
    for _ in 0..2000 {
        let n = call(&session, "sys.random-bounded", &[Value::Int(5)])
            .unwrap()
            .as_int()
            .unwrap();
        assert!((0..5).contains(&n));
        seen.insert(n);
    }
    assert_eq!(seen.len(), 5);
}

// ---------- [Stream handles] ----------
#[test]
#[serial]
fn open_read_missing_then_open_write_creates() {
    let session = start();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("created.txt");

    let missing = call(&session, "sys.open-read", &[p(&path)]);
    assert_eq!(missing, Err(SysError::Os(Errno::ENOENT)));
    assert_eq!(error_code(&session), libc::ENOENT as i64);
    assert_eq!(call(&session, "sys.error-name", &[]), Ok(Value::Sym("ENOENT".to_string())));

    let handle = call(&session, "sys.open-write", &[p(&path)]).unwrap();
    assert!(path.exists());
    assert_eq!(call(&session, "sys.close-write", &[handle.clone()]), Ok(Value::Bool(true)));

    // second close of the same handle
    let again = call(&session, "sys.close-write", &[handle]);
    assert_eq!(again.into_host_value(), Ok(Value::Bool(false)));
    assert_eq!(error_code(&session), libc::EBADF as i64);
}

// ---------- [Process replacement] ----------
#[test]
#[serial]
fn exec_missing_program_leaves_state() {
    let session = start();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("still-open.txt");
    std::env::set_var("HOSTPOSIX_IT_EXEC", "unchanged");
    let handle = call(&session, "sys.open-write", &[p(&path)]).unwrap();

    let result = call(
        &session,
        "sys.exec-replace",
        &[
            s("hostposix-missing-program"),
            Value::List(vec![s("hostposix-missing-program"), s("arg")]),
        ],
    );
    assert_eq!(result.into_host_value(), Ok(Value::Bool(false)));
    assert_eq!(error_code(&session), libc::ENOENT as i64);

    assert_eq!(call(&session, "sys.env-get", &[s("HOSTPOSIX_IT_EXEC")]), Ok(s("unchanged")));
    match &handle {
        Value::Handle(h) => {
            assert!(h.is_open());
            h.write_str("written after exec failed", session.status()).unwrap();
        }
        other => panic!("expected a handle, got {:?}", other),
    }
    assert_eq!(call(&session, "sys.close-write", &[handle]), Ok(Value::Bool(true)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "written after exec failed");
    std::env::remove_var("HOSTPOSIX_IT_EXEC");
}

// ---------- [Errors] ----------
#[test]
#[serial]
fn error_message_for_captured_code() {
    let session = start();
    let tmp = tempfile::tempdir().unwrap();
    let _ = call(&session, "sys.remove-dir", &[p(&tmp.path().join("absent"))]);

    let code = error_code(&session);
    let msg = call(&session, "sys.error-message", &[Value::Int(code)]).unwrap();
    assert!(!msg.as_str().unwrap().is_empty());
    // querying never disturbs the cell
    assert_eq!(error_code(&session), libc::ENOENT as i64);
}

#[test]
#[serial]
fn ctime_format_of_now() {
    let session = start();
    let now = call(&session, "sys.time-now", &[]).unwrap();
    let text = call(&session, "sys.ctime-format", &[now]).unwrap();
    let text = text.as_str().unwrap();
    assert_eq!(text.len(), 25);
    assert!(text.ends_with('\n'));
}

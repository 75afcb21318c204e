#![allow(dead_code)] //suppress warning for these functions not being used in targets other than the
                     // tests

#[cfg(test)]
pub mod dispatcher_tests {
    use std::collections::HashSet;

    use super::super::*;
    use crate::constants::OPERATION_PREFIX;
    use crate::interface::{Errno, HostResult, SysError, SysResult, Value};
    use crate::posix::dispatcher::*;
    use crate::posix::session::Session;

    fn echo_entry(_session: &Session, args: &[Value]) -> SysResult<Value> {
        Ok(Value::List(args.to_vec()))
    }

    fn other_entry(_session: &Session, _args: &[Value]) -> SysResult<Value> {
        Ok(Value::None)
    }

    #[test]
    pub fn ut_posix_catalog_registered() {
        let _thelock = setup::lock_and_init();
        let mut seen = HashSet::new();
        for desc in SYSCALL_TABLE.iter() {
            assert!(desc.name.starts_with(OPERATION_PREFIX), "{}", desc.name);
            assert!(seen.insert(desc.name), "duplicate {}", desc.name);
            let found = lookup(desc.name).unwrap();
            assert_eq!(found.required, desc.required);
            assert_eq!(found.optional, desc.optional);
        }
        assert_eq!(seen.len(), 38);
    }

    #[test]
    pub fn ut_posix_registration_is_idempotent() {
        let _thelock = setup::lock_and_init();
        assert_eq!(register_posix_syscalls(), Ok(()));
        assert_eq!(register_handler(SYSCALL_TABLE[0]), Ok(()));
    }

    #[test]
    pub fn ut_posix_registration_conflict() {
        let _thelock = setup::lock_and_init();
        let clash = OperationDescriptor::new("sys.fork", other_entry, 0, 0);
        assert_eq!(
            register_handler(clash),
            Err(SysError::Conflict("sys.fork".to_string()))
        );
        // the original entry is untouched
        let session = Session::with_seed(1);
        assert_eq!(dispatch(&session, "sys.fork", &[1.into()]).map(|_| ()), Err(SysError::Arity {
            name: "sys.fork".to_string(),
            required: 0,
            optional: 0,
            given: 1,
        }));
    }

    #[test]
    pub fn ut_posix_unknown_operation() {
        let _thelock = setup::lock_and_init();
        let session = Session::with_seed(1);
        session.status().record(Errno::EPERM);
        assert_eq!(
            dispatch(&session, "sys.no-such-op", &[]),
            Err(SysError::UnknownOperation("sys.no-such-op".to_string()))
        );
        assert_eq!(session.status().errno(), Errno::EPERM);
    }

    #[test]
    pub fn ut_posix_arity_checked_before_call() {
        let _thelock = setup::lock_and_init();
        let session = Session::with_seed(1);
        session.status().record(Errno::EPERM);
        let result = dispatch(&session, "sys.env-get", &[]);
        assert_eq!(
            result,
            Err(SysError::Arity {
                name: "sys.env-get".to_string(),
                required: 1,
                optional: 0,
                given: 0,
            })
        );
        assert!(dispatch(&session, "sys.make-dir", &["a".into()]).is_err());
        assert!(dispatch(&session, "sys.process-id", &[Value::None]).is_err());
        assert_eq!(session.status().errno(), Errno::EPERM);
    }

    #[test]
    pub fn ut_posix_type_errors() {
        let _thelock = setup::lock_and_init();
        let session = Session::with_seed(1);
        assert_eq!(
            dispatch(&session, "sys.make-dir", &[Value::Int(3), Value::Int(0o755)]),
            Err(SysError::Type {
                expected: "string",
                found: "integer"
            })
        );
        assert!(matches!(
            dispatch(&session, "sys.remove-dir", &["bad\0path".into()]),
            Err(SysError::Type { .. })
        ));
        assert!(matches!(
            dispatch(&session, "sys.exec-replace", &["true".into(), "true".into()]),
            Err(SysError::Type { .. })
        ));
        // symbols are accepted for variable names
        assert!(dispatch(&session, "sys.env-get", &[Value::Sym("PATH".to_string())]).is_ok());
    }

    #[test]
    pub fn ut_posix_exec_rejects_empty_argv() {
        let _thelock = setup::lock_and_init();
        let session = Session::with_seed(1);
        session.status().record(Errno::EPERM);
        assert_eq!(
            dispatch(&session, "sys.exec-replace", &["true".into(), Value::List(vec![])]),
            Err(SysError::Type {
                expected: "non-empty list of strings",
                found: "empty list"
            })
        );
        // rejected before execvp, so the cell still holds the old code
        assert_eq!(session.status().errno(), Errno::EPERM);
    }

    #[test]
    pub fn ut_posix_started_sessions_diverge() {
        let _thelock = setup::lock_and_init();
        let first = posix_start(0).unwrap();
        let second = posix_start(0).unwrap();
        let draw = |session: &Session| -> Vec<Value> {
            (0..8)
                .map(|_| dispatch(session, "sys.random-bounded", &[Value::Int(1 << 40)]).unwrap())
                .collect()
        };
        assert_ne!(draw(&first), draw(&second));
        assert_ne!(draw(&Session::new()), draw(&Session::new()));
    }

    #[test]
    pub fn ut_posix_close_kind_mismatch() {
        let _thelock = setup::lock_and_init();
        let session = Session::with_seed(1);
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out");
        let handle = dispatch(&session, "sys.open-write", &[path.to_str().unwrap().into()]).unwrap();

        assert_eq!(
            dispatch(&session, "sys.close-read", &[handle.clone()]),
            Err(SysError::Type {
                expected: "read handle",
                found: "write handle"
            })
        );
        assert_eq!(dispatch(&session, "sys.close-write", &[handle]), Ok(Value::Bool(true)));
    }

    #[test]
    pub fn ut_posix_optional_args_padded() {
        let _thelock = setup::lock_and_init();
        register_handler(OperationDescriptor::new("test.echo", echo_entry, 1, 2)).unwrap();
        let session = Session::with_seed(1);

        assert_eq!(
            dispatch(&session, "test.echo", &[Value::Int(1)]),
            Ok(Value::List(vec![Value::Int(1), Value::None, Value::None]))
        );
        assert_eq!(
            dispatch(&session, "test.echo", &[Value::Int(1), Value::Int(2)]),
            Ok(Value::List(vec![Value::Int(1), Value::Int(2), Value::None]))
        );
        assert!(dispatch(&session, "test.echo", &[]).is_err());
        assert!(dispatch(&session, "test.echo", &vec![Value::None; 4]).is_err());
    }

    #[test]
    pub fn ut_posix_host_value_shape() {
        let _thelock = setup::lock_and_init();
        let session = Session::with_seed(1);
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing");

        let failed = dispatch(&session, "sys.remove-dir", &[missing.to_str().unwrap().into()]);
        assert_eq!(failed.into_host_value(), Ok(Value::Bool(false)));
        assert_eq!(
            dispatch(&session, "sys.error-name", &[]),
            Ok(Value::Sym("ENOENT".to_string()))
        );

        let arity = dispatch(&session, "sys.remove-dir", &[]);
        assert!(matches!(arity.into_host_value(), Err(SysError::Arity { .. })));

        let ok = dispatch(&session, "sys.process-id", &[]);
        assert_eq!(ok.into_host_value(), Ok(Value::Int(std::process::id() as i64)));
    }

    #[test]
    pub fn ut_posix_export_catalog() {
        let _thelock = setup::lock_and_init();
        let bytes = export_catalog().unwrap();
        let entries: Vec<CatalogEntry> = serde_cbor::from_slice(&bytes).unwrap();

        let mut sorted = entries.clone();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries, sorted);
        assert!(entries.contains(&CatalogEntry {
            name: "sys.env-set".to_string(),
            required: 3,
            optional: 0,
        }));
        assert!(entries.len() >= SYSCALL_TABLE.len());
    }

    #[test]
    pub fn ut_posix_start_sets_marker() {
        let _thelock = setup::lock_and_init();
        let session = posix_start(0).unwrap();
        assert_eq!(info_entry("posix"), Some(0));
        assert_eq!(info_entry("no-such-feature"), None);
        assert_eq!(session.status().code(), 0);

        register_info_entry("test-feature", 2);
        assert_eq!(info_entry("test-feature"), Some(2));
    }
}

//! Persistent session behavior: state across inputs, error recovery, and
//! result reporting.

use bxscript::{ErrorKind, NoPrint, Object, ReplSession};
use pretty_assertions::assert_eq;

fn execute(session: &mut ReplSession, code: &str) -> Object {
    session.execute(code, &mut NoPrint).expect("execution failure")
}

#[test]
fn variables_persist_across_inputs() {
    let mut session = ReplSession::new();
    execute(&mut session, "let a = 10;");
    execute(&mut session, "let b = 20;");
    assert_eq!(execute(&mut session, "a + b;"), Object::Number(30.0));
}

#[test]
fn declarations_return_null_expressions_return_values() {
    let mut session = ReplSession::new();
    assert_eq!(execute(&mut session, "let x = 42;"), Object::Null);
    assert_eq!(execute(&mut session, "x;"), Object::Number(42.0));
    assert_eq!(execute(&mut session, "x * 2;"), Object::Number(84.0));
}

#[test]
fn functions_defined_then_called_later() {
    let mut session = ReplSession::new();
    execute(&mut session, "function double(n) { return n * 2; }");
    assert_eq!(execute(&mut session, "double(21);"), Object::Number(42.0));
}

#[test]
fn closures_survive_between_inputs() {
    let mut session = ReplSession::new();
    execute(
        &mut session,
        "function counter() { let n = 0; return function() { n += 1; return n; }; } let tick = counter();",
    );
    execute(&mut session, "tick();");
    execute(&mut session, "tick();");
    assert_eq!(execute(&mut session, "tick();"), Object::Number(3.0));
}

#[test]
fn prototype_changes_persist() {
    let mut session = ReplSession::new();
    execute(&mut session, r#"String.prototype.shout = function() { return this + "!"; };"#);
    assert_eq!(execute(&mut session, r#""hey".shout();"#), Object::String("hey!".to_owned()));
}

#[test]
fn redeclaring_a_global_across_inputs_is_still_an_error() {
    let mut session = ReplSession::new();
    execute(&mut session, "let x = 1;");
    let err = session.execute("let x = 2;", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn errors_do_not_poison_the_session() {
    let mut session = ReplSession::new();
    execute(&mut session, "let ok = 1;");
    let err = session.execute("ghost;", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameError);
    assert_eq!(execute(&mut session, "ok;"), Object::Number(1.0));
}

#[test]
fn parse_errors_surface_before_execution() {
    let mut session = ReplSession::new();
    execute(&mut session, "let n = 0;");
    let err = session.execute("n +;", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParseError);
    // nothing executed, state unchanged
    assert_eq!(execute(&mut session, "n;"), Object::Number(0.0));
}

#[test]
fn compound_values_cross_the_boundary_as_snapshots() {
    let mut session = ReplSession::new();
    let result = execute(&mut session, r#"let o = {n: 1, tags: ["a", "b"]}; o;"#);
    assert_eq!(
        result,
        Object::Record(vec![
            ("n".to_owned(), Object::Number(1.0)),
            (
                "tags".to_owned(),
                Object::Array(vec![Object::String("a".to_owned()), Object::String("b".to_owned())]),
            ),
        ])
    );
}

#[test]
fn host_values_can_seed_globals() {
    let mut session = ReplSession::new();
    session.set_global(
        "input",
        &Object::Record(vec![("limit".to_owned(), Object::Number(3.0))]),
    );
    assert_eq!(execute(&mut session, "input.limit * 2;"), Object::Number(6.0));
}

#[test]
fn global_inspection_sees_current_values() {
    let mut session = ReplSession::new();
    execute(&mut session, "let hits = 0;");
    execute(&mut session, "hits = 7;");
    assert_eq!(session.global("hits"), Some(Object::Number(7.0)));
    assert_eq!(session.global("missing"), None);
}

#[test]
fn dropped_structures_do_not_poison_later_inputs() {
    let mut session = ReplSession::new();
    execute(&mut session, "let scratch = null;");
    // build and drop a large structure repeatedly; collection runs between
    // inputs and the session keeps working
    for _ in 0..5 {
        execute(
            &mut session,
            "scratch = [];
             for (let i = 0; i < 1000; i++) { scratch.push([i, i, i]); }
             scratch = null;",
        );
    }
    assert_eq!(execute(&mut session, "scratch;"), Object::Null);
    assert_eq!(execute(&mut session, "1 + 1;"), Object::Number(2.0));
}

#[test]
fn reset_clears_pending_async_work() {
    let mut session = ReplSession::new();
    execute(&mut session, "Thread.invoke(function() { 1; }, 5000);");
    assert!(session.should_keep_alive());
    session.reset();
    // the worker may still be sleeping, but the queue and counter are clear
    assert!(!session.should_keep_alive());
}

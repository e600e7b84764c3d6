//! Module loading: path resolution, caching, and error reporting.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use bxscript::{CollectStringPrint, ErrorKind, NoPrint, Object, ReplSession, Runner};
use pretty_assertions::assert_eq;

static DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A fresh directory tree (with a `lib/` subdirectory) for one test.
fn module_root() -> PathBuf {
    let unique = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("bxscript-module-tests-{}-{unique}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("lib")).expect("create module dir");
    dir
}

#[test]
fn std_imports_resolve_under_lib() {
    let root = module_root();
    fs::write(
        root.join("lib/math.bx"),
        "let PI = 3.14; function double(x){ return x*2; }",
    )
    .unwrap();

    let mut runner = Runner::new("import std.math as m; m.double(10) + m.PI;", "test.bx").unwrap();
    runner.set_module_root(&root);
    assert_eq!(runner.run(&mut NoPrint).unwrap(), Object::Number(23.14));
}

#[test]
fn plain_imports_resolve_under_the_root() {
    let root = module_root();
    fs::write(root.join("util.bx"), r#"function greet(name) { return "hi " + name; }"#).unwrap();

    let mut runner = Runner::new(r#"import util as u; u.greet("bx");"#, "test.bx").unwrap();
    runner.set_module_root(&root);
    assert_eq!(runner.run(&mut NoPrint).unwrap(), Object::String("hi bx".to_owned()));
}

#[test]
fn nested_paths_become_directories() {
    let root = module_root();
    fs::create_dir_all(root.join("app/tools")).unwrap();
    fs::write(root.join("app/tools/fmt.bx"), "function dash(s){ return \"-\" + s; }").unwrap();

    let mut runner = Runner::new(r#"import app.tools.fmt as fmt; fmt.dash("x");"#, "test.bx").unwrap();
    runner.set_module_root(&root);
    assert_eq!(runner.run(&mut NoPrint).unwrap(), Object::String("-x".to_owned()));
}

#[test]
fn module_exports_every_top_level_binding() {
    let root = module_root();
    fs::write(root.join("cfg.bx"), "let name = \"app\"; let version = 2; function id(x){ return x; }").unwrap();

    let mut runner = Runner::new("import cfg as c; c.name + c.version + c.id(\"!\");", "test.bx").unwrap();
    runner.set_module_root(&root);
    assert_eq!(runner.run(&mut NoPrint).unwrap(), Object::String("app2!".to_owned()));
}

#[test]
fn reimports_reuse_the_cached_module_object() {
    let root = module_root();
    fs::write(root.join("noisy.bx"), r#"IO.println("loaded"); let marker = 1;"#).unwrap();

    let mut session = ReplSession::new();
    session.set_module_root(&root);
    let mut print = CollectStringPrint::new();
    session.execute("import noisy as a;", &mut print).unwrap();
    session.execute("import noisy as b;", &mut print).unwrap();
    // the module body ran once; both aliases see the same object
    assert_eq!(print.output(), "loaded\n");
    assert_eq!(session.execute("a == b;", &mut print).unwrap(), Object::Bool(true));
}

#[test]
fn missing_modules_are_module_errors() {
    let root = module_root();
    let mut runner = Runner::new("import nope as n; 1;", "test.bx").unwrap();
    runner.set_module_root(&root);
    let err = runner.run(&mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ModuleError);
    assert!(err.message.contains("nope"));
}

#[test]
fn module_parse_failures_name_the_module() {
    let root = module_root();
    fs::write(root.join("broken.bx"), "let = ;").unwrap();

    let mut runner = Runner::new("import broken as b; 1;", "test.bx").unwrap();
    runner.set_module_root(&root);
    let err = runner.run(&mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ModuleError);
    assert!(err.message.contains("broken"));
}

#[test]
fn module_runtime_failures_name_the_module() {
    let root = module_root();
    fs::write(root.join("crash.bx"), "ghost;").unwrap();

    let mut runner = Runner::new("import crash as c; 1;", "test.bx").unwrap();
    runner.set_module_root(&root);
    let err = runner.run(&mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ModuleError);
    assert!(err.message.contains("crash") && err.message.contains("ghost"));
}

#[test]
fn module_errors_are_catchable_from_the_repl() {
    let root = module_root();
    let mut session = ReplSession::new();
    session.set_module_root(&root);
    // the import itself fails the program, but a later line still works
    let err = session.execute("import gone as g;", &mut NoPrint).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ModuleError);
    assert_eq!(session.execute("2 + 2;", &mut NoPrint).unwrap(), Object::Number(4.0));
}

#[test]
fn modules_see_the_standard_globals() {
    let root = module_root();
    fs::write(root.join("mathy.bx"), "function max3(a, b, c) { return Math.max(a, b, c); }").unwrap();

    let mut runner = Runner::new("import mathy as m; m.max3(1, 9, 4);", "test.bx").unwrap();
    runner.set_module_root(&root);
    assert_eq!(runner.run(&mut NoPrint).unwrap(), Object::Number(9.0));
}

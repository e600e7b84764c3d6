//! Parser and lexer boundary tests: what is accepted, what is rejected, and
//! that rejections happen before any code runs.

use bxscript::{ErrorKind, Runner};

fn parse_err(code: &str) -> bxscript::CompileError {
    Runner::new(code, "test.bx").expect_err("expected a compile error")
}

fn parses(code: &str) {
    Runner::new(code, "test.bx").expect("expected code to parse");
}

#[test]
fn plain_statements_parse() {
    parses("let a = 1, b; a = b;");
    parses("if (a) { b(); } else if (c) { d(); } else { e(); }");
    parses("for (let i = 0; i < 10; i++) { continue; }");
    parses("for (let k in obj) { break; }");
    parses("while (x) { x = x - 1; }");
    parses("try { f(); } catch (e) { g(e); } finally { h(); }");
    parses("function f(a, b) { return a + b; }");
    parses("let f = function(a) { return a; };");
    parses("let o = {a: 1, \"b\": 2, 3: 4,};");
    parses("let xs = [1, \"two\", [3]];");
    parses("a ? b : c;");
    parses("x.y[0](1, 2).z;");
    parses("delete o.k;");
}

#[test]
fn semicolons_are_lenient() {
    parses("let a = 1\nlet b = 2");
    parses("a = 1; b = 2;");
}

#[test]
fn return_outside_function_is_rejected() {
    let err = parse_err("return 1;");
    assert_eq!(err.kind, ErrorKind::ParseError);
}

#[test]
fn return_inside_loop_inside_function_is_fine() {
    parses("function f() { for (;;) { return 1; } }");
    parses("function f() { while (true) { return 1; } }");
}

#[test]
fn break_and_continue_need_a_loop() {
    assert_eq!(parse_err("break;").kind, ErrorKind::ParseError);
    assert_eq!(parse_err("continue;").kind, ErrorKind::ParseError);
    // a function body does not inherit the surrounding loop context
    assert_eq!(parse_err("for (;;) { let f = function() { break; }; }").kind, ErrorKind::ParseError);
}

#[test]
fn function_statement_requires_a_name() {
    let err = parse_err("function (a) { return a; }");
    assert!(err.message.contains("name"));
}

#[test]
fn import_requires_alias_and_semicolon() {
    assert_eq!(parse_err("import std.math;").kind, ErrorKind::ParseError);
    assert_eq!(parse_err("import std.math as m").kind, ErrorKind::ParseError);
    parses("import std.math as m;");
}

#[test]
fn try_requires_catch() {
    let err = parse_err("try { a(); } finally { b(); }");
    assert!(err.message.contains("catch"));
}

#[test]
fn assignment_target_must_be_assignable() {
    assert_eq!(parse_err("1 = 2;").kind, ErrorKind::ParseError);
    assert_eq!(parse_err("f() = 2;").kind, ErrorKind::ParseError);
    assert_eq!(parse_err("1++;").kind, ErrorKind::ParseError);
}

#[test]
fn lex_errors_are_fatal() {
    assert_eq!(parse_err("let s = \"abc").kind, ErrorKind::LexError);
    assert_eq!(parse_err("let x = #;").kind, ErrorKind::LexError);
}

#[test]
fn lex_error_reports_position() {
    let err = parse_err("let a = 1;\nlet x = @;");
    assert_eq!(err.kind, ErrorKind::LexError);
    assert_eq!(err.line, 2);
}

#[test]
fn deep_nesting_is_rejected_not_a_crash() {
    let mut code = String::from("let x = ");
    for _ in 0..500 {
        code.push('(');
    }
    code.push('1');
    for _ in 0..500 {
        code.push(')');
    }
    code.push(';');
    let err = parse_err(&code);
    assert!(err.message.contains("nesting"));
}

#[test]
fn unterminated_block_is_reported() {
    let err = parse_err("if (a) { b();");
    assert!(err.message.contains('}'));
}

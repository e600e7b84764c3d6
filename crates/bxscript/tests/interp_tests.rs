//! End-to-end evaluator tests: each runs a source program and checks the
//! value of its last expression statement.

use bxscript::{ErrorKind, NoPrint, Object, Runner};
use pretty_assertions::assert_eq;

fn eval(code: &str) -> Object {
    Runner::new(code, "test.bx")
        .expect("parse failure")
        .run(&mut NoPrint)
        .expect("runtime failure")
}

fn eval_err(code: &str) -> bxscript::Exception {
    Runner::new(code, "test.bx")
        .expect("parse failure")
        .run(&mut NoPrint)
        .expect_err("expected a runtime error")
}

fn num(n: f64) -> Object {
    Object::Number(n)
}

fn s(text: &str) -> Object {
    Object::String(text.to_owned())
}

// ----- arithmetic and operators -----

#[test]
fn sum_loop() {
    let code = "let sum = 0; for (let i = 0; i < 10; i++) { sum = sum + i; } sum;";
    assert_eq!(eval(code), num(45.0));
}

#[test]
fn arithmetic_is_double_precision() {
    assert_eq!(eval("0.1 + 0.2;"), num(0.1 + 0.2));
    assert_eq!(eval("7 % 3;"), num(1.0));
    assert_eq!(eval("2 * 3.5;"), num(7.0));
    assert_eq!(eval("-5 / 2;"), num(-2.5));
}

#[test]
fn division_by_zero_raises() {
    let err = eval_err("1 / 0;");
    assert_eq!(err.kind, ErrorKind::ArithmeticError);
    assert!(err.message.contains("division by zero"));
}

#[test]
fn string_concatenation_coerces_the_other_side() {
    assert_eq!(eval(r#""a" + "b";"#), s("ab"));
    assert_eq!(eval(r#""n=" + 3;"#), s("n=3"));
    assert_eq!(eval(r#"3.14 + "";"#), s("3.14"));
    assert_eq!(eval(r#"null + "!";"#), s("null!"));
    assert_eq!(eval(r#"[1, 2] + "";"#), s("[1, 2]"));
}

#[test]
fn relational_operators_require_numbers() {
    assert_eq!(eval("1 < 2;"), Object::Bool(true));
    assert_eq!(eval("2 <= 2;"), Object::Bool(true));
    assert_eq!(eval("3 > 4;"), Object::Bool(false));
    let err = eval_err(r#""a" < "b";"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    assert_eq!(eval(r#"0 || "fallback";"#), s("fallback"));
    assert_eq!(eval("1 && 2;"), num(2.0));
    assert_eq!(eval("0 && f();"), num(0.0)); // short-circuit: f is never called
    assert_eq!(eval(r#""" || 7;"#), num(7.0));
}

#[test]
fn ternary_evaluates_only_the_taken_branch() {
    assert_eq!(eval("1 ? 2 : boom();"), num(2.0));
    assert_eq!(eval("0 ? boom() : 3;"), num(3.0));
}

#[test]
fn increment_and_decrement() {
    assert_eq!(eval("let i = 5; i++;"), num(5.0));
    assert_eq!(eval("let i = 5; i++; i;"), num(6.0));
    assert_eq!(eval("let i = 5; ++i;"), num(6.0));
    assert_eq!(eval("let i = 5; --i;"), num(4.0));
    assert_eq!(eval("let o = {n: 1}; o.n++; o.n;"), num(2.0));
    assert_eq!(eval("let a = [1]; a[0]++; a[0];"), num(2.0));
}

#[test]
fn compound_assignment() {
    assert_eq!(eval("let x = 10; x += 5; x;"), num(15.0));
    assert_eq!(eval("let x = 10; x -= 4; x *= 2; x /= 3; x;"), num(4.0));
    assert_eq!(eval("let o = {n: 7}; o.n %= 4; o.n;"), num(3.0));
    assert_eq!(eval(r#"let t = "a"; t += "b"; t;"#), s("ab"));
}

#[test]
fn comma_expression_evaluates_left_to_right() {
    assert_eq!(eval("let x = 0; x = 1, x = 2, x + 1;"), num(3.0));
}

// ----- functions and closures -----

#[test]
fn recursive_fibonacci() {
    let code = "function fib(n){ if (n<=1) { return n; } return fib(n-1)+fib(n-2); } fib(10);";
    assert_eq!(eval(code), num(55.0));
}

#[test]
fn closures_capture_their_environment() {
    let code = "function makeAdder(x){ return function(y){ return x+y; }; } makeAdder(5)(10);";
    assert_eq!(eval(code), num(15.0));
}

#[test]
fn closures_share_mutable_state() {
    let code = "
        function counter() {
            let n = 0;
            return function() { n = n + 1; return n; };
        }
        let next = counter();
        next(); next(); next();
    ";
    assert_eq!(eval(code), num(3.0));
}

#[test]
fn function_statements_are_hoisted() {
    let code = "let r = early(); function early() { return 42; } r;";
    assert_eq!(eval(code), num(42.0));
}

#[test]
fn missing_arguments_are_null_and_extras_dropped() {
    assert_eq!(eval("function f(a, b) { return b; } f(1);"), Object::Null);
    assert_eq!(eval("function f(a) { return a; } f(1, 2, 3);"), num(1.0));
}

#[test]
fn function_without_return_yields_null() {
    assert_eq!(eval("function f() { 1 + 1; } f();"), Object::Null);
}

#[test]
fn calling_a_non_function_raises() {
    let err = eval_err("let x = 3; x();");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn runaway_recursion_is_a_catchable_error() {
    let err = eval_err("function f() { return f(); } f();");
    assert_eq!(err.kind, ErrorKind::RangeError);
    let caught = eval("function f() { return f(); } let m = 0; try { f(); } catch (e) { m = e; } m;");
    let Object::String(message) = caught else {
        panic!("expected the error message string, got {caught:?}")
    };
    assert!(message.contains("stack overflow"));
}

// ----- scoping -----

#[test]
fn redeclaration_in_same_scope_raises() {
    let err = eval_err("let x = 1; let x = 2;");
    assert_eq!(err.kind, ErrorKind::NameError);
    assert!(err.message.contains("redefined"));
}

#[test]
fn shadowing_in_inner_block_is_allowed() {
    assert_eq!(eval("let x = 1; { let x = 2; } x;"), num(1.0));
}

#[test]
fn undeclared_use_raises() {
    let err = eval_err("ghost;");
    assert_eq!(err.kind, ErrorKind::NameError);
    assert!(err.message.contains("undefined"));
}

#[test]
fn name_errors_are_catchable() {
    let code = r#"let m = ""; try { ghost; } catch (e) { m = e; } m;"#;
    let Object::String(message) = eval(code) else {
        panic!("expected string")
    };
    assert!(message.contains("ghost"));
}

#[test]
fn loop_body_lets_do_not_collide_across_iterations() {
    let code = "let total = 0; for (let i = 0; i < 3; i++) { let t = i * 2; total += t; } total;";
    assert_eq!(eval(code), num(6.0));
}

// ----- control flow -----

#[test]
fn break_exits_and_continue_skips_to_update() {
    let code = "let n = 0; for (let i = 0; i < 10; i++) { if (i == 5) { break; } n = i; } n;";
    assert_eq!(eval(code), num(4.0));
    let evens = "let n = 0; for (let i = 0; i < 6; i++) { if (i % 2 == 1) { continue; } n += i; } n;";
    assert_eq!(eval(evens), num(6.0));
}

#[test]
fn while_loops_desugar_to_for() {
    assert_eq!(eval("let n = 0; while (n < 5) { n++; } n;"), num(5.0));
}

#[test]
fn for_in_over_object_yields_keys_in_insertion_order() {
    let code = r#"let o = {b: 1, a: 2, c: 3}; let ks = ""; for (let k in o) { ks += k; } ks;"#;
    assert_eq!(eval(code), s("bac"));
}

#[test]
fn for_in_over_array_yields_indices_as_numbers() {
    let code = "let total = 0; for (let i in [10, 20, 30]) { total += i; } total;";
    assert_eq!(eval(code), num(3.0));
}

#[test]
fn return_propagates_through_loops_and_blocks() {
    let code = "function f() { for (let i = 0; i < 10; i++) { if (i == 3) { return i; } } } f();";
    assert_eq!(eval(code), num(3.0));
}

// ----- exceptions -----

#[test]
fn thrown_value_reaches_catch_verbatim() {
    let code = "let res=0; try { throw 100; res=1; } catch(e){ res=e; } res;";
    assert_eq!(eval(code), num(100.0));
}

#[test]
fn throw_can_carry_any_value() {
    let code = "let res = null; try { throw {code: 7}; } catch (e) { res = e.code; } res;";
    assert_eq!(eval(code), num(7.0));
}

#[test]
fn finally_runs_on_every_path() {
    let normal = "let log = 0; try { log += 1; } catch (e) {} finally { log += 10; } log;";
    assert_eq!(eval(normal), num(11.0));
    let raised = "let log = 0; try { throw 1; } catch (e) { log += 1; } finally { log += 10; } log;";
    assert_eq!(eval(raised), num(11.0));
    let through_return = "
        let log = 0;
        function f() { try { return 1; } catch (e) {} finally { log = 5; } }
        let r = f();
        r + log;
    ";
    assert_eq!(eval(through_return), num(6.0));
}

#[test]
fn uncaught_throw_aborts_with_its_payload() {
    let err = eval_err(r#"throw "boom";"#);
    assert_eq!(err.kind, ErrorKind::UserThrow);
    assert_eq!(err.message, "boom");
}

#[test]
fn host_errors_are_strings_in_catch() {
    let code = "let m = null; try { 1 / 0; } catch (e) { m = e; } m;";
    let Object::String(message) = eval(code) else {
        panic!("expected string")
    };
    assert!(message.starts_with("ArithmeticError"));
}

// ----- values, equality, display -----

#[test]
fn structural_equality_for_arrays_and_objects() {
    assert_eq!(eval("let a=[1,2,3,4]; let b=[1,2,3,4]; a==b;"), Object::Bool(true));
    assert_eq!(eval(r#"let c={sex:1,name:"b"}; let d={name:"b",sex:1}; c==d;"#), Object::Bool(true));
    assert_eq!(eval("[1, [2]] == [1, [2]];"), Object::Bool(true));
    assert_eq!(eval("[1, 2] == [1, 2, 3];"), Object::Bool(false));
    assert_eq!(eval("({a: 1}) == {a: 2};"), Object::Bool(false));
}

#[test]
fn equality_and_inequality_are_complementary() {
    for code in ["1 == 1;", r#""x" == "x";"#, "[1] == [1];", "null == null;", "1 == 2;"] {
        let eq = eval(code);
        let ne = eval(&code.replace("==", "!="));
        assert_eq!(eq, Object::Bool(ne == Object::Bool(false)), "for {code}");
    }
}

#[test]
fn cross_kind_equality_is_false() {
    assert_eq!(eval(r#"1 == "1";"#), Object::Bool(false));
    assert_eq!(eval("0 == null;"), Object::Bool(false));
    assert_eq!(eval("0 == false;"), Object::Bool(false));
}

#[test]
fn functions_compare_by_identity() {
    assert_eq!(eval("function f(){} let g = f; f == g;"), Object::Bool(true));
    assert_eq!(eval("let a = function(){}; let b = function(){}; a == b;"), Object::Bool(false));
}

#[test]
fn display_strings_are_fixed() {
    assert_eq!(eval(r#"[1, 2, 3] + "";"#), s("[1, 2, 3]"));
    assert_eq!(eval(r#"({}) + "";"#), s("[object Object]"));
    assert_eq!(eval(r#"function f(){} f + "";"#), s("[function]"));
    assert_eq!(eval(r#"IO.println + "";"#), s("[native code]"));
    assert_eq!(eval(r#"10 + "";"#), s("10"));
    assert_eq!(eval(r#"3.14 + "";"#), s("3.14"));
}

#[test]
fn truthiness_follows_kind_rules() {
    assert_eq!(eval(r#"!"";"#), Object::Bool(true));
    assert_eq!(eval("![];"), Object::Bool(true));
    assert_eq!(eval("!{};"), Object::Bool(true));
    assert_eq!(eval("!{a: 0};"), Object::Bool(false));
    assert_eq!(eval("!0;"), Object::Bool(true));
    assert_eq!(eval("!null;"), Object::Bool(true));
    assert_eq!(eval("!function(){};"), Object::Bool(false));
}

// ----- arrays -----

#[test]
fn out_of_range_reads_are_null_and_writes_zero_fill() {
    assert_eq!(eval("let a = [1]; a[5];"), Object::Null);
    assert_eq!(eval("let a = []; a[3] = 9; a.length;"), num(4.0));
    assert_eq!(eval("let a = []; a[3] = 9; a[1];"), Object::Null);
    assert_eq!(eval("let a = []; a[2] = 7; a[2];"), num(7.0));
}

#[test]
fn array_indices_parse_a_numeric_prefix() {
    // a negative index lands far out of range and reads as Null
    assert_eq!(eval("let a = [1, 2, 3]; a[-1];"), Object::Null);
    assert_eq!(eval(r#"let a = [1, 2, 3]; a["-7"];"#), Object::Null);
    // trailing characters after the digits are ignored
    assert_eq!(eval(r#"let a = [7, 8, 9]; a["1junk"];"#), num(8.0));
    // writing at a negative index would be a negative resize
    let err = eval_err("let a = [1]; a[-1] = 0;");
    assert_eq!(err.kind, ErrorKind::RangeError);
}

#[test]
fn array_methods() {
    assert_eq!(eval("let a = [1, 2]; a.push(3, 4);"), num(4.0));
    assert_eq!(eval("let a = [1, 2]; a.pop(); a.length;"), num(1.0));
    assert_eq!(eval("let a = [1, 2, 3]; a.shift();"), num(1.0));
    assert_eq!(eval("let a = [2]; a.unshift(0, 1); a[1];"), num(1.0));
    assert_eq!(eval("[1, 2].concat([3], 4).length;"), num(4.0));
    assert_eq!(eval(r#"[1, 2, 3].join("-");"#), s("1-2-3"));
    assert_eq!(eval("[1, 2, 3].join();"), s("1,2,3"));
    assert_eq!(eval("let a = [1, 3]; a.insert(1, 2); a[1];"), num(2.0));
    assert_eq!(eval("let a = [1, 2, 3, 4]; a.remove(1, 2); a.length;"), num(2.0));
    assert_eq!(eval("[0, 1, 2, 3].slice(1, 3).length;"), num(2.0));
    assert_eq!(eval("[0, 1, 2, 3].slice(-2)[0];"), num(2.0));
    assert_eq!(eval("[5, 6, 7].indexOf(6);"), num(1.0));
    assert_eq!(eval("[5, 6, 7].indexOf(9);"), num(-1.0));
    assert_eq!(eval("[[1], [2]].indexOf([2]);"), num(1.0));
    assert_eq!(eval("[1, 2, 1].lastIndexOf(1);"), num(2.0));
}

#[test]
fn array_insert_out_of_range_raises() {
    let err = eval_err("[1].insert(5, 0);");
    assert_eq!(err.kind, ErrorKind::RangeError);
}

#[test]
fn arrays_share_references() {
    let code = "let a = [1]; let b = a; b.push(2); a.length;";
    assert_eq!(eval(code), num(2.0));
}

// ----- strings -----

#[test]
fn string_methods_work_in_code_points() {
    assert_eq!(eval(r#""HELLO".indexOf("E");"#), num(1.0));
    assert_eq!(eval(r#""HELLO".endsWith("O");"#), Object::Bool(true));
    assert_eq!(eval(r#""HELLO".startsWith("HE");"#), Object::Bool(true));
    assert_eq!(eval(r#""abcabc".lastIndexOf("b");"#), num(4.0));
    assert_eq!(eval(r#""A".charCodeAt(0);"#), num(65.0));
    assert_eq!(eval(r#""hello".substr(1, 3);"#), s("el"));
    assert_eq!(eval(r#""héllo".length;"#), num(5.0));
    assert_eq!(eval(r#""héllo"[1];"#), s("é"));
    assert_eq!(eval(r#""abc"[10];"#), Object::Null);
}

#[test]
fn string_from_char_code() {
    assert_eq!(eval("String.fromCharCode(65);"), s("A"));
    assert_eq!(eval("String.fromCharCode(72, 105);"), s("Hi"));
}

#[test]
fn strings_are_immutable() {
    let err = eval_err(r#"let t = "abc"; t[0] = "x";"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
}

// ----- numbers -----

#[test]
fn to_fixed_and_to_string() {
    assert_eq!(eval("(3.14159).toFixed(2);"), s("3.14"));
    assert_eq!(eval("(2).toFixed(0);"), s("2"));
    assert_eq!(eval("(2.5).toString();"), s("2.5"));
    assert_eq!(eval("(10).toString();"), s("10"));
}

#[test]
fn to_fixed_precision_is_range_checked() {
    let err = eval_err("(1.5).toFixed(101);");
    assert_eq!(err.kind, ErrorKind::RangeError);
}

#[test]
fn number_prototype_constants_are_reachable() {
    assert_eq!(eval("(0).MAX_VALUE > 0;"), Object::Bool(true));
    assert_eq!(eval("(0).MIN_VALUE > 0;"), Object::Bool(true));
}

// ----- objects and prototypes -----

#[test]
fn object_member_access_and_bracket_coercion() {
    assert_eq!(eval("let o = {a: 1}; o.a;"), num(1.0));
    assert_eq!(eval(r#"let o = {a: 1}; o["a"];"#), num(1.0));
    assert_eq!(eval("let o = {}; o[1 + 1] = 9; o[\"2\"];"), num(9.0));
    assert_eq!(eval("let o = {}; o.missing;"), Object::Null);
}

#[test]
fn duplicate_object_literal_keys_last_wins() {
    assert_eq!(eval("let o = {a: 1, a: 2}; o.a;"), num(2.0));
}

#[test]
fn object_keys_and_remove() {
    assert_eq!(eval("Object.keys({a:1,b:2}).length;"), num(2.0));
    assert_eq!(eval("Object.keys({b:1,a:2})[0];"), s("b"));
    assert_eq!(eval(r#"let o = {a:1,b:2}; Object.remove(o, "a"); Object.keys(o).length;"#), num(1.0));
}

#[test]
fn delete_removes_own_properties() {
    assert_eq!(eval("let o = {a: 1}; delete o.a;"), Object::Bool(true));
    assert_eq!(eval("let o = {a: 1}; delete o.b;"), Object::Bool(false));
    assert_eq!(eval("let o = {a: 1}; delete o.a; o.a;"), Object::Null);
    assert_eq!(eval(r#"let o = {xy: 1}; delete o["xy"]; Object.keys(o).length;"#), num(0.0));
}

#[test]
fn prototype_methods_bind_this_to_the_receiver() {
    let code = r#"String.prototype.hello=function(){return this+" hi";}; "b".hello();"#;
    assert_eq!(eval(code), s("b hi"));
}

#[test]
fn prototype_writes_are_visible_on_existing_values() {
    let code = "
        let o = {x: 5};
        Object.prototype.getX = function() { return this.x; };
        o.getX();
    ";
    assert_eq!(eval(code), num(5.0));
}

#[test]
fn array_prototype_extension() {
    let code = "
        Array.prototype.first = function() { return this[0]; };
        [7, 8, 9].first();
    ";
    assert_eq!(eval(code), num(7.0));
}

#[test]
fn number_prototype_extension() {
    let code = "
        Number.prototype.double = function() { return this * 2; };
        (21).double();
    ";
    assert_eq!(eval(code), num(42.0));
}

#[test]
fn missing_object_property_stays_null_after_proto_miss() {
    assert_eq!(eval("({a: 1}).nothing;"), Object::Null);
}

#[test]
fn this_outside_any_binding_is_a_name_error() {
    let err = eval_err("this;");
    assert_eq!(err.kind, ErrorKind::NameError);
}

// ----- misc -----

#[test]
fn program_result_is_last_expression_statement() {
    assert_eq!(eval("let a = 1;"), Object::Null);
    assert_eq!(eval("1; 2; let b = 3;"), num(2.0));
    assert_eq!(eval("if (1) { 5; }"), Object::Null);
}

#[test]
fn string_escapes_keep_backslashes_verbatim() {
    // the two-character sequence backslash-n, not a newline
    assert_eq!(eval(r#""a\nb".length;"#), num(4.0));
    assert_eq!(eval(r#""say \"hi\"";"#), s("say \"hi\""));
}

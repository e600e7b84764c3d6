//! Standard-library module surface tests.

use bxscript::{CollectStringPrint, ErrorKind, NoPrint, Object, Runner};
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

// ----- IO -----

#[test]
fn println_joins_arguments_with_comma_space() {
    let runner = Runner::new(r#"IO.println("a", 1, [2, 3]);"#, "test.bx").unwrap();
    let mut print = CollectStringPrint::new();
    runner.run(&mut print).unwrap();
    assert_eq!(print.output(), "a, 1, [2, 3]\n");
}

// ----- Math -----

#[test]
fn math_basics() {
    assert_eq!(eval("Math.abs(-3);"), num(3.0));
    assert_eq!(eval("Math.floor(2.9);"), num(2.0));
    assert_eq!(eval("Math.ceil(2.1);"), num(3.0));
    assert_eq!(eval("Math.round(2.5);"), num(3.0));
    assert_eq!(eval("Math.pow(2, 10);"), num(1024.0));
    assert_eq!(eval("Math.sqrt(81);"), num(9.0));
    assert_eq!(eval("Math.min(3, 1, 2);"), num(1.0));
    assert_eq!(eval("Math.max(3, 1, 2);"), num(3.0));
    assert_eq!(eval("Math.log(1);"), num(0.0));
}

#[test]
fn math_pi_is_a_constant() {
    let Object::Number(pi) = eval("Math.PI;") else {
        panic!("expected a number")
    };
    assert!((pi - std::f64::consts::PI).abs() < 1e-15);
}

#[test]
fn math_random_is_in_unit_interval() {
    for _ in 0..20 {
        let Object::Number(r) = eval("Math.random();") else {
            panic!("expected a number")
        };
        assert!((0.0..1.0).contains(&r));
    }
}

#[test]
fn math_is_lenient_about_argument_kinds() {
    assert_eq!(eval(r#"Math.abs("x");"#), Object::Null);
    assert_eq!(eval("Math.pow(2);"), Object::Null);
}

// ----- Json -----

#[test]
fn json_parse_maps_onto_runtime_values() {
    assert_eq!(eval(r#"Json.parse("{\"a\": [1, 2]}").a.length;"#), num(2.0));
    assert_eq!(eval(r#"Json.parse("null");"#), Object::Null);
    assert_eq!(eval(r#"Json.parse("true");"#), Object::Bool(true));
    assert_eq!(eval(r#"Json.parse("\"txt\"");"#), s("txt"));
    assert_eq!(eval(r#"Json.parse("3.5");"#), num(3.5));
}

#[test]
fn json_stringify_round_trips() {
    assert_eq!(eval(r#"Json.stringify({a: 1, b: [true, null]});"#), s(r#"{"a":1,"b":[true,null]}"#));
    assert_eq!(eval(r#"Json.parse(Json.stringify({x: "y"})).x;"#), s("y"));
}

#[test]
fn json_errors_are_catchable() {
    assert_eq!(eval_err(r#"Json.parse("{nope");"#).kind, ErrorKind::HostError);
    assert_eq!(eval_err("Json.stringify(function(){});").kind, ErrorKind::TypeError);
    assert_eq!(eval_err("Json.parse(42);").kind, ErrorKind::TypeError);
}

// ----- Date -----

#[test]
fn date_now_is_epoch_milliseconds() {
    let Object::Number(now) = eval("Date.now();") else {
        panic!("expected a number")
    };
    // after 2020, before 2100
    assert!(now > 1.577e12 && now < 4.1e12);
}

#[test]
fn date_from_and_format() {
    assert_eq!(eval(r#"Date.from("2025-12-09 10:20:30").format("HH:mm:ss");"#), s("10:20:30"));
    assert_eq!(
        eval(r#"Date.from("2025-12-09 10:20:30").format("yyyy-MM-dd HH:mm:ss");"#),
        s("2025-12-09 10:20:30")
    );
    assert_eq!(eval(r#"Date.from("2025-12-09").format("dd");"#), s("09"));
}

#[test]
fn date_from_rejects_garbage() {
    assert_eq!(eval_err(r#"Date.from("not a date");"#).kind, ErrorKind::HostError);
}

#[test]
fn date_format_renders_epoch_timestamps() {
    // one day into 1970, year is 1970 in every timezone
    assert_eq!(eval(r#"Date.format(86400000, "yyyy");"#), s("1970"));
}

// ----- OS -----

#[test]
fn os_platform_is_one_of_the_known_names() {
    let Object::String(platform) = eval("OS.platform();") else {
        panic!("expected a string")
    };
    assert!(["linux", "macos", "windows"].contains(&platform.as_str()));
}

#[test]
fn os_get_env_reads_the_process_environment() {
    // SAFETY: test-local variable, no concurrent reader cares about it
    unsafe { std::env::set_var("BXSCRIPT_TEST_ENV", "42") };
    assert_eq!(eval(r#"OS.getEnv("BXSCRIPT_TEST_ENV");"#), s("42"));
    assert_eq!(eval(r#"OS.getEnv("BXSCRIPT_DEFINITELY_UNSET");"#), Object::Null);
}

#[test]
#[cfg(unix)]
fn os_exec_captures_output_and_status() {
    assert_eq!(eval(r#"OS.exec("echo hi").stdout;"#), s("hi\n"));
    assert_eq!(eval(r#"OS.exec("exit 3").code;"#), num(3.0));
}

// ----- Http (synchronous validation only; transport is covered by the
// event-loop tests' contract and needs a network) -----

#[test]
fn http_validates_arguments_synchronously() {
    assert_eq!(eval_err("Http.get(42, function(r){});").kind, ErrorKind::TypeError);
    assert_eq!(eval_err(r#"Http.get("ftp://x", function(r){});"#).kind, ErrorKind::HostError);
    assert_eq!(eval_err(r#"Http.get("http://x", 5);"#).kind, ErrorKind::TypeError);
    assert_eq!(eval_err(r#"Http.post("http://x", "body", null);"#).kind, ErrorKind::TypeError);
}

// ----- Crypt -----

#[test]
fn base64_round_trip() {
    assert_eq!(eval(r#"Crypt.encode("hi");"#), s("aGk="));
    assert_eq!(eval(r#"Crypt.decode(Crypt.encode("hello world"));"#), s("hello world"));
    assert_eq!(eval_err(r#"Crypt.decode("!!!");"#).kind, ErrorKind::HostError);
}

#[test]
fn digests_match_known_vectors() {
    assert_eq!(eval(r#"Crypt.md5("abc");"#), s("900150983cd24fb0d6963f7d28e17f72"));
    assert_eq!(
        eval(r#"Crypt.sha256("abc");"#),
        s("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
    let Object::String(mac) = eval(r#"Crypt.hmac("key", "message");"#) else {
        panic!("expected a string")
    };
    assert_eq!(mac.len(), 64);
}

// ----- Regex -----

#[test]
fn regex_match_and_replace() {
    assert_eq!(eval(r#"Regex.match("abc123", "[0-9]+");"#), Object::Bool(true));
    assert_eq!(eval(r#"Regex.match("abc", "^[0-9]+$");"#), Object::Bool(false));
    assert_eq!(eval(r#"Regex.replace("a1b2", "[0-9]", "_");"#), s("a_b_"));
}

#[test]
fn invalid_patterns_raise_host_errors() {
    assert_eq!(eval_err(r#"Regex.match("x", "(unclosed");"#).kind, ErrorKind::HostError);
}

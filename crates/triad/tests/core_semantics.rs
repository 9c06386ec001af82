//! End-to-end tests driving the evaluator through [`Runner`] the way a host
//! embedding this crate would: feed source text in, check the stringified
//! result (or the formatted uncaught-exception report) out. Mirrors the
//! seed scenarios of spec §8 plus a handful of the boundary behaviors and
//! round-trip laws listed alongside them.

use triad::{Runner, Version};

fn run_ok(version: Version, src: &str) -> String {
    let mut runner = Runner::new(version, "test.tri");
    match runner.run(src) {
        Ok(outcome) => outcome.display,
        Err(e) => panic!("expected success, got failure: {e}"),
    }
}

fn run_err(version: Version, src: &str) -> String {
    let mut runner = Runner::new(version, "test.tri");
    match runner.run(src) {
        Ok(outcome) => panic!("expected failure, got success: {}", outcome.display),
        Err(e) => e.to_string(),
    }
}

// ---- seed scenario 1: uncaught TypeError with a 4-frame source stack -----

#[test]
fn calling_a_non_function_throws_with_value_in_message() {
    let msg = run_err(
        Version::V5,
        "x = 42; function a() { x(); } function b() { a(); } function c() { b(); } c();",
    );
    assert!(msg.starts_with("TypeError: 42 is not a function"), "got: {msg}");
}

#[test]
fn uncaught_exception_carries_four_source_frames() {
    let msg = run_err(
        Version::V5,
        "x = 42; function a() { x(); } function b() { a(); } function c() { b(); } c();",
    );
    // header line + one line per stack frame
    assert_eq!(msg.lines().count(), 5, "got: {msg}");
}

// ---- seed scenario 2: try/catch doesn't disturb a `return` in `try` ------

#[test]
fn return_inside_try_is_not_overridden_by_catch() {
    let out = run_ok(Version::V3, "function f(){ try { return 42; } catch (e) { return 60; } } f();");
    assert_eq!(out, "42");
}

// ---- seed scenario 3: non-strict `arguments` aliasing is bidirectional ---

#[test]
fn arguments_object_aliases_formal_parameters_non_strict() {
    let out = run_ok(
        Version::V3,
        "function evil(x,y){ arguments[0]=56; y=78; return ''+x+','+arguments[1]; } evil(12,34);",
    );
    assert_eq!(out, "56,78");
}

#[test]
fn arguments_does_not_alias_under_v5_strict() {
    let out = run_ok(
        Version::V5,
        "function evil(x,y){ 'use strict'; arguments[0]=56; y=78; return ''+x+','+arguments[1]; } evil(12,34);",
    );
    // strict-mode arguments are plain, independent data properties: writing
    // arguments[0] does not change x, and writing y does not change
    // arguments[1].
    assert_eq!(out, "12,34");
}

// ---- seed scenario 4: labeled continue unwinds to the targeted loop ------

#[test]
fn labeled_continue_targets_the_outer_loop() {
    let out = run_ok(
        Version::V3,
        "s=''; a: for(i=0;i<3;++i){ b:for(j=0;j<4;++j){s+=i+'-'+j; continue a;} } s",
    );
    assert_eq!(out, "0-01-02-0");
}

// ---- seed scenario 5: V5 accessor properties ------------------------------

#[test]
fn v5_accessor_properties_run_getter_and_setter() {
    let out = run_ok(
        Version::V5,
        "o={get q(){return this.n;}, set q(v){this.n=v+1;}, n:1}; o.q=42; o.q;",
    );
    assert_eq!(out, "43");
}

#[test]
fn accessor_literals_do_not_parse_pre_v5() {
    let mut runner = Runner::new(Version::V3, "test.tri");
    let result = runner.run("o={get q(){return 1;}};");
    assert!(result.is_err(), "accessor property syntax should not parse under V3");
}

// ---- seed scenario 6: Array length auto-extend / truncate ----------------

#[test]
fn array_index_assignment_extends_length() {
    let out = run_ok(Version::V3, "var a=new Array(); a[5]=42; a[3]=2; a.length;");
    assert_eq!(out, "6");
}

#[test]
fn shrinking_array_length_deletes_trailing_indices() {
    let mut runner = Runner::new(Version::V3, "test.tri");
    runner.run("var a=new Array(); a[5]=42; a[3]=2;").unwrap();
    runner.run("a.length=2;").unwrap();
    let out = runner.run("a[3];").unwrap().display;
    assert_eq!(out, "undefined");
}

// ---- typeof invariant (spec §8) -------------------------------------------

#[test]
fn typeof_covers_every_primitive_and_object_kind() {
    assert_eq!(run_ok(Version::V3, "typeof undefined;"), "undefined");
    assert_eq!(run_ok(Version::V3, "typeof null;"), "object");
    assert_eq!(run_ok(Version::V3, "typeof true;"), "boolean");
    assert_eq!(run_ok(Version::V3, "typeof 1;"), "number");
    assert_eq!(run_ok(Version::V3, "typeof 'a';"), "string");
    assert_eq!(run_ok(Version::V3, "typeof {};"), "object");
    assert_eq!(run_ok(Version::V3, "typeof function(){};"), "function");
}

// ---- enumeration order and shadowing (spec §8) ----------------------------

#[test]
fn enumeration_visits_own_keys_before_prototype_and_skips_shadowed() {
    let out = run_ok(
        Version::V3,
        "function P(){} P.prototype.a='proto-a'; P.prototype.b='proto-b'; \
         var o=new P(); o.b='own-b'; o.c='own-c'; \
         var seen=''; for (var k in o) { seen += k; } seen;",
    );
    // own keys (insertion order b, c) before inherited (a); b is shadowed so
    // the prototype's `b` never appears a second time.
    assert_eq!(out, "bca");
}

// ---- boundary behaviors (spec §8) -----------------------------------------

#[test]
fn division_by_zero_and_nan_comparisons() {
    assert_eq!(run_ok(Version::V3, "1/0;"), "Infinity");
    assert_eq!(run_ok(Version::V3, "-1/0;"), "-Infinity");
    assert_eq!(run_ok(Version::V3, "0/0;"), "NaN");
    assert_eq!(run_ok(Version::V3, "var n=0/0; n==n;"), "false");
    assert_eq!(run_ok(Version::V3, "var n=0/0; n!=n;"), "true");
}

#[test]
fn new_array_with_non_integer_length_throws_range_error() {
    let msg = run_err(Version::V3, "new Array(42.5);");
    assert!(msg.starts_with("RangeError"), "got: {msg}");
}

#[test]
fn numeric_property_above_uint32_max_is_a_plain_string_key_not_length() {
    let out = run_ok(Version::V3, "var a=[]; a[4294967296]=1; a.length;");
    assert_eq!(out, "0");
}

// ---- round-trip laws (spec §8) --------------------------------------------

#[test]
fn decode_uri_undoes_encode_uri_for_well_formed_text() {
    let out = run_ok(Version::V3, "decodeURI(encodeURI('hello world/safe?ok')) === 'hello world/safe?ok';");
    assert_eq!(out, "true");
}

#[test]
fn parse_int_round_trips_through_to_string_with_radix() {
    let out = run_ok(Version::V3, "parseInt((255).toString(16), 16);");
    assert_eq!(out, "255");
}

// ---- version gating (spec §4.6) -------------------------------------------

#[test]
fn strict_equality_operator_requires_v3() {
    assert!(Runner::new(Version::V1, "t").run("1 === 1;").is_err());
    assert_eq!(run_ok(Version::V3, "1 === 1;"), "true");
}

#[test]
fn octal_literals_parse_only_pre_v5() {
    assert_eq!(run_ok(Version::V1, "010;"), "8");
    assert!(Runner::new(Version::V5, "t").run("010;").is_err());
}

#[test]
fn for_in_over_null_throws_pre_v5_and_is_a_noop_from_v5() {
    assert!(Runner::new(Version::V3, "t").run("for (var k in null) {}").is_err());
    let mut runner = Runner::new(Version::V5, "t");
    assert!(runner.run("for (var k in null) {}").is_ok());
}

#[test]
fn globals_are_writable_pre_v5_and_read_only_from_v5() {
    // pre-V5 `undefined` is a plain writable global, so reassigning it
    // sticks; V5 makes it read-only, so the original primitive survives.
    let out = run_ok(Version::V3, "undefined = 5; undefined;");
    assert_eq!(out, "5");
    let out5 = run_ok(Version::V5, "undefined = 5; undefined;");
    assert_eq!(out5, "undefined");
}

// ---- with / exceptions across finally (spec §4.3) -------------------------

#[test]
fn finally_completion_overrides_a_pending_return() {
    let out = run_ok(
        Version::V3,
        "function f(){ try { return 1; } finally { return 2; } } f();",
    );
    assert_eq!(out, "2");
}

#[test]
fn with_statement_resolves_identifiers_against_the_pushed_object() {
    let out = run_ok(Version::V3, "var o={x:10}; var x=1; with(o){ x; }");
    assert_eq!(out, "10");
}

#[test]
fn switch_falls_through_to_default_when_no_case_matches() {
    let out = run_ok(
        Version::V3,
        "var r=''; switch(5){ case 1: r+='a'; break; default: r+='d'; case 2: r+='b'; } r;",
    );
    assert_eq!(out, "db");
}

// ---- closures & scope chain -----------------------------------------------

#[test]
fn closures_capture_their_defining_scope_not_the_call_site() {
    let out = run_ok(
        Version::V3,
        "function make(n){ return function(){ return n; }; } var f = make(7); var n = 99; f();",
    );
    assert_eq!(out, "7");
}

#[test]
fn repl_style_sequential_runs_share_top_level_bindings() {
    let mut runner = Runner::new(Version::V3, "t");
    runner.run("var count = 0;").unwrap();
    runner.run("count = count + 1;").unwrap();
    let out = runner.run("count;").unwrap().display;
    assert_eq!(out, "1");
}

//! Snapshot tests for diagnostic formatting.
//!
//! Uses insta inline snapshots; run `cargo insta review` after changing a
//! message.

use insta::assert_snapshot;

use reef::ast::builder::{named, ClassSpec, FunctionSpec, ProgramBuilder};
use reef::{type_check, CheckedProgram, CheckerOptions};

fn check(b: ProgramBuilder) -> CheckedProgram {
    let program = b.finish();
    match type_check(&program, &CheckerOptions::default()) {
        Ok(checked) => checked,
        Err(e) => panic!("checker failed internally: {e}"),
    }
}

/// One line per diagnostic, with spans.
fn rendered(b: ProgramBuilder) -> String {
    check(b).errors().iter().map(|d| d.to_string()).collect::<Vec<_>>().join("\n")
}

/// One line per diagnostic, spans left out so the snapshot survives
/// changes to how programs are built.
fn messages(b: ProgramBuilder) -> String {
    check(b)
        .errors()
        .iter()
        .map(|d| format!("{}: {}", d.category(), d.error))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn undefined_symbol() {
    let mut b = ProgramBuilder::new();
    let missing = b.var("nope");
    b.push(missing);
    assert_snapshot!(rendered(b), @"name resolution error at 0..1: undefined symbol 'nope'");
}

#[test]
fn declared_type_mismatch() {
    let mut b = ProgramBuilder::new();
    let text = b.string("hello");
    let declare = b.declaration("x", false, Some(named("int")), Some(text));
    b.push(declare);
    assert_snapshot!(rendered(b), @"type mismatch error at 0..1: type mismatch: expected int, found string");
}

#[test]
fn several_top_level_mistakes() {
    let mut b = ProgramBuilder::new();
    b.class(ClassSpec::new("Point").field("x", named("int")).field("y", named("int")));
    let this = b.this();
    let members = (0..11).map(|i| b.int(i)).collect();
    let tuple = b.tuple(members);
    let x = b.int(1);
    let point = b.object(named("Point"), vec![("x", x)]);
    let skip = b.continue_();
    let stop = b.break_();
    for expr in [this, tuple, point, skip, stop] {
        b.push(expr);
    }
    assert_snapshot!(messages(b), @r"
    name resolution: 'this' can only be used inside an instance function
    type mismatch: tuple has 11 members, at most 10 are supported
    declarations: initializer for 'Point' leaves fields unassigned: y
    name resolution: 'continue' outside of a loop
    name resolution: 'break' outside of a loop
    ");
}

#[test]
fn capture_of_unassigned_variable() {
    let mut b = ProgramBuilder::new();
    let read = b.var("count");
    b.top_function(FunctionSpec::new("show").body(vec![read]));
    let decl = b.declaration("count", false, Some(named("int")), None);
    let reference = b.var("show");
    b.push(decl);
    b.push(reference);
    assert_snapshot!(
        messages(b),
        @"definite assignment: function 'show' captures variables that are not yet assigned: count"
    );
}

#[test]
fn unresolved_type_argument() {
    let mut b = ProgramBuilder::new();
    let message = b.string("bad");
    let error = b.call_named("error", vec![message]);
    b.push(error);
    assert_snapshot!(messages(b), @"generics: cannot infer type argument 'TValue'");
}

#[test]
fn diagnostic_json() {
    let mut b = ProgramBuilder::new();
    let missing = b.var("nope");
    b.push(missing);
    let checked = check(b);
    let json = serde_json::to_string(&checked.errors()[0]).unwrap();
    assert_snapshot!(json, @r#"{"error":{"kind":"SymbolNotFound","name":"nope"},"span":{"start":0,"end":1,"file_id":0}}"#);
}

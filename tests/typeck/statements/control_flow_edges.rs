//! Loops, jumps and conditions.
#[path = "../common.rs"]
mod common;
use common::{check_should_pass, check_should_report};

use reef::ast::builder::{FunctionSpec, ProgramBuilder};
use reef::TypeError;

// `continue` with no loop around it
#[test]
fn continue_outside_loop() {
    let mut b = ProgramBuilder::new();
    let jump = b.continue_();
    b.push(jump);
    check_should_report(b, &[TypeError::ContinueOutsideLoop]);
}

// `break` nested in an if inside a loop
#[test]
fn break_inside_if_inside_loop() {
    let mut b = ProgramBuilder::new();
    let cond = b.bool(true);
    let inner_cond = b.bool(false);
    let jump = b.break_();
    let then_block = b.block(vec![jump]);
    let branch = b.if_(inner_cond, then_block);
    let body = b.block(vec![branch]);
    let lp = b.while_(cond, body);
    b.push(lp);
    check_should_pass(b);
}

// A function declared inside a loop starts outside of it
#[test]
fn break_in_function_declared_in_loop() {
    let mut b = ProgramBuilder::new();
    let jump = b.break_();
    let inner = b.function(FunctionSpec::new("inner").body(vec![jump]));
    let cond = b.bool(true);
    let body = b.block_with_functions(vec![], vec![inner]);
    let lp = b.while_(cond, body);
    b.top_function(FunctionSpec::new("outer").body(vec![lp]));
    check_should_report(b, &[TypeError::BreakOutsideLoop]);
}

// `if` conditions must be bool
#[test]
fn if_condition_must_be_bool() {
    let mut b = ProgramBuilder::new();
    let cond = b.string("yes");
    let body = b.block(vec![]);
    let branch = b.if_(cond, body);
    b.push(branch);
    check_should_report(
        b,
        &[TypeError::MismatchedTypes { expected: "bool".into(), found: "string".into() }],
    );
}

// `not` needs a bool
#[test]
fn not_requires_bool() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    let negated = b.not(one);
    b.push(negated);
    check_should_report(b, &[TypeError::MismatchedTypes { expected: "bool".into(), found: "int".into() }]);
}

// The value of an if/else-if chain without else is used
#[test]
fn if_chain_value_without_else() {
    let mut b = ProgramBuilder::new();
    let cond = b.bool(true);
    let body = b.int(1);
    let other = b.bool(false);
    let middle = b.int(2);
    let branch = b.if_full(cond, Some(body), vec![(other, Some(middle))], None);
    let decl = b.declare("picked", branch);
    b.push(decl);
    check_should_report(b, &[TypeError::IfExpressionValueUsedWithoutElseBranch]);
}

// An if used as a statement needs no else
#[test]
fn if_statement_without_else() {
    let mut b = ProgramBuilder::new();
    let cond = b.bool(true);
    let body = b.int(1);
    let branch = b.if_(cond, body);
    b.push(branch);
    check_should_pass(b);
}

// Loops nest
#[test]
fn continue_in_nested_loop() {
    let mut b = ProgramBuilder::new();
    let outer_cond = b.bool(true);
    let inner_cond = b.bool(true);
    let jump = b.continue_();
    let inner_body = b.block(vec![jump]);
    let inner = b.while_(inner_cond, inner_body);
    let outer_body = b.block(vec![inner]);
    let outer = b.while_(outer_cond, outer_body);
    b.push(outer);
    check_should_pass(b);
}

//! Operand and result types of the binary and unary operators.
#[path = "../common.rs"]
mod common;
use common::{check_should_pass, check_should_report};

use reef::ast::builder::{named, ProgramBuilder};
use reef::ast::{BinaryOp, ExprId};
use reef::TypeError;

fn mismatch(expected: &str, found: &str) -> TypeError {
    TypeError::MismatchedTypes { expected: expected.into(), found: found.into() }
}

/// `let r: ty = left op right` at the top level.
fn typed_binary(b: &mut ProgramBuilder, ty: &str, op: BinaryOp, left: ExprId, right: ExprId) {
    let value = b.binary(op, left, right);
    let declare = b.declaration("r", false, Some(named(ty)), Some(value));
    b.push(declare);
}

// Arithmetic on ints gives an int
#[test]
fn arithmetic_on_ints() {
    for op in [BinaryOp::Plus, BinaryOp::Minus, BinaryOp::Multiply, BinaryOp::Divide] {
        let mut b = ProgramBuilder::new();
        let (l, r) = (b.int(6), b.int(3));
        typed_binary(&mut b, "int", op, l, r);
        check_should_pass(b);
    }
}

// Arithmetic with a string on the right
#[test]
fn arithmetic_right_operand() {
    let mut b = ProgramBuilder::new();
    let (l, r) = (b.int(1), b.string("a"));
    typed_binary(&mut b, "int", BinaryOp::Plus, l, r);
    check_should_report(b, &[mismatch("int", "string")]);
}

// Arithmetic with a string on the left reports only the left side
#[test]
fn arithmetic_left_operand() {
    let mut b = ProgramBuilder::new();
    let (l, r) = (b.string("a"), b.int(1));
    typed_binary(&mut b, "int", BinaryOp::Minus, l, r);
    check_should_report(b, &[mismatch("int", "string")]);
}

// Comparisons give a bool
#[test]
fn comparison_result_is_bool() {
    let mut b = ProgramBuilder::new();
    let (l, r) = (b.int(1), b.int(2));
    typed_binary(&mut b, "int", BinaryOp::LessThan, l, r);
    check_should_report(b, &[mismatch("int", "bool")]);
}

// Comparisons need int operands
#[test]
fn comparison_of_bools() {
    let mut b = ProgramBuilder::new();
    let (l, r) = (b.bool(true), b.bool(false));
    typed_binary(&mut b, "bool", BinaryOp::GreaterThan, l, r);
    check_should_report(b, &[mismatch("int", "bool")]);
}

// Equality works on ints and bools
#[test]
fn equality_of_ints_and_bools() {
    let mut b = ProgramBuilder::new();
    let (l, r) = (b.int(1), b.int(1));
    typed_binary(&mut b, "bool", BinaryOp::Equal, l, r);
    let (l, r) = (b.bool(true), b.bool(false));
    let value = b.binary(BinaryOp::NotEqual, l, r);
    b.push(value);
    check_should_pass(b);
}

// Equality does not apply to strings
#[test]
fn equality_of_strings() {
    let mut b = ProgramBuilder::new();
    let (l, r) = (b.string("a"), b.string("b"));
    typed_binary(&mut b, "bool", BinaryOp::Equal, l, r);
    check_should_report(b, &[mismatch("int or bool", "string")]);
}

// Both sides of an equality have the same type
#[test]
fn equality_of_mixed_operands() {
    let mut b = ProgramBuilder::new();
    let (l, r) = (b.bool(true), b.int(1));
    typed_binary(&mut b, "bool", BinaryOp::NotEqual, l, r);
    check_should_report(b, &[mismatch("bool", "int")]);
}

// Logical operators check both operands
#[test]
fn logical_operands() {
    let mut b = ProgramBuilder::new();
    let (l, r) = (b.int(1), b.string("x"));
    typed_binary(&mut b, "bool", BinaryOp::And, l, r);
    check_should_report(b, &[mismatch("bool", "int"), mismatch("bool", "string")]);
}

// Logical operators on bools
#[test]
fn logical_on_bools() {
    let mut b = ProgramBuilder::new();
    let (l, r) = (b.bool(true), b.bool(false));
    typed_binary(&mut b, "bool", BinaryOp::Or, l, r);
    check_should_pass(b);
}

// Operands take their type from an inferred variable
#[test]
fn inferred_variable_operand() {
    let mut b = ProgramBuilder::new();
    let seven = b.int(7);
    let declare = b.declare("n", seven);
    b.push(declare);
    let n = b.var("n");
    let one = b.int(1);
    typed_binary(&mut b, "int", BinaryOp::Multiply, n, one);
    check_should_pass(b);
}

// Negation of a non-bool
#[test]
fn not_of_int() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    let not = b.not(one);
    let declare = b.declaration("r", false, Some(named("bool")), Some(not));
    b.push(declare);
    check_should_report(b, &[mismatch("bool", "int")]);
}

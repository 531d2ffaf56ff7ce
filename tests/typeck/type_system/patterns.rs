//! Checking patterns against the values they match.
#[path = "../common.rs"]
mod common;
use common::{check_should_pass, check_should_report};

use reef::ast::builder::{named, ClassSpec, FieldSpec, ProgramBuilder, UnionSpec};
use reef::ast::{BinaryOp, ExprId};
use reef::TypeError;

fn point(b: &mut ProgramBuilder) -> ExprId {
    b.class(ClassSpec::new("Point").field("x", named("int")).field("y", named("int")));
    let x = b.int(1);
    let y = b.int(2);
    b.object(named("Point"), vec![("x", x), ("y", y)])
}

fn shapes(b: &mut ProgramBuilder) {
    b.union(
        UnionSpec::new("Shape")
            .unit("Empty")
            .tuple("Line", vec![named("int"), named("int")])
            .class_variant("Rect", vec![("w", named("int")), ("h", named("int"))]),
    );
}

fn empty_shape(b: &mut ProgramBuilder) -> ExprId {
    b.static_member(named("Shape"), "Empty")
}

// Class pattern without every public field
#[test]
fn class_pattern_missing_field() {
    let mut b = ProgramBuilder::new();
    let value = point(&mut b);
    let pattern = b.class_pattern(named("Point"), vec![("x", None)], false);
    let body = b.var("x");
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(
        b,
        &[TypeError::MissingFieldsInClassPattern { ty: "Point".into(), fields: vec!["y".into()] }],
    );
}

// Remaining fields discarded with `..`
#[test]
fn class_pattern_with_rest() {
    let mut b = ProgramBuilder::new();
    let value = point(&mut b);
    let pattern = b.class_pattern(named("Point"), vec![("x", None)], true);
    let body = b.var("x");
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    let checked = check_should_pass(b);
    assert_eq!(checked.display_type_of(body).as_deref(), Some("int"));
}

// Union named in a class pattern
#[test]
fn union_in_class_pattern() {
    let mut b = ProgramBuilder::new();
    shapes(&mut b);
    let value = empty_shape(&mut b);
    let pattern = b.class_pattern(named("Shape"), vec![], true);
    let body = b.int(0);
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(b, &[TypeError::NonClassUsedInClassPattern { ty: "Shape".into() }]);
}

// Tuple variant pattern with too few members
#[test]
fn tuple_pattern_arity() {
    let mut b = ProgramBuilder::new();
    shapes(&mut b);
    let value = empty_shape(&mut b);
    let only = b.discard();
    let pattern = b.tuple_variant_pattern(named("Shape"), "Line", vec![only]);
    let body = b.int(0);
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(
        b,
        &[TypeError::IncorrectNumberOfPatternsInTupleVariantUnionPattern { expected: 2, found: 1 }],
    );
}

// Named members still bind when the member count is wrong
#[test]
fn tuple_pattern_arity_keeps_bindings() {
    let mut b = ProgramBuilder::new();
    b.union(
        UnionSpec::new("Reading")
            .unit("Missing")
            .tuple("Sample", vec![named("int"), named("int"), named("int")]),
    );
    let value = b.static_member(named("Reading"), "Missing");
    let a = b.bind("a");
    let c = b.bind("c");
    let pattern = b.tuple_variant_pattern(named("Reading"), "Sample", vec![a, c]);
    let left = b.var("a");
    let right = b.var("c");
    let sum = b.binary(BinaryOp::Plus, left, right);
    let choose = b.match_(value, vec![(pattern, sum)]);
    b.push(choose);
    check_should_report(
        b,
        &[TypeError::IncorrectNumberOfPatternsInTupleVariantUnionPattern { expected: 3, found: 2 }],
    );
}

// Variant that does not exist
#[test]
fn unknown_variant() {
    let mut b = ProgramBuilder::new();
    shapes(&mut b);
    let value = empty_shape(&mut b);
    let pattern = b.variant_pattern(named("Shape"), Some("Triangle"), None);
    let body = b.int(0);
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(b, &[TypeError::UnknownTypeMember { member: "Triangle".into(), ty: "Shape".into() }]);
}

// Tuple pattern over a unit variant
#[test]
fn tuple_pattern_on_unit_variant() {
    let mut b = ProgramBuilder::new();
    shapes(&mut b);
    let value = empty_shape(&mut b);
    let pattern = b.tuple_variant_pattern(named("Shape"), "Empty", vec![]);
    let body = b.int(0);
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(
        b,
        &[TypeError::VariantPatternShapeMismatch { variant: "Shape::Empty".into(), expected: "tuple".into() }],
    );
}

// Class variant pattern without every field
#[test]
fn class_variant_pattern_missing_field() {
    let mut b = ProgramBuilder::new();
    shapes(&mut b);
    let value = empty_shape(&mut b);
    let pattern = b.class_variant_pattern(named("Shape"), "Rect", vec![("w", None)], false);
    let body = b.var("w");
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(
        b,
        &[TypeError::MissingFieldsInUnionClassVariantPattern { variant: "Rect".into(), fields: vec!["h".into()] }],
    );
}

// Same field named twice
#[test]
fn duplicate_field_in_pattern() {
    let mut b = ProgramBuilder::new();
    let value = point(&mut b);
    let discard = b.discard();
    let pattern = b.class_pattern(named("Point"), vec![("x", None), ("x", Some(discard))], true);
    let body = b.int(0);
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(b, &[TypeError::DuplicateFieldInPattern { field: "x".into() }]);
}

// Static fields cannot be destructured
#[test]
fn static_field_in_class_pattern() {
    let mut b = ProgramBuilder::new();
    let zero = b.int(0);
    b.class(
        ClassSpec::new("Point")
            .field("x", named("int"))
            .field_spec(FieldSpec::new("origin", named("int")).static_().initializer(zero)),
    );
    let one = b.int(1);
    let value = b.object(named("Point"), vec![("x", one)]);
    let discard = b.discard();
    let pattern = b.class_pattern(named("Point"), vec![("x", None), ("origin", Some(discard))], false);
    let body = b.int(0);
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(b, &[TypeError::StaticFieldInClassPattern { field: "origin".into() }]);
}

// Two bindings with the same name
#[test]
fn duplicate_binding() {
    let mut b = ProgramBuilder::new();
    let value = point(&mut b);
    let again = b.bind("x");
    let pattern = b.class_pattern(named("Point"), vec![("x", None), ("y", Some(again))], false);
    let body = b.int(0);
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(b, &[TypeError::DuplicateVariableDeclaration { name: "x".into() }]);
}

// Type pattern of another type
#[test]
fn type_pattern_mismatch() {
    let mut b = ProgramBuilder::new();
    let value = b.int(1);
    let pattern = b.type_pattern(named("string"), Some("s"));
    let body = b.int(0);
    let choose = b.match_(value, vec![(pattern, body)]);
    b.push(choose);
    check_should_report(b, &[TypeError::MismatchedTypes { expected: "int".into(), found: "string".into() }]);
}

// Members of a generic variant take the instance arguments
#[test]
fn generic_variant_member_binding() {
    let mut b = ProgramBuilder::new();
    b.union(UnionSpec::new("Maybe").type_param("T").tuple("Some", vec![named("T")]).unit("None"));
    let create = b.static_member(named("Maybe"), "Some");
    let one = b.int(1);
    let value = b.call(create, vec![one]);
    let n = b.bind("n");
    let some = b.tuple_variant_pattern(named("Maybe"), "Some", vec![n]);
    let read = b.var("n");
    let none = b.variant_pattern(named("Maybe"), Some("None"), None);
    let zero = b.int(0);
    let choose = b.match_(value, vec![(some, read), (none, zero)]);
    b.push(choose);
    let checked = check_should_pass(b);
    assert_eq!(checked.display_type_of(read).as_deref(), Some("int"));
    assert_eq!(checked.display_type_of(choose).as_deref(), Some("int"));
}

// Binding the whole value next to a variant
#[test]
fn whole_value_binding() {
    let mut b = ProgramBuilder::new();
    shapes(&mut b);
    let value = empty_shape(&mut b);
    let pattern = b.variant_pattern(named("Shape"), None, Some("any"));
    let read = b.var("any");
    let choose = b.match_(value, vec![(pattern, read)]);
    b.push(choose);
    let checked = check_should_pass(b);
    assert_eq!(checked.display_type_of(read).as_deref(), Some("Shape"));
}

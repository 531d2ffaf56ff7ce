//! The same name declared twice within one declaration.
#[path = "../common.rs"]
mod common;
use common::{check_should_pass, check_should_report};

use reef::ast::builder::{named, ClassSpec, FunctionSpec, ProgramBuilder, UnionSpec};
use reef::TypeError;

// A union with two variants of one name
#[test]
fn duplicate_variant() {
    let mut b = ProgramBuilder::new();
    b.union(UnionSpec::new("Light").unit("Red").unit("Green").unit("Red"));
    check_should_report(b, &[TypeError::DuplicateVariantName { name: "Red".into() }]);
}

// A class with two fields of one name
#[test]
fn duplicate_class_field() {
    let mut b = ProgramBuilder::new();
    b.class(ClassSpec::new("Point").field("x", named("int")).field("x", named("int")));
    check_should_report(b, &[TypeError::DuplicateClassField { class: "Point".into(), field: "x".into() }]);
}

// A class variant with two fields of one name
#[test]
fn duplicate_field_in_class_variant() {
    let mut b = ProgramBuilder::new();
    b.union(UnionSpec::new("Shape").class_variant("Rect", vec![("w", named("int")), ("w", named("int"))]));
    check_should_report(
        b,
        &[TypeError::DuplicateFieldInUnionClassVariant { variant: "Rect".into(), field: "w".into() }],
    );
}

// Variants of different unions may share field names
#[test]
fn same_field_in_different_variants() {
    let mut b = ProgramBuilder::new();
    b.union(
        UnionSpec::new("Shape")
            .class_variant("Rect", vec![("w", named("int"))])
            .class_variant("Square", vec![("w", named("int"))]),
    );
    check_should_pass(b);
}

// Two parameters with one name
#[test]
fn duplicate_parameter() {
    let mut b = ProgramBuilder::new();
    b.top_function(FunctionSpec::new("add").param("a", named("int")).param("a", named("int")));
    check_should_report(b, &[TypeError::DuplicateFunctionParameter { name: "a".into() }]);
}

// A class declaring one type parameter twice
#[test]
fn duplicate_class_type_parameter() {
    let mut b = ProgramBuilder::new();
    b.class(ClassSpec::new("Pair").type_param("T").type_param("T"));
    check_should_report(b, &[TypeError::DuplicateTypeParameter { name: "T".into() }]);
}

// A function declaring one type parameter twice
#[test]
fn duplicate_function_type_parameter() {
    let mut b = ProgramBuilder::new();
    b.top_function(FunctionSpec::new("pick").type_param("T").type_param("T"));
    check_should_report(b, &[TypeError::DuplicateTypeParameter { name: "T".into() }]);
}

// Redeclaring a top-level variable
#[test]
fn duplicate_variable() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    let first = b.declare("x", one);
    let two = b.int(2);
    let second = b.declare("x", two);
    b.push(first);
    b.push(second);
    check_should_report(b, &[TypeError::DuplicateVariableDeclaration { name: "x".into() }]);
}

// A local cannot reuse a parameter's name
#[test]
fn local_shadows_parameter() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    let local = b.declare("a", one);
    b.top_function(FunctionSpec::new("f").param("a", named("int")).body(vec![local]));
    check_should_report(b, &[TypeError::DuplicateVariableDeclaration { name: "a".into() }]);
}

// A nested block cannot reuse an enclosing name
#[test]
fn block_shadows_outer_variable() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    let outer = b.declare("x", one);
    let two = b.int(2);
    let inner = b.declare("x", two);
    let block = b.block(vec![inner]);
    b.push(outer);
    b.push(block);
    check_should_report(b, &[TypeError::DuplicateVariableDeclaration { name: "x".into() }]);
}

// Sibling blocks each get a fresh scope
#[test]
fn sibling_blocks_reuse_name() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    let first = b.declare("x", one);
    let first = b.block(vec![first]);
    let two = b.int(2);
    let second = b.declare("x", two);
    let second = b.block(vec![second]);
    b.push(first);
    b.push(second);
    check_should_pass(b);
}

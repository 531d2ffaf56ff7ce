//! Explicit instantiation of generic classes and functions.
#[path = "../common.rs"]
mod common;
use common::{check_should_fail_with, check_should_pass, check_should_report};

use reef::ast::builder::{generic, named, ClassSpec, FunctionSpec, ProgramBuilder};
use reef::TypeError;

fn boxed(b: &mut ProgramBuilder) {
    b.class(ClassSpec::new("Box").type_param("T").field("value", named("T")));
}

fn identity(b: &mut ProgramBuilder) {
    let x = b.var("x");
    let ret = b.ret(Some(x));
    b.top_function(FunctionSpec::new("identity").type_param("T").param("x", named("T")).returns(named("T")).body(vec![ret]));
}

// Field value must match the explicit argument
#[test]
fn explicit_class_argument_checks_field() {
    let mut b = ProgramBuilder::new();
    boxed(&mut b);
    let value = b.string("s");
    let init = b.object(generic("Box", vec![named("int")]), vec![("value", value)]);
    b.push(init);
    check_should_report(b, &[TypeError::MismatchedTypes { expected: "int".into(), found: "string".into() }]);
}

// Too many type arguments on a class
#[test]
fn too_many_class_arguments() {
    let mut b = ProgramBuilder::new();
    boxed(&mut b);
    let value = b.int(1);
    let init = b.object(generic("Box", vec![named("int"), named("string")]), vec![("value", value)]);
    b.push(init);
    check_should_report(b, &[TypeError::IncorrectNumberOfTypeArguments { expected: 1, found: 2 }]);
}

// Explicit function argument wins over the call argument
#[test]
fn explicit_function_argument_checks_call() {
    let mut b = ProgramBuilder::new();
    identity(&mut b);
    let callee = b.var_with_args("identity", vec![named("int")]);
    let arg = b.string("s");
    let call = b.call(callee, vec![arg]);
    b.push(call);
    check_should_report(b, &[TypeError::MismatchedTypes { expected: "int".into(), found: "string".into() }]);
}

// Explicit function argument agreeing with the call
#[test]
fn explicit_function_argument_accepts_matching_call() {
    let mut b = ProgramBuilder::new();
    identity(&mut b);
    let callee = b.var_with_args("identity", vec![named("string")]);
    let arg = b.string("s");
    let call = b.call(callee, vec![arg]);
    b.push(call);
    let checked = check_should_pass(b);
    assert_eq!(checked.display_type_of(call).as_deref(), Some("string"));
}

// Type arguments on a plain variable
#[test]
fn type_arguments_on_variable() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    let decl = b.declare("x", one);
    let read = b.var_with_args("x", vec![named("int")]);
    b.push(decl);
    b.push(read);
    check_should_report(b, &[TypeError::GenericTypeArgumentsOnNonFunctionValue]);
}

// Unknown type in a declaration
#[test]
fn unknown_type_name() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    let decl = b.declaration("a", false, Some(named("Nope")), Some(one));
    b.push(decl);
    check_should_report(b, &[TypeError::SymbolNotFound { name: "Nope".into() }]);
}

// Type parameters take no arguments of their own
#[test]
fn type_parameter_with_arguments() {
    let mut b = ProgramBuilder::new();
    b.top_function(FunctionSpec::new("f").type_param("T").param("x", generic("T", vec![named("int")])));
    check_should_fail_with(b, TypeError::IncorrectNumberOfTypeArguments { expected: 0, found: 1 });
}

// Instances with different arguments do not mix
#[test]
fn instances_with_different_arguments() {
    let mut b = ProgramBuilder::new();
    boxed(&mut b);
    b.top_function(FunctionSpec::new("take").param("b", generic("Box", vec![named("int")])));
    let value = b.string("s");
    let init = b.object(generic("Box", vec![named("string")]), vec![("value", value)]);
    let call = b.call_named("take", vec![init]);
    b.push(call);
    check_should_report(
        b,
        &[TypeError::MismatchedTypes { expected: "Box<int>".into(), found: "Box<string>".into() }],
    );
}

// Member function of a generic class sees the instance arguments
#[test]
fn member_function_return_follows_instance() {
    let mut b = ProgramBuilder::new();
    let this = b.this();
    let value = b.member(this, "value");
    let ret = b.ret(Some(value));
    let get = b.function(FunctionSpec::new("get").returns(named("T")).body(vec![ret]));
    b.class(ClassSpec::new("Box").type_param("T").field("value", named("T")).function(get));
    let one = b.int(1);
    let init = b.object(generic("Box", vec![named("int")]), vec![("value", one)]);
    let decl = b.declare("b", init);
    let read = b.var("b");
    let member = b.member(read, "get");
    let call = b.call(member, vec![]);
    b.push(decl);
    b.push(call);
    let checked = check_should_pass(b);
    assert_eq!(checked.display_type_of(call).as_deref(), Some("int"));
}

// The builtin result union can be named with arguments
#[test]
fn builtin_result_with_arguments() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    let ok = b.call_named("ok", vec![one]);
    let decl = b.declaration("r", false, Some(generic("result", vec![named("int"), named("string")])), Some(ok));
    b.push(decl);
    let checked = check_should_pass(b);
    let variable = checked.declared_variable(decl).unwrap();
    assert_eq!(checked.display(&variable.ty), "result<int, string>");
}

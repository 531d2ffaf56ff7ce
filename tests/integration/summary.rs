//! The serializable summary drivers print after checking.

use reef::ast::builder::{named, FunctionSpec, ProgramBuilder, UnionSpec};
use reef::ast::BinaryOp;
use reef::typeck::serializable::to_json;
use reef::typeck::summarize;
use reef::{type_check, CheckerOptions, ErrorCategory};

#[test]
fn functions_list_locals_and_types() {
    let mut b = ProgramBuilder::new();
    let (w, h) = (b.var("w"), b.var("h"));
    let product = b.binary(BinaryOp::Multiply, w, h);
    let declare = b.declare("size", product);
    let size = b.var("size");
    let ret = b.ret(Some(size));
    b.top_function(
        FunctionSpec::new("area")
            .param("w", named("int"))
            .param("h", named("int"))
            .returns(named("int"))
            .body(vec![declare, ret]),
    );
    let program = b.finish();
    let checked = type_check(&program, &CheckerOptions::default()).unwrap();
    let summary = summarize(&program, &checked);

    assert!(summary.ok);
    assert!(summary.diagnostics.is_empty());
    assert_eq!(summary.functions.len(), 1);
    let area = &summary.functions[0];
    assert_eq!(area.name, "area");
    assert_eq!(area.locals, vec!["size".to_string()]);
    assert!(area.captures.is_empty());

    let product = summary.expressions.iter().find(|e| e.expr == product).unwrap();
    assert_eq!(product.ty, "int");
    let w = summary.expressions.iter().find(|e| e.expr == w).unwrap();
    assert!(w.value_used);
}

#[test]
fn redundant_arms_are_listed() {
    let mut b = ProgramBuilder::new();
    b.union(UnionSpec::new("Light").unit("Red").unit("Off"));
    let value = b.static_member(named("Light"), "Red");
    let discard = b.discard();
    let red = b.variant_pattern(named("Light"), Some("Red"), None);
    let (zero, one) = (b.int(0), b.int(1));
    let choose = b.match_(value, vec![(discard, zero), (red, one)]);
    b.push(choose);
    let red_span = b.pattern_span_of(red);
    let program = b.finish();
    let checked = type_check(&program, &CheckerOptions::default()).unwrap();

    let summary = summarize(&program, &checked);
    assert!(summary.ok);
    assert_eq!(summary.redundant_arms, vec![red_span]);
}

#[test]
fn diagnostics_carry_category_and_message() {
    let mut b = ProgramBuilder::new();
    let stop = b.break_();
    b.push(stop);
    let stop_span = b.span_of(stop);
    let program = b.finish();
    let checked = type_check(&program, &CheckerOptions::default()).unwrap();

    let summary = summarize(&program, &checked);
    assert!(!summary.ok);
    assert_eq!(summary.diagnostics.len(), 1);
    let diagnostic = &summary.diagnostics[0];
    assert_eq!(diagnostic.category, ErrorCategory::NameResolution);
    assert_eq!(diagnostic.message, "'break' outside of a loop");
    assert_eq!(diagnostic.span, stop_span);
}

#[test]
fn json_omits_unused_value_flags() {
    let mut b = ProgramBuilder::new();
    let one = b.int(1);
    b.push(one);
    let program = b.finish();
    let checked = type_check(&program, &CheckerOptions::default()).unwrap();

    let json = to_json(&summarize(&program, &checked)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["ok"], true);
    assert_eq!(value["expressions"][0]["ty"], "int");
    assert!(value["expressions"][0].get("value_used").is_none());
    assert_eq!(value["functions"], serde_json::json!([]));
}

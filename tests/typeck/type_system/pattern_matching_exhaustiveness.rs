//! Exhaustiveness of `match` and usefulness of its arms.
#[path = "../common.rs"]
mod common;
use common::{check_should_pass, check_should_report, check_with};

use reef::ast::builder::{generic, named, ProgramBuilder, UnionSpec};
use reef::ast::{ExprId, PatternId};
use reef::typeck::types::Type;
use reef::typeck::{
    type_check_with, AnalysisError, ArmUsefulness, MatchInput, Usefulness, UsefulnessAnalyzer, Witness,
};
use reef::{CheckerOptions, TypeError};

fn lights(b: &mut ProgramBuilder) -> ExprId {
    b.union(UnionSpec::new("Light").unit("Red").unit("Green").unit("Blue"));
    b.static_member(named("Light"), "Green")
}

fn light(b: &mut ProgramBuilder, variant: &str) -> PatternId {
    b.variant_pattern(named("Light"), Some(variant), None)
}

fn arms(b: &mut ProgramBuilder, patterns: Vec<PatternId>) -> Vec<(PatternId, ExprId)> {
    patterns.into_iter().map(|p| (p, b.int(0))).collect()
}

// A variant without an arm
#[test]
fn missing_variant() {
    let mut b = ProgramBuilder::new();
    let value = lights(&mut b);
    let patterns = vec![light(&mut b, "Red"), light(&mut b, "Green")];
    let arms = arms(&mut b, patterns);
    let choose = b.match_(value, arms);
    b.push(choose);
    check_should_report(b, &[TypeError::MatchNonExhaustive]);
}

// Every variant has an arm
#[test]
fn every_variant_covered() {
    let mut b = ProgramBuilder::new();
    let value = lights(&mut b);
    let patterns = vec![light(&mut b, "Red"), light(&mut b, "Green"), light(&mut b, "Blue")];
    let arms = arms(&mut b, patterns);
    let choose = b.match_(value, arms);
    b.push(choose);
    check_should_pass(b);
}

// A discard covers the rest
#[test]
fn discard_covers_rest() {
    let mut b = ProgramBuilder::new();
    let value = lights(&mut b);
    let patterns = vec![light(&mut b, "Red"), b.discard()];
    let arms = arms(&mut b, patterns);
    let choose = b.match_(value, arms);
    b.push(choose);
    check_should_pass(b);
}

// An arm after a discard is redundant but not an error
#[test]
fn arm_after_discard_is_redundant() {
    let mut b = ProgramBuilder::new();
    let value = lights(&mut b);
    let discard = b.discard();
    let blue = light(&mut b, "Blue");
    let arms = arms(&mut b, vec![discard, blue]);
    let choose = b.match_(value, arms);
    b.push(choose);
    let checked = check_should_pass(b);
    assert_eq!(checked.annotations.arm_usefulness[&discard], ArmUsefulness::Useful);
    assert_eq!(checked.annotations.arm_usefulness[&blue], ArmUsefulness::Redundant);
}

// Nested variants inside a generic union
#[test]
fn nested_variant_missing() {
    let mut b = ProgramBuilder::new();
    let green = lights(&mut b);
    b.union(UnionSpec::new("Maybe").type_param("T").tuple("Some", vec![named("T")]).unit("None"));
    let create = b.static_member(generic("Maybe", vec![named("Light")]), "Some");
    let value = b.call(create, vec![green]);
    let red = light(&mut b, "Red");
    let some_red = b.tuple_variant_pattern(named("Maybe"), "Some", vec![red]);
    let none = b.variant_pattern(named("Maybe"), Some("None"), None);
    let arms = arms(&mut b, vec![some_red, none]);
    let choose = b.match_(value, arms);
    b.push(choose);
    check_should_report(b, &[TypeError::MatchNonExhaustive]);
}

// The check can be switched off
#[test]
fn exhaustiveness_can_be_disabled() {
    let mut b = ProgramBuilder::new();
    let value = lights(&mut b);
    let patterns = vec![light(&mut b, "Red")];
    let arms = arms(&mut b, patterns);
    let choose = b.match_(value, arms);
    b.push(choose);
    let options = CheckerOptions { check_exhaustiveness: false, ..CheckerOptions::default() };
    assert!(check_with(b, &options).is_ok());
}

// Over the complexity budget the match is accepted unchecked
#[test]
fn complexity_budget_skips_the_check() {
    let build = || {
        let mut b = ProgramBuilder::new();
        let value = lights(&mut b);
        let patterns = (0..4).map(|_| light(&mut b, "Red")).collect();
        let arms = arms(&mut b, patterns);
        let choose = b.match_(value, arms);
        b.push(choose);
        b
    };
    let tight = CheckerOptions { complexity_limit: 2, ..CheckerOptions::default() };
    assert!(check_with(build(), &tight).is_ok());
    check_should_report(build(), &[TypeError::MatchNonExhaustive]);
}

// The budget applies to each arm on its own, not to the whole match
#[test]
fn budget_is_per_query() {
    let mut b = ProgramBuilder::new();
    let value = lights(&mut b);
    let patterns = vec![light(&mut b, "Red"), light(&mut b, "Green"), light(&mut b, "Blue"), b.discard(), b.discard()];
    let last = patterns[4];
    let arms = arms(&mut b, patterns);
    let choose = b.match_(value, arms);
    b.push(choose);
    let checked = check_should_pass(b);
    assert_eq!(checked.annotations.arm_usefulness(last), Some(ArmUsefulness::Redundant));
}

/// Claims every match misses something.
struct Pessimist;

impl UsefulnessAnalyzer for Pessimist {
    fn compute_usefulness(
        &self,
        _input: &MatchInput<'_>,
        arms: &[PatternId],
        _scrutinee: &Type,
        _complexity_limit: usize,
    ) -> Result<Usefulness, AnalysisError> {
        Ok(Usefulness { arms: vec![ArmUsefulness::Useful; arms.len()], uncovered: vec![Witness("_".into())] })
    }
}

// The checker reports whatever the analyzer decides
#[test]
fn custom_analyzer_is_consulted() {
    let mut b = ProgramBuilder::new();
    let value = lights(&mut b);
    let patterns = vec![b.discard()];
    let arms = arms(&mut b, patterns);
    let choose = b.match_(value, arms);
    b.push(choose);
    let program = b.finish();
    let checked = type_check_with(&program, &CheckerOptions::default(), &Pessimist).unwrap();
    let errors: Vec<_> = checked.errors().iter().map(|d| d.error.clone()).collect();
    assert_eq!(errors, vec![TypeError::MatchNonExhaustive]);
}

//! JSON-friendly view of a [`CheckedProgram`] for drivers and tooling.
//!
//! Types are rendered to strings so the summary is self-contained.

use serde::Serialize;

use crate::ast::{ExprId, Program};
use crate::diagnostics::ErrorCategory;
use crate::span::Span;

use super::annotations::ArmUsefulness;
use super::types::VariableId;
use super::CheckedProgram;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub ok: bool,
    pub diagnostics: Vec<DiagnosticSummary>,
    pub expressions: Vec<ExprSummary>,
    pub functions: Vec<FunctionSummary>,
    pub redundant_arms: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticSummary {
    pub category: ErrorCategory,
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExprSummary {
    pub expr: ExprId,
    pub span: Span,
    pub ty: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub value_used: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSummary {
    pub name: String,
    pub span: Span,
    pub locals: Vec<String>,
    pub captures: Vec<String>,
}

pub fn summarize(program: &Program, checked: &CheckedProgram) -> CheckSummary {
    let diagnostics = checked
        .diagnostics
        .iter()
        .map(|d| DiagnosticSummary { category: d.category(), message: d.error.to_string(), span: d.span })
        .collect();

    let mut expressions: Vec<ExprSummary> = checked
        .annotations
        .expr_types
        .iter()
        .map(|(&expr, ty)| ExprSummary {
            expr,
            span: program.expr_span(expr),
            ty: checked.display(ty),
            value_used: checked.is_value_useful(expr),
        })
        .collect();
    expressions.sort_by_key(|e| e.expr);

    let names = |ids: &[VariableId]| -> Vec<String> { ids.iter().map(|&v| checked.variable(v).name.clone()).collect() };
    let functions = checked
        .registry
        .functions()
        .filter(|f| f.decl.is_some())
        .map(|f| FunctionSummary { name: f.name.clone(), span: f.span, locals: names(&f.locals), captures: names(&f.captures) })
        .collect();

    let mut redundant_arms: Vec<Span> = checked
        .annotations
        .arm_usefulness
        .iter()
        .filter(|(_, usefulness)| **usefulness == ArmUsefulness::Redundant)
        .map(|(&pattern, _)| program.pattern_span(pattern))
        .collect();
    redundant_arms.sort();

    CheckSummary { ok: checked.is_ok(), diagnostics, expressions, functions, redundant_arms }
}

pub fn to_json(summary: &CheckSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

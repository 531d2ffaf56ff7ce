//! Second pass, run once the first pass reported nothing.
//!
//! Flags inference cells nothing ever constrained, closures referenced
//! before every variable they capture is assigned, `if` values used without
//! an `else`, and non-exhaustive matches.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::ast::{BinaryOp, ClassDecl, ElseIf, Expr, ExprId, FunctionId, MatchArm, Program};
use crate::diagnostics::{CompileError, TypeError};
use crate::span::Span;
use crate::visit::{walk_class, walk_expr, Visitor};

use super::env::VariableKind;
use super::exhaustiveness::{MatchInput, UsefulnessAnalyzer};
use super::generics::CellOrigin;
use super::types::*;
use super::Checker;

pub(crate) fn validate(checker: &mut Checker<'_>, analyzer: &dyn UsefulnessAnalyzer) -> Result<(), CompileError> {
    let program = checker.program;
    let before = checker.diagnostics.len();
    let mut validator = Validator {
        checker: &mut *checker,
        analyzer,
        initialized: Vec::new(),
        reported_cells: HashSet::new(),
        error: None,
    };
    validator.visit_program(program);
    if let Some(error) = validator.error {
        return Err(error);
    }
    debug!(errors = checker.diagnostics.len() - before, "validation finished");
    Ok(())
}

struct Validator<'c, 'p> {
    checker: &'c mut Checker<'p>,
    analyzer: &'c dyn UsefulnessAnalyzer,
    /// Assignment state of locals, one map per function being walked.
    initialized: Vec<HashMap<VariableId, bool>>,
    /// Root cells already reported as unresolved.
    reported_cells: HashSet<CellId>,
    /// First internal error; the walk keeps going but the pass fails.
    error: Option<CompileError>,
}

impl Validator<'_, '_> {
    fn fail(&mut self, error: CompileError) {
        self.error.get_or_insert(error);
    }

    fn with_locals(&mut self, locals: &[VariableId], value: bool, f: impl FnOnce(&mut Self)) {
        self.initialized.push(locals.iter().map(|&v| (v, value)).collect());
        f(self);
        self.initialized.pop();
    }

    /// Variables outside every tracked frame were assigned where they were declared.
    fn is_initialized(&self, variable: VariableId) -> bool {
        self.initialized.iter().rev().find_map(|frame| frame.get(&variable).copied()).unwrap_or(true)
    }

    fn set_initialized(&mut self, variable: VariableId, value: bool) {
        if let Some(frame) = self.initialized.last_mut() {
            frame.insert(variable, value);
        }
    }

    fn pending(&self) -> Vec<VariableId> {
        self.initialized
            .last()
            .map(|frame| frame.iter().filter(|(_, done)| !**done).map(|(v, _)| *v).collect())
            .unwrap_or_default()
    }

    fn check_resolved(&mut self, ty: &Type, span: Span) {
        match ty {
            Type::Class(Instance { args, .. }) | Type::Union(Instance { args, .. }) => {
                for &arg in args {
                    self.check_resolved(&Type::Cell(arg), span);
                }
            }
            Type::Function(function) => {
                for param in &function.params {
                    self.check_resolved(&param.ty, span);
                }
                self.check_resolved(&function.ret, span);
            }
            Type::Cell(cell) => match self.checker.cells.resolved(*cell).cloned() {
                Some(resolved) => self.check_resolved(&resolved, span),
                None => self.report_unresolved(*cell, span),
            },
            Type::Placeholder(_) | Type::Unknown => {}
        }
    }

    fn report_unresolved(&mut self, cell: CellId, span: Span) {
        if !self.reported_cells.insert(self.checker.cells.find(cell)) {
            return;
        }
        let error = match self.checker.cells.origin(cell) {
            CellOrigin::TypeArgument { name, .. } => TypeError::UnresolvedInferredTypeArgument { name: name.clone() },
            CellOrigin::InferredVariable { name } => TypeError::UnresolvedInferredVariableType { name: name.clone() },
        };
        self.checker.report(error, span);
    }

    fn check_declaration(&mut self, id: ExprId, value: Option<ExprId>, span: Span) {
        let Some(&variable) = self.checker.annotations.declared_variables.get(&id) else {
            self.fail(CompileError::internal_at("declaration without a variable", span));
            return;
        };
        if value.is_some() {
            self.set_initialized(variable, true);
        }
        let declared = self.checker.env.variable(variable);
        let (name, ty) = (declared.name.clone(), declared.ty.clone());
        if let Type::Cell(cell) = self.checker.cells.shallow_resolve(&ty) {
            if let CellOrigin::InferredVariable { .. } = self.checker.cells.origin(cell) {
                if self.reported_cells.insert(self.checker.cells.find(cell)) {
                    self.checker.report(TypeError::UnresolvedInferredVariableType { name }, span);
                }
                return;
            }
        }
        self.check_resolved(&ty, span);
    }

    /// Referencing a local function is an error while a variable it captures
    /// may still be unassigned.
    fn check_closure_reference(&mut self, id: ExprId, name: &str, span: Span) {
        let Some(instantiation) = self.checker.annotations.instantiations.get(&id) else {
            return;
        };
        let (sig, type_args) = (instantiation.sig, instantiation.type_args.clone());
        let unassigned: Vec<String> = self
            .checker
            .registry
            .function(sig)
            .captures
            .iter()
            .filter(|&&v| self.checker.env.variable(v).is_local() && !self.is_initialized(v))
            .map(|&v| self.checker.env.variable(v).name.clone())
            .collect();
        if !unassigned.is_empty() {
            let error = TypeError::AccessingClosureWhichReferencesUninitializedVariables {
                function: name.to_string(),
                variables: unassigned,
            };
            self.checker.report(error, span);
        }
        for arg in type_args {
            self.check_resolved(&Type::Cell(arg), span);
        }
    }

    fn check_instantiation_args(&mut self, id: ExprId, span: Span) {
        let Some(instantiation) = self.checker.annotations.instantiations.get(&id) else {
            return;
        };
        for arg in instantiation.type_args.clone() {
            self.check_resolved(&Type::Cell(arg), span);
        }
    }

    fn visit_if(
        &mut self,
        program: &Program,
        id: ExprId,
        check: ExprId,
        body: Option<ExprId>,
        else_ifs: &[ElseIf],
        else_body: Option<ExprId>,
    ) {
        let pending = self.pending();
        self.visit_expr(program, check);

        let take_branch = |validator: &mut Self, branch: Option<ExprId>| -> Vec<bool> {
            if let Some(branch) = branch {
                validator.visit_expr(program, branch);
            }
            pending
                .iter()
                .map(|&v| {
                    let done = validator.is_initialized(v);
                    validator.set_initialized(v, false);
                    done
                })
                .collect()
        };

        let in_body = take_branch(self, body);
        let mut in_each_else_if = vec![true; pending.len()];
        for branch in else_ifs {
            self.visit_expr(program, branch.check);
            for (all, done) in in_each_else_if.iter_mut().zip(take_branch(self, branch.body)) {
                *all &= done;
            }
        }
        let in_else = take_branch(self, else_body);

        if else_body.is_none() && self.checker.annotations.is_value_useful(id) {
            self.checker.report(TypeError::IfExpressionValueUsedWithoutElseBranch, program.expr_span(id));
        }

        for (index, &variable) in pending.iter().enumerate() {
            let assigned = body.is_some() && in_body[index] && else_body.is_some() && in_else[index] && in_each_else_if[index];
            self.set_initialized(variable, assigned);
        }
    }

    fn visit_match(&mut self, program: &Program, id: ExprId, value: ExprId, arms: &[MatchArm]) {
        self.visit_expr(program, value);
        for arm in arms {
            let bound = self.checker.annotations.pattern_variables.get(&arm.pattern).cloned().unwrap_or_default();
            for variable in bound {
                self.set_initialized(variable, true);
            }
            if let Some(body) = arm.body {
                self.visit_expr(program, body);
            }
        }

        if !self.checker.options.check_exhaustiveness {
            return;
        }
        let span = program.expr_span(id);
        let scrutinee = match self.checker.type_of(value) {
            Ok(ty) => ty,
            Err(error) => return self.fail(error),
        };
        let patterns: Vec<_> = arms.iter().map(|arm| arm.pattern).collect();
        let input = MatchInput {
            program,
            registry: &self.checker.registry,
            cells: &self.checker.cells,
            annotations: &self.checker.annotations,
        };
        let usefulness =
            match self.analyzer.compute_usefulness(&input, &patterns, &scrutinee, self.checker.options.complexity_limit) {
                Ok(usefulness) => usefulness,
                Err(error) => {
                    warn!(%error, %span, "skipping exhaustiveness check");
                    return;
                }
            };
        for (&pattern, &arm) in patterns.iter().zip(&usefulness.arms) {
            self.checker.annotations.arm_usefulness.insert(pattern, arm);
        }
        if !usefulness.is_exhaustive() {
            debug!(uncovered = ?usefulness.uncovered, "non-exhaustive match");
            self.checker.report(TypeError::MatchNonExhaustive, span);
        }
    }

    fn signature(&mut self, id: FunctionId) -> Option<FnSigId> {
        let signature = self.checker.registry.signature_for(id);
        if signature.is_none() {
            let span = self.checker.program.function(id).name.span;
            self.fail(CompileError::internal_at("function has no signature", span));
        }
        signature
    }
}

impl Visitor for Validator<'_, '_> {
    fn visit_program(&mut self, program: &Program) {
        for union in &program.unions {
            self.visit_union(program, union);
        }
        for class in &program.classes {
            self.visit_class(program, class);
        }
        let locals = self.checker.annotations.top_level_locals.clone();
        self.with_locals(&locals, true, |v| {
            for &function in &program.top_level_functions {
                v.visit_function(program, function);
            }
        });
        self.with_locals(&locals, false, |v| {
            for &expr in &program.top_level {
                v.visit_expr(program, expr);
            }
        });
    }

    fn visit_class(&mut self, program: &Program, class: &ClassDecl) {
        self.with_locals(&[], true, |v| walk_class(v, program, class));
    }

    /// The body runs with every local unassigned; functions declared directly
    /// in the body are checked as if called after it finished.
    fn visit_function(&mut self, program: &Program, id: FunctionId) {
        let Some(sig) = self.signature(id) else {
            return;
        };
        let locals = self.checker.registry.function(sig).locals.clone();
        let body = &program.function(id).body;
        self.with_locals(&locals, false, |v| {
            for &expr in &body.exprs {
                v.visit_expr(program, expr);
            }
        });
        self.with_locals(&locals, true, |v| {
            for &function in &body.functions {
                v.visit_function(program, function);
            }
        });
    }

    fn visit_expr(&mut self, program: &Program, id: ExprId) {
        let span = program.expr_span(id);
        match self.checker.type_of(id) {
            Ok(ty) => self.check_resolved(&ty, span),
            Err(error) => return self.fail(error),
        }

        match &program.expr(id).node {
            Expr::VariableDeclaration { value, .. } => {
                self.check_declaration(id, *value, span);
                if let Some(value) = value {
                    self.visit_expr(program, *value);
                }
            }
            Expr::Variable { name, .. } => self.check_closure_reference(id, name, span),
            Expr::MemberAccess { owner, .. } => {
                self.visit_expr(program, *owner);
                self.check_instantiation_args(id, span);
            }
            Expr::StaticMemberAccess { .. } => self.check_instantiation_args(id, span),
            Expr::Binary { op: BinaryOp::Assign, left, right } => {
                self.visit_expr(program, *left);
                self.visit_expr(program, *right);
                let target = self.checker.annotations.variable_refs.get(left).copied();
                if let Some(variable) = target {
                    if let VariableKind::Local { .. } = self.checker.env.variable(variable).kind {
                        self.set_initialized(variable, true);
                    }
                }
            }
            Expr::If { check, body, else_ifs, else_body } => {
                self.visit_if(program, id, *check, *body, else_ifs, *else_body);
            }
            Expr::Matches { value, .. } => {
                self.visit_expr(program, *value);
                let bound = self.checker.annotations.matches_variables.get(&id).cloned().unwrap_or_default();
                for variable in bound {
                    self.set_initialized(variable, true);
                }
            }
            Expr::Match { value, arms } => self.visit_match(program, id, *value, arms),
            Expr::While { check, body } => {
                self.visit_expr(program, *check);
                if let Some(body) = body {
                    let pending = self.pending();
                    self.visit_expr(program, *body);
                    for variable in pending {
                        self.set_initialized(variable, false);
                    }
                }
            }
            _ => walk_expr(self, program, id),
        }
    }
}

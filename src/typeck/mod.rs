//! Two-pass static checker.
//!
//! The first pass registers every signature, then checks bodies in a fixed
//! order (union functions, classes, top-level expressions, top-level
//! functions), inferring generic arguments through [`generics::GenericCells`].
//! When it reports nothing, a second pass validates what inference left
//! behind: unresolved cells, closures over unassigned variables and match
//! exhaustiveness.

pub mod annotations;
pub mod closures;
pub mod env;
pub mod exhaustiveness;
pub mod generics;
pub mod registry;
pub mod serializable;
pub mod types;

mod check;
mod infer;
mod patterns;
mod register;
mod resolve;
mod unify;
mod validate;

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::ast::{ExprId, Program};
use crate::diagnostics::{CompileError, Diagnostic, TypeError};
use crate::manifest::CheckerOptions;
use crate::span::Span;

pub use annotations::{Annotations, ArmUsefulness, FunctionObject, MemberKind, MemberRef};
pub use env::{Variable, VariableKind};
pub use exhaustiveness::{AnalysisError, MatchInput, MatrixAnalyzer, Usefulness, UsefulnessAnalyzer, Witness};
pub use serializable::{summarize, CheckSummary};
pub use resolve::InstantiatedFunction;

use env::{FrameSpec, TypeEnv};
use generics::GenericCells;
use registry::Registry;
use types::{ClassId, FnSigId, Type, TypeDisplay, TypeOwner, UnionId, VariableId};

/// Checks `program` with the default usefulness analyzer.
pub fn type_check(program: &Program, options: &CheckerOptions) -> Result<CheckedProgram, CompileError> {
    type_check_with(program, options, &MatrixAnalyzer)
}

#[instrument(skip_all, fields(exprs = program.exprs.len(), functions = program.functions.len()))]
pub fn type_check_with(
    program: &Program,
    options: &CheckerOptions,
    analyzer: &dyn UsefulnessAnalyzer,
) -> Result<CheckedProgram, CompileError> {
    let mut checker = Checker::new(program, options);

    // Pass 1: Register class and union names
    checker.register_type_skeletons();

    // Pass 2: Fill in variants, fields and function signatures
    checker.register_signatures()?;

    // Pass 3: Check union function bodies
    checker.check_unions()?;

    // Pass 4: Check static field initializers and class function bodies
    checker.check_classes()?;

    // Pass 5: Check top-level expressions, then top-level function bodies
    checker.check_top_level()?;

    let first_pass_errors = checker.diagnostics.len();
    debug!(first_pass_errors, cells = checker.cells.len(), "first pass finished");

    // Pass 6: Validate what inference produced
    if first_pass_errors == 0 {
        validate::validate(&mut checker, analyzer)?;
    }

    Ok(checker.finish())
}

/// State threaded through both passes.
pub(crate) struct Checker<'p> {
    pub(crate) program: &'p Program,
    pub(crate) options: &'p CheckerOptions,
    pub(crate) registry: Registry,
    pub(crate) cells: GenericCells,
    pub(crate) env: TypeEnv,
    pub(crate) annotations: Annotations,
    pub(crate) diagnostics: Vec<Diagnostic>,
    /// Registered id per `program.classes` entry; `None` when its name conflicted.
    pub(crate) class_ids: Vec<Option<ClassId>>,
    pub(crate) union_ids: Vec<Option<UnionId>>,
}

impl<'p> Checker<'p> {
    fn new(program: &'p Program, options: &'p CheckerOptions) -> Self {
        let mut cells = GenericCells::new();
        let registry = Registry::new(&mut cells);
        let mut root_functions = HashMap::new();
        root_functions.insert(
            registry.function(registry.builtins.printf).name.clone(),
            registry.builtins.printf,
        );
        let env = TypeEnv::new(root_functions, registry.unit());
        Self {
            program,
            options,
            registry,
            cells,
            env,
            annotations: Annotations::default(),
            diagnostics: Vec::new(),
            class_ids: Vec::new(),
            union_ids: Vec::new(),
        }
    }

    fn finish(self) -> CheckedProgram {
        CheckedProgram {
            registry: self.registry,
            cells: self.cells,
            variables: self.env.into_variables(),
            annotations: self.annotations,
            diagnostics: self.diagnostics,
        }
    }

    pub(crate) fn report(&mut self, error: TypeError, span: Span) {
        debug!(%error, %span, "diagnostic");
        self.diagnostics.push(Diagnostic::new(error, span));
    }

    pub(crate) fn display(&self, ty: &Type) -> String {
        TypeDisplay::new(ty, &self.registry, &self.cells).to_string()
    }

    /// Runs `f` inside a new frame and releases the frame afterwards, also
    /// when `f` fails.
    pub(crate) fn in_scope<R>(
        &mut self,
        spec: FrameSpec,
        f: impl FnOnce(&mut Self) -> Result<R, CompileError>,
    ) -> Result<R, CompileError> {
        let mark = self.env.push(spec);
        let result = f(self);
        self.env.pop_to(mark)?;
        result
    }

    pub(crate) fn current_function(&self) -> Option<FnSigId> {
        self.env.frame().current_function
    }

    pub(crate) fn current_type(&self) -> Option<TypeOwner> {
        self.env.frame().current_type
    }

    /// Locals of the current function, or of the top level.
    pub(crate) fn locals_mut(&mut self) -> &mut Vec<VariableId> {
        match self.env.frame().current_function {
            Some(function) => &mut self.registry.function_mut(function).locals,
            None => &mut self.annotations.top_level_locals,
        }
    }

    pub(crate) fn type_of(&self, expr: ExprId) -> Result<Type, CompileError> {
        self.annotations.expr_types.get(&expr).cloned().ok_or_else(|| {
            CompileError::internal_at("expression was not checked", self.program.expr_span(expr))
        })
    }
}

/// Everything the checker learned about a program.
#[derive(Debug)]
pub struct CheckedProgram {
    pub registry: Registry,
    pub cells: GenericCells,
    pub variables: Vec<Variable>,
    pub annotations: Annotations,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckedProgram {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn type_of(&self, expr: ExprId) -> Option<&Type> {
        self.annotations.expr_types.get(&expr)
    }

    /// Rendered type of `expr`, following inference results.
    pub fn display_type_of(&self, expr: ExprId) -> Option<String> {
        self.type_of(expr).map(|ty| self.display(ty))
    }

    pub fn display(&self, ty: &Type) -> String {
        TypeDisplay::new(ty, &self.registry, &self.cells).to_string()
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    /// Variable introduced by a declaration expression.
    pub fn declared_variable(&self, decl: ExprId) -> Option<&Variable> {
        self.annotations.declared_variables.get(&decl).map(|id| self.variable(*id))
    }

    pub fn is_value_useful(&self, expr: ExprId) -> bool {
        self.annotations.value_useful.contains(&expr)
    }
}

//! Statement-like expressions and the order bodies are checked in.

use tracing::trace;

use crate::ast::{Block, ElseIf, Expr, ExprId, Literal, MatchArm, TypeExpr};
use crate::diagnostics::{CompileError, TypeError};
use crate::span::{Span, Spanned};

use super::env::{FrameSpec, Variable, VariableKind};
use super::generics::CellOrigin;
use super::types::*;
use super::Checker;

impl Checker<'_> {
    pub(crate) fn check_unions(&mut self) -> Result<(), CompileError> {
        for id in self.union_ids.clone().into_iter().flatten() {
            let owner = TypeOwner::Union(id);
            let placeholders = self.registry.placeholders(owner.into());
            let functions = self.registry.union(id).functions.clone();
            self.in_scope(FrameSpec::for_type(owner, placeholders), |checker| {
                for function in functions {
                    checker.check_function_body(function)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    pub(crate) fn check_classes(&mut self) -> Result<(), CompileError> {
        for id in self.class_ids.clone().into_iter().flatten() {
            let owner = TypeOwner::Class(id);
            let placeholders = self.registry.placeholders(owner.into());
            self.in_scope(FrameSpec::for_type(owner, placeholders), |checker| checker.check_class(id))?;
        }
        Ok(())
    }

    fn check_class(&mut self, id: ClassId) -> Result<(), CompileError> {
        let fields = self.registry.class(id).fields.clone();
        let mut static_fields = Vec::new();
        let mut instance_fields = Vec::new();

        for field in &fields {
            match field.initializer {
                Some(initializer) => {
                    self.check_value(initializer)?;
                    self.expect_expr(&field.ty, initializer)?;
                }
                None if field.is_static => {
                    self.report(TypeError::StaticFieldWithoutInitializer { field: field.name.clone() }, field.span);
                }
                None => {}
            }
            let variable = self.env.create(Variable {
                name: field.name.clone(),
                span: field.span,
                ty: field.ty.clone(),
                is_mut: field.is_mut,
                kind: VariableKind::Field { owner: id, index: field.index, is_static: field.is_static },
                referenced_in_closure: false,
            });
            if field.is_static {
                static_fields.push(variable);
            } else {
                instance_fields.push(variable);
            }
        }

        let functions = self.registry.class(id).functions.clone();
        let (statics, instances): (Vec<FnSigId>, Vec<FnSigId>) =
            functions.into_iter().partition(|f| self.registry.function(*f).is_static);

        self.in_scope(FrameSpec::default(), |checker| {
            for &variable in &static_fields {
                checker.env.bind(variable);
            }
            for function in statics {
                checker.check_function_body(function)?;
            }
            Ok(())
        })?;

        self.in_scope(FrameSpec::default(), |checker| {
            for &variable in instance_fields.iter().chain(&static_fields) {
                checker.env.bind(variable);
            }
            for function in instances {
                checker.check_function_body(function)?;
            }
            Ok(())
        })
    }

    /// Top-level expressions, then top-level function bodies. Both share one
    /// scope so functions see the top-level variables.
    pub(crate) fn check_top_level(&mut self) -> Result<(), CompileError> {
        let program = self.program;
        self.in_scope(FrameSpec::default(), |checker| {
            for &expr in &program.top_level {
                checker.check_expr(expr)?;
            }
            for &function in &program.top_level_functions {
                let sig = checker.registry.signature_for(function).ok_or_else(|| {
                    CompileError::internal_at("top-level function has no signature", program.function(function).name.span)
                })?;
                checker.check_function_body(sig)?;
            }
            Ok(())
        })
    }

    pub(crate) fn check_function_body(&mut self, sig: FnSigId) -> Result<(), CompileError> {
        let program = self.program;
        let signature = self.registry.function(sig);
        let decl = signature
            .decl
            .ok_or_else(|| CompileError::internal_at("function has no declaration", signature.span))?;
        trace!(function = %signature.name, "checking function body");

        let return_type = signature.return_type.clone();
        let placeholders = self.registry.placeholders(GenericOwner::Function(sig));
        self.in_scope(FrameSpec::for_function(sig, return_type.clone(), placeholders), |checker| {
            let signature = checker.registry.function(sig);
            let params = signature.params.clone();
            let owner = signature.owner.filter(|_| !signature.is_static);
            let local_functions = signature.local_functions.clone();

            for (index, param) in params.into_iter().enumerate() {
                let variable = checker.env.create(Variable {
                    name: param.name,
                    span: param.span,
                    ty: param.ty,
                    is_mut: param.is_mut,
                    kind: VariableKind::Parameter { function: sig, index: index as u32 },
                    referenced_in_closure: false,
                });
                checker.env.bind(variable);
            }
            if let Some(owner) = owner {
                let ty = checker.self_instance(owner);
                let this = checker.env.create(Variable {
                    name: "this".to_string(),
                    span: checker.registry.function(sig).span,
                    ty,
                    is_mut: false,
                    kind: VariableKind::This { function: sig },
                    referenced_in_closure: false,
                });
                checker.env.bind(this);
            }
            for &local in &local_functions {
                let name = checker.registry.function(local).name.clone();
                checker.env.frame_mut().functions.insert(name, local);
            }

            let body = &program.function(decl).body;
            for &expr in &body.exprs {
                checker.check_expr(expr)?;
            }

            let diverges = body.exprs.iter().any(|&expr| program.diverges(expr));
            let returns_unit = checker.cells.shallow_resolve(&return_type).is_class(checker.registry.builtins.unit);
            if !diverges && !returns_unit && !return_type.is_unknown() {
                let expected = checker.display(&return_type);
                let span = program.function(decl).name.span;
                checker.report(TypeError::MismatchedTypes { expected, found: "unit".to_string() }, span);
            }

            for local in local_functions {
                checker.check_function_body(local)?;
                checker.propagate_captures(sig, local);
            }
            Ok(())
        })
    }

    pub(crate) fn check_expr(&mut self, id: ExprId) -> Result<Type, CompileError> {
        self.check_expr_with(id, false)
    }

    /// Marks `id` as consumed by its parent, then checks it.
    pub(crate) fn check_value(&mut self, id: ExprId) -> Result<Type, CompileError> {
        self.annotations.mark_value_useful(id);
        self.check_expr(id)
    }

    /// Checks `id` and records its type. `allow_uninstantiated` lets a bare
    /// variable be read before assignment, for assignment targets.
    pub(crate) fn check_expr_with(&mut self, id: ExprId, allow_uninstantiated: bool) -> Result<Type, CompileError> {
        let program = self.program;
        let expr = program.expr(id);
        if self.annotations.expr_types.contains_key(&id) {
            return Err(CompileError::internal_at("expression checked twice", expr.span));
        }

        let ty = match &expr.node {
            Expr::Literal(Literal::Int(_)) => self.registry.int(),
            Expr::Literal(Literal::String(_)) => self.registry.string(),
            Expr::Literal(Literal::Bool(_)) => self.registry.boolean(),
            Expr::Todo => self.registry.never(),
            Expr::Variable { name, type_args } => {
                self.check_value_access(id, name, type_args.as_deref(), allow_uninstantiated)?
            }
            Expr::VariableDeclaration { name, is_mut, ty, value } => {
                self.check_declaration(id, name, *is_mut, ty.as_ref(), *value)?
            }
            Expr::Binary { op, left, right } => self.check_binary(id, *op, *left, *right)?,
            Expr::Unary { op, operand } => self.check_unary(*op, *operand, expr.span)?,
            Expr::MemberAccess { owner, member, type_args } => {
                self.check_member_access(id, *owner, member, type_args.as_deref())?
            }
            Expr::StaticMemberAccess { ty, member, type_args } => {
                self.check_static_member_access(id, ty, member, type_args.as_deref())?
            }
            Expr::Call { callee, args } => self.check_call(*callee, args, expr.span)?,
            Expr::Return(value) => self.check_return(*value, expr.span)?,
            Expr::Block(block) => self.check_block(block)?,
            Expr::If { check, body, else_ifs, else_body } => self.check_if(*check, *body, else_ifs, *else_body)?,
            Expr::While { check, body } => self.check_while(*check, *body)?,
            Expr::Break => self.check_loop_jump(TypeError::BreakOutsideLoop, expr.span),
            Expr::Continue => self.check_loop_jump(TypeError::ContinueOutsideLoop, expr.span),
            Expr::Tuple(values) => self.check_tuple(values, expr.span)?,
            Expr::ObjectInitializer { ty, fields } => self.check_object_initializer(id, ty, fields)?,
            Expr::VariantInitializer { ty, variant, fields } => {
                self.check_variant_initializer(id, ty, variant, fields)?
            }
            Expr::Matches { value, pattern } => self.check_matches(id, *value, *pattern)?,
            Expr::Match { value, arms } => self.check_match(*value, arms)?,
        };

        self.annotations.set_type(id, ty.clone());
        Ok(ty)
    }

    fn check_block(&mut self, block: &Block) -> Result<Type, CompileError> {
        self.in_scope(FrameSpec::default(), |checker| {
            let parent = checker.current_function();
            let mut locals = Vec::with_capacity(block.functions.len());
            for &function in &block.functions {
                let sig = match checker.registry.signature_for(function) {
                    Some(sig) => sig,
                    None => checker.build_function_signature(function, None, parent)?,
                };
                match parent {
                    Some(parent) => checker.registry.function_mut(parent).local_functions.push(sig),
                    None => checker.annotations.top_level_local_functions.push(sig),
                }
                let name = checker.registry.function(sig).name.clone();
                checker.env.frame_mut().functions.insert(name, sig);
                locals.push(sig);
            }
            for sig in locals {
                checker.check_function_body(sig)?;
                if let Some(parent) = parent {
                    checker.propagate_captures(parent, sig);
                }
            }
            for &expr in &block.exprs {
                checker.check_expr(expr)?;
            }
            Ok(checker.registry.unit())
        })
    }

    fn check_declaration(
        &mut self,
        id: ExprId,
        name: &Spanned<String>,
        is_mut: bool,
        ty: Option<&Spanned<TypeExpr>>,
        value: Option<ExprId>,
    ) -> Result<Type, CompileError> {
        let already_defined = self.env.is_defined(&name.node);
        if already_defined {
            self.report(TypeError::DuplicateVariableDeclaration { name: name.node.clone() }, name.span);
        }

        let (variable_type, instantiated) = match (ty, value) {
            (None, None) => {
                let cell = self.cells.fresh(CellOrigin::InferredVariable { name: name.node.clone() });
                (Type::Cell(cell), false)
            }
            (declared, Some(value)) => {
                let value_type = self.check_value(value)?;
                match declared {
                    Some(declared) => {
                        let declared = self.resolve_type(declared);
                        self.expect_expr(&declared, value)?;
                        (declared, true)
                    }
                    None => (value_type, true),
                }
            }
            (Some(declared), None) => (self.resolve_type(declared), false),
        };

        let variable = self.env.create(Variable {
            name: name.node.clone(),
            span: name.span,
            ty: variable_type,
            is_mut,
            kind: VariableKind::Local { function: self.current_function(), instantiated },
            referenced_in_closure: false,
        });
        if !already_defined {
            self.env.bind(variable);
            self.locals_mut().push(variable);
        }
        self.annotations.declared_variables.insert(id, variable);
        Ok(self.registry.unit())
    }

    /// Whether `id` may appear on the left of an assignment. Reports why not
    /// when `report` is set.
    pub(crate) fn expect_assignable(&mut self, id: ExprId, report: bool) -> Result<bool, CompileError> {
        let program = self.program;
        let expr = program.expr(id);
        match &expr.node {
            Expr::Variable { name, .. } => {
                let Some(variable) = self.env.lookup(name) else {
                    return Ok(false);
                };
                let variable = self.env.variable(variable);
                let assignable = match variable.kind {
                    VariableKind::Local { instantiated, .. } => !instantiated || variable.is_mut,
                    VariableKind::Field { .. } | VariableKind::Parameter { .. } => variable.is_mut,
                    VariableKind::This { function } => self.registry.function(function).is_mut,
                };
                if !assignable && report {
                    let error = match variable.kind {
                        VariableKind::This { .. } => TypeError::MutatingInstanceInNonMutableFunction,
                        _ => TypeError::NonMutableAssignment { name: variable.name.clone() },
                    };
                    self.report(error, expr.span);
                }
                Ok(assignable)
            }
            Expr::MemberAccess { owner, member, .. } => {
                let owner_assignable = self.expect_assignable(*owner, false)?;
                let owner_type = self.type_of(*owner)?;
                let field = match self.cells.shallow_resolve(&owner_type) {
                    Type::Class(instance) => self.registry.class(instance.id).field(&member.node).map(|f| f.is_mut),
                    _ => None,
                };
                match field {
                    None => {
                        if report {
                            self.report(TypeError::ExpressionNotAssignable, expr.span);
                        }
                        Ok(false)
                    }
                    Some(false) => {
                        if report {
                            self.report(TypeError::NonMutableMemberAssignment { member: member.node.clone() }, expr.span);
                        }
                        Ok(false)
                    }
                    Some(true) if owner_assignable => Ok(true),
                    Some(true) => {
                        if report {
                            let error = match &program.expr(*owner).node {
                                Expr::Variable { name, .. } if name == "this" => {
                                    TypeError::MutatingInstanceInNonMutableFunction
                                }
                                _ => TypeError::NonMutableMemberOwnerAssignment,
                            };
                            self.report(error, program.expr_span(*owner));
                        }
                        Ok(false)
                    }
                }
            }
            Expr::StaticMemberAccess { ty, member, .. } => {
                let field = match &ty.node {
                    TypeExpr::Named { name, .. } => match self.registry.lookup_type(name) {
                        Some(TypeOwner::Class(class)) => {
                            self.registry.class(class).field(&member.node).map(|f| (f.is_static, f.is_mut))
                        }
                        _ => None,
                    },
                    _ => None,
                };
                match field {
                    Some((true, true)) => Ok(true),
                    Some((true, false)) => {
                        if report {
                            self.report(TypeError::NonMutableMemberAssignment { member: member.node.clone() }, expr.span);
                        }
                        Ok(false)
                    }
                    _ => {
                        if report {
                            self.report(TypeError::ExpressionNotAssignable, expr.span);
                        }
                        Ok(false)
                    }
                }
            }
            _ => {
                if report {
                    self.report(TypeError::ExpressionNotAssignable, expr.span);
                }
                Ok(false)
            }
        }
    }

    fn check_return(&mut self, value: Option<ExprId>, span: Span) -> Result<Type, CompileError> {
        let expected = self.env.frame().expected_return.clone();
        match value {
            Some(value) => {
                self.check_value(value)?;
                self.expect_expr(&expected, value)?;
            }
            None => {
                let unit = self.registry.unit();
                self.expect_type(&unit, &expected, span, true);
            }
        }
        Ok(self.registry.never())
    }

    fn check_if(
        &mut self,
        check: ExprId,
        body: Option<ExprId>,
        else_ifs: &[ElseIf],
        else_body: Option<ExprId>,
    ) -> Result<Type, CompileError> {
        self.in_scope(FrameSpec::default(), |checker| {
            checker.check_condition(check)?;
            // Locals still unassigned once the condition ran; the branches decide their fate.
            let pending = checker.env.uninstantiated_locals();

            let bound = checker.matches_bindings(check);
            checker.set_instantiated(&bound, true);
            if let Some(body) = body {
                checker.check_value(body)?;
            }
            let in_body = checker.instantiation_state(&pending);
            checker.set_instantiated(&pending, false);
            checker.set_instantiated(&bound, false);

            let mut in_every_else_if = vec![true; pending.len()];
            for branch in else_ifs {
                checker.in_scope(FrameSpec::default(), |checker| {
                    checker.check_condition(branch.check)?;
                    let bound = checker.matches_bindings(branch.check);
                    checker.set_instantiated(&bound, true);
                    if let Some(body) = branch.body {
                        checker.check_value(body)?;
                    }
                    for (state, assigned) in in_every_else_if.iter_mut().zip(checker.instantiation_state(&pending)) {
                        *state &= assigned;
                    }
                    checker.set_instantiated(&pending, false);
                    checker.set_instantiated(&bound, false);
                    Ok(())
                })?;
            }

            let mut in_else = vec![false; pending.len()];
            if let Some(else_body) = else_body {
                checker.in_scope(FrameSpec::default(), |checker| {
                    checker.check_value(else_body)?;
                    in_else = checker.instantiation_state(&pending);
                    checker.set_instantiated(&pending, false);
                    Ok(())
                })?;
            }

            for (i, &variable) in pending.iter().enumerate() {
                let assigned = body.is_some()
                    && in_body[i]
                    && else_body.is_some()
                    && in_else[i]
                    && (else_ifs.is_empty() || in_every_else_if[i]);
                checker.env.set_instantiated(variable, assigned);
            }
            Ok(checker.registry.unit())
        })
    }

    fn check_condition(&mut self, check: ExprId) -> Result<(), CompileError> {
        self.check_value(check)?;
        let boolean = self.registry.boolean();
        self.expect_expr(&boolean, check)?;
        Ok(())
    }

    fn matches_bindings(&self, check: ExprId) -> Vec<VariableId> {
        self.annotations.matches_variables.get(&check).cloned().unwrap_or_default()
    }

    pub(crate) fn set_instantiated(&mut self, variables: &[VariableId], value: bool) {
        for &variable in variables {
            self.env.set_instantiated(variable, value);
        }
    }

    fn instantiation_state(&self, variables: &[VariableId]) -> Vec<bool> {
        variables.iter().map(|&v| self.env.is_instantiated(v)).collect()
    }

    fn check_while(&mut self, check: ExprId, body: Option<ExprId>) -> Result<Type, CompileError> {
        self.check_condition(check)?;
        if let Some(body) = body {
            // Locals unassigned before the body stay unassigned after it.
            let pending = self.env.uninstantiated_locals();
            self.in_scope(FrameSpec::for_loop(), |checker| checker.check_expr(body))?;
            self.set_instantiated(&pending, false);
        }
        Ok(self.registry.unit())
    }

    fn check_loop_jump(&mut self, error: TypeError, span: Span) -> Type {
        if self.env.frame().loop_depth == 0 {
            self.report(error, span);
        }
        self.registry.unit()
    }

    fn check_match(&mut self, value: ExprId, arms: &[MatchArm]) -> Result<Type, CompileError> {
        let value_type = self.check_value(value)?;
        let mut found: Option<Type> = None;
        for arm in arms {
            self.in_scope(FrameSpec::default(), |checker| {
                let bound = checker.check_pattern(&value_type, arm.pattern)?;
                checker.set_instantiated(&bound, true);
                if bound.iter().any(|&v| checker.env.variable(v).is_mut) {
                    checker.expect_assignable(value, true)?;
                }
                if let Some(body) = arm.body {
                    let body_type = checker.check_value(body)?;
                    match &found {
                        Some(expected) => {
                            checker.expect_expr(expected, body)?;
                        }
                        None => found = Some(body_type),
                    }
                }
                checker.set_instantiated(&bound, false);
                Ok(())
            })?;
        }
        Ok(found.unwrap_or(Type::Unknown))
    }
}

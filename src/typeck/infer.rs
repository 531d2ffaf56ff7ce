//! Expressions that produce values: variable and member access, calls,
//! operators, tuples, initializers and `matches`.

use std::collections::HashSet;

use crate::ast::{BinaryOp, ExprId, FieldInit, PatternId, TypeExpr, UnaryOp};
use crate::diagnostics::{CompileError, TypeError};
use crate::span::{Span, Spanned};

use super::annotations::{FunctionObject, MemberKind, MemberRef};
use super::env::VariableKind;
use super::registry::{FieldSignature, VariantKind, RESULT_ERROR, RESULT_OK};
use super::resolve::InstantiatedFunction;
use super::types::*;
use super::Checker;

const THIS: &str = "this";

fn instance_args(ty: &Type) -> Vec<CellId> {
    match ty {
        Type::Class(instance) => instance.args.clone(),
        Type::Union(instance) => instance.args.clone(),
        _ => Vec::new(),
    }
}

impl Checker<'_> {
    fn record_function(&mut self, id: ExprId, function: InstantiatedFunction) -> Type {
        let ty = function.fn_type();
        let class = self.registry.function_class(function.params.len());
        let args = function.params.iter().map(|p| p.ty.clone()).chain(std::iter::once(function.ret.clone())).collect();
        self.annotations.function_objects.insert(id, FunctionObject { class, args });
        self.annotations.instantiations.insert(id, function);
        ty
    }

    fn record_member(&mut self, id: ExprId, kind: MemberKind, index: u32) {
        self.annotations.members.insert(id, MemberRef { kind, index });
    }

    pub(crate) fn check_value_access(
        &mut self,
        id: ExprId,
        name: &str,
        type_args: Option<&[Spanned<TypeExpr>]>,
        allow_uninstantiated: bool,
    ) -> Result<Type, CompileError> {
        let span = self.program.expr_span(id);

        if name == "ok" || name == "error" {
            let variant = if name == "ok" { RESULT_OK } else { RESULT_ERROR };
            return Ok(self.result_constructor(id, variant, span));
        }

        if let Some(function) = self.env.lookup_function(name) {
            let instantiated = self.instantiate_function(function, Vec::new(), type_args, span);
            return Ok(self.record_function(id, instantiated));
        }

        if let Some(owner) = self.current_type() {
            if let Some((index, function)) = self.registry.member_function(owner, name) {
                let in_static_context = self.current_function().is_none_or(|f| self.registry.function(f).is_static);
                if !self.registry.function(function).is_static && in_static_context {
                    self.report(TypeError::AccessInstanceMemberInStaticContext { name: name.to_string() }, span);
                }
                let owner_args = instance_args(&self.self_instance(owner));
                let instantiated = self.instantiate_function(function, owner_args, type_args, span);
                self.record_member(id, MemberKind::Function, index);
                return Ok(self.record_function(id, instantiated));
            }
        }

        if type_args.is_some() {
            self.report(TypeError::GenericTypeArgumentsOnNonFunctionValue, span);
        }

        let Some(variable) = self.lookup_variable(name, span) else {
            let error = if name == THIS {
                TypeError::ThisAccessedOutsideOfInstanceMethod
            } else {
                TypeError::SymbolNotFound { name: name.to_string() }
            };
            self.report(error, span);
            return Ok(Type::Unknown);
        };
        self.annotations.variable_refs.insert(id, variable);

        let current = self.current_function();
        let found = self.env.variable(variable);
        if let VariableKind::Local { function, instantiated: false } = found.kind {
            // Outer locals are assumed assigned by the time a closure runs; the
            // second pass checks that.
            if !allow_uninstantiated && function == current {
                self.report(TypeError::AccessUninitializedVariable { name: name.to_string() }, span);
            }
        }
        Ok(self.env.variable(variable).ty.clone())
    }

    /// `ok` and `error`: the create functions of the builtin result variants.
    fn result_constructor(&mut self, id: ExprId, variant: &str, span: Span) -> Type {
        let result = self.registry.builtins.result;
        let create = if variant == RESULT_OK { self.registry.builtins.result_ok } else { self.registry.builtins.result_error };
        let owner_args = self.instantiate(GenericOwner::Union(result), &[], span);
        let instantiated = self.instantiate_function(create, owner_args, None, span);
        self.record_function(id, instantiated)
    }

    /// Field `name` of `class` with accessibility checked. Reports unknown
    /// and private fields.
    pub(crate) fn class_field(&mut self, class: ClassId, name: &Spanned<String>) -> Option<FieldSignature> {
        let signature = self.registry.class(class);
        let Some(field) = signature.field(&name.node).cloned() else {
            let error = TypeError::UnknownTypeMember { member: name.node.clone(), ty: signature.name.clone() };
            self.report(error, name.span);
            return None;
        };
        if !field.is_pub && self.current_type() != Some(TypeOwner::Class(class)) {
            self.report(TypeError::PrivateFieldReferenced { field: field.name.clone() }, name.span);
        }
        Some(field)
    }

    pub(crate) fn check_member_access(
        &mut self,
        id: ExprId,
        owner: ExprId,
        member: &Spanned<String>,
        type_args: Option<&[Spanned<TypeExpr>]>,
    ) -> Result<Type, CompileError> {
        let span = self.program.expr_span(id);
        let owner_type = self.check_value(owner)?;
        let resolved = self.cells.shallow_resolve(&owner_type);

        let type_owner = match &resolved {
            Type::Class(instance) => TypeOwner::Class(instance.id),
            Type::Union(instance) => TypeOwner::Union(instance.id),
            Type::Unknown => return Ok(Type::Unknown),
            _ => {
                self.report(TypeError::MemberAccessOnGenericExpression { member: member.node.clone() }, span);
                return Ok(Type::Unknown);
            }
        };
        let args = instance_args(&resolved);

        if let Some((index, function)) = self.registry.member_function(type_owner, &member.node) {
            let signature = self.registry.function(function);
            let (is_static, is_mut) = (signature.is_static, signature.is_mut);
            if is_static {
                self.report(TypeError::InstanceMemberAccessOnStaticMember { member: member.node.clone() }, span);
            }
            let instantiated = self.instantiate_function(function, args, type_args, span);
            self.record_member(id, MemberKind::Function, index);
            if is_mut {
                self.expect_assignable(owner, true)?;
            }
            return Ok(self.record_function(id, instantiated));
        }

        let TypeOwner::Class(class) = type_owner else {
            let ty = self.registry.type_name(type_owner).to_string();
            self.report(TypeError::UnknownTypeMember { member: member.node.clone(), ty }, member.span);
            return Ok(Type::Unknown);
        };
        if type_args.is_some() {
            self.report(TypeError::GenericTypeArgumentsOnNonFunctionValue, span);
        }
        let Some(field) = self.class_field(class, member) else {
            return Ok(Type::Unknown);
        };
        if field.is_static {
            self.report(TypeError::InstanceMemberAccessOnStaticMember { member: member.node.clone() }, span);
        }
        self.record_member(id, MemberKind::Field, field.index);
        Ok(self.member_type(&field.ty, type_owner, &args))
    }

    pub(crate) fn check_static_member_access(
        &mut self,
        id: ExprId,
        ty: &Spanned<TypeExpr>,
        member: &Spanned<String>,
        type_args: Option<&[Spanned<TypeExpr>]>,
    ) -> Result<Type, CompileError> {
        let span = self.program.expr_span(id);
        let owner_type = self.resolve_type(ty);
        let resolved = self.cells.shallow_resolve(&owner_type);
        let args = instance_args(&resolved);

        let type_owner = match &resolved {
            Type::Class(instance) => TypeOwner::Class(instance.id),
            Type::Union(instance) => TypeOwner::Union(instance.id),
            Type::Unknown => return Ok(Type::Unknown),
            Type::Placeholder(_) | Type::Cell(_) => {
                self.report(TypeError::StaticMemberAccessOnGenericReference { member: member.node.clone() }, span);
                return Ok(Type::Unknown);
            }
            Type::Function(_) => {
                let ty = self.display(&resolved);
                self.report(TypeError::UnknownTypeMember { member: member.node.clone(), ty }, member.span);
                return Ok(Type::Unknown);
            }
        };

        if let TypeOwner::Class(class) = type_owner {
            if self.registry.class(class).field(&member.node).is_some() {
                if type_args.is_some() {
                    self.report(TypeError::GenericTypeArgumentsOnNonFunctionValue, span);
                }
                let Some(field) = self.class_field(class, member) else {
                    return Ok(Type::Unknown);
                };
                if !field.is_static {
                    self.report(TypeError::StaticMemberAccessOnInstanceMember { member: member.node.clone() }, span);
                }
                self.record_member(id, MemberKind::Field, field.index);
                return Ok(self.member_type(&field.ty, type_owner, &args));
            }
        }

        if let TypeOwner::Union(union) = type_owner {
            let variant = self
                .registry
                .union(union)
                .variant(&member.node)
                .map(|(index, variant)| (index, variant.kind.clone()));
            if let Some((index, kind)) = variant {
                if type_args.is_some() {
                    self.report(TypeError::GenericTypeArgumentsOnNonFunctionValue, span);
                }
                self.record_member(id, MemberKind::Variant, index);
                return Ok(match kind {
                    VariantKind::Unit => resolved,
                    VariantKind::Tuple { create, .. } => {
                        let instantiated = self.instantiate_function(create, args, None, span);
                        self.record_function(id, instantiated)
                    }
                    VariantKind::Class { .. } => {
                        self.report(
                            TypeError::UnionClassVariantWithoutInitializer { variant: member.node.clone() },
                            span,
                        );
                        resolved
                    }
                });
            }
        }

        let Some((index, function)) = self.registry.member_function(type_owner, &member.node) else {
            let ty = self.registry.type_name(type_owner).to_string();
            self.report(TypeError::UnknownTypeMember { member: member.node.clone(), ty }, member.span);
            return Ok(Type::Unknown);
        };
        if !self.registry.function(function).is_static {
            self.report(TypeError::StaticMemberAccessOnInstanceMember { member: member.node.clone() }, span);
        }
        let instantiated = self.instantiate_function(function, args, type_args, span);
        self.record_member(id, MemberKind::Function, index);
        Ok(self.record_function(id, instantiated))
    }

    pub(crate) fn check_call(&mut self, callee: ExprId, args: &[ExprId], span: Span) -> Result<Type, CompileError> {
        let callee_type = self.check_value(callee)?;
        let function = match self.cells.shallow_resolve(&callee_type) {
            Type::Function(function) => function,
            Type::Unknown => {
                for &arg in args {
                    self.check_value(arg)?;
                }
                return Ok(Type::Unknown);
            }
            other => {
                let ty = self.display(&other);
                self.report(TypeError::ExpressionNotCallable { ty }, self.program.expr_span(callee));
                for &arg in args {
                    self.check_value(arg)?;
                }
                return Ok(Type::Unknown);
            }
        };

        if args.len() != function.params.len() {
            self.report(
                TypeError::IncorrectNumberOfMethodArguments { expected: function.params.len(), found: args.len() },
                span,
            );
            for &arg in args {
                self.check_value(arg)?;
            }
            return Ok(*function.ret);
        }

        for (&arg, param) in args.iter().zip(&function.params) {
            self.check_value(arg)?;
            self.expect_expr(&param.ty, arg)?;
            if param.is_mut {
                self.expect_assignable(arg, true)?;
            }
        }
        Ok(*function.ret)
    }

    pub(crate) fn check_binary(
        &mut self,
        id: ExprId,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    ) -> Result<Type, CompileError> {
        self.annotations.mark_value_useful(left);
        self.annotations.mark_value_useful(right);
        let int = self.registry.int();
        let boolean = self.registry.boolean();

        match op {
            BinaryOp::LessThan | BinaryOp::GreaterThan => {
                let left_type = self.check_expr(left)?;
                self.check_expr(right)?;
                if self.expect_expr(&int, left)? {
                    self.expect_expr(&left_type, right)?;
                }
                Ok(boolean)
            }
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide => {
                let left_type = self.check_expr(left)?;
                self.check_expr(right)?;
                if self.expect_expr(&int, left)? {
                    self.expect_expr(&left_type, right)?;
                    return Ok(left_type);
                }
                Ok(int)
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                let left_type = self.check_expr(left)?;
                self.check_expr(right)?;
                if self.expect_int_or_bool(&left_type, left) {
                    self.expect_expr(&left_type, right)?;
                }
                Ok(boolean)
            }
            BinaryOp::And | BinaryOp::Or => {
                self.check_expr(left)?;
                self.expect_expr(&boolean, left)?;
                self.check_expr(right)?;
                self.expect_expr(&boolean, right)?;
                Ok(boolean)
            }
            BinaryOp::Assign => self.check_assignment(id, left, right),
        }
    }

    fn expect_int_or_bool(&mut self, ty: &Type, expr: ExprId) -> bool {
        let resolved = self.cells.shallow_resolve(ty);
        let builtins = self.registry.builtins;
        match &resolved {
            Type::Unknown => true,
            Type::Class(instance) if [builtins.int, builtins.bool, builtins.never].contains(&instance.id) => true,
            Type::Cell(_) => {
                let int = self.registry.int();
                self.expect_type(&resolved, &int, self.program.expr_span(expr), true)
            }
            _ => {
                let found = self.display(&resolved);
                let error = TypeError::MismatchedTypes { expected: "int or bool".to_string(), found };
                self.report(error, self.program.expr_span(expr));
                false
            }
        }
    }

    fn check_assignment(&mut self, id: ExprId, left: ExprId, right: ExprId) -> Result<Type, CompileError> {
        let program = self.program;
        let left_type = self.check_expr_with(left, true)?;
        self.annotations.value_useful.remove(&left);
        if !left_type.is_unknown() {
            self.expect_assignable(left, true)?;
        }
        self.check_expr(right)?;

        let target = self.annotations.variable_refs.get(&left).copied();
        if let (Some(variable), false) = (target, left_type.is_unknown()) {
            match self.env.variable(variable).kind {
                VariableKind::Local { instantiated: false, .. } => self.env.set_instantiated(variable, true),
                VariableKind::Field { is_static: false, .. } => {
                    let mutable = self.current_function().is_some_and(|f| self.registry.function(f).is_mut);
                    if !mutable {
                        self.report(TypeError::MutatingInstanceInNonMutableFunction, program.expr_span(id));
                    }
                }
                _ => {}
            }
        }

        self.expect_expr(&left_type, right)?;
        Ok(left_type)
    }

    pub(crate) fn check_unary(&mut self, op: UnaryOp, operand: ExprId, span: Span) -> Result<Type, CompileError> {
        match op {
            UnaryOp::Not => {
                self.check_value(operand)?;
                let boolean = self.registry.boolean();
                self.expect_expr(&boolean, operand)?;
                Ok(boolean)
            }
            UnaryOp::Fallout => self.check_fallout(operand, span),
        }
    }

    /// `value?` unwraps `Ok` and returns `Error` from the enclosing function,
    /// so only the error arguments have to agree.
    fn check_fallout(&mut self, operand: ExprId, span: Span) -> Result<Type, CompileError> {
        let operand_type = self.check_value(operand)?;
        let result = self.registry.builtins.result;
        let expected_return = self.env.frame().expected_return.clone();
        let return_args = match self.cells.shallow_resolve(&expected_return) {
            Type::Union(instance) if instance.id == result => instance.args,
            _ => {
                self.report(TypeError::FalloutOutsideResultFunction, span);
                return Ok(Type::Unknown);
            }
        };

        let synthesized = self.instantiate(GenericOwner::Union(result), &[], span);
        self.cells.link(synthesized[1], return_args[1]);
        let expected = Type::Union(Instance { id: result, args: synthesized });
        self.expect_expr(&expected, operand)?;

        match self.cells.shallow_resolve(&operand_type) {
            Type::Union(instance) if instance.id == result => Ok(Type::Cell(instance.args[0])),
            _ => Ok(Type::Cell(return_args[0])),
        }
    }

    pub(crate) fn check_tuple(&mut self, values: &[ExprId], span: Span) -> Result<Type, CompileError> {
        let mut members = Vec::with_capacity(values.len());
        for &value in values {
            let ty = self.check_value(value)?;
            members.push((ty, self.program.expr_span(value)));
        }
        Ok(self.instantiate_tuple(members, span))
    }

    pub(crate) fn check_object_initializer(
        &mut self,
        id: ExprId,
        ty: &Spanned<TypeExpr>,
        fields: &[FieldInit],
    ) -> Result<Type, CompileError> {
        let span = self.program.expr_span(id);
        let object_type = self.resolve_type(ty);
        for value in fields.iter().filter_map(|f| f.value) {
            self.check_value(value)?;
        }

        let instance = match self.cells.shallow_resolve(&object_type) {
            Type::Class(instance) => instance,
            Type::Unknown => return Ok(Type::Unknown),
            other => {
                let found = self.display(&other);
                self.report(TypeError::MismatchedTypes { expected: "class".to_string(), found }, ty.span);
                return Ok(Type::Unknown);
            }
        };
        let owner = TypeOwner::Class(instance.id);
        let inside_class = self.current_type() == Some(owner);
        let class = self.registry.class(instance.id);
        let class_name = class.name.clone();
        let required: Vec<String> = class
            .fields
            .iter()
            .filter(|f| !f.is_static && (f.is_pub || inside_class))
            .map(|f| f.name.clone())
            .collect();

        let mut initialized = HashSet::new();
        for (position, init) in fields.iter().enumerate() {
            let field = self.registry.class(instance.id).field(&init.name.node).cloned();
            let Some(field) = field else {
                self.report(
                    TypeError::UnknownField { field: init.name.node.clone(), ty: class_name.clone() },
                    init.name.span,
                );
                continue;
            };
            self.annotations.initializer_fields.insert((id, position), field.index);

            if !required.contains(&field.name) {
                self.report(TypeError::PrivateFieldReferenced { field: field.name.clone() }, init.name.span);
            } else if !initialized.insert(field.name.clone()) {
                self.report(
                    TypeError::ClassFieldSetMultipleTypesInInitializer { field: field.name.clone() },
                    init.name.span,
                );
            }

            if let Some(value) = init.value {
                let field_type = self.member_type(&field.ty, owner, &instance.args);
                self.expect_expr(&field_type, value)?;
            }
        }

        let missing: Vec<String> = required.into_iter().filter(|f| !initialized.contains(f)).collect();
        if !missing.is_empty() {
            self.report(TypeError::FieldsLeftUnassignedInClassInitializer { ty: class_name, fields: missing }, span);
        }
        Ok(Type::Class(instance))
    }

    pub(crate) fn check_variant_initializer(
        &mut self,
        id: ExprId,
        ty: &Spanned<TypeExpr>,
        variant: &Spanned<String>,
        fields: &[FieldInit],
    ) -> Result<Type, CompileError> {
        let span = self.program.expr_span(id);
        let union_type = self.resolve_type(ty);
        for value in fields.iter().filter_map(|f| f.value) {
            self.check_value(value)?;
        }

        let instance = match self.cells.shallow_resolve(&union_type) {
            Type::Union(instance) => instance,
            Type::Unknown => return Ok(Type::Unknown),
            other => {
                let ty = self.display(&other);
                self.report(TypeError::UnknownTypeMember { member: variant.node.clone(), ty }, variant.span);
                return Ok(Type::Unknown);
            }
        };
        let owner = TypeOwner::Union(instance.id);
        let union = self.registry.union(instance.id);
        let union_name = union.name.clone();
        let Some((index, signature)) = union.variant(&variant.node) else {
            self.report(TypeError::UnknownTypeMember { member: variant.node.clone(), ty: union_name }, variant.span);
            return Ok(Type::Union(instance));
        };
        let VariantKind::Class { fields: variant_fields } = signature.kind.clone() else {
            self.report(
                TypeError::UnionClassVariantInitializerNotClassVariant { variant: variant.node.clone() },
                variant.span,
            );
            return Ok(Type::Union(instance));
        };
        self.record_member(id, MemberKind::Variant, index);
        let qualified = format!("{union_name}::{}", variant.node);

        let mut initialized = HashSet::new();
        for (position, init) in fields.iter().enumerate() {
            let Some(field) = variant_fields.iter().find(|f| f.name == init.name.node) else {
                self.report(
                    TypeError::UnknownField { field: init.name.node.clone(), ty: qualified.clone() },
                    init.name.span,
                );
                continue;
            };
            self.annotations.initializer_fields.insert((id, position), field.index);
            if !initialized.insert(field.name.clone()) {
                self.report(
                    TypeError::ClassFieldSetMultipleTypesInInitializer { field: field.name.clone() },
                    init.name.span,
                );
            }
            if let Some(value) = init.value {
                let field_type = self.member_type(&field.ty, owner, &instance.args);
                self.expect_expr(&field_type, value)?;
            }
        }

        let missing: Vec<String> = variant_fields
            .iter()
            .filter(|f| !initialized.contains(&f.name))
            .map(|f| f.name.clone())
            .collect();
        if !missing.is_empty() {
            self.report(TypeError::FieldsLeftUnassignedInClassInitializer { ty: qualified, fields: missing }, span);
        }
        Ok(Type::Union(instance))
    }

    pub(crate) fn check_matches(
        &mut self,
        id: ExprId,
        value: ExprId,
        pattern: Option<PatternId>,
    ) -> Result<Type, CompileError> {
        self.annotations.mark_value_useful(id);
        let value_type = self.check_value(value)?;
        if let Some(pattern) = pattern {
            let bound = self.check_pattern(&value_type, pattern)?;
            if bound.iter().any(|&v| self.env.variable(v).is_mut) {
                self.expect_assignable(value, true)?;
            }
            self.annotations.matches_variables.insert(id, bound);
        }
        Ok(self.registry.boolean())
    }
}

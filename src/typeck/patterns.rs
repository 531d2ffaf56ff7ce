//! Pattern checking.
//!
//! Every pattern is checked against the type of the value it is matched
//! with and binds its variables into the current frame. The variables start
//! out unassigned; `match` arms and `if` bodies flip them as they enter.

use std::collections::HashSet;

use crate::ast::{Binding, FieldPattern, Pattern, PatternId};
use crate::diagnostics::{CompileError, TypeError};
use crate::span::{Span, Spanned};

use super::env::{Variable, VariableKind};
use super::registry::{FieldSignature, VariantKind};
use super::types::*;
use super::Checker;

/// A union pattern's type and the variant it names.
struct VariantTarget {
    instance: Instance<UnionId>,
    index: u32,
    kind: VariantKind,
    qualified: String,
}

impl Checker<'_> {
    pub(crate) fn check_pattern(&mut self, value_type: &Type, pattern: PatternId) -> Result<Vec<VariableId>, CompileError> {
        let program = self.program;
        let span = program.pattern_span(pattern);
        let mut bound = Vec::new();

        let pattern_type = match &program.pattern(pattern).node {
            Pattern::Discard => value_type.clone(),
            Pattern::Variable { name, is_mut } => {
                self.bind_pattern_variable(name, *is_mut, value_type.clone(), &mut bound);
                value_type.clone()
            }
            Pattern::Type { ty, binding } => {
                let pattern_type = self.resolve_type(ty);
                self.expect_type(&pattern_type, value_type, span, true);
                self.bind_whole(binding.as_ref(), &pattern_type, &mut bound);
                pattern_type
            }
            Pattern::UnionVariant { ty, variant, binding } => {
                let pattern_type = self.resolve_type(ty);
                self.expect_type(value_type, &pattern_type, span, true);
                if let Some(variant) = variant {
                    if let Some(target) = self.variant_target(&pattern_type, variant, span) {
                        self.annotations.pattern_variants.insert(pattern, target.index);
                    }
                } else if !matches!(self.cells.shallow_resolve(&pattern_type), Type::Union(_) | Type::Unknown) {
                    let ty = self.display(&pattern_type);
                    self.report(TypeError::NonUnionUsedInVariantPattern { ty }, span);
                }
                self.bind_whole(binding.as_ref(), &pattern_type, &mut bound);
                pattern_type
            }
            Pattern::UnionTupleVariant { ty, variant, members, binding } => {
                let pattern_type = self.resolve_type(ty);
                self.expect_type(&pattern_type, value_type, span, true);
                match self.variant_target(&pattern_type, variant, span) {
                    Some(VariantTarget { instance, index, kind: VariantKind::Tuple { members: member_types, .. }, .. }) => {
                        self.annotations.pattern_variants.insert(pattern, index);
                        if member_types.len() != members.len() {
                            self.report(
                                TypeError::IncorrectNumberOfPatternsInTupleVariantUnionPattern {
                                    expected: member_types.len(),
                                    found: members.len(),
                                },
                                span,
                            );
                        }
                        let owner = TypeOwner::Union(instance.id);
                        for (member_type, &member) in member_types.iter().zip(members) {
                            let member_type = self.member_type(member_type, owner, &instance.args);
                            bound.extend(self.check_pattern(&member_type, member)?);
                        }
                    }
                    Some(target) => self.shape_mismatch(variant, &target, "tuple"),
                    None => {}
                }
                self.bind_whole(binding.as_ref(), &pattern_type, &mut bound);
                pattern_type
            }
            Pattern::UnionClassVariant { ty, variant, fields, rest_discarded, binding } => {
                let pattern_type = self.resolve_type(ty);
                self.expect_type(&pattern_type, value_type, span, true);
                self.report_duplicate_fields(fields);
                match self.variant_target(&pattern_type, variant, span) {
                    Some(VariantTarget {
                        instance, index, kind: VariantKind::Class { fields: variant_fields }, qualified, ..
                    }) => {
                        self.annotations.pattern_variants.insert(pattern, index);
                        if !rest_discarded {
                            let missing = missing_fields(variant_fields.iter(), fields);
                            if !missing.is_empty() {
                                self.report(
                                    TypeError::MissingFieldsInUnionClassVariantPattern {
                                        variant: variant.node.clone(),
                                        fields: missing,
                                    },
                                    span,
                                );
                            }
                        }
                        let owner = TypeOwner::Union(instance.id);
                        for (position, field_pattern) in fields.iter().enumerate() {
                            let Some(field) = variant_fields.iter().find(|f| f.name == field_pattern.name.node) else {
                                self.report(
                                    TypeError::UnknownField { field: field_pattern.name.node.clone(), ty: qualified.clone() },
                                    field_pattern.name.span,
                                );
                                continue;
                            };
                            let field_type = self.member_type(&field.ty, owner, &instance.args);
                            self.check_field_pattern(pattern, position, field_pattern, field.index, field_type, &mut bound)?;
                        }
                    }
                    Some(target) => self.shape_mismatch(variant, &target, "class"),
                    None => {}
                }
                self.bind_whole(binding.as_ref(), &pattern_type, &mut bound);
                pattern_type
            }
            Pattern::Class { ty, fields, rest_discarded, binding } => {
                let pattern_type = self.resolve_type(ty);
                self.expect_type(&pattern_type, value_type, span, true);
                self.report_duplicate_fields(fields);
                match self.cells.shallow_resolve(&pattern_type) {
                    Type::Class(instance) => {
                        self.check_class_pattern(pattern, &instance, fields, *rest_discarded, span, &mut bound)?;
                    }
                    Type::Unknown => {}
                    other => {
                        let ty = self.display(&other);
                        self.report(TypeError::NonClassUsedInClassPattern { ty }, span);
                    }
                }
                self.bind_whole(binding.as_ref(), &pattern_type, &mut bound);
                pattern_type
            }
        };

        self.annotations.pattern_types.insert(pattern, pattern_type);
        self.annotations.pattern_variables.insert(pattern, bound.clone());
        Ok(bound)
    }

    fn check_class_pattern(
        &mut self,
        pattern: PatternId,
        instance: &Instance<ClassId>,
        fields: &[FieldPattern],
        rest_discarded: bool,
        span: Span,
        bound: &mut Vec<VariableId>,
    ) -> Result<(), CompileError> {
        let class = self.registry.class(instance.id);
        let class_name = class.name.clone();
        let public: Vec<FieldSignature> = class.fields.iter().filter(|f| f.is_pub && !f.is_static).cloned().collect();

        let owner = TypeOwner::Class(instance.id);
        for (position, field_pattern) in fields.iter().enumerate() {
            let Some(field) = self.class_field(instance.id, &field_pattern.name) else {
                continue;
            };
            if field.is_static {
                self.report(TypeError::StaticFieldInClassPattern { field: field.name.clone() }, field_pattern.name.span);
            }
            let field_type = self.member_type(&field.ty, owner, &instance.args);
            self.check_field_pattern(pattern, position, field_pattern, field.index, field_type, bound)?;
        }

        if !rest_discarded {
            let missing = missing_fields(public.iter(), fields);
            if !missing.is_empty() {
                self.report(TypeError::MissingFieldsInClassPattern { ty: class_name, fields: missing }, span);
            }
        }
        Ok(())
    }

    /// `field: pattern` checks the nested pattern; a bare `field` binds a
    /// variable of the same name.
    fn check_field_pattern(
        &mut self,
        pattern: PatternId,
        position: usize,
        field_pattern: &FieldPattern,
        index: u32,
        field_type: Type,
        bound: &mut Vec<VariableId>,
    ) -> Result<(), CompileError> {
        self.annotations.field_pattern_indices.insert((pattern, position), index);
        match field_pattern.pattern {
            Some(nested) => bound.extend(self.check_pattern(&field_type, nested)?),
            None => {
                if let Some(variable) = self.bind_pattern_variable(&field_pattern.name, false, field_type, bound) {
                    self.annotations.field_pattern_variables.insert((pattern, position), variable);
                }
            }
        }
        Ok(())
    }

    /// Resolves the variant a union pattern names. Reports and returns `None`
    /// when the type is not a union or has no such variant.
    fn variant_target(&mut self, pattern_type: &Type, variant: &Spanned<String>, span: Span) -> Option<VariantTarget> {
        let instance = match self.cells.shallow_resolve(pattern_type) {
            Type::Union(instance) => instance,
            Type::Unknown => return None,
            other => {
                let ty = self.display(&other);
                self.report(TypeError::NonUnionUsedInVariantPattern { ty }, span);
                return None;
            }
        };
        let union = self.registry.union(instance.id);
        let union_name = union.name.clone();
        let Some((index, signature)) = union.variant(&variant.node) else {
            self.report(TypeError::UnknownTypeMember { member: variant.node.clone(), ty: union_name }, variant.span);
            return None;
        };
        let kind = signature.kind.clone();
        Some(VariantTarget {
            instance,
            index,
            kind,
            qualified: format!("{union_name}::{}", variant.node),
        })
    }

    /// The pattern was written for an `expected` variant but the variant has
    /// another shape.
    fn shape_mismatch(&mut self, variant: &Spanned<String>, target: &VariantTarget, expected: &str) {
        self.report(
            TypeError::VariantPatternShapeMismatch {
                variant: target.qualified.clone(),
                expected: expected.to_string(),
            },
            variant.span,
        );
    }

    fn report_duplicate_fields(&mut self, fields: &[FieldPattern]) {
        let mut seen = HashSet::new();
        for field in fields {
            if !seen.insert(field.name.node.as_str()) {
                self.report(TypeError::DuplicateFieldInPattern { field: field.name.node.clone() }, field.name.span);
            }
        }
    }

    fn bind_whole(&mut self, binding: Option<&Binding>, ty: &Type, bound: &mut Vec<VariableId>) {
        if let Some(binding) = binding {
            self.bind_pattern_variable(&binding.name, binding.is_mut, ty.clone(), bound);
        }
    }

    /// Declares a pattern variable in the current frame. A name already in
    /// scope is reported and the variable is left unbound.
    fn bind_pattern_variable(
        &mut self,
        name: &Spanned<String>,
        is_mut: bool,
        ty: Type,
        bound: &mut Vec<VariableId>,
    ) -> Option<VariableId> {
        if self.env.is_defined(&name.node) {
            self.report(TypeError::DuplicateVariableDeclaration { name: name.node.clone() }, name.span);
            return None;
        }
        let variable = self.env.create(Variable {
            name: name.node.clone(),
            span: name.span,
            ty,
            is_mut,
            kind: VariableKind::Local { function: self.current_function(), instantiated: false },
            referenced_in_closure: false,
        });
        self.env.bind(variable);
        self.locals_mut().push(variable);
        bound.push(variable);
        Some(variable)
    }
}

fn missing_fields<'a>(declared: impl Iterator<Item = &'a FieldSignature>, given: &[FieldPattern]) -> Vec<String> {
    declared
        .filter(|f| !given.iter().any(|g| g.name.node == f.name))
        .map(|f| f.name.clone())
        .collect()
}

//! Signature registration.
//!
//! Types are registered in two passes so declarations can refer to each
//! other regardless of order: first every class and union name with its type
//! parameters, then fields, variants and function signatures.

use std::collections::HashSet;

use tracing::debug;

use crate::ast::{FieldDecl, FunctionId, VariantDeclKind};
use crate::diagnostics::{CompileError, TypeError};
use crate::span::Spanned;

use super::env::FrameSpec;
use super::registry::{FieldSignature, ParamSignature, TypeParam, VariantKind, VariantSignature};
use super::types::*;
use super::Checker;

/// Type parameters with duplicates reported and dropped.
fn unique_type_params(checker: &mut Checker<'_>, params: &[Spanned<String>]) -> Vec<TypeParam> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(params.len());
    for param in params {
        if !seen.insert(param.node.as_str()) {
            checker.report(TypeError::DuplicateTypeParameter { name: param.node.clone() }, param.span);
            continue;
        }
        unique.push(TypeParam { name: param.node.clone(), span: param.span });
    }
    unique
}

impl Checker<'_> {
    /// Pass 1: names and type parameters of every union and class.
    pub(crate) fn register_type_skeletons(&mut self) {
        let program = self.program;
        for decl in &program.unions {
            let type_params = unique_type_params(self, &decl.type_params);
            if self.registry.lookup_type(&decl.name.node).is_some() {
                self.report(TypeError::ConflictingTypeName { name: decl.name.node.clone() }, decl.name.span);
                self.union_ids.push(None);
                continue;
            }
            let id = self.registry.add_union(&decl.name.node, decl.name.span, type_params);
            self.registry.register_type_name(&decl.name.node, TypeOwner::Union(id));
            self.union_ids.push(Some(id));
        }
        for decl in &program.classes {
            let type_params = unique_type_params(self, &decl.type_params);
            if self.registry.lookup_type(&decl.name.node).is_some() {
                self.report(TypeError::ConflictingTypeName { name: decl.name.node.clone() }, decl.name.span);
                self.class_ids.push(None);
                continue;
            }
            let id = self.registry.add_class(&decl.name.node, decl.name.span, type_params);
            self.registry.register_type_name(&decl.name.node, TypeOwner::Class(id));
            self.class_ids.push(Some(id));
        }
        debug!(unions = program.unions.len(), classes = program.classes.len(), "registered type names");
    }

    /// Pass 2: variants, fields and function signatures.
    pub(crate) fn register_signatures(&mut self) -> Result<(), CompileError> {
        let program = self.program;

        for (decl, id) in program.unions.iter().zip(self.union_ids.clone()) {
            let Some(id) = id else { continue };
            let owner = TypeOwner::Union(id);
            let placeholders = self.registry.placeholders(owner.into());
            self.in_scope(FrameSpec::for_type(owner, placeholders), |checker| {
                for &function in &decl.functions {
                    checker.register_member_function(owner, function)?;
                }
                let self_instance = checker.self_instance(owner);
                for variant in &decl.variants {
                    let name = &variant.name.node;
                    if checker.registry.union(id).variant(name).is_some() {
                        checker.report(TypeError::DuplicateVariantName { name: name.clone() }, variant.name.span);
                        continue;
                    }
                    let kind = match &variant.kind {
                        VariantDeclKind::Unit => VariantKind::Unit,
                        VariantDeclKind::Tuple(members) => {
                            let members: Vec<Type> = members.iter().map(|m| checker.resolve_type(m)).collect();
                            let create =
                                checker.registry.add_tuple_constructor(id, name, &members, self_instance.clone());
                            VariantKind::Tuple { members, create }
                        }
                        VariantDeclKind::Class(fields) => {
                            let fields = checker.variant_fields(name, fields);
                            VariantKind::Class { fields }
                        }
                    };
                    checker.registry.union_mut(id).variants.push(VariantSignature {
                        name: name.clone(),
                        span: variant.name.span,
                        kind,
                    });
                }
                Ok(())
            })?;
        }

        for (decl, id) in program.classes.iter().zip(self.class_ids.clone()) {
            let Some(id) = id else { continue };
            let owner = TypeOwner::Class(id);
            let placeholders = self.registry.placeholders(owner.into());
            self.in_scope(FrameSpec::for_type(owner, placeholders), |checker| {
                for &function in &decl.functions {
                    checker.register_member_function(owner, function)?;
                }
                for field in &decl.fields {
                    if checker.registry.class(id).field(&field.name.node).is_some() {
                        let class = checker.registry.class(id).name.clone();
                        checker.report(
                            TypeError::DuplicateClassField { class, field: field.name.node.clone() },
                            field.name.span,
                        );
                        continue;
                    }
                    let signature = checker.field_signature(field, checker.registry.class(id).fields.len());
                    checker.registry.class_mut(id).fields.push(signature);
                }
                Ok(())
            })?;
        }

        for &function in &program.top_level_functions {
            let sig = self.build_function_signature(function, None, None)?;
            let decl = program.function(function);
            let root = self.env.root_mut();
            if root.functions.contains_key(&decl.name.node) {
                self.report(TypeError::ConflictingFunctionName { name: decl.name.node.clone() }, decl.name.span);
                continue;
            }
            root.functions.insert(decl.name.node.clone(), sig);
        }

        let type_params = program
            .classes
            .iter()
            .flat_map(|c| &c.type_params)
            .chain(program.unions.iter().flat_map(|u| &u.type_params));
        for param in type_params {
            if self.registry.lookup_type(&param.node).is_some() {
                self.report(TypeError::TypeParameterConflictsWithType { name: param.node.clone() }, param.span);
            }
        }

        debug!(functions = self.registry.functions().count(), "registered signatures");
        Ok(())
    }

    fn register_member_function(&mut self, owner: TypeOwner, function: FunctionId) -> Result<(), CompileError> {
        let program = self.program;
        let name = &program.function(function).name;
        if self.registry.member_function(owner, &name.node).is_some() {
            self.report(TypeError::ConflictingFunctionName { name: name.node.clone() }, name.span);
        }
        let sig = self.build_function_signature(function, Some(owner), None)?;
        match owner {
            TypeOwner::Class(id) => self.registry.class_mut(id).functions.push(sig),
            TypeOwner::Union(id) => self.registry.union_mut(id).functions.push(sig),
        }
        Ok(())
    }

    fn field_signature(&mut self, field: &FieldDecl, index: usize) -> FieldSignature {
        let ty = match &field.ty {
            Some(ty) => self.resolve_type(ty),
            None => Type::Unknown,
        };
        FieldSignature {
            name: field.name.node.clone(),
            span: field.name.span,
            ty,
            is_pub: field.is_pub,
            is_mut: field.is_mut,
            is_static: field.is_static,
            index: index as u32,
            initializer: field.initializer,
        }
    }

    /// Fields of a class variant. They are always public instance fields.
    fn variant_fields(&mut self, variant: &str, fields: &[FieldDecl]) -> Vec<FieldSignature> {
        let mut signatures: Vec<FieldSignature> = Vec::with_capacity(fields.len());
        for field in fields {
            if signatures.iter().any(|f| f.name == field.name.node) {
                self.report(
                    TypeError::DuplicateFieldInUnionClassVariant {
                        variant: variant.to_string(),
                        field: field.name.node.clone(),
                    },
                    field.name.span,
                );
                continue;
            }
            let mut signature = self.field_signature(field, signatures.len());
            signature.is_pub = true;
            signature.is_static = false;
            signature.initializer = None;
            signatures.push(signature);
        }
        signatures
    }

    /// Builds the signature of `decl` and, recursively, of the local
    /// functions declared directly in its body.
    pub(crate) fn build_function_signature(
        &mut self,
        decl: FunctionId,
        owner: Option<TypeOwner>,
        parent: Option<FnSigId>,
    ) -> Result<FnSigId, CompileError> {
        let program = self.program;
        let function = program.function(decl);
        let name = &function.name;
        let id = self.registry.add_function(&name.node, name.span);
        {
            let sig = self.registry.function_mut(id);
            sig.is_static = function.is_static;
            sig.is_mut = function.is_mut;
            sig.is_pub = function.is_pub;
            sig.owner = owner;
            sig.parent = parent;
        }
        self.registry.bind_decl(decl, id);

        if self.current_type().is_none() && function.is_mut {
            self.report(TypeError::GlobalFunctionMarkedAsMutable { name: name.node.clone() }, name.span);
        }
        if let Some(current) = self.current_function() {
            if !self.registry.function(current).is_mut && function.is_mut {
                self.report(TypeError::MutableFunctionWithinNonMutableFunction { name: name.node.clone() }, name.span);
            }
        }
        if function.is_static && function.is_mut {
            self.report(TypeError::StaticFunctionMarkedAsMutable { name: name.node.clone() }, name.span);
        }

        let mut seen = HashSet::new();
        for param in &function.type_params {
            if !seen.insert(param.node.as_str()) {
                self.report(TypeError::DuplicateTypeParameter { name: param.node.clone() }, param.span);
            }
            let in_scope = self.env.placeholders().iter().any(|p| self.registry.placeholder_name(*p) == param.node);
            if in_scope {
                self.report(TypeError::ConflictingTypeParameter { name: param.node.clone() }, param.span);
            }
            if self.registry.lookup_type(&param.node).is_some() {
                self.report(TypeError::TypeParameterConflictsWithType { name: param.node.clone() }, param.span);
            }
            self.registry
                .function_mut(id)
                .type_params
                .push(TypeParam { name: param.node.clone(), span: param.span });
        }

        let spec = FrameSpec {
            current_function: Some(id),
            placeholders: self.registry.placeholders(GenericOwner::Function(id)),
            ..FrameSpec::default()
        };
        self.in_scope(spec, |checker| {
            let return_type = match &function.return_type {
                Some(ty) => checker.resolve_type(ty),
                None => checker.registry.unit(),
            };
            checker.registry.function_mut(id).return_type = return_type;

            let mut params: Vec<ParamSignature> = Vec::with_capacity(function.params.len());
            for param in &function.params {
                if params.iter().any(|p| p.name == param.name.node) {
                    checker.report(
                        TypeError::DuplicateFunctionParameter { name: param.name.node.clone() },
                        param.name.span,
                    );
                    continue;
                }
                let ty = match &param.ty {
                    Some(ty) => checker.resolve_type(ty),
                    None => Type::Unknown,
                };
                params.push(ParamSignature {
                    name: param.name.node.clone(),
                    span: param.name.span,
                    ty,
                    is_mut: param.is_mut,
                });
            }
            checker.registry.function_mut(id).params = params;

            for &local in &function.body.functions {
                let local_sig = checker.build_function_signature(local, None, Some(id))?;
                checker.registry.function_mut(id).local_functions.push(local_sig);
            }
            Ok(())
        })?;

        Ok(id)
    }
}

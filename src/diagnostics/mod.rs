use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::span::Span;

/// Failures that abort checking.
///
/// User mistakes never end up here: they are collected as [`Diagnostic`]s and
/// checking carries on. A `CompileError` means the input tree or the checker's
/// own bookkeeping was inconsistent, or the options could not be loaded.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Internal error: {msg}")]
    Internal { msg: String, span: Option<Span> },

    #[error("Manifest error: {msg}")]
    Manifest { msg: String, path: PathBuf },
}

impl CompileError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { msg: msg.into(), span: None }
    }

    pub fn internal_at(msg: impl Into<String>, span: Span) -> Self {
        Self::Internal { msg: msg.into(), span: Some(span) }
    }

    pub fn manifest(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Manifest { msg: msg.into(), path }
    }
}

/// Coarse grouping used by drivers to sort and filter diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    NameResolution,
    TypeMismatch,
    Mutability,
    DefiniteAssignment,
    Generics,
    Patterns,
    Declarations,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::NameResolution => "name resolution",
            ErrorCategory::TypeMismatch => "type mismatch",
            ErrorCategory::Mutability => "mutability",
            ErrorCategory::DefiniteAssignment => "definite assignment",
            ErrorCategory::Generics => "generics",
            ErrorCategory::Patterns => "patterns",
            ErrorCategory::Declarations => "declarations",
        };
        f.write_str(name)
    }
}

/// A recoverable problem found while checking a program.
///
/// Types are carried as their rendered form so a diagnostic stays meaningful
/// after the checker that produced it is gone.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum TypeError {
    #[error("type mismatch: expected {expected}, found {found}")]
    MismatchedTypes { expected: String, found: String },

    #[error("expression is not assignable")]
    ExpressionNotAssignable,

    #[error("cannot assign to immutable variable '{name}'")]
    NonMutableAssignment { name: String },

    #[error("cannot assign to immutable field '{member}'")]
    NonMutableMemberAssignment { member: String },

    #[error("cannot assign to a field of an immutable value")]
    NonMutableMemberOwnerAssignment,

    #[error("undefined symbol '{name}'")]
    SymbolNotFound { name: String },

    #[error("cannot infer the type of variable '{name}'")]
    UnresolvedInferredVariableType { name: String },

    #[error("cannot infer type argument '{name}'")]
    UnresolvedInferredTypeArgument { name: String },

    #[error("'this' can only be used inside an instance function")]
    ThisAccessedOutsideOfInstanceMethod,

    #[error("match is not exhaustive")]
    MatchNonExhaustive,

    #[error("variable '{name}' is used before it is assigned")]
    AccessUninitializedVariable { name: String },

    #[error("tuple variant pattern has {found} members but the variant has {expected}")]
    IncorrectNumberOfPatternsInTupleVariantUnionPattern { expected: usize, found: usize },

    #[error("type '{ty}' has no member named '{member}'")]
    UnknownTypeMember { member: String, ty: String },

    #[error("'{ty}' is not a class and cannot be used in a class pattern")]
    NonClassUsedInClassPattern { ty: String },

    #[error("pattern for variant '{variant}' is missing fields: {}", .fields.join(", "))]
    MissingFieldsInUnionClassVariantPattern { variant: String, fields: Vec<String> },

    #[error("pattern for '{ty}' is missing fields: {}", .fields.join(", "))]
    MissingFieldsInClassPattern { ty: String, fields: Vec<String> },

    #[error("field '{field}' is private")]
    PrivateFieldReferenced { field: String },

    #[error("variant '{variant}' is not a class variant")]
    UnionClassVariantInitializerNotClassVariant { variant: String },

    #[error("duplicate variant '{name}'")]
    DuplicateVariantName { name: String },

    #[error("type '{name}' is already defined")]
    ConflictingTypeName { name: String },

    #[error("duplicate field '{field}' in variant '{variant}'")]
    DuplicateFieldInUnionClassVariant { variant: String, field: String },

    #[error("duplicate field '{field}' in class '{class}'")]
    DuplicateClassField { class: String, field: String },

    #[error("function '{name}' is already defined")]
    ConflictingFunctionName { name: String },

    #[error("expected {expected} arguments, found {found}")]
    IncorrectNumberOfMethodArguments { expected: usize, found: usize },

    #[error("cannot access member '{member}' on a value of generic type")]
    MemberAccessOnGenericExpression { member: String },

    #[error("cannot access static member '{member}' through a generic type")]
    StaticMemberAccessOnGenericReference { member: String },

    #[error("duplicate type parameter '{name}'")]
    DuplicateTypeParameter { name: String },

    #[error("duplicate parameter '{name}'")]
    DuplicateFunctionParameter { name: String },

    #[error("expected {expected} type arguments, found {found}")]
    IncorrectNumberOfTypeArguments { expected: usize, found: usize },

    #[error("field '{field}' is set more than once")]
    ClassFieldSetMultipleTypesInInitializer { field: String },

    #[error("type '{ty}' has no field named '{field}'")]
    UnknownField { field: String, ty: String },

    #[error("initializer for '{ty}' leaves fields unassigned: {}", .fields.join(", "))]
    FieldsLeftUnassignedInClassInitializer { ty: String, fields: Vec<String> },

    #[error("type parameter '{name}' shadows a type parameter already in scope")]
    ConflictingTypeParameter { name: String },

    #[error("type parameter '{name}' has the same name as a type")]
    TypeParameterConflictsWithType { name: String },

    #[error("cannot mutate 'this' inside a function that is not 'mut'")]
    MutatingInstanceInNonMutableFunction,

    #[error("static function '{name}' cannot be 'mut'")]
    StaticFunctionMarkedAsMutable { name: String },

    #[error("'mut' function '{name}' cannot be declared inside a function that is not 'mut'")]
    MutableFunctionWithinNonMutableFunction { name: String },

    #[error("function '{function}' captures variables that are not yet assigned: {}", .variables.join(", "))]
    AccessingClosureWhichReferencesUninitializedVariables { function: String, variables: Vec<String> },

    #[error("static local function cannot capture outer variable '{name}'")]
    StaticLocalFunctionAccessesOuterVariable { name: String },

    #[error("global function '{name}' cannot be 'mut'")]
    GlobalFunctionMarkedAsMutable { name: String },

    #[error("cannot access instance member '{name}' from a static context")]
    AccessInstanceMemberInStaticContext { name: String },

    #[error("type arguments are only allowed on functions")]
    GenericTypeArgumentsOnNonFunctionValue,

    #[error("'{member}' is an instance member and cannot be accessed statically")]
    StaticMemberAccessOnInstanceMember { member: String },

    #[error("'{member}' is a static member and cannot be accessed through an instance")]
    InstanceMemberAccessOnStaticMember { member: String },

    #[error("class variant '{variant}' must be created with an initializer")]
    UnionClassVariantWithoutInitializer { variant: String },

    #[error("static field '{field}' cannot appear in a class pattern")]
    StaticFieldInClassPattern { field: String },

    #[error("variable '{name}' is already declared")]
    DuplicateVariableDeclaration { name: String },

    #[error("value of an 'if' without 'else' is used")]
    IfExpressionValueUsedWithoutElseBranch,

    #[error("'?' can only be used inside a function returning result")]
    FalloutOutsideResultFunction,

    #[error("'break' outside of a loop")]
    BreakOutsideLoop,

    #[error("'continue' outside of a loop")]
    ContinueOutsideLoop,

    #[error("tuple has {found} members, at most {max} are supported")]
    TooManyTupleMembers { max: usize, found: usize },

    #[error("static field '{field}' has no initializer")]
    StaticFieldWithoutInitializer { field: String },

    #[error("variant '{variant}' is not a {expected} variant")]
    VariantPatternShapeMismatch { variant: String, expected: String },

    #[error("'{ty}' is not a union and cannot be used in a variant pattern")]
    NonUnionUsedInVariantPattern { ty: String },

    #[error("field '{field}' appears more than once in the pattern")]
    DuplicateFieldInPattern { field: String },

    #[error("value of type '{ty}' is not callable")]
    ExpressionNotCallable { ty: String },
}

impl TypeError {
    pub fn category(&self) -> ErrorCategory {
        use TypeError::*;
        match self {
            SymbolNotFound { .. }
            | UnknownTypeMember { .. }
            | UnknownField { .. }
            | ConflictingTypeName { .. }
            | ConflictingFunctionName { .. }
            | PrivateFieldReferenced { .. }
            | ThisAccessedOutsideOfInstanceMethod
            | AccessInstanceMemberInStaticContext { .. }
            | StaticMemberAccessOnInstanceMember { .. }
            | InstanceMemberAccessOnStaticMember { .. }
            | MemberAccessOnGenericExpression { .. }
            | StaticMemberAccessOnGenericReference { .. }
            | BreakOutsideLoop
            | ContinueOutsideLoop => ErrorCategory::NameResolution,

            MismatchedTypes { .. }
            | IncorrectNumberOfMethodArguments { .. }
            | IncorrectNumberOfTypeArguments { .. }
            | UnionClassVariantInitializerNotClassVariant { .. }
            | UnionClassVariantWithoutInitializer { .. }
            | FalloutOutsideResultFunction
            | TooManyTupleMembers { .. }
            | ExpressionNotCallable { .. } => ErrorCategory::TypeMismatch,

            ExpressionNotAssignable
            | NonMutableAssignment { .. }
            | NonMutableMemberAssignment { .. }
            | NonMutableMemberOwnerAssignment
            | MutatingInstanceInNonMutableFunction
            | StaticFunctionMarkedAsMutable { .. }
            | MutableFunctionWithinNonMutableFunction { .. }
            | GlobalFunctionMarkedAsMutable { .. } => ErrorCategory::Mutability,

            AccessUninitializedVariable { .. }
            | AccessingClosureWhichReferencesUninitializedVariables { .. }
            | StaticLocalFunctionAccessesOuterVariable { .. }
            | IfExpressionValueUsedWithoutElseBranch => ErrorCategory::DefiniteAssignment,

            DuplicateTypeParameter { .. }
            | ConflictingTypeParameter { .. }
            | TypeParameterConflictsWithType { .. }
            | UnresolvedInferredTypeArgument { .. }
            | UnresolvedInferredVariableType { .. }
            | GenericTypeArgumentsOnNonFunctionValue => ErrorCategory::Generics,

            MatchNonExhaustive
            | IncorrectNumberOfPatternsInTupleVariantUnionPattern { .. }
            | NonClassUsedInClassPattern { .. }
            | MissingFieldsInUnionClassVariantPattern { .. }
            | MissingFieldsInClassPattern { .. }
            | StaticFieldInClassPattern { .. }
            | VariantPatternShapeMismatch { .. }
            | NonUnionUsedInVariantPattern { .. }
            | DuplicateFieldInPattern { .. } => ErrorCategory::Patterns,

            DuplicateVariantName { .. }
            | DuplicateFieldInUnionClassVariant { .. }
            | DuplicateClassField { .. }
            | DuplicateFunctionParameter { .. }
            | DuplicateVariableDeclaration { .. }
            | ClassFieldSetMultipleTypesInInitializer { .. }
            | FieldsLeftUnassignedInClassInitializer { .. }
            | StaticFieldWithoutInitializer { .. } => ErrorCategory::Declarations,
        }
    }
}

/// A [`TypeError`] together with the source range it was reported at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub error: TypeError,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(error: TypeError, span: Span) -> Self {
        Self { error, span }
    }

    pub fn category(&self) -> ErrorCategory {
        self.error.category()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error at {}: {}", self.category(), self.span, self.error)
    }
}

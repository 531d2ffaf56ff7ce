//! Side tables recording what the checker learned about each node.
//!
//! The syntax tree stays immutable; lowering reads these tables keyed by the
//! node handles instead.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::ast::{ExprId, PatternId};

use super::resolve::InstantiatedFunction;
use super::types::{ClassId, FnSigId, Type, VariableId};

/// Which kind of member a member access resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemberKind {
    Field,
    Function,
    Variant,
}

/// A resolved member: the kind plus its position in the owner's field,
/// function or variant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MemberRef {
    pub kind: MemberKind,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArmUsefulness {
    Useful,
    /// Every value the arm matches is already matched by an earlier arm.
    Redundant,
}

/// A function referenced as a value: its `Function`N` class and the class
/// arguments, parameter types first and the return type last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionObject {
    pub class: ClassId,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, Default)]
pub struct Annotations {
    pub expr_types: HashMap<ExprId, Type>,
    /// Expressions whose value is consumed by the surrounding expression.
    pub value_useful: HashSet<ExprId>,
    /// Variable a `Variable` expression refers to.
    pub variable_refs: HashMap<ExprId, VariableId>,
    pub declared_variables: HashMap<ExprId, VariableId>,
    /// Generic function referenced by an expression, with its type arguments.
    pub instantiations: HashMap<ExprId, InstantiatedFunction>,
    pub function_objects: HashMap<ExprId, FunctionObject>,
    pub members: HashMap<ExprId, MemberRef>,
    /// Variables bound by the pattern of a `matches` expression.
    pub matches_variables: HashMap<ExprId, Vec<VariableId>>,
    /// Field index for each `(initializer expression, position in its field list)`.
    pub initializer_fields: HashMap<(ExprId, usize), u32>,
    pub pattern_types: HashMap<PatternId, Type>,
    /// Variables bound anywhere inside a pattern, in binding order.
    pub pattern_variables: HashMap<PatternId, Vec<VariableId>>,
    /// Variable bound by a `field` shorthand in a class or class-variant pattern.
    pub field_pattern_variables: HashMap<(PatternId, usize), VariableId>,
    pub field_pattern_indices: HashMap<(PatternId, usize), u32>,
    pub pattern_variants: HashMap<PatternId, u32>,
    pub arm_usefulness: HashMap<PatternId, ArmUsefulness>,
    pub top_level_locals: Vec<VariableId>,
    pub top_level_local_functions: Vec<FnSigId>,
}

impl Annotations {
    pub fn set_type(&mut self, expr: ExprId, ty: Type) {
        self.expr_types.insert(expr, ty);
    }

    pub fn mark_value_useful(&mut self, expr: ExprId) {
        self.value_useful.insert(expr);
    }

    pub fn is_value_useful(&self, expr: ExprId) -> bool {
        self.value_useful.contains(&expr)
    }

    pub fn arm_usefulness(&self, pattern: PatternId) -> Option<ArmUsefulness> {
        self.arm_usefulness.get(&pattern).copied()
    }
}

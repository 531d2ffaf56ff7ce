//! Match exhaustiveness and arm usefulness.
//!
//! The checker only depends on [`UsefulnessAnalyzer`]. [`MatrixAnalyzer`] is
//! the default implementation: the usual pattern-matrix usefulness algorithm
//! with a budget on how many matrix rows a single usefulness query may
//! examine. Each arm's redundancy query and the final exhaustiveness query
//! get their own budget.

use serde::Serialize;
use thiserror::Error;

use crate::ast::{FieldPattern, Pattern, PatternId, Program};

use super::annotations::{Annotations, ArmUsefulness};
use super::generics::GenericCells;
use super::registry::{Registry, VariantKind};
use super::types::*;

/// What an analyzer may look at.
pub struct MatchInput<'a> {
    pub program: &'a Program,
    pub registry: &'a Registry,
    pub cells: &'a GenericCells,
    pub annotations: &'a Annotations,
}

/// A value shape no arm matches, rendered as a pattern, e.g. `Shape::Square`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Witness(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usefulness {
    /// One entry per arm, in order.
    pub arms: Vec<ArmUsefulness>,
    pub uncovered: Vec<Witness>,
}

impl Usefulness {
    pub fn is_exhaustive(&self) -> bool {
        self.uncovered.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("pattern complexity limit of {limit} exceeded")]
    ComplexityLimitExceeded { limit: usize },
}

pub trait UsefulnessAnalyzer {
    fn compute_usefulness(
        &self,
        input: &MatchInput<'_>,
        arms: &[PatternId],
        scrutinee: &Type,
        complexity_limit: usize,
    ) -> Result<Usefulness, AnalysisError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixAnalyzer;

impl UsefulnessAnalyzer for MatrixAnalyzer {
    fn compute_usefulness(
        &self,
        input: &MatchInput<'_>,
        arms: &[PatternId],
        scrutinee: &Type,
        complexity_limit: usize,
    ) -> Result<Usefulness, AnalysisError> {
        let mut analysis = Analysis { input, cells: input.cells.clone(), complexity: 0, limit: complexity_limit };
        let rows: Vec<Vec<Pat>> = arms.iter().map(|&arm| vec![analysis.lower(arm)]).collect();
        let types = [scrutinee.clone()];

        let mut usefulness = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            analysis.complexity = 0;
            let useful = !analysis.useful(&rows[..index], row, &types)?.is_empty();
            usefulness.push(if useful { ArmUsefulness::Useful } else { ArmUsefulness::Redundant });
        }

        analysis.complexity = 0;
        let uncovered = analysis
            .useful(&rows, &[Pat::Wild], &types)?
            .iter()
            .filter_map(|witness| witness.first())
            .map(|pattern| Witness(analysis.render(pattern)))
            .collect();
        Ok(Usefulness { arms: usefulness, uncovered })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctor {
    /// The only constructor of a class.
    Single,
    Variant(u32),
}

#[derive(Debug, Clone)]
enum Pat {
    Wild,
    Ctor(Ctor, Vec<Pat>),
}

impl Pat {
    fn ctor(&self) -> Option<Ctor> {
        match self {
            Pat::Wild => None,
            Pat::Ctor(ctor, _) => Some(*ctor),
        }
    }
}

#[derive(Debug, Clone)]
enum WitnessPat {
    Wild,
    Ctor { ty: Type, ctor: Ctor, fields: Vec<WitnessPat> },
}

struct Analysis<'a> {
    input: &'a MatchInput<'a>,
    /// Private copy; instantiating member types allocates cells.
    cells: GenericCells,
    complexity: usize,
    limit: usize,
}

impl Analysis<'_> {
    fn charge(&mut self, rows: usize) -> Result<(), AnalysisError> {
        self.complexity += rows;
        if self.complexity > self.limit {
            return Err(AnalysisError::ComplexityLimitExceeded { limit: self.limit });
        }
        Ok(())
    }

    /// Every constructor of `ty`, or `None` when they cannot be listed.
    fn constructors(&self, ty: &Type) -> Option<Vec<Ctor>> {
        let registry = self.input.registry;
        match self.cells.shallow_resolve(ty) {
            Type::Union(instance) => {
                let count = registry.union(instance.id).variants.len() as u32;
                Some((0..count).map(Ctor::Variant).collect())
            }
            Type::Class(instance) if !registry.class(instance.id).builtin => Some(vec![Ctor::Single]),
            _ => None,
        }
    }

    /// Types of the values `ctor` of `ty` carries.
    fn field_types(&mut self, ty: &Type, ctor: Ctor) -> Vec<Type> {
        let registry = self.input.registry;
        let (owner, args, declared): (GenericOwner, Vec<CellId>, Vec<Type>) = match (self.cells.shallow_resolve(ty), ctor) {
            (Type::Class(instance), Ctor::Single) => {
                let fields = registry.class(instance.id).fields.iter().map(|f| f.ty.clone()).collect();
                (GenericOwner::Class(instance.id), instance.args, fields)
            }
            (Type::Union(instance), Ctor::Variant(index)) => {
                let Some(variant) = registry.union(instance.id).variants.get(index as usize) else {
                    return Vec::new();
                };
                let members = match &variant.kind {
                    VariantKind::Unit => Vec::new(),
                    VariantKind::Tuple { members, .. } => members.clone(),
                    VariantKind::Class { fields } => fields.iter().map(|f| f.ty.clone()).collect(),
                };
                (GenericOwner::Union(instance.id), instance.args, members)
            }
            _ => return Vec::new(),
        };
        declared
            .iter()
            .map(|ty| {
                ty.substitute(&mut self.cells, &|p: Placeholder| {
                    (p.owner == owner).then(|| args.get(p.index as usize).map(|cell| Type::Cell(*cell))).flatten()
                })
            })
            .collect()
    }

    fn lower(&mut self, pattern: PatternId) -> Pat {
        let input = self.input;
        let Some(ty) = input.annotations.pattern_types.get(&pattern) else {
            return Pat::Wild;
        };
        let variant = input.annotations.pattern_variants.get(&pattern).copied();
        match &input.program.pattern(pattern).node {
            Pattern::Discard | Pattern::Variable { .. } | Pattern::Type { .. } => Pat::Wild,
            Pattern::UnionVariant { .. } => match variant {
                Some(index) => {
                    let arity = self.field_types(ty, Ctor::Variant(index)).len();
                    Pat::Ctor(Ctor::Variant(index), vec![Pat::Wild; arity])
                }
                None => Pat::Wild,
            },
            Pattern::UnionTupleVariant { members, .. } => {
                let Some(index) = variant else {
                    return Pat::Wild;
                };
                let arity = self.field_types(ty, Ctor::Variant(index)).len();
                let mut slots = vec![Pat::Wild; arity];
                for (slot, &member) in slots.iter_mut().zip(members) {
                    *slot = self.lower(member);
                }
                Pat::Ctor(Ctor::Variant(index), slots)
            }
            Pattern::UnionClassVariant { fields, .. } => {
                let Some(index) = variant else {
                    return Pat::Wild;
                };
                let slots = self.lower_fields(pattern, ty, Ctor::Variant(index), fields);
                Pat::Ctor(Ctor::Variant(index), slots)
            }
            Pattern::Class { fields, .. } => {
                if self.constructors(ty).is_none() {
                    return Pat::Wild;
                }
                let slots = self.lower_fields(pattern, ty, Ctor::Single, fields);
                Pat::Ctor(Ctor::Single, slots)
            }
        }
    }

    fn lower_fields(&mut self, pattern: PatternId, ty: &Type, ctor: Ctor, fields: &[FieldPattern]) -> Vec<Pat> {
        let arity = self.field_types(ty, ctor).len();
        let mut slots = vec![Pat::Wild; arity];
        for (position, field) in fields.iter().enumerate() {
            let index = self.input.annotations.field_pattern_indices.get(&(pattern, position));
            if let (Some(&index), Some(nested)) = (index, field.pattern) {
                if let Some(slot) = slots.get_mut(index as usize) {
                    *slot = self.lower(nested);
                }
            }
        }
        slots
    }

    /// Values matched by `vector` that no row in `rows` matches, as witness
    /// stacks parallel to `vector`. Empty when `vector` is not useful.
    fn useful(&mut self, rows: &[Vec<Pat>], vector: &[Pat], types: &[Type]) -> Result<Vec<Vec<WitnessPat>>, AnalysisError> {
        let (Some((head, rest)), Some(ty)) = (vector.split_first(), types.first()) else {
            self.charge(rows.len())?;
            return Ok(if rows.is_empty() { vec![Vec::new()] } else { Vec::new() });
        };

        if let Pat::Ctor(ctor, args) = head {
            return self.useful_ctor(rows, *ctor, args, rest, types);
        }

        let mut used: Vec<Ctor> = Vec::new();
        for ctor in rows.iter().filter_map(|row| row.first().and_then(Pat::ctor)) {
            if !used.contains(&ctor) {
                used.push(ctor);
            }
        }

        let all = self.constructors(ty);
        if let Some(all) = all.as_ref().filter(|all| !used.is_empty() && all.iter().all(|c| used.contains(c))) {
            let mut witnesses = Vec::new();
            for &ctor in all {
                let wilds = vec![Pat::Wild; self.field_types(ty, ctor).len()];
                witnesses.extend(self.useful_ctor(rows, ctor, &wilds, rest, types)?);
            }
            return Ok(witnesses);
        }

        let default: Vec<Vec<Pat>> = rows
            .iter()
            .filter(|row| matches!(row.first(), Some(Pat::Wild)))
            .map(|row| row[1..].to_vec())
            .collect();
        let witnesses = self.useful(&default, rest, &types[1..])?;

        let missing: Vec<(Ctor, usize)> = match all {
            Some(all) if !used.is_empty() => all
                .into_iter()
                .filter(|c| !used.contains(c))
                .map(|c| (c, self.field_types(ty, c).len()))
                .collect(),
            _ => Vec::new(),
        };
        let mut result = Vec::new();
        for witness in witnesses {
            if missing.is_empty() {
                result.push(prepend(WitnessPat::Wild, witness));
                continue;
            }
            for &(ctor, arity) in &missing {
                let head = WitnessPat::Ctor { ty: ty.clone(), ctor, fields: vec![WitnessPat::Wild; arity] };
                result.push(prepend(head, witness.clone()));
            }
        }
        Ok(result)
    }

    fn useful_ctor(
        &mut self,
        rows: &[Vec<Pat>],
        ctor: Ctor,
        args: &[Pat],
        rest: &[Pat],
        types: &[Type],
    ) -> Result<Vec<Vec<WitnessPat>>, AnalysisError> {
        let Some((ty, rest_types)) = types.split_first() else {
            return Ok(Vec::new());
        };
        let mut sub_types = self.field_types(ty, ctor);
        let arity = sub_types.len();
        sub_types.extend_from_slice(rest_types);

        let specialized: Vec<Vec<Pat>> = rows.iter().filter_map(|row| specialize(row, ctor, arity)).collect();
        let mut vector = args.to_vec();
        vector.resize(arity, Pat::Wild);
        vector.extend_from_slice(rest);

        let witnesses = self.useful(&specialized, &vector, &sub_types)?;
        Ok(witnesses
            .into_iter()
            .map(|mut fields| {
                let tail = fields.split_off(arity.min(fields.len()));
                prepend(WitnessPat::Ctor { ty: ty.clone(), ctor, fields }, tail)
            })
            .collect())
    }

    fn render(&self, witness: &WitnessPat) -> String {
        let WitnessPat::Ctor { ty, ctor, fields } = witness else {
            return "_".to_string();
        };
        let registry = self.input.registry;
        let rendered: Vec<String> = fields.iter().map(|f| self.render(f)).collect();
        match (self.cells.shallow_resolve(ty), ctor) {
            (Type::Union(instance), Ctor::Variant(index)) => {
                let union = registry.union(instance.id);
                let Some(variant) = union.variants.get(*index as usize) else {
                    return "_".to_string();
                };
                let name = format!("{}::{}", union.name, variant.name);
                match &variant.kind {
                    VariantKind::Unit => name,
                    VariantKind::Tuple { .. } => format!("{name}({})", rendered.join(", ")),
                    VariantKind::Class { fields } => {
                        let names = fields.iter().map(|f| f.name.as_str());
                        format!("{name} {{ {} }}", named_fields(names, &rendered))
                    }
                }
            }
            (Type::Class(instance), Ctor::Single) => {
                let class = registry.class(instance.id);
                let names = class.fields.iter().map(|f| f.name.as_str());
                format!("{} {{ {} }}", class.name, named_fields(names, &rendered))
            }
            _ => "_".to_string(),
        }
    }
}

fn specialize(row: &[Pat], ctor: Ctor, arity: usize) -> Option<Vec<Pat>> {
    let (head, rest) = row.split_first()?;
    let mut specialized = match head {
        Pat::Wild => vec![Pat::Wild; arity],
        Pat::Ctor(other, args) if *other == ctor => {
            let mut args = args.clone();
            args.resize(arity, Pat::Wild);
            args
        }
        Pat::Ctor(..) => return None,
    };
    specialized.extend_from_slice(rest);
    Some(specialized)
}

fn prepend(head: WitnessPat, mut tail: Vec<WitnessPat>) -> Vec<WitnessPat> {
    tail.insert(0, head);
    tail
}

fn named_fields<'a>(names: impl Iterator<Item = &'a str>, values: &[String]) -> String {
    names.zip(values).map(|(name, value)| format!("{name}: {value}")).collect::<Vec<_>>().join(", ")
}

//! Closure captures.
//!
//! A function captures every variable it reads that belongs to an enclosing
//! function or to the top level. Captures of local functions bubble up to
//! their parents until they reach the function owning the variable.

use tracing::trace;

use crate::diagnostics::TypeError;
use crate::span::Span;

use super::env::VariableKind;
use super::types::*;
use super::Checker;

impl Checker<'_> {
    /// Looks `name` up and records a capture when the variable is owned by
    /// something other than the function being checked.
    pub(crate) fn lookup_variable(&mut self, name: &str, span: Span) -> Option<VariableId> {
        let id = self.env.lookup(name)?;
        let Some(current) = self.current_function() else {
            return Some(id);
        };

        let owned = match self.env.variable(id).kind {
            VariableKind::Local { function, .. } => function == Some(current),
            VariableKind::Parameter { function, .. } | VariableKind::This { function } => function == current,
            VariableKind::Field { owner, .. } => self.current_type() == Some(TypeOwner::Class(owner)),
        };
        if owned || self.registry.function(current).captures.contains(&id) {
            return Some(id);
        }

        if self.registry.function(current).is_static {
            self.report(TypeError::StaticLocalFunctionAccessesOuterVariable { name: name.to_string() }, span);
        } else {
            trace!(variable = name, function = %self.registry.function(current).name, "captured");
            self.registry.function_mut(current).captures.push(id);
            self.env.variable_mut(id).referenced_in_closure = true;
        }
        Some(id)
    }

    /// Adds the captures of `child` that `parent` does not own itself to the
    /// captures of `parent`.
    pub(crate) fn propagate_captures(&mut self, parent: FnSigId, child: FnSigId) {
        let parent_owner = self.registry.function(parent).owner;
        let inherited: Vec<VariableId> = self
            .registry
            .function(child)
            .captures
            .iter()
            .copied()
            .filter(|id| !self.registry.function(parent).captures.contains(id))
            .filter(|id| match self.env.variable(*id).kind {
                VariableKind::Field { .. } | VariableKind::This { .. } => parent_owner.is_none(),
                VariableKind::Parameter { function, .. } => function != parent,
                VariableKind::Local { function, .. } => function != Some(parent),
            })
            .collect();
        self.registry.function_mut(parent).captures.extend(inherited);
    }
}

use std::collections::HashMap;

use crate::diagnostics::CompileError;
use crate::span::Span;

use super::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Declared in a body or bound by a pattern. `function` is `None` at the top level.
    Local { function: Option<FnSigId>, instantiated: bool },
    Field { owner: ClassId, index: u32, is_static: bool },
    Parameter { function: FnSigId, index: u32 },
    This { function: FnSigId },
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub span: Span,
    pub ty: Type,
    pub is_mut: bool,
    pub kind: VariableKind,
    pub referenced_in_closure: bool,
}

impl Variable {
    pub fn is_local(&self) -> bool {
        matches!(self.kind, VariableKind::Local { .. })
    }
}

/// What a new frame changes relative to its parent. Unset fields are inherited.
#[derive(Debug, Clone, Default)]
pub struct FrameSpec {
    pub current_type: Option<TypeOwner>,
    pub current_function: Option<FnSigId>,
    pub expected_return: Option<Type>,
    pub placeholders: Vec<Placeholder>,
    pub enters_loop: bool,
}

impl FrameSpec {
    pub fn for_type(owner: TypeOwner, placeholders: Vec<Placeholder>) -> Self {
        Self { current_type: Some(owner), placeholders, ..Self::default() }
    }

    pub fn for_function(function: FnSigId, expected_return: Type, placeholders: Vec<Placeholder>) -> Self {
        Self {
            current_function: Some(function),
            expected_return: Some(expected_return),
            placeholders,
            ..Self::default()
        }
    }

    pub fn for_loop() -> Self {
        Self { enters_loop: true, ..Self::default() }
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    variables: HashMap<String, VariableId>,
    pub functions: HashMap<String, FnSigId>,
    pub placeholders: Vec<Placeholder>,
    pub current_type: Option<TypeOwner>,
    pub current_function: Option<FnSigId>,
    pub expected_return: Type,
    pub loop_depth: u32,
}

/// Depth to restore when the scope it was returned for is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ScopeMark(usize);

/// Stack of lexical frames plus the table of every variable ever declared.
///
/// Variables outlive their frames so annotations can refer to them after
/// checking finishes.
#[derive(Debug, Clone)]
pub struct TypeEnv {
    root: Frame,
    frames: Vec<Frame>,
    variables: Vec<Variable>,
}

impl TypeEnv {
    pub fn new(root_functions: HashMap<String, FnSigId>, expected_return: Type) -> Self {
        Self {
            root: Frame {
                variables: HashMap::new(),
                functions: root_functions,
                placeholders: Vec::new(),
                current_type: None,
                current_function: None,
                expected_return,
                loop_depth: 0,
            },
            frames: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn frame(&self) -> &Frame {
        self.frames.last().unwrap_or(&self.root)
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap_or(&mut self.root)
    }

    pub fn root_mut(&mut self) -> &mut Frame {
        &mut self.root
    }

    pub fn scope_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, spec: FrameSpec) -> ScopeMark {
        let mark = ScopeMark(self.frames.len());
        let parent = self.frame();
        let loop_depth = if spec.current_function.is_some() {
            0
        } else {
            parent.loop_depth
        } + u32::from(spec.enters_loop);
        let mut placeholders = parent.placeholders.clone();
        placeholders.extend(spec.placeholders);
        let frame = Frame {
            variables: HashMap::new(),
            functions: parent.functions.clone(),
            placeholders,
            current_type: spec.current_type.or(parent.current_type),
            current_function: spec.current_function.or(parent.current_function),
            expected_return: spec.expected_return.unwrap_or_else(|| parent.expected_return.clone()),
            loop_depth,
        };
        self.frames.push(frame);
        mark
    }

    /// Pops every frame pushed since `mark` was taken.
    pub fn pop_to(&mut self, mark: ScopeMark) -> Result<(), CompileError> {
        if self.frames.len() <= mark.0 {
            return Err(CompileError::internal(format!(
                "scope released twice: depth {} is not above {}",
                self.frames.len(),
                mark.0
            )));
        }
        self.frames.truncate(mark.0);
        Ok(())
    }

    fn frames_innermost_first(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev().chain(std::iter::once(&self.root))
    }

    pub fn lookup(&self, name: &str) -> Option<VariableId> {
        self.frames_innermost_first().find_map(|f| f.variables.get(name).copied())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn lookup_function(&self, name: &str) -> Option<FnSigId> {
        self.frame().functions.get(name).copied()
    }

    pub fn placeholders(&self) -> &[Placeholder] {
        &self.frame().placeholders
    }

    pub fn create(&mut self, variable: Variable) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    /// Makes `id` visible in the innermost frame. Returns `false` when that
    /// frame already has a variable with the same name.
    pub fn bind(&mut self, id: VariableId) -> bool {
        let name = self.variables[id.index()].name.clone();
        let frame = self.frame_mut();
        if frame.variables.contains_key(&name) {
            return false;
        }
        frame.variables.insert(name, id);
        true
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn variable_mut(&mut self, id: VariableId) -> &mut Variable {
        &mut self.variables[id.index()]
    }

    pub fn set_instantiated(&mut self, id: VariableId, value: bool) {
        if let VariableKind::Local { instantiated, .. } = &mut self.variables[id.index()].kind {
            *instantiated = value;
        }
    }

    pub fn is_instantiated(&self, id: VariableId) -> bool {
        match self.variables[id.index()].kind {
            VariableKind::Local { instantiated, .. } => instantiated,
            _ => true,
        }
    }

    /// Visible locals that are not yet instantiated, in declaration order.
    pub fn uninstantiated_locals(&self) -> Vec<VariableId> {
        let mut found = Vec::new();
        for frame in self.frames_innermost_first() {
            for &id in frame.variables.values() {
                if !self.is_instantiated(id) && !found.contains(&id) {
                    found.push(id);
                }
            }
        }
        found.sort();
        found
    }

    pub fn into_variables(self) -> Vec<Variable> {
        self.variables
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

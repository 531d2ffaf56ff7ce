//! Inference cells for generic type arguments and inferred variable types.
//!
//! Cells form a union-find forest. Linking two cells merges their classes so
//! that resolving either resolves both. A class holds at most one resolution
//! and it never changes once set.

use super::types::{CellId, GenericOwner, Type};

/// Why a cell was created. Used for display and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellOrigin {
    /// Type argument `name` of a generic class, union or function.
    TypeArgument { owner: GenericOwner, name: String },
    /// Type of a variable declared without a type or a value.
    InferredVariable { name: String },
}

impl CellOrigin {
    pub fn name(&self) -> &str {
        match self {
            CellOrigin::TypeArgument { name, .. } | CellOrigin::InferredVariable { name } => name,
        }
    }
}

#[derive(Debug, Clone)]
struct CellData {
    origin: CellOrigin,
    parent: CellId,
    rank: u8,
    resolved: Option<Type>,
}

#[derive(Debug, Clone, Default)]
pub struct GenericCells {
    cells: Vec<CellData>,
}

impl GenericCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn fresh(&mut self, origin: CellOrigin) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(CellData { origin, parent: id, rank: 0, resolved: None });
        id
    }

    pub fn origin(&self, cell: CellId) -> &CellOrigin {
        &self.cells[cell.index()].origin
    }

    /// Representative of the class containing `cell`.
    pub fn find(&self, cell: CellId) -> CellId {
        let mut current = cell;
        loop {
            let parent = self.cells[current.index()].parent;
            if parent == current {
                return current;
            }
            current = parent;
        }
    }

    fn compress(&mut self, cell: CellId) -> CellId {
        let root = self.find(cell);
        let mut current = cell;
        while current != root {
            let next = self.cells[current.index()].parent;
            self.cells[current.index()].parent = root;
            current = next;
        }
        root
    }

    pub fn resolved(&self, cell: CellId) -> Option<&Type> {
        self.cells[self.find(cell).index()].resolved.as_ref()
    }

    pub fn is_resolved(&self, cell: CellId) -> bool {
        self.resolved(cell).is_some()
    }

    pub fn linked(&self, a: CellId, b: CellId) -> bool {
        self.find(a) == self.find(b)
    }

    /// Resolves the class of `cell` to `ty`. Resolving to another cell links
    /// the two classes instead. A class that already has a resolution keeps it.
    pub fn resolve(&mut self, cell: CellId, ty: Type) {
        if let Type::Cell(other) = ty {
            self.link(cell, other);
            return;
        }
        let root = self.compress(cell);
        let data = &mut self.cells[root.index()];
        if data.resolved.is_none() {
            data.resolved = Some(ty);
        }
    }

    /// Merges the classes of `a` and `b`. When only one side is resolved the
    /// merged class takes that resolution; when both are, `a`'s wins.
    pub fn link(&mut self, a: CellId, b: CellId) {
        let root_a = self.compress(a);
        let root_b = self.compress(b);
        if root_a == root_b {
            return;
        }
        let resolved = self.cells[root_a.index()]
            .resolved
            .take()
            .or_else(|| self.cells[root_b.index()].resolved.take());
        let (rank_a, rank_b) = (self.cells[root_a.index()].rank, self.cells[root_b.index()].rank);
        let (child, root) = if rank_a < rank_b { (root_a, root_b) } else { (root_b, root_a) };
        self.cells[child.index()].parent = root;
        self.cells[child.index()].resolved = None;
        if rank_a == rank_b {
            self.cells[root.index()].rank += 1;
        }
        self.cells[root.index()].resolved = resolved;
    }

    /// Follows resolved cells until reaching a non-cell type or an unresolved
    /// cell, which is returned as its representative.
    pub fn shallow_resolve(&self, ty: &Type) -> Type {
        let mut current = ty.clone();
        while let Type::Cell(cell) = current {
            match self.resolved(cell) {
                Some(resolved) => current = resolved.clone(),
                None => return Type::Cell(self.find(cell)),
            }
        }
        current
    }

    /// Whether `ty` mentions the class of `cell`, looking through resolutions.
    pub fn occurs(&self, cell: CellId, ty: &Type) -> bool {
        let root = self.find(cell);
        self.occurs_root(root, ty)
    }

    fn occurs_root(&self, root: CellId, ty: &Type) -> bool {
        match ty {
            Type::Cell(other) => self.cell_mentions(root, *other),
            Type::Class(instance) => instance.args.iter().any(|&arg| self.cell_mentions(root, arg)),
            Type::Union(instance) => instance.args.iter().any(|&arg| self.cell_mentions(root, arg)),
            Type::Function(fn_type) => {
                fn_type.params.iter().any(|p| self.occurs_root(root, &p.ty))
                    || self.occurs_root(root, &fn_type.ret)
            }
            Type::Placeholder(_) | Type::Unknown => false,
        }
    }

    fn cell_mentions(&self, root: CellId, cell: CellId) -> bool {
        if self.find(cell) == root {
            return true;
        }
        self.resolved(cell).is_some_and(|resolved| self.occurs_root(root, resolved))
    }
}

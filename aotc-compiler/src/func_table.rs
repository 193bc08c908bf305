//! The Context's function table (§3.4): one entry per Wasm function,
//! imported or defined, used to resolve `call`/`call_indirect`/`ref.func`
//! targets during translation.

use aotc_ir::FuncRef;
use aotc_types::{EntityRef, FuncIndex, TypeIndex};

/// Where a function's callable code lives.
#[derive(Debug, Clone)]
pub enum Callee {
    /// A module-defined function, compiled to a body in this module.
    Defined { symbol: String },
    /// An import, linked to a host trampoline generated by the ABI layer
    /// (§3.4 "imports are linked to a host trampoline generated by the ABI
    /// layer", §4.3 `fN`).
    Imported { module: String, name: String },
}

#[derive(Debug, Clone)]
pub struct FunctionTableEntry {
    pub type_index: TypeIndex,
    pub callee: Callee,
    /// `None` for imports (§3.4 "`body_ref` is null for imports").
    pub body_ref: Option<FuncRef>,
}

impl FunctionTableEntry {
    pub fn is_import(&self) -> bool {
        self.body_ref.is_none()
    }
}

/// The full table, indexed by [`FuncIndex`] in declaration order (imports
/// first, then module-defined functions, matching the Wasm index space).
#[derive(Debug, Default)]
pub struct FunctionTable {
    entries: Vec<FunctionTableEntry>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FunctionTableEntry) -> FuncIndex {
        let idx = FuncIndex::from_u32(self.entries.len() as u32);
        self.entries.push(entry);
        idx
    }

    pub fn get(&self, index: FuncIndex) -> Option<&FunctionTableEntry> {
        self.entries.get(index.index())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionTableEntry> {
        self.entries.iter()
    }
}

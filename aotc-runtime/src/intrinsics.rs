//! The intrinsics table (§4.6): a process-wide array of function pointers
//! that compiled code calls through rather than linking directly against
//! host symbols, so that the same object file works whether it was loaded
//! from a universal binary or JIT-compiled in-process.

use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

/// Stable index into [`IntrinsicTable`]; the discriminant order matches
/// the enumeration in §4.6 and must never change once a universal-binary
/// format version ships, since loaders resolve intrinsics by this index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum IntrinsicId {
    Call = 0,
    CallIndirect,
    PtrFunc,
    Trap,
    RefFunc,
    MemGrow,
    MemSize,
    MemCopy,
    MemFill,
    MemInit,
    DataDrop,
    TableGet,
    TableSet,
    TableGrow,
    TableSize,
    TableFill,
    TableCopy,
    TableInit,
    ElemDrop,
    MemoryAtomicNotify,
    MemoryAtomicWait,
    /// Software round-to-even fallback for `f32.nearest`/`f64.nearest` on
    /// targets without a hardware round instruction (§4.1, §4.2.2).
    FloatNearest,
}

impl IntrinsicId {
    pub const MAX: usize = Self::FloatNearest as usize + 1;

    pub const ALL: [IntrinsicId; Self::MAX] = [
        IntrinsicId::Call,
        IntrinsicId::CallIndirect,
        IntrinsicId::PtrFunc,
        IntrinsicId::Trap,
        IntrinsicId::RefFunc,
        IntrinsicId::MemGrow,
        IntrinsicId::MemSize,
        IntrinsicId::MemCopy,
        IntrinsicId::MemFill,
        IntrinsicId::MemInit,
        IntrinsicId::DataDrop,
        IntrinsicId::TableGet,
        IntrinsicId::TableSet,
        IntrinsicId::TableGrow,
        IntrinsicId::TableSize,
        IntrinsicId::TableFill,
        IntrinsicId::TableCopy,
        IntrinsicId::TableInit,
        IntrinsicId::ElemDrop,
        IntrinsicId::MemoryAtomicNotify,
        IntrinsicId::MemoryAtomicWait,
        IntrinsicId::FloatNearest,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntrinsicId::Call => "kCall",
            IntrinsicId::CallIndirect => "kCallIndirect",
            IntrinsicId::PtrFunc => "kPtrFunc",
            IntrinsicId::Trap => "kTrap",
            IntrinsicId::RefFunc => "kRefFunc",
            IntrinsicId::MemGrow => "kMemGrow",
            IntrinsicId::MemSize => "kMemSize",
            IntrinsicId::MemCopy => "kMemCopy",
            IntrinsicId::MemFill => "kMemFill",
            IntrinsicId::MemInit => "kMemInit",
            IntrinsicId::DataDrop => "kDataDrop",
            IntrinsicId::TableGet => "kTableGet",
            IntrinsicId::TableSet => "kTableSet",
            IntrinsicId::TableGrow => "kTableGrow",
            IntrinsicId::TableSize => "kTableSize",
            IntrinsicId::TableFill => "kTableFill",
            IntrinsicId::TableCopy => "kTableCopy",
            IntrinsicId::TableInit => "kTableInit",
            IntrinsicId::ElemDrop => "kElemDrop",
            IntrinsicId::MemoryAtomicNotify => "kMemoryAtomicNotify",
            IntrinsicId::MemoryAtomicWait => "kMemoryAtomicWait",
            IntrinsicId::FloatNearest => "kFloatNearest",
        }
    }
}

#[derive(Debug, Error)]
pub enum IntrinsicsError {
    #[error("intrinsic {0} was never installed")]
    NotInstalled(&'static str),
}

/// The table itself: one raw function pointer (as a `usize`) per
/// intrinsic, stored behind `AtomicUsize` so `install` can be called
/// exactly once per process before any compiled function runs, matching
/// "the runtime installs the table before any compiled function executes"
/// (§4.6) without requiring unsafe mutable statics.
pub struct IntrinsicTable {
    slots: [AtomicUsize; IntrinsicId::MAX],
}

impl IntrinsicTable {
    pub fn empty() -> Self {
        IntrinsicTable {
            slots: std::array::from_fn(|_| AtomicUsize::new(0)),
        }
    }

    /// Installs `ptr` for `id`. The compiler only ever reads this table
    /// through an "invariant" load (§4.6) after installation, so a
    /// `Relaxed` store paired with a `Relaxed` load is sufficient as long
    /// as installation happens-before any compiled call — guaranteed by
    /// the loader sequencing install before publishing the module.
    pub fn install(&self, id: IntrinsicId, ptr: usize) {
        self.slots[id as usize].store(ptr, Ordering::Relaxed);
    }

    pub fn get(&self, id: IntrinsicId) -> Result<usize, IntrinsicsError> {
        let ptr = self.slots[id as usize].load(Ordering::Relaxed);
        if ptr == 0 {
            return Err(IntrinsicsError::NotInstalled(id.name()));
        }
        Ok(ptr)
    }

    pub fn is_fully_installed(&self) -> bool {
        IntrinsicId::ALL.iter().all(|&id| self.get(id).is_ok())
    }
}

impl Default for IntrinsicTable {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninstalled_intrinsic_reports_its_own_name() {
        let table = IntrinsicTable::empty();
        let err = table.get(IntrinsicId::MemGrow).unwrap_err();
        assert!(matches!(err, IntrinsicsError::NotInstalled("kMemGrow")));
    }

    #[test]
    fn installing_every_intrinsic_satisfies_is_fully_installed() {
        let table = IntrinsicTable::empty();
        assert!(!table.is_fully_installed());
        for (i, &id) in IntrinsicId::ALL.iter().enumerate() {
            table.install(id, 0x1000 + i);
        }
        assert!(table.is_fully_installed());
        assert_eq!(table.get(IntrinsicId::Call).unwrap(), 0x1000);
    }
}

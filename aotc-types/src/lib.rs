//! Value types, entity indices, and the trap-code/artifact-tag taxonomy
//! shared by every crate in the wasm AOT compiler (§3, §6, §7).

pub mod artifact;
pub mod entity;
pub mod index;
pub mod trap;
pub mod valtype;

pub use artifact::{CpuTag, OsTag, SectionKind, BINARY_VERSION, UNIVERSAL_SECTION_NAME};
pub use entity::{EntityRef, PrimaryMap, SecondaryMap};
pub use index::{DataIndex, ElemIndex, FuncIndex, GlobalIndex, LocalIndex, MemoryIndex, TableIndex, TypeIndex};
pub use trap::TrapCode;
pub use valtype::{BlockSignature, FuncType, ValType, VALUE_SLOT_SIZE};

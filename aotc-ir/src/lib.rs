//! A small SSA-ish code generator IR: the compilation target that
//! `aotc-compiler`'s per-opcode translator lowers Wasm into, and the input
//! `aotc-object`'s emitter consumes.
//!
//! Structurally this mirrors cranelift-codegen's `ir`/`cursor`/
//! `cranelift_frontend` split (entities → data-flow graph + layout →
//! cursor → high-level builder), trimmed to exactly the instruction shapes
//! needed to lower Wasm (no register allocation, no legalization passes,
//! no target-independent optimizations — those concerns live in
//! `aotc-compiler`'s direct-to-machine-code backend instead of a separate
//! mid-level optimizer, per §4.1).

pub mod builder;
pub mod condcodes;
pub mod cursor;
pub mod entities;
pub mod function;
pub mod instructions;
pub mod types;

pub use builder::{FunctionBuilder, FunctionBuilderContext, InsBuilder};
pub use condcodes::{FloatCC, IntCC};
pub use cursor::FuncCursor;
pub use entities::{Block, FuncRef, GlobalValue, Inst, JumpTable, SigRef, StackSlot, Value};
pub use function::{
    DataFlowGraph, ExtFuncData, ExternalName, Function, GlobalValueData, JumpTableData, Layout,
    Signature, StackSlotData, StackSlotKind, ValueDef,
};
pub use instructions::{AtomicRmwOp, InstData, MemFlags, Opcode, VecOp};
pub use types::Type;

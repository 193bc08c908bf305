//! Entity references used inside one [`crate::function::Function`]: values,
//! blocks, instructions, and the handles a function holds onto external
//! declarations (signatures, callees, stack slots, globals).
//!
//! These mirror the role cranelift-codegen's `ir::entities` module plays for
//! cranelift IR: small `u32` newtypes that index into the parallel
//! [`aotc_types::PrimaryMap`]/[`aotc_types::SecondaryMap`] tables owned by
//! the data-flow graph, rather than being pointers into a graph.

use aotc_types::entity_impl;
use aotc_types::EntityRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value(u32);
entity_impl!(Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block(u32);
entity_impl!(Block);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Inst(u32);
entity_impl!(Inst);

/// A reference, local to one function, to a callee declared via
/// `Function::import_function` (either a module-internal function or an
/// import trampoline; §3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(u32);
entity_impl!(FuncRef);

/// A reference, local to one function, to a call signature declared for an
/// indirect call (§4.2.5 `call_indirect`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigRef(u32);
entity_impl!(SigRef);

/// A stack-allocated local slot (one per Wasm parameter/local; §4.2 "allocates
/// stack slots for every parameter ... and every declared local").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackSlot(u32);
entity_impl!(StackSlot);

/// A reference to one of the `ExecCtx` fields (§3.2), materialised as a
/// pointer value the first time it is accessed in a function and cached
/// thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalValue(u32);
entity_impl!(GlobalValue);

/// A jump table attached to a `br_table` instruction (§4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JumpTable(u32);
entity_impl!(JumpTable);

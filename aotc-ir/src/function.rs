//! The data-flow graph, layout, and function container.
//!
//! Split the way cranelift-codegen splits `ir::Function` into a
//! [`DataFlowGraph`] (instruction/value bookkeeping, no order) and a
//! `Layout` (block/instruction order, no data) — §4.1 "the in-memory IR is
//! a conventional sea-of-nodes-free, block-structured CFG with an explicit
//! linear layout".

use std::collections::HashMap;

use aotc_types::entity::{EntityRef, PrimaryMap, SecondaryMap};
use aotc_types::FuncType;

use crate::entities::{Block, FuncRef, GlobalValue, Inst, JumpTable, SigRef, StackSlot, Value};
use crate::instructions::InstData;
use crate::types::Type;

/// One entry in a [`JumpTable`]'s destination list, used by `br_table`
/// (§4.2.1).
#[derive(Debug, Clone, Default)]
pub struct JumpTableData {
    pub targets: Vec<Block>,
}

impl JumpTableData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.targets.push(block);
    }
}

/// Everything a [`Value`] needs beyond its defining instruction: the type
/// it carries, and whether it is a block parameter or the result of an
/// instruction.
#[derive(Debug, Clone, Copy)]
pub enum ValueDef {
    /// The `n`th result of `inst`.
    Result(Inst, u32),
    /// The `n`th formal parameter of `block` (§4.2.1, block-arg "phi"
    /// merges).
    Param(Block, u32),
}

#[derive(Debug, Clone)]
struct ValueData {
    ty: Type,
    def: ValueDef,
}

/// Holds every instruction and value in a function, independent of their
/// order. Mirrors `ir::DataFlowGraph`.
#[derive(Debug, Default)]
pub struct DataFlowGraph {
    values: PrimaryMap<Value, ValueData>,
    insts: PrimaryMap<Inst, InstData>,
    /// Results produced by each instruction (most instructions produce 0
    /// or 1; a handful of intrinsic calls produce more).
    inst_results: SecondaryMap<Inst, Vec<Value>>,
    block_params: SecondaryMap<Block, Vec<Value>>,
    signatures: PrimaryMap<SigRef, FuncType>,
    ext_funcs: PrimaryMap<FuncRef, ExtFuncData>,
    jump_tables: PrimaryMap<JumpTable, JumpTableData>,
    global_values: PrimaryMap<GlobalValue, GlobalValueData>,
}

/// A function reference as seen from inside the function doing the
/// calling: either a direct call to a module-local function, or an import
/// trampoline (§3.4, §4.2.5).
#[derive(Debug, Clone)]
pub struct ExtFuncData {
    pub sig: SigRef,
    pub name: ExternalName,
}

#[derive(Debug, Clone)]
pub enum ExternalName {
    User(u32),
    Intrinsic(u32),
}

/// A read-only global value derived from `ExecCtx` or module state (§3.2,
/// §4.1).
#[derive(Debug, Clone)]
pub enum GlobalValueData {
    /// The `ExecCtx*` hidden argument itself.
    ExecCtxPtr,
    /// `memories[index].base`, reloaded on every access since `memory.grow`
    /// can relocate it (§4.2.3).
    MemoryBase { memory_index: u32 },
    /// `&globals[index]`.
    GlobalAddr { global_index: u32 },
}

impl DataFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_inst(&mut self, data: InstData) -> Inst {
        self.insts.push(data)
    }

    pub fn inst_data(&self, inst: Inst) -> &InstData {
        &self.insts[inst]
    }

    pub fn inst_data_mut(&mut self, inst: Inst) -> &mut InstData {
        &mut self.insts[inst]
    }

    pub fn append_result(&mut self, inst: Inst, ty: Type) -> Value {
        let n = self.inst_results[inst].len() as u32;
        let value = self.values.push(ValueData {
            ty,
            def: ValueDef::Result(inst, n),
        });
        self.inst_results[inst].push(value);
        value
    }

    pub fn inst_results(&self, inst: Inst) -> &[Value] {
        &self.inst_results[inst]
    }

    pub fn first_result(&self, inst: Inst) -> Value {
        self.inst_results[inst][0]
    }

    pub fn append_block_param(&mut self, block: Block, ty: Type) -> Value {
        let n = self.block_params[block].len() as u32;
        let value = self.values.push(ValueData {
            ty,
            def: ValueDef::Param(block, n),
        });
        self.block_params[block].push(value);
        value
    }

    pub fn block_params(&self, block: Block) -> &[Value] {
        &self.block_params[block]
    }

    pub fn value_type(&self, value: Value) -> Type {
        self.values[value].ty
    }

    pub fn value_def(&self, value: Value) -> ValueDef {
        self.values[value].def
    }

    pub fn import_signature(&mut self, sig: FuncType) -> SigRef {
        self.signatures.push(sig)
    }

    pub fn signature(&self, sig_ref: SigRef) -> &FuncType {
        &self.signatures[sig_ref]
    }

    pub fn import_function(&mut self, data: ExtFuncData) -> FuncRef {
        self.ext_funcs.push(data)
    }

    pub fn ext_func(&self, func_ref: FuncRef) -> &ExtFuncData {
        &self.ext_funcs[func_ref]
    }

    pub fn create_jump_table(&mut self, data: JumpTableData) -> JumpTable {
        self.jump_tables.push(data)
    }

    pub fn jump_table(&self, jt: JumpTable) -> &JumpTableData {
        &self.jump_tables[jt]
    }

    pub fn create_global_value(&mut self, data: GlobalValueData) -> GlobalValue {
        self.global_values.push(data)
    }

    pub fn global_value(&self, gv: GlobalValue) -> &GlobalValueData {
        &self.global_values[gv]
    }
}

/// Linear order of blocks and, within each block, of instructions. Kept
/// separate from [`DataFlowGraph`] so that reordering blocks (e.g. sinking
/// cold trap blocks to the end, §4.2.6) never touches value/instruction
/// identity.
#[derive(Debug, Default)]
pub struct Layout {
    block_order: Vec<Block>,
    block_insts: SecondaryMap<Block, Vec<Inst>>,
    next_block: u32,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_block(&mut self) -> Block {
        let block = Block::from_u32(self.next_block);
        self.next_block += 1;
        self.block_order.push(block);
        block
    }

    pub fn append_inst(&mut self, block: Block, inst: Inst) {
        self.block_insts[block].push(inst);
    }

    pub fn block_insts(&self, block: Block) -> &[Inst] {
        &self.block_insts[block]
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.block_order.iter().copied()
    }

    /// Moves `block` to the end of the layout, used to sink the trap
    /// blocks synthesized for `cost_limit_exceeded`/`unreachable`/etc. out
    /// of the hot path (§4.2.6, "cold/unlikely trap-branch marking").
    pub fn move_to_end(&mut self, block: Block) {
        if let Some(pos) = self.block_order.iter().position(|&b| b == block) {
            let b = self.block_order.remove(pos);
            self.block_order.push(b);
        }
    }
}

/// A local variable slot's storage class, used by [`StackSlotData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSlotKind {
    /// Backs a Wasm parameter or local (§4.2 "stack slots, not SSA
    /// variables").
    Local,
    /// Scratch space used to marshal SIMD or multi-value results through
    /// the ABI wrapper (§4.3).
    Spill,
}

#[derive(Debug, Clone)]
pub struct StackSlotData {
    pub kind: StackSlotKind,
    pub size: u32,
    pub ty: Type,
}

/// The function's formal signature, lowered from a Wasm [`FuncType`] (§4.1
/// type lowering).
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<Type>,
    pub returns: Vec<Type>,
}

impl Signature {
    pub fn lower(func_type: &FuncType) -> Self {
        Signature {
            params: func_type.params.iter().map(|&vt| Type::lower_valtype(vt)).collect(),
            returns: func_type.results.iter().map(|&vt| Type::lower_valtype(vt)).collect(),
        }
    }
}

/// One compiled function: its signature, stack slots, and IR body.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub signature: Signature,
    pub dfg: DataFlowGraph,
    pub layout: Layout,
    stack_slots: PrimaryMap<StackSlot, StackSlotData>,
    entry_block: Option<Block>,
}

impl Function {
    pub fn with_name_signature(name: impl Into<String>, signature: Signature) -> Self {
        Function {
            name: name.into(),
            signature,
            dfg: DataFlowGraph::new(),
            layout: Layout::new(),
            stack_slots: PrimaryMap::new(),
            entry_block: None,
        }
    }

    pub fn create_stack_slot(&mut self, data: StackSlotData) -> StackSlot {
        self.stack_slots.push(data)
    }

    pub fn stack_slot(&self, slot: StackSlot) -> &StackSlotData {
        &self.stack_slots[slot]
    }

    pub fn stack_slots(&self) -> impl Iterator<Item = (StackSlot, &StackSlotData)> {
        self.stack_slots.iter()
    }

    pub fn set_entry_block(&mut self, block: Block) {
        self.entry_block = Some(block);
    }

    pub fn entry_block(&self) -> Option<Block> {
        self.entry_block
    }

    /// Total byte size of the locals frame, used by the wrapper layer to
    /// size its value-slot scratch buffer (§4.3).
    pub fn frame_size(&self) -> u32 {
        self.stack_slots.iter().map(|(_, d)| d.size).sum()
    }

    /// Maps every value that is a block parameter to the block it belongs
    /// to, used by the trap-block cache to detect whether a cached trap
    /// block can be reused across call sites with a differing live-value
    /// set (§4.2.6).
    pub fn block_param_owners(&self) -> HashMap<Value, Block> {
        let mut map = HashMap::new();
        for block in self.layout.blocks() {
            for &v in self.dfg.block_params(block) {
                map.insert(v, block);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::{InstData, Opcode};

    fn sig() -> Signature {
        Signature {
            params: vec![Type::I32, Type::I32],
            returns: vec![Type::I32],
        }
    }

    #[test]
    fn appending_a_result_assigns_a_fresh_value_with_the_given_type() {
        let mut f = Function::with_name_signature("add", sig());
        let inst = f.dfg.make_inst(InstData::Binary {
            opcode: Opcode::Iadd,
            args: [Value::from_u32(0), Value::from_u32(1)],
        });
        let result = f.dfg.append_result(inst, Type::I32);
        assert_eq!(f.dfg.value_type(result), Type::I32);
        match f.dfg.value_def(result) {
            ValueDef::Result(i, 0) => assert_eq!(i, inst),
            other => panic!("unexpected def: {:?}", other),
        }
    }

    #[test]
    fn layout_preserves_append_order_until_a_block_is_sunk() {
        let mut f = Function::with_name_signature("f", sig());
        let b0 = f.layout.append_block();
        let b1 = f.layout.append_block();
        let b2 = f.layout.append_block();
        assert_eq!(f.layout.blocks().collect::<Vec<_>>(), vec![b0, b1, b2]);
        f.layout.move_to_end(b0);
        assert_eq!(f.layout.blocks().collect::<Vec<_>>(), vec![b1, b2, b0]);
    }

    #[test]
    fn frame_size_sums_every_declared_stack_slot() {
        let mut f = Function::with_name_signature("f", sig());
        f.create_stack_slot(StackSlotData {
            kind: StackSlotKind::Local,
            size: 16,
            ty: Type::I8X16,
        });
        f.create_stack_slot(StackSlotData {
            kind: StackSlotKind::Local,
            size: 8,
            ty: Type::I64,
        });
        assert_eq!(f.frame_size(), 24);
    }
}

//! High-level function construction surface.
//!
//! Grounded in `cranelift_frontend::FunctionBuilder`: a context object that
//! owns the scratch state needed across an entire function translation,
//! paired with a per-function builder that exposes `create_block`,
//! `append_block_param`, `switch_to_block`, `seal_block`, and an `ins()`
//! instruction-builder surface. Unlike cranelift-frontend's `SSABuilder`,
//! this builder does *not* need incomplete-phi tracking: Wasm's structured
//! control flow means every block's predecessors are known before the
//! block is sealed (§4.2.1 "all merge points are produced by `end`/`else`,
//! whose predecessors are exactly the frames already on the control
//! stack").

use std::collections::HashSet;

use crate::condcodes::{FloatCC, IntCC};
use crate::cursor::FuncCursor;
use crate::entities::{Block, FuncRef, GlobalValue, Inst, JumpTable, SigRef, StackSlot, Value};
use crate::function::{Function, JumpTableData, StackSlotData};
use crate::instructions::{AtomicRmwOp, InstData, MemFlags, Opcode, VecOp};
use crate::types::Type;
use aotc_types::TrapCode;

/// Scratch state reusable across many function translations, the same
/// role `FunctionBuilderContext` plays for cranelift-frontend: its
/// allocations are amortised instead of reallocated per function.
#[derive(Default)]
pub struct FunctionBuilderContext {
    sealed_blocks: HashSet<Block>,
}

impl FunctionBuilderContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&mut self) {
        self.sealed_blocks.clear();
    }
}

pub struct FunctionBuilder<'a> {
    pub func: &'a mut Function,
    ctx: &'a mut FunctionBuilderContext,
    position: Option<Block>,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(func: &'a mut Function, ctx: &'a mut FunctionBuilderContext) -> Self {
        ctx.clear();
        FunctionBuilder {
            func,
            ctx,
            position: None,
        }
    }

    pub fn create_block(&mut self) -> Block {
        self.func.layout.append_block()
    }

    pub fn append_block_param(&mut self, block: Block, ty: Type) -> Value {
        self.func.dfg.append_block_param(block, ty)
    }

    pub fn block_params(&self, block: Block) -> &[Value] {
        self.func.dfg.block_params(block)
    }

    pub fn switch_to_block(&mut self, block: Block) {
        self.position = Some(block);
    }

    pub fn current_block(&self) -> Option<Block> {
        self.position
    }

    /// Marks `block` as having all of its predecessors known. Since every
    /// block this builder creates is only ever jumped to from code already
    /// emitted by the time it is sealed, sealing here is bookkeeping for
    /// debug assertions rather than triggering phi completion (contrast
    /// with cranelift-frontend, which uses sealing to finalize
    /// incomplete-phi placeholders).
    pub fn seal_block(&mut self, block: Block) {
        self.ctx.sealed_blocks.insert(block);
    }

    pub fn is_sealed(&self, block: Block) -> bool {
        self.ctx.sealed_blocks.contains(&block)
    }

    pub fn create_stack_slot(&mut self, data: StackSlotData) -> StackSlot {
        self.func.create_stack_slot(data)
    }

    pub fn import_signature(&mut self, sig: aotc_types::FuncType) -> SigRef {
        self.func.dfg.import_signature(sig)
    }

    pub fn create_jump_table(&mut self, data: JumpTableData) -> JumpTable {
        self.func.dfg.create_jump_table(data)
    }

    pub fn create_global_value(&mut self, data: crate::function::GlobalValueData) -> GlobalValue {
        self.func.dfg.create_global_value(data)
    }

    fn cursor(&mut self) -> FuncCursor<'_> {
        let block = self
            .position
            .expect("FunctionBuilder::ins called with no block selected");
        let mut cursor = FuncCursor::new(self.func);
        cursor.goto_bottom(block);
        cursor
    }

    pub fn ins(&mut self) -> InsBuilder<'_, 'a> {
        InsBuilder { builder: self }
    }
}

/// The `ins()` surface: one method per instruction shape, each appending
/// to whichever block `switch_to_block` last selected and returning the
/// produced [`Value`] (or [`Inst`] for instructions with no single
/// result). Named and grouped the way `cranelift_frontend::FuncInstBuilder`
/// exposes `ins().iadd(...)`, `ins().load(...)`, etc.
pub struct InsBuilder<'short, 'long> {
    builder: &'short mut FunctionBuilder<'long>,
}

impl<'short, 'long> InsBuilder<'short, 'long> {
    fn append(&mut self, data: InstData, ty: Type) -> Value {
        let inst = self.builder.cursor().ins(data);
        self.builder.func.dfg.append_result(inst, ty)
    }

    fn append_inst(&mut self, data: InstData) -> Inst {
        self.builder.cursor().ins(data)
    }

    pub fn iconst(&mut self, ty: Type, imm: i64) -> Value {
        self.append(InstData::UnaryImm { opcode: Opcode::Iconst, imm }, ty)
    }

    pub fn f32const(&mut self, bits: u32) -> Value {
        self.append(InstData::UnaryIeee32 { opcode: Opcode::Fconst, bits }, Type::F32)
    }

    pub fn f64const(&mut self, bits: u64) -> Value {
        self.append(InstData::UnaryIeee64 { opcode: Opcode::Fconst, bits }, Type::F64)
    }

    pub fn vconst(&mut self, bytes: [u8; 16]) -> Value {
        self.append(InstData::UnaryConst128 { opcode: Opcode::Vconst, bytes }, Type::I8X16)
    }

    pub fn binary(&mut self, opcode: Opcode, ty: Type, a: Value, b: Value) -> Value {
        self.append(InstData::Binary { opcode, args: [a, b] }, ty)
    }

    pub fn unary(&mut self, opcode: Opcode, ty: Type, a: Value) -> Value {
        self.append(InstData::Unary { opcode, arg: a }, ty)
    }

    pub fn select(&mut self, ty: Type, cond: Value, a: Value, b: Value) -> Value {
        self.append(InstData::Ternary { opcode: Opcode::Select, args: [cond, a, b] }, ty)
    }

    pub fn icmp(&mut self, cc: IntCC, a: Value, b: Value) -> Value {
        self.append(InstData::IntCompare { cc, args: [a, b] }, Type::I32)
    }

    pub fn fcmp(&mut self, cc: FloatCC, a: Value, b: Value) -> Value {
        self.append(InstData::FloatCompare { cc, args: [a, b] }, Type::I32)
    }

    pub fn load(&mut self, ty: Type, flags: MemFlags, base: Value, offset: i64) -> Value {
        self.append(InstData::Load { flags, offset, ty, arg: base }, ty)
    }

    pub fn store(&mut self, flags: MemFlags, value: Value, base: Value, offset: i64) -> Inst {
        self.append_inst(InstData::Store { flags, offset, args: [base, value] })
    }

    pub fn stack_load(&mut self, ty: Type, slot: StackSlot) -> Value {
        self.append(InstData::StackLoad { slot, ty }, ty)
    }

    pub fn stack_store(&mut self, slot: StackSlot, value: Value) -> Inst {
        self.append_inst(InstData::StackStore { slot, arg: value })
    }

    pub fn heap_addr(
        &mut self,
        memory_base: GlobalValue,
        index: Value,
        offset: u32,
        access_size: u32,
    ) -> Value {
        self.append(
            InstData::HeapAddr { memory_base, index, offset, access_size },
            Type::Pointer,
        )
    }

    pub fn exec_ctx_field(&mut self, field: u32, ty: Type) -> Value {
        self.append(InstData::ExecCtxField { field, ty }, ty)
    }

    /// The address of an `ExecCtx` field, for an atomic RMW/CAS against it
    /// rather than a plain load (§4.2.1, §4.2.4).
    pub fn exec_ctx_field_addr(&mut self, field: u32) -> Value {
        self.append(InstData::ExecCtxFieldAddr { field }, Type::Pointer)
    }

    pub fn atomic_rmw(&mut self, op: AtomicRmwOp, ty: Type, flags: MemFlags, addr: Value, value: Value) -> Value {
        self.append(InstData::AtomicRmw { op, flags, args: [addr, value] }, ty)
    }

    pub fn atomic_cas(&mut self, ty: Type, flags: MemFlags, addr: Value, expected: Value, replacement: Value) -> Value {
        self.append(
            InstData::AtomicCas { flags, args: [addr, expected, replacement] },
            ty,
        )
    }

    pub fn atomic_fence(&mut self) -> Inst {
        self.append_inst(InstData::Nullary { opcode: Opcode::AtomicFence })
    }

    pub fn vector_op(&mut self, op: VecOp, ty: Type, args: &[Value], imm: Option<i64>) -> Value {
        self.append(
            InstData::VectorOp { op, args: args.iter().copied().collect(), imm },
            ty,
        )
    }

    pub fn jump(&mut self, destination: Block, args: &[Value]) -> Inst {
        self.append_inst(InstData::Jump {
            destination,
            args: args.iter().copied().collect(),
        })
    }

    pub fn brif(
        &mut self,
        cond: Value,
        then_block: Block,
        then_args: &[Value],
        else_block: Block,
        else_args: &[Value],
    ) -> Inst {
        self.append_inst(InstData::Brif {
            arg: cond,
            then_block,
            then_args: then_args.iter().copied().collect(),
            else_block,
            else_args: else_args.iter().copied().collect(),
        })
    }

    pub fn br_table(&mut self, index: Value, table: JumpTable, default: Block) -> Inst {
        self.append_inst(InstData::BranchTable { arg: index, table, default })
    }

    pub fn return_(&mut self, args: &[Value]) -> Inst {
        self.append_inst(InstData::Return { args: args.iter().copied().collect() })
    }

    pub fn trap(&mut self, code: TrapCode) -> Inst {
        self.append_inst(InstData::Trap { code })
    }

    /// Appends a call and returns every result value (multi-value returns
    /// are rare but legal, §4.2.5).
    pub fn call(&mut self, func_ref: FuncRef, args: &[Value], result_types: &[Type]) -> Vec<Value> {
        let inst = self.append_inst(InstData::Call {
            func_ref,
            args: args.iter().copied().collect(),
        });
        result_types
            .iter()
            .map(|&ty| self.builder.func.dfg.append_result(inst, ty))
            .collect()
    }

    pub fn call_indirect(
        &mut self,
        sig_ref: SigRef,
        callee: Value,
        args: &[Value],
        result_types: &[Type],
    ) -> Vec<Value> {
        let inst = self.append_inst(InstData::CallIndirect {
            sig_ref,
            callee,
            args: args.iter().copied().collect(),
        });
        result_types
            .iter()
            .map(|&ty| self.builder.func.dfg.append_result(inst, ty))
            .collect()
    }

    pub fn intrinsic_call(&mut self, intrinsic: u32, args: &[Value], result_types: &[Type]) -> Vec<Value> {
        let inst = self.append_inst(InstData::IntrinsicCall {
            intrinsic,
            args: args.iter().copied().collect(),
        });
        result_types
            .iter()
            .map(|&ty| self.builder.func.dfg.append_result(inst, ty))
            .collect()
    }

    pub fn intrinsic_load(&mut self, intrinsic: u32) -> Value {
        self.append(InstData::IntrinsicLoad { intrinsic }, Type::Pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{Function, Signature, StackSlotKind};

    fn empty_sig() -> Signature {
        Signature { params: vec![], returns: vec![Type::I32] }
    }

    #[test]
    fn block_params_round_trip_as_phi_style_merge_arguments() {
        let mut func = Function::with_name_signature("f", empty_sig());
        let mut ctx = FunctionBuilderContext::new();
        let mut b = FunctionBuilder::new(&mut func, &mut ctx);

        let entry = b.create_block();
        let merge = b.create_block();
        let p = b.append_block_param(merge, Type::I32);

        b.switch_to_block(entry);
        let c = b.ins().iconst(Type::I32, 42);
        b.ins().jump(merge, &[c]);
        b.seal_block(entry);

        b.switch_to_block(merge);
        b.ins().return_(&[p]);
        b.seal_block(merge);

        assert!(b.is_sealed(entry));
        assert_eq!(b.block_params(merge), &[p]);
    }

    #[test]
    fn stack_slot_round_trips_through_store_then_load() {
        let mut func = Function::with_name_signature("f", empty_sig());
        let mut ctx = FunctionBuilderContext::new();
        let mut b = FunctionBuilder::new(&mut func, &mut ctx);
        let slot = b.create_stack_slot(StackSlotData {
            kind: StackSlotKind::Local,
            size: 4,
            ty: Type::I32,
        });
        let entry = b.create_block();
        b.switch_to_block(entry);
        let v = b.ins().iconst(Type::I32, 5);
        b.ins().stack_store(slot, v);
        let reloaded = b.ins().stack_load(Type::I32, slot);
        b.ins().return_(&[reloaded]);
        assert_eq!(func.layout.block_insts(entry).len(), 4);
    }
}

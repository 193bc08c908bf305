//! Translates validated wasm function bodies into the compiler's native IR
//! (§4.1-§4.2).
//!
//! The module split mirrors `cranelift_wasm`'s own layering: [`context`]
//! plays the role of `cranelift_wasm::FuncEnvironment`, [`state`] the role
//! of `TranslationState`, and [`translator`] the role of
//! `code_translator::translate_operator`. [`compile_function`] is the
//! driver that ties them together for one function body at a time; the
//! `aotc` crate calls it once per function found while walking the module
//! with `wasmparser`.

pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod func_table;
pub mod state;
pub mod translator;
pub mod wrapper;

pub use config::{CompilerConfig, CpuFeatures, OptLevel, TargetCpu};
pub use context::{CompilationContext, ExecCtxField, FnAttributes, LoweredFuncType, ReturnConvention};
pub use control::{ControlFrame, FrameKind, PendingExit};
pub use error::{CompilerError, CompilerResult};
pub use func_table::{Callee, FunctionTable, FunctionTableEntry};
pub use state::FunctionState;
pub use translator::{translate_operator, wasm_valtype, Intrinsic};
pub use wrapper::{build_entry_wrapper, build_import_trampoline, trampoline_name, wrapper_name, WrapperPlan};

use aotc_ir::{
    AtomicRmwOp, Function, FunctionBuilder, FunctionBuilderContext, MemFlags, Signature, StackSlotData,
    StackSlotKind, Type, Value,
};
use aotc_types::{BlockSignature, FuncType};

use control::ControlFrame;
use translator::TranslateCtx;

/// Compiles one function body (§4.2).
///
/// Allocates a stack slot for every parameter and declared local (locals
/// are stack slots, not SSA variables, so a later spill/reload pass never
/// has to reconstruct them), pushes the function body's own implicit
/// outer `block` onto the control stack so its trailing `end` is handled
/// by the ordinary `end` path, translates every operator in turn, and
/// finally gives every trap block reached along the way a real `trap`
/// terminator and sinks it to the end of the layout (§4.2.6).
pub fn compile_function(
    cx: &CompilationContext,
    name: impl Into<String>,
    ft: &FuncType,
    mut body: wasmparser::FunctionBody,
) -> CompilerResult<Function> {
    let lowered = cx.lower_functype(ft);
    let sig = Signature { params: lowered.params.clone(), returns: lowered.returns.clone() };
    let mut func = Function::with_name_signature(name, sig);
    let mut fbc = FunctionBuilderContext::new();
    let mut state = FunctionState::new();
    let mut builder = FunctionBuilder::new(&mut func, &mut fbc);

    let entry = builder.create_block();
    let mut entry_params = Vec::with_capacity(lowered.params.len());
    for &ty in &lowered.params {
        entry_params.push(builder.append_block_param(entry, ty));
    }
    builder.switch_to_block(entry);

    for (i, &vt) in ft.params.iter().enumerate() {
        let ty = cx.lower_valtype(vt);
        let slot = builder.create_stack_slot(StackSlotData { kind: StackSlotKind::Local, size: ty.bytes(), ty });
        builder.ins().stack_store(slot, entry_params[i + 1]);
        state.locals.push(slot);
    }

    let mut locals_reader = body.get_locals_reader().map_err(CompilerError::Parse)?;
    for _ in 0..locals_reader.get_count() {
        let (count, vt) = locals_reader.read().map_err(CompilerError::Parse)?;
        let ty = wasm_valtype(vt);
        for _ in 0..count {
            let slot = builder.create_stack_slot(StackSlotData { kind: StackSlotKind::Local, size: ty.bytes(), ty });
            let zero = zero_value(&mut builder, ty);
            builder.ins().stack_store(slot, zero);
            state.locals.push(slot);
        }
    }

    // The function body is itself the implicit outermost `block`
    // (§4.2.1): pushing it here means the body's trailing `end` operator
    // (every `wasmparser` operator stream for a function ends with one)
    // is handled by the ordinary `end` path rather than as a special
    // case, landing the builder on `end_block` with the return values
    // already sitting on the operand stack.
    let end_block = builder.create_block();
    for &vt in &ft.results {
        builder.append_block_param(end_block, cx.lower_valtype(vt));
    }
    state.push_control(ControlFrame::new_block(
        0,
        end_block,
        BlockSignature::Indexed(FuncType::new(vec![], ft.results.clone())),
    ));

    {
        let mut tc = TranslateCtx { builder: &mut builder, state: &mut state, cx };
        let mut operators = body.get_operators_reader().map_err(CompilerError::Parse)?;
        while !operators.eof() {
            let op = operators.read().map_err(CompilerError::Parse)?;
            translate_operator(&op, &mut tc)?;
        }
    }

    builder.ins().return_(&state.operand_stack.clone());

    // Every trap block carries the gas/instruction deltas pending at its
    // jump site as its two block params (added by `trap_block_for` when
    // gas metering is on); flush them into the shared ExecCtx counters
    // before the trap terminator so a trapping function never loses
    // accounting for work it already did (§4.2.6).
    let trap_blocks: Vec<_> = state.trap_blocks.iter().map(|(&code, &block)| (code, block)).collect();
    for (code, block) in trap_blocks {
        builder.switch_to_block(block);
        if cx.config.gas_metering {
            let params = builder.block_params(block).to_vec();
            let (gas_delta, instr_delta) = (params[0], params[1]);
            let gas_addr = builder.ins().exec_ctx_field_addr(ExecCtxField::Gas as u32);
            builder.ins().atomic_rmw(AtomicRmwOp::Add, Type::I64, MemFlags::new(), gas_addr, gas_delta);
            let instr_addr = builder.ins().exec_ctx_field_addr(ExecCtxField::InstrCount as u32);
            builder.ins().atomic_rmw(AtomicRmwOp::Add, Type::I64, MemFlags::new(), instr_addr, instr_delta);
        }
        builder.ins().trap(code);
        builder.seal_block(block);
        builder.func.layout.move_to_end(block);
    }

    builder.func.set_entry_block(entry);
    drop(builder);
    Ok(func)
}

fn zero_value(builder: &mut FunctionBuilder, ty: Type) -> Value {
    match ty {
        Type::F32 => builder.ins().f32const(0),
        Type::F64 => builder.ins().f64const(0),
        Type::I8X16 => builder.ins().vconst([0; 16]),
        _ => builder.ins().iconst(ty, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aotc_types::ValType;

    fn new_ctx() -> CompilationContext {
        CompilationContext::new(CompilerConfig::default(), vec![FuncType::new(vec![], vec![])])
    }

    /// `wasmparser` encodes a function body as raw locals-declarations
    /// bytes followed by the operator stream, both readable straight back
    /// off a hand-built byte buffer without going through a whole module.
    fn function_body(locals: &[u8], code: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(locals);
        bytes.extend_from_slice(code);
        bytes
    }

    #[test]
    fn compiles_identity_function_with_no_locals_and_one_param() {
        let cx = new_ctx();
        let ft = FuncType::new(vec![ValType::I32], vec![ValType::I32]);
        // 0 local-declaration groups, then `local.get 0`, `end`.
        let bytes = function_body(&[0x00], &[0x20, 0x00, 0x0b]);
        let body = wasmparser::FunctionBody::new(0, &bytes);
        let func = compile_function(&cx, "f", &ft, body).expect("function should compile");
        assert!(func.entry_block().is_some());
        assert_eq!(func.signature.params.len(), 2); // ExecCtx* + one i32
        assert_eq!(func.signature.returns, vec![Type::I32]);
    }

    #[test]
    fn declared_locals_get_one_stack_slot_each() {
        let cx = new_ctx();
        let ft = FuncType::new(vec![], vec![]);
        // 1 local-declaration group (2 locals, i32 = 0x7f), then `end`.
        let bytes = function_body(&[0x01, 0x02, 0x7f], &[0x0b]);
        let body = wasmparser::FunctionBody::new(0, &bytes);
        let func = compile_function(&cx, "f", &ft, body).expect("function should compile");
        assert_eq!(func.stack_slots().count(), 2);
    }
}

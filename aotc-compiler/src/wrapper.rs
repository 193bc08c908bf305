//! The Wrapper & ABI layer (§4.3): generates, per distinct [`FuncType`], a
//! `tN` entry-point wrapper callable with an untyped array-of-values
//! argument/return buffer, and, per import, an `fN` trampoline that calls
//! back into the host through the `kCall` intrinsic.
//!
//! Grounded in `wasmtime`'s own trampoline generation
//! (`wasmtime/crates/cranelift/src/compiler/component.rs` and
//! `crates/cranelift/src/func_environ.rs`'s `'tN'`-style host-call
//! trampolines): a small, mechanically generated function per signature
//! that marshals values between the native calling convention and a
//! uniform boxed representation, so the loader only ever needs to resolve
//! one call shape per arity/signature rather than one per module.

use std::collections::HashMap;

use aotc_ir::{Function, FunctionBuilder, FunctionBuilderContext, MemFlags, Signature, Type};
use aotc_types::{FuncType, VALUE_SLOT_SIZE};

use crate::context::CompilationContext;

/// Name of the generated entry wrapper for a given signature index, e.g.
/// `t0`, `t1`, ... (§4.3 "per-function-type wrapper named `tN`").
pub fn wrapper_name(index: u32) -> String {
    format!("t{index}")
}

/// Name of the generated import trampoline for a given import index, e.g.
/// `f0`, `f1`, ... (§4.3 "`fN` trampoline").
pub fn trampoline_name(index: u32) -> String {
    format!("f{index}")
}

/// Deduplicates function types so structurally identical signatures share
/// one wrapper (§4.3 "Duplicate function types alias to a single
/// wrapper").
pub struct WrapperPlan {
    /// Distinct signatures needing a `tN` wrapper, in first-seen order.
    pub distinct_types: Vec<FuncType>,
    /// Maps every module type index to the `distinct_types` slot (hence
    /// wrapper name) it aliases to.
    pub type_to_wrapper: HashMap<usize, usize>,
}

impl WrapperPlan {
    pub fn build(types: &[FuncType]) -> Self {
        let mut distinct_types: Vec<FuncType> = Vec::new();
        let mut type_to_wrapper = HashMap::new();
        for (i, ft) in types.iter().enumerate() {
            let slot = distinct_types
                .iter()
                .position(|existing| existing.is_equivalent_to(ft))
                .unwrap_or_else(|| {
                    distinct_types.push(ft.clone());
                    distinct_types.len() - 1
                });
            type_to_wrapper.insert(i, slot);
        }
        WrapperPlan { distinct_types, type_to_wrapper }
    }

    pub fn wrapper_for(&self, type_index: usize) -> u32 {
        self.type_to_wrapper[&type_index] as u32
    }
}

/// Builds the `tN(ExecCtx*, raw_func, raw_args, raw_rets)` entry wrapper
/// for one signature (§4.3): unpacks each argument out of the
/// [`VALUE_SLOT_SIZE`]-wide marshalling slots in `raw_args`, calls
/// `raw_func` (the real compiled function, reached through a function
/// pointer rather than a direct call since the wrapper is shared across
/// every module-defined function of this shape), and packs results back
/// into `raw_rets`.
pub fn build_entry_wrapper(cx: &CompilationContext, index: u32, ft: &FuncType) -> Function {
    let lowered = cx.lower_functype(ft);
    let sig = Signature {
        // exec_ctx*, raw_func (callee pointer), raw_args*, raw_rets*
        params: vec![Type::Pointer, Type::Pointer, Type::Pointer, Type::Pointer],
        returns: vec![],
    };
    let mut func = Function::with_name_signature(wrapper_name(index), sig);
    let mut fbc = FunctionBuilderContext::new();
    let mut builder = FunctionBuilder::new(&mut func, &mut fbc);
    let entry = builder.create_block();
    let exec_ctx = builder.append_block_param(entry, Type::Pointer);
    let raw_func = builder.append_block_param(entry, Type::Pointer);
    let raw_args = builder.append_block_param(entry, Type::Pointer);
    let raw_rets = builder.append_block_param(entry, Type::Pointer);
    builder.switch_to_block(entry);

    let mut args = vec![exec_ctx];
    for (i, &native_ty) in lowered.params.iter().skip(1).enumerate() {
        let offset = (i as i64) * VALUE_SLOT_SIZE as i64;
        let v = builder.ins().load(native_ty, MemFlags::new(), raw_args, offset);
        args.push(v);
    }

    // The real callee is reached indirectly through `raw_func`, so this
    // is encoded as an intrinsic-style indirect call rather than
    // `ins().call`, which assumes a module-local `FuncRef` (§4.3 "wrapper
    // dispatches through a raw function pointer, not a module call").
    let sig_ref = builder.import_signature(FuncType::new(
        ft.params.clone(),
        ft.results.clone(),
    ));
    let results = builder.ins().call_indirect(sig_ref, raw_func, &args, &lowered.returns);

    for (i, &v) in results.iter().enumerate() {
        let offset = (i as i64) * VALUE_SLOT_SIZE as i64;
        builder.ins().store(MemFlags::new(), v, raw_rets, offset);
    }
    builder.ins().return_(&[]);
    builder.seal_block(entry);
    func.set_entry_block(entry);
    func
}

/// Builds the `fN` import trampoline (§4.3, §4.6 `kCall`): the compiled
/// body of a module import, whose only job is to marshal arguments into
/// the uniform value-slot buffer and invoke the host function through the
/// `kCall` intrinsic, then unpack the result back into native registers.
pub fn build_import_trampoline(cx: &CompilationContext, index: u32, ft: &FuncType, import_index: u32) -> Function {
    let lowered = cx.lower_functype(ft);
    let sig = Signature { params: lowered.params.clone(), returns: lowered.returns.clone() };
    let mut func = Function::with_name_signature(trampoline_name(index), sig);
    let mut fbc = FunctionBuilderContext::new();
    let mut builder = FunctionBuilder::new(&mut func, &mut fbc);
    let entry = builder.create_block();
    let mut native_params = Vec::with_capacity(lowered.params.len());
    for &ty in &lowered.params {
        native_params.push(builder.append_block_param(entry, ty));
    }
    builder.switch_to_block(entry);

    // The hidden ExecCtx* is dropped here: only the Wasm-visible arguments
    // are forwarded to the host through `kCall` (§4.6); the host side
    // resolves `import_id` back to the module/name pair it was registered
    // under at link time.
    let import_id = builder.ins().iconst(Type::I32, import_index as i64);
    let mut call_args = vec![import_id];
    call_args.extend(native_params.iter().skip(1).copied());
    let results = builder.ins().intrinsic_call(
        crate::translator::Intrinsic::Call as u32,
        &call_args,
        &lowered.returns,
    );
    builder.ins().return_(&results);
    builder.seal_block(entry);
    func.set_entry_block(entry);
    func
}

#[cfg(test)]
mod tests {
    use super::*;
    use aotc_types::ValType;

    #[test]
    fn structurally_identical_types_share_one_wrapper_slot() {
        let a = FuncType::new(vec![ValType::I32], vec![ValType::I32]);
        let b = FuncType::new(vec![ValType::I32], vec![ValType::I32]);
        let c = FuncType::new(vec![ValType::I64], vec![]);
        let plan = WrapperPlan::build(&[a, b, c]);
        assert_eq!(plan.distinct_types.len(), 2);
        assert_eq!(plan.wrapper_for(0), plan.wrapper_for(1));
        assert_ne!(plan.wrapper_for(0), plan.wrapper_for(2));
    }

    #[test]
    fn wrapper_and_trampoline_names_follow_the_tn_fn_convention() {
        assert_eq!(wrapper_name(3), "t3");
        assert_eq!(trampoline_name(7), "f7");
    }
}

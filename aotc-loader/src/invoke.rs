//! Calling through a resolved `tN` wrapper (§6.4): regardless of the
//! wasm function's own arity or value types, every wrapper shares the
//! signature `fn(*mut ExecCtx, raw_func, raw_args, raw_rets)`, so the
//! loader never needs per-arity trampolines of its own.

use aotc_runtime::ExecCtx;

type WrapperFn = unsafe extern "C" fn(*mut ExecCtx, *const (), *mut u8, *mut u8);

/// Invokes a resolved wrapper address. `raw_args`/`raw_rets` point at
/// the caller's packed argument/return buffers, laid out per §6.3/§6.4;
/// `raw_func` is the paired `fN` address the wrapper itself unpacks
/// into and calls.
///
/// # Safety
/// `wrapper` must be a `tN` symbol resolved from a [`crate::LoadedModule`]
/// whose `intrinsics` pointer has already been fixed up, `raw_func` must
/// be the matching `fN` address from the same module, and `raw_args`/
/// `raw_rets` must point at buffers sized for that function's signature.
pub unsafe fn call_wrapper(wrapper: *const (), exec_ctx: *mut ExecCtx, raw_func: *const (), raw_args: *mut u8, raw_rets: *mut u8) {
    let f: WrapperFn = std::mem::transmute(wrapper);
    f(exec_ctx, raw_func, raw_args, raw_rets)
}

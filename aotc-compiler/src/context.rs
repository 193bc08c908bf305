//! The Compilation Context (§4.1): owns canonical types, pre-allocated
//! attributes, the function table, and the handful of module-wide symbols
//! (`version`, `intrinsics`, the shared `trap` function) every compiled
//! function refers to.

use std::sync::Mutex;

use aotc_ir::{Function, GlobalValueData, Signature, Type};
use aotc_types::{BlockSignature, FuncType, TypeIndex, ValType, BINARY_VERSION};

use crate::config::{CompilerConfig, CpuFeatures};
use crate::error::{CompilerError, CompilerResult};
use crate::func_table::FunctionTable;

/// Attributes attached to generated functions, pre-allocated once per
/// context the way §4.1 describes ("pre-allocated attributes (`cold`,
/// `noreturn`, `readonly`, `strictfp`, `noalias`, `no-stack-arg-probe`)").
/// Kept as a bitflags-free plain struct since they gate independent,
/// freely-combinable properties of a single function declaration rather
/// than a value set.
#[derive(Debug, Clone, Copy, Default)]
pub struct FnAttributes {
    pub cold: bool,
    pub noreturn: bool,
    pub noinline: bool,
    pub readonly: bool,
    pub strictfp: bool,
    pub noalias: bool,
    pub no_stack_arg_probe: bool,
}

impl FnAttributes {
    /// Attributes for the shared internal `trap(i32)` function (§4.1: "an
    /// internal `trap(i32)` function attributed `cold|noreturn|noinline`").
    pub fn trap_function() -> Self {
        FnAttributes {
            cold: true,
            noreturn: true,
            noinline: true,
            ..Default::default()
        }
    }

    /// Attributes for an intrinsic call site (§4.1: "a call-site attributed
    /// as `strictfp`").
    pub fn intrinsic_call_site() -> Self {
        FnAttributes {
            strictfp: true,
            ..Default::default()
        }
    }
}

/// Lowered function type: native parameter/return types with the hidden
/// `ExecCtx*` prepended to the parameter list (§4.1 type lowering).
#[derive(Debug, Clone)]
pub struct LoweredFuncType {
    pub params: Vec<Type>,
    pub returns: Vec<Type>,
}

pub enum ReturnConvention {
    Void,
    Scalar(Type),
    Aggregate(Vec<Type>),
}

impl LoweredFuncType {
    pub fn return_convention(&self) -> ReturnConvention {
        match self.returns.as_slice() {
            [] => ReturnConvention::Void,
            [single] => ReturnConvention::Scalar(*single),
            many => ReturnConvention::Aggregate(many.to_vec()),
        }
    }
}

/// ExecCtx field indices, matching the declaration order of §3.2. Exposed
/// here so the translator can request a load for "the field at this
/// index" without re-deriving the layout at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExecCtxField {
    Memories = 0,
    Globals = 1,
    InstrCount = 2,
    CostTable = 3,
    Gas = 4,
    GasLimit = 5,
    StopToken = 6,
}

pub struct CompilationContext {
    pub config: CompilerConfig,
    pub cpu_features: CpuFeatures,
    pub function_table: FunctionTable,
    pub types: Vec<FuncType>,
    pub attributes: FnAttributes,
    /// Guards access to the code generator the way the spec calls for
    /// (§5: "guarded by a mutex on the shared Compiler object to serialise
    /// access to the code generator"). Compiled `Function`s accumulate
    /// here as each body finishes translation.
    functions: Mutex<Vec<Function>>,
    pub version_symbol: [u8; 4],
}

impl CompilationContext {
    pub fn new(config: CompilerConfig, types: Vec<FuncType>) -> Self {
        let cpu_features = CpuFeatures::detect(&config.target_cpu);
        CompilationContext {
            config,
            cpu_features,
            function_table: FunctionTable::new(),
            types,
            attributes: FnAttributes::default(),
            functions: Mutex::new(Vec::new()),
            version_symbol: BINARY_VERSION,
        }
    }

    pub fn lower_valtype(&self, vt: ValType) -> Type {
        Type::lower_valtype(vt)
    }

    /// `lower(functype) -> (ret, args with ExecCtx* first)` (§4.1).
    pub fn lower_functype(&self, ft: &FuncType) -> LoweredFuncType {
        let mut params = vec![Type::Pointer];
        params.extend(ft.params.iter().map(|&vt| self.lower_valtype(vt)));
        let returns = ft.results.iter().map(|&vt| self.lower_valtype(vt)).collect();
        LoweredFuncType { params, returns }
    }

    pub fn resolve_func_type(&self, idx: TypeIndex) -> CompilerResult<&FuncType> {
        self.types
            .get(aotc_types::EntityRef::index(idx))
            .ok_or(CompilerError::UnknownType(idx))
    }

    /// Resolves a block's type annotation to `(params, results)` (§4.1
    /// block-type resolver).
    pub fn resolve_block_type(&self, sig: &BlockSignature) -> (Vec<ValType>, Vec<ValType>) {
        (sig.params(), sig.results())
    }

    /// Declares the `ExecCtx*` global a function needs the first time it
    /// is referenced. Every field access is a typed load off this same
    /// pointer at `field`'s offset, so the global itself doesn't vary by
    /// field; `field` is accepted so call sites read naturally (`exec_ctx_global(b, ExecCtxField::Gas)`)
    /// even though today they all resolve to the same underlying pointer.
    pub fn exec_ctx_global(
        &self,
        builder: &mut aotc_ir::FunctionBuilder,
        _field: ExecCtxField,
    ) -> aotc_ir::GlobalValue {
        builder.create_global_value(GlobalValueData::ExecCtxPtr)
    }

    pub fn push_function(&self, f: Function) {
        self.functions.lock().expect("compiler mutex poisoned").push(f);
    }

    pub fn take_functions(&self) -> Vec<Function> {
        std::mem::take(&mut self.functions.lock().expect("compiler mutex poisoned"))
    }

    pub fn make_entry_signature(&self, ft: &FuncType) -> Signature {
        let lowered = self.lower_functype(ft);
        Signature {
            params: lowered.params,
            returns: lowered.returns,
        }
    }
}

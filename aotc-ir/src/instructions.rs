//! Instruction opcodes and their operand shapes.
//!
//! This is deliberately a much smaller surface than cranelift-codegen's
//! `InstructionData`/`Opcode` pair (which is generated from a meta
//! description of every ISA-independent Cranelift instruction): it only
//! contains the primitives the Wasm lowering in `aotc-compiler` actually
//! emits, grouped the same way §4.2.2 groups them (numeric, comparison,
//! conversion, memory, atomic, vector, control, call).

use crate::condcodes::{FloatCC, IntCC};
use crate::entities::{Block, FuncRef, GlobalValue, JumpTable, SigRef, StackSlot, Value};
use crate::types::Type;
use aotc_types::TrapCode;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Numeric, binary
    Iadd,
    Isub,
    Imul,
    Sdiv,
    Udiv,
    Srem,
    Urem,
    Band,
    Bor,
    Bxor,
    Ishl,
    Ushr,
    Sshr,
    Rotl,
    Rotr,
    Fadd,
    Fsub,
    Fmul,
    Fdiv,
    Fmin,
    Fmax,
    Fcopysign,
    // Numeric, unary
    Clz,
    Ctz,
    Popcnt,
    Fneg,
    Fabs,
    Sqrt,
    Ceil,
    Floor,
    Trunc,
    Nearest,
    Bnot,
    // Conversions
    Sextend,
    Uextend,
    Ireduce,
    Fpromote,
    Fdemote,
    FcvtToSint,
    FcvtToUint,
    FcvtToSintSat,
    FcvtToUintSat,
    FcvtFromSint,
    FcvtFromUint,
    Bitcast,
    // Constants
    Iconst,
    Fconst,
    Vconst,
    // Comparisons (produce an i32 0/1)
    Icmp(IntCC),
    Fcmp(FloatCC),
    // Control
    Select,
    Jump,
    Brif,
    BrTable,
    Return,
    Trap,
    Unreachable,
    // Memory
    Load,
    Store,
    StackLoad,
    StackStore,
    HeapAddr,
    // Atomics
    AtomicLoad,
    AtomicStore,
    AtomicRmw(AtomicRmwOp),
    AtomicCas,
    AtomicFence,
    // Calls
    Call,
    CallIndirect,
    /// Calls through the intrinsics table (§4.6) rather than the module's
    /// own function table.
    IntrinsicCall,
    /// Loads a pointer out of the intrinsics table (§4.1 "intrinsic call
    /// builder ... emits a load through the `intrinsics` table").
    IntrinsicLoad,
    /// A field of `ExecCtx` (§3.2), materialised as a load off the hidden
    /// context pointer.
    ExecCtxField,
    /// The address of a field of `ExecCtx`, for atomic RMW/CAS against
    /// `gas`/`stop_token` rather than a plain load (§4.2.1, §4.2.4).
    ExecCtxFieldAddr,
    // SIMD lane ops, represented generically; `VecOp` distinguishes them.
    VectorOp(VecOp),
}

/// Read-modify-write atomic operation kinds (§4.2.3 atomics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicRmwOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Xchg,
}

/// SIMD lane/vector operations that don't fit the generic binary/unary
/// shape (§4.2.2 "SIMD swizzle, q15mul-sat, avgr, ext-add-pairwise, popcnt,
/// abs, bitmask, narrow").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VecOp {
    Splat,
    ExtractLaneS,
    ExtractLaneU,
    ReplaceLane,
    Shuffle,
    Swizzle,
    AnyTrue,
    AllTrue,
    Bitmask,
    Neg,
    Abs,
    AddSatS,
    AddSatU,
    SubSatS,
    SubSatU,
    AvgrU,
    Q15mulrSatS,
    ExtAddPairwiseS,
    ExtAddPairwiseU,
    Narrow,
    MinS,
    MinU,
    MaxS,
    MaxU,
}

/// Per-access memory flags (§4.2.3: "alignment hard-coded to 1").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemFlags {
    /// When set, the access is elided from bounds-checking because the
    /// compiler otherwise proved it is safe (never set by Wasm lowering;
    /// reserved for future trusted accesses such as ExecCtx field reads).
    pub trusted: bool,
}

impl MemFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trusted() -> Self {
        Self { trusted: true }
    }
}

/// Immediate/operand payload for one instruction. Analogous to
/// cranelift-codegen's `ir::InstructionData`, but collapsed to exactly the
/// shapes the Wasm translator needs.
#[derive(Debug, Clone)]
pub enum InstData {
    Nullary {
        opcode: Opcode,
    },
    Unary {
        opcode: Opcode,
        arg: Value,
    },
    UnaryImm {
        opcode: Opcode,
        imm: i64,
    },
    UnaryIeee32 {
        opcode: Opcode,
        bits: u32,
    },
    UnaryIeee64 {
        opcode: Opcode,
        bits: u64,
    },
    UnaryConst128 {
        opcode: Opcode,
        bytes: [u8; 16],
    },
    Binary {
        opcode: Opcode,
        args: [Value; 2],
    },
    Ternary {
        opcode: Opcode,
        args: [Value; 3],
    },
    IntCompare {
        cc: IntCC,
        args: [Value; 2],
    },
    FloatCompare {
        cc: FloatCC,
        args: [Value; 2],
    },
    Load {
        flags: MemFlags,
        offset: i64,
        ty: Type,
        arg: Value,
    },
    Store {
        flags: MemFlags,
        offset: i64,
        args: [Value; 2],
    },
    StackLoad {
        slot: StackSlot,
        ty: Type,
    },
    StackStore {
        slot: StackSlot,
        arg: Value,
    },
    HeapAddr {
        memory_base: GlobalValue,
        index: Value,
        offset: u32,
        access_size: u32,
    },
    ExecCtxField {
        field: u32,
        ty: Type,
    },
    ExecCtxFieldAddr {
        field: u32,
    },
    AtomicRmw {
        op: AtomicRmwOp,
        flags: MemFlags,
        args: [Value; 2],
    },
    AtomicCas {
        flags: MemFlags,
        args: [Value; 3],
    },
    Jump {
        destination: Block,
        args: SmallVec<[Value; 4]>,
    },
    Brif {
        arg: Value,
        then_block: Block,
        then_args: SmallVec<[Value; 4]>,
        else_block: Block,
        else_args: SmallVec<[Value; 4]>,
    },
    BranchTable {
        arg: Value,
        table: JumpTable,
        default: Block,
    },
    Return {
        args: SmallVec<[Value; 4]>,
    },
    Trap {
        code: TrapCode,
    },
    Call {
        func_ref: FuncRef,
        args: SmallVec<[Value; 8]>,
    },
    CallIndirect {
        sig_ref: SigRef,
        callee: Value,
        args: SmallVec<[Value; 8]>,
    },
    IntrinsicCall {
        intrinsic: u32,
        args: SmallVec<[Value; 8]>,
    },
    IntrinsicLoad {
        intrinsic: u32,
    },
    VectorOp {
        op: VecOp,
        args: SmallVec<[Value; 2]>,
        imm: Option<i64>,
    },
}

impl InstData {
    pub fn opcode(&self) -> Opcode {
        match self {
            InstData::Nullary { opcode } => *opcode,
            InstData::Unary { opcode, .. } => *opcode,
            InstData::UnaryImm { opcode, .. } => *opcode,
            InstData::UnaryIeee32 { opcode, .. } => *opcode,
            InstData::UnaryIeee64 { opcode, .. } => *opcode,
            InstData::UnaryConst128 { opcode, .. } => *opcode,
            InstData::Binary { opcode, .. } => *opcode,
            InstData::Ternary { opcode, .. } => *opcode,
            InstData::IntCompare { cc, .. } => Opcode::Icmp(*cc),
            InstData::FloatCompare { cc, .. } => Opcode::Fcmp(*cc),
            InstData::Load { .. } => Opcode::Load,
            InstData::Store { .. } => Opcode::Store,
            InstData::StackLoad { .. } => Opcode::StackLoad,
            InstData::StackStore { .. } => Opcode::StackStore,
            InstData::HeapAddr { .. } => Opcode::HeapAddr,
            InstData::ExecCtxField { .. } => Opcode::ExecCtxField,
            InstData::ExecCtxFieldAddr { .. } => Opcode::ExecCtxFieldAddr,
            InstData::AtomicRmw { op, .. } => Opcode::AtomicRmw(*op),
            InstData::AtomicCas { .. } => Opcode::AtomicCas,
            InstData::Jump { .. } => Opcode::Jump,
            InstData::Brif { .. } => Opcode::Brif,
            InstData::BranchTable { .. } => Opcode::BrTable,
            InstData::Return { .. } => Opcode::Return,
            InstData::Trap { .. } => Opcode::Trap,
            InstData::Call { .. } => Opcode::Call,
            InstData::CallIndirect { .. } => Opcode::CallIndirect,
            InstData::IntrinsicCall { .. } => Opcode::IntrinsicCall,
            InstData::IntrinsicLoad { .. } => Opcode::IntrinsicLoad,
            InstData::VectorOp { op, .. } => Opcode::VectorOp(*op),
        }
    }

    /// Whether this instruction ends a basic block (no fallthrough
    /// successor). Mirrors cranelift's `Opcode::is_terminator`.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstData::Jump { .. }
                | InstData::Brif { .. }
                | InstData::BranchTable { .. }
                | InstData::Return { .. }
                | InstData::Trap { .. }
        )
    }

    /// The successor blocks this instruction can transfer control to.
    pub fn branch_destinations(&self) -> SmallVec<[Block; 2]> {
        match self {
            InstData::Jump { destination, .. } => smallvec::smallvec![*destination],
            InstData::Brif {
                then_block,
                else_block,
                ..
            } => smallvec::smallvec![*then_block, *else_block],
            InstData::BranchTable { default, .. } => smallvec::smallvec![*default],
            _ => SmallVec::new(),
        }
    }
}

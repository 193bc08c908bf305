use aotc_types::TypeIndex;
use thiserror::Error;

/// Errors the translator can raise while lowering one function body.
///
/// These are all *compiler* failures — malformed module structure the
/// upstream validator should already have rejected, or constructs this
/// compiler deliberately declines to lower. They are distinct from
/// [`aotc_types::TrapCode`], which describes failures compiled code itself
/// can raise at run time.
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("wasm operator {0} is not supported by this compiler")]
    UnsupportedOperator(String),

    #[error("block type references type index {0:?}, which is not declared in this module")]
    UnknownType(TypeIndex),

    #[error("function index {0} has no declared signature")]
    UnknownFunction(u32),

    #[error("operand stack underflow while lowering `{op}` (needed {needed}, had {had})")]
    OperandStackUnderflow {
        op: &'static str,
        needed: usize,
        had: usize,
    },

    #[error("control stack underflow: `end`/`else` with no matching `block`/`loop`/`if`")]
    ControlStackUnderflow,

    #[error("`else` without a matching `if`")]
    ElseWithoutIf,

    #[error("branch target depth {0} exceeds the active control stack")]
    InvalidBranchDepth(u32),

    #[error("failed to parse the wasm operator stream: {0}")]
    Parse(#[from] wasmparser::BinaryReaderError),

    #[error("invalid function body: {0}")]
    Malformed(String),
}

pub type CompilerResult<T> = Result<T, CompilerError>;

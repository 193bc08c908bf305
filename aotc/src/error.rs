use thiserror::Error;

/// Aggregates every crate-boundary error this driver touches (§10.2: "the
/// top-level driver crate aggregates them behind `anyhow::Error` for CLI
/// reporting"). Library callers match on this; the `aotc` binary itself
/// widens it to [`anyhow::Error`] at its own boundary.
#[derive(Debug, Error)]
pub enum AotcError {
    #[error("failed to parse the wasm module: {0}")]
    Parse(#[from] wasmparser::BinaryReaderError),

    #[error(transparent)]
    Compile(#[from] aotc_compiler::CompilerError),

    #[error(transparent)]
    Object(#[from] aotc_object::ObjectError),

    #[error(transparent)]
    Loader(#[from] aotc_loader::LoaderError),

    #[error("module declares {declared} functions but only {defined} bodies were found")]
    FunctionCountMismatch { declared: usize, defined: usize },

    #[error("a call_indirect/ref.func target references undeclared function index {0}")]
    UnknownFunction(u32),
}

pub type AotcResult<T> = Result<T, AotcError>;

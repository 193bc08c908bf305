use thiserror::Error;

/// Errors the packager can raise (§7: `IllegalPath` covers I/O and linker
/// failures; everything else here is a packaging-specific refinement of
/// that same bucket).
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("unsupported target triple: {0}")]
    UnsupportedTarget(String),

    #[error("failed to write the native object: {0}")]
    Write(#[from] object::write::Error),

    #[error("failed to invoke the linker driver")]
    Linker(#[source] std::io::Error),

    #[error("linker exited with failure status {0:?}")]
    LinkFailed(Option<i32>),

    #[error("codesign failed on the linked dylib")]
    CodesignFailed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed universal-binary custom section: {0}")]
    MalformedUniversalSection(String),

    #[error("no \"{0}\" custom section found in the wasm bytes")]
    MissingUniversalSection(&'static str),

    #[error("failed to parse wasm bytes while scanning for the universal section: {0}")]
    Parse(#[from] wasmparser::BinaryReaderError),

    #[error("failed to read back the linked object's symbol table: {0}")]
    Read(String),
}

pub type ObjectResult<T> = Result<T, ObjectError>;

use aotc_types::BINARY_VERSION;
use thiserror::Error;

/// Errors the loader can raise while resolving a packaged artifact's
/// symbols (§7: `IllegalPath` covers these; split out here the way the
/// other crates split their own corner of that same bucket).
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to open the shared object")]
    Dlopen(#[source] libloading::Error),

    #[error("missing symbol `{0}`")]
    MissingSymbol(String, #[source] libloading::Error),

    #[error("artifact binary version mismatch: found {found:?}, expected {expected:?}")]
    VersionMismatch { found: [u8; 4], expected: [u8; 4] },

    #[error(transparent)]
    Universal(#[from] aotc_object::ObjectError),

    #[error("universal binary carries no mappable sections")]
    EmptyUniversalImage,

    #[error("failed to map universal binary image")]
    Mmap(#[source] std::io::Error),
}

impl LoaderError {
    pub fn version_mismatch(found: [u8; 4]) -> Self {
        LoaderError::VersionMismatch { found, expected: BINARY_VERSION }
    }
}

pub type LoaderResult<T> = Result<T, LoaderError>;

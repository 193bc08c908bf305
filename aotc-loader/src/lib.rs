//! Executable Loader (§4.5): resolves a packaged artifact's symbols
//! into callable entry points, either by `dlopen`-ing a standalone
//! shared object or a universal-binary wasm module, or by looking
//! addresses up directly from an in-process JIT.

pub mod dylib;
pub mod error;
pub mod invoke;
pub mod jit;
pub mod universal;

pub use dylib::{load_standalone, LoadedModule, ModuleLayout};
pub use error::{LoaderError, LoaderResult};
pub use invoke::call_wrapper;
pub use jit::JitModule;
pub use universal::{load_universal, UniversalModule};

//! Drives the whole pipeline end to end: parses and compiles a wasm
//! module (`aotc-compiler`), packages the result into a native object or
//! universal binary (`aotc-object`), and resolves a packaged artifact's
//! symbols back into callables (`aotc-loader`).
//!
//! Mirrors the umbrella `wasmtime-cli` crate's own split: a thin library
//! surface the binary in `src/bin/aotc.rs` wires up with `clap`.

pub mod backend;
pub mod error;
pub mod module;
pub mod package;

pub use aotc_compiler::{CompilerConfig, OptLevel, TargetCpu};
pub use backend::{CodeBackend, StubBackend};
pub use error::{AotcError, AotcResult};
pub use module::{compile_module, CompiledModule};
pub use package::{package_module, PackageOutput};

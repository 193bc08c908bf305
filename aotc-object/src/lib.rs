//! Executable Packager (§4.4): turns compiled function bodies into a
//! native object, links it into a platform shared object, and optionally
//! re-embeds the result as a custom section of the original wasm bytes
//! for the universal-binary format (§3.5, §6.2).

pub mod addresses;
pub mod codegen;
pub mod error;
pub mod linker;
pub mod sections;
pub mod universal;

pub use addresses::resolve_symbol_addresses;
pub use codegen::{emit_object, CompiledSymbol, ObjectArtifact};
pub use error::{ObjectError, ObjectResult};
pub use linker::link_shared_object;
pub use sections::copy_sections;
pub use universal::{embed_in_wasm, extract_from_wasm, CopiedSection, UniversalSection};

//! Standalone loader: opens a packaged shared object directly with
//! `libloading`, resolves its `version`/`intrinsics`/`tN`/`fN` symbols,
//! and fixes up the intrinsics pointer to a process-local table (§4.5).

use std::path::Path;

use aotc_runtime::IntrinsicTable;
use aotc_types::BINARY_VERSION;

use crate::error::{LoaderError, LoaderResult};

/// How many wrapper (`tN`) and function (`fN`) symbols a packaged
/// artifact carries, read back out of the universal section's address
/// tables or tracked by the caller when loading a bare object.
#[derive(Debug, Clone, Copy)]
pub struct ModuleLayout {
    pub wrapper_count: usize,
    pub function_count: usize,
}

/// A loaded standalone shared object. Its `tN`/`fN` symbols are resolved
/// to raw addresses; the caller invokes them through [`crate::invoke`]
/// rather than calling them directly, since only the `tN` wrappers share
/// a calling convention uniform across every wasm function signature.
pub struct LoadedModule {
    _lib: libloading::Library,
    pub version: [u8; 4],
    wrappers: Vec<*const ()>,
    functions: Vec<*const ()>,
}

// The raw pointers only ever address the mapped, read-only-after-load
// code and data sections of `_lib`; they're as shareable as the library
// itself.
unsafe impl Send for LoadedModule {}
unsafe impl Sync for LoadedModule {}

impl LoadedModule {
    pub fn wrapper(&self, index: u32) -> Option<*const ()> {
        self.wrappers.get(index as usize).copied()
    }

    pub fn function(&self, index: u32) -> Option<*const ()> {
        self.functions.get(index as usize).copied()
    }
}

/// Loads `path`, checks its `version` symbol, installs `table` as its
/// intrinsics pointer, and resolves `layout.wrapper_count` `tN` symbols
/// plus `layout.function_count` `fN` symbols.
pub fn load_standalone(path: &Path, layout: &ModuleLayout, table: &IntrinsicTable) -> LoaderResult<LoadedModule> {
    tracing::info!(path = %path.display(), "loading standalone artifact");
    let lib = unsafe { libloading::Library::new(path) }.map_err(LoaderError::Dlopen)?;

    let version: [u8; 4] = unsafe { read_data_symbol(&lib, b"version\0")? };
    if version != BINARY_VERSION {
        return Err(LoaderError::version_mismatch(version));
    }

    unsafe {
        write_data_symbol::<usize>(&lib, b"intrinsics\0", table as *const IntrinsicTable as usize)?;
    }
    tracing::debug!("intrinsics pointer fixed up");

    let wrappers = (0..layout.wrapper_count)
        .map(|i| unsafe { read_function_symbol(&lib, format!("t{i}\0").as_bytes()) })
        .collect::<LoaderResult<Vec<_>>>()?;
    let functions = (0..layout.function_count)
        .map(|i| unsafe { read_function_symbol(&lib, format!("f{i}\0").as_bytes()) })
        .collect::<LoaderResult<Vec<_>>>()?;

    Ok(LoadedModule { _lib: lib, version, wrappers, functions })
}

unsafe fn read_data_symbol<T: Copy>(lib: &libloading::Library, name: &[u8]) -> LoaderResult<T> {
    let symbol: libloading::Symbol<T> = lib.get(name).map_err(|e| LoaderError::MissingSymbol(symbol_name(name), e))?;
    Ok(*symbol)
}

unsafe fn write_data_symbol<T>(lib: &libloading::Library, name: &[u8], value: T) -> LoaderResult<()> {
    let symbol: libloading::Symbol<T> = lib.get(name).map_err(|e| LoaderError::MissingSymbol(symbol_name(name), e))?;
    let slot = &*symbol as *const T as *mut T;
    *slot = value;
    Ok(())
}

unsafe fn read_function_symbol(lib: &libloading::Library, name: &[u8]) -> LoaderResult<*const ()> {
    type RawFn = unsafe extern "C" fn();
    let symbol: libloading::Symbol<RawFn> =
        lib.get(name).map_err(|e| LoaderError::MissingSymbol(symbol_name(name), e))?;
    Ok(*symbol as usize as *const ())
}

fn symbol_name(name: &[u8]) -> String {
    String::from_utf8_lossy(&name[..name.len().saturating_sub(1)]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_dlopen_error() {
        let table = IntrinsicTable::empty();
        let layout = ModuleLayout { wrapper_count: 0, function_count: 0 };
        let err = load_standalone(Path::new("/nonexistent/does-not-exist.so"), &layout, &table).unwrap_err();
        assert!(matches!(err, LoaderError::Dlopen(_)));
    }
}

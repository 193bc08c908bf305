//! Executable Packager driver (§4.4): builds every `tN` wrapper and `fN`
//! function symbol for a compiled module, asks the plugged-in
//! [`CodeBackend`] to encode each one, emits a native object, links it
//! into a platform shared object, and — unless the config asks for a
//! standalone object — re-embeds the result as the module's own
//! universal-binary custom section (§3.5, §6.2).

use std::path::{Path, PathBuf};

use aotc_compiler::{build_entry_wrapper, build_import_trampoline, Callee, CompilationContext, CompilerConfig, WrapperPlan};
use aotc_object::{copy_sections, embed_in_wasm, emit_object, link_shared_object, resolve_symbol_addresses, CompiledSymbol, UniversalSection};
use aotc_types::{CpuTag, EntityRef, OsTag};

use crate::backend::CodeBackend;
use crate::error::AotcResult;
use crate::module::CompiledModule;

pub struct PackageOutput {
    /// Path to the linked platform shared object (`.so`/`.dylib`/`.dll`).
    pub shared_object_path: PathBuf,
    /// Present unless `config.standalone_object` is set: the original
    /// wasm bytes with the universal section appended.
    pub universal_wasm: Option<Vec<u8>>,
}

pub fn package_module(
    compiled: &CompiledModule,
    original_wasm: &[u8],
    backend: &dyn CodeBackend,
    config: &CompilerConfig,
    output_dir: &Path,
) -> AotcResult<PackageOutput> {
    let cx = CompilationContext::new(config.clone(), compiled.types.clone());
    let wrapper_plan = WrapperPlan::build(&compiled.types);

    let mut wrapper_symbols = Vec::with_capacity(wrapper_plan.distinct_types.len());
    for (i, ft) in wrapper_plan.distinct_types.iter().enumerate() {
        let wrapper_fn = build_entry_wrapper(&cx, i as u32, ft);
        wrapper_symbols.push(CompiledSymbol { name: wrapper_fn.name.clone(), bytes: backend.encode(&wrapper_fn) });
    }

    let mut fn_symbols = Vec::with_capacity(cx.function_table.len());
    let mut defined_idx = 0usize;
    for (i, entry) in cx.function_table.iter().enumerate() {
        let ft = &compiled.types[entry.type_index.index()];
        match &entry.callee {
            Callee::Imported { .. } => {
                let trampoline = build_import_trampoline(&cx, i as u32, ft, i as u32);
                fn_symbols.push(CompiledSymbol { name: trampoline.name.clone(), bytes: backend.encode(&trampoline) });
            }
            Callee::Defined { .. } => {
                let func = &compiled.functions[defined_idx];
                defined_idx += 1;
                fn_symbols.push(CompiledSymbol { name: func.name.clone(), bytes: backend.encode(func) });
            }
        }
    }

    let mut all_symbols = wrapper_symbols.clone();
    all_symbols.extend(fn_symbols.iter().cloned());

    let triple = target_lexicon::Triple::host();
    let artifact = emit_object(&triple, cx.version_symbol, &all_symbols)?;

    std::fs::create_dir_all(output_dir).map_err(aotc_object::ObjectError::Io)?;
    let object_path = output_dir.join("module.o");
    std::fs::write(&object_path, &artifact.bytes).map_err(aotc_object::ObjectError::Io)?;

    let shared_object_path = output_dir.join(shared_object_name());
    let os = OsTag::host();
    link_shared_object(&object_path, &shared_object_path, os)?;

    if config.standalone_object {
        return Ok(PackageOutput { shared_object_path, universal_wasm: None });
    }

    // Addresses and copied sections both have to come from the *linked*
    // shared object: the universal loader treats every address here as
    // an RVA into the sections copied below, and those two only agree
    // with each other once the linker has placed everything in its
    // final layout.
    let linked_bytes = std::fs::read(&shared_object_path).map_err(aotc_object::ObjectError::Io)?;
    let addresses = resolve_symbol_addresses(&linked_bytes)?;
    let type_addresses = wrapper_symbols.iter().map(|s| addresses.get(&s.name).copied().unwrap_or(0)).collect();
    let code_addresses = fn_symbols.iter().map(|s| addresses.get(&s.name).copied().unwrap_or(0)).collect();
    let sections = copy_sections(&linked_bytes)?;

    let section = UniversalSection {
        version: cx.version_symbol,
        os,
        cpu: CpuTag::host(),
        version_symbol_address: addresses.get("version").copied().unwrap_or(0),
        intrinsics_symbol_address: addresses.get("intrinsics").copied().unwrap_or(0),
        type_addresses,
        code_addresses,
        sections,
    };
    let universal_wasm = embed_in_wasm(original_wasm, &section);

    Ok(PackageOutput { shared_object_path, universal_wasm: Some(universal_wasm) })
}

#[cfg(target_os = "macos")]
fn shared_object_name() -> &'static str {
    "module.dylib"
}

#[cfg(target_os = "windows")]
fn shared_object_name() -> &'static str {
    "module.dll"
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn shared_object_name() -> &'static str {
    "module.so"
}

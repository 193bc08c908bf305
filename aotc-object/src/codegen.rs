//! Emits a compiled module's symbols into a native object (§4.4 "invokes
//! the code generator to emit an object into memory").
//!
//! Grounded in `cranelift-object`'s `ObjectModule`: a thin bookkeeping
//! layer over `object::write::Object` that appends each function's
//! machine code to `.text`, each data symbol to `.data`, and declares
//! externally-resolved symbols as undefined so the loader can fix them up.
//! Instruction selection and register allocation — turning `aotc-ir`
//! bodies into the bytes handed to `append_function` below — are an
//! external collaborator this crate never performs itself, the same way
//! `cranelift-object` never runs `cranelift-codegen`'s backends on its own
//! behalf.

use object::write::{Object, StandardSection, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};

use crate::error::{ObjectError, ObjectResult};

/// One already machine-code-encoded function body, ready to be appended to
/// the object's text section (§4.3 `tN`/`fN` symbols, §4.2 compiled
/// function bodies).
#[derive(Clone)]
pub struct CompiledSymbol {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The linked-in-memory native object, not yet passed through the
/// platform linker (§4.4).
pub struct ObjectArtifact {
    pub bytes: Vec<u8>,
}

/// Resolves a `target-lexicon` triple to the `(format, architecture,
/// endianness)` triple `object::write::Object::new` needs, rejecting
/// anything this compiler doesn't target (§4.1 CPU tags, §6.2 CPU tag
/// taxonomy: x86_64, aarch64, riscv64, armv7).
fn resolve_target(triple: &target_lexicon::Triple) -> ObjectResult<(BinaryFormat, Architecture, Endianness)> {
    use target_lexicon::{Architecture as TArch, OperatingSystem};

    let format = match triple.operating_system {
        OperatingSystem::Linux => BinaryFormat::Elf,
        OperatingSystem::Darwin => BinaryFormat::MachO,
        OperatingSystem::Windows => BinaryFormat::Coff,
        ref other => return Err(ObjectError::UnsupportedTarget(other.to_string())),
    };
    let arch = match triple.architecture {
        TArch::X86_64 => Architecture::X86_64,
        TArch::Aarch64(_) => Architecture::Aarch64,
        TArch::Riscv64(_) => Architecture::Riscv64,
        TArch::Arm(_) => Architecture::Arm,
        ref other => return Err(ObjectError::UnsupportedTarget(other.to_string())),
    };
    Ok((format, arch, Endianness::Little))
}

/// Builds the native object for one compiled module (§4.1 "creates the
/// global symbol `version`... the external `intrinsics` table pointer"):
/// every `tN`/`fN` symbol goes into `.text`, the `version` constant into
/// `.data`, and `intrinsics` is left undefined for the loader to resolve
/// against the process-wide table (§4.5, §4.6).
pub fn emit_object(
    triple: &target_lexicon::Triple,
    version_symbol: [u8; 4],
    functions: &[CompiledSymbol],
) -> ObjectResult<ObjectArtifact> {
    let (format, arch, endian) = resolve_target(triple)?;
    let mut obj = Object::new(format, arch, endian);

    let text = obj.section_id(StandardSection::Text);
    for sym in functions {
        let offset = obj.append_section_data(text, &sym.bytes, 16);
        obj.add_symbol(Symbol {
            name: sym.name.clone().into_bytes(),
            value: offset,
            size: sym.bytes.len() as u64,
            kind: SymbolKind::Text,
            scope: SymbolScope::Dynamic,
            weak: false,
            section: SymbolSection::Section(text),
            flags: SymbolFlags::None,
        });
    }

    let data = obj.section_id(StandardSection::Data);
    let version_offset = obj.append_section_data(data, &version_symbol, 4);
    obj.add_symbol(Symbol {
        name: b"version".to_vec(),
        value: version_offset,
        size: version_symbol.len() as u64,
        kind: SymbolKind::Data,
        scope: SymbolScope::Dynamic,
        weak: false,
        section: SymbolSection::Section(data),
        flags: SymbolFlags::None,
    });

    obj.add_symbol(Symbol {
        name: b"intrinsics".to_vec(),
        value: 0,
        size: 0,
        kind: SymbolKind::Data,
        scope: SymbolScope::Dynamic,
        weak: false,
        section: SymbolSection::Undefined,
        flags: SymbolFlags::None,
    });

    let bytes = obj.write()?;
    Ok(ObjectArtifact { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_x86_64_resolves_to_elf() {
        let triple: target_lexicon::Triple = "x86_64-unknown-linux-gnu".parse().unwrap();
        let (format, arch, _) = resolve_target(&triple).unwrap();
        assert_eq!(format, BinaryFormat::Elf);
        assert_eq!(arch, Architecture::X86_64);
    }

    #[test]
    fn unknown_os_is_rejected() {
        let triple: target_lexicon::Triple = "x86_64-unknown-none".parse().unwrap();
        assert!(resolve_target(&triple).is_err());
    }
}

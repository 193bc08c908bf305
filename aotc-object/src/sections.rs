//! Copies a linked object's own sections back out verbatim (§3.5 "one
//! entry per copied section (text / rdata / bss / pdata|eh_frame)"),
//! the other half of what [`crate::addresses`] does for symbols.

use object::{Object, ObjectSection};

use crate::error::{ObjectError, ObjectResult};
use crate::universal::CopiedSection;
use aotc_types::SectionKind;

/// Reads every loadable section out of `object_bytes` that the
/// universal-binary format tracks, skipping debug/symbol-table sections
/// that never need to be mapped at load time.
pub fn copy_sections(object_bytes: &[u8]) -> ObjectResult<Vec<CopiedSection>> {
    let file = object::read::File::parse(object_bytes).map_err(|e| ObjectError::Read(e.to_string()))?;
    let mut sections = Vec::new();
    for section in file.sections() {
        let Some(kind) = classify(section.kind()) else { continue };
        let bytes = section.uncompressed_data().map_err(|e| ObjectError::Read(e.to_string()))?;
        if bytes.is_empty() {
            continue;
        }
        sections.push(CopiedSection { kind, address: section.address(), bytes: bytes.into_owned() });
    }
    Ok(sections)
}

fn classify(kind: object::SectionKind) -> Option<SectionKind> {
    match kind {
        object::SectionKind::Text => Some(SectionKind::Text),
        object::SectionKind::Data | object::SectionKind::ReadOnlyData => Some(SectionKind::Data),
        object::SectionKind::UninitializedData => Some(SectionKind::Bss),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{emit_object, CompiledSymbol};

    #[test]
    fn copies_the_text_section_emitted_for_a_function() {
        let triple: target_lexicon::Triple = "x86_64-unknown-linux-gnu".parse().unwrap();
        let functions = vec![CompiledSymbol { name: "f0".into(), bytes: vec![0x0f, 0x0b] }];
        let artifact = emit_object(&triple, *b"AOT1", &functions).unwrap();
        let sections = copy_sections(&artifact.bytes).unwrap();
        assert!(sections.iter().any(|s| s.kind == SectionKind::Text));
    }
}

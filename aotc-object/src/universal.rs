//! The universal-binary format: embeds a linked native object as a custom
//! section of the original wasm bytes (§3.5, §6.2), and extracts it back
//! out at load time.
//!
//! The custom section's own fields are fixed-width little-endian, as
//! §6.2 specifies; only the section-length framing wasmtime's own
//! `wasmparser`/`wasm-encoder` pair uses around it follows the ordinary
//! wasm LEB128 convention, written here by hand since this crate only
//! ever needs to emit one section, not a general encoder.

use aotc_types::{CpuTag, OsTag, SectionKind, BINARY_VERSION, UNIVERSAL_SECTION_NAME};

use crate::error::{ObjectError, ObjectResult};

/// One native section copied verbatim into the universal binary (§3.5
/// "one entry per copied section (text / rdata / bss / pdata|eh_frame)").
#[derive(Debug, Clone)]
pub struct CopiedSection {
    pub kind: SectionKind,
    pub address: u64,
    pub bytes: Vec<u8>,
}

/// The fully decoded custom section (§6.2 steps 1-8).
#[derive(Debug, Clone)]
pub struct UniversalSection {
    pub version: [u8; 4],
    pub os: OsTag,
    pub cpu: CpuTag,
    pub version_symbol_address: u64,
    pub intrinsics_symbol_address: u64,
    pub type_addresses: Vec<u64>,
    pub code_addresses: Vec<u64>,
    pub sections: Vec<CopiedSection>,
}

impl UniversalSection {
    /// Encodes the fixed-width payload that goes inside the wasm custom
    /// section (§6.2 steps 1-8, all little-endian).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.version);
        buf.push(self.os as u8);
        buf.push(self.cpu as u8);
        buf.extend_from_slice(&self.version_symbol_address.to_le_bytes());
        buf.extend_from_slice(&self.intrinsics_symbol_address.to_le_bytes());

        buf.extend_from_slice(&(self.type_addresses.len() as u64).to_le_bytes());
        for addr in &self.type_addresses {
            buf.extend_from_slice(&addr.to_le_bytes());
        }

        buf.extend_from_slice(&(self.code_addresses.len() as u64).to_le_bytes());
        for addr in &self.code_addresses {
            buf.extend_from_slice(&addr.to_le_bytes());
        }

        buf.extend_from_slice(&(self.sections.len() as u32).to_le_bytes());
        for section in &self.sections {
            buf.push(section.kind as u8);
            buf.extend_from_slice(&section.address.to_le_bytes());
            buf.extend_from_slice(&(section.bytes.len() as u64).to_le_bytes());
            buf.extend_from_slice(&section.bytes);
        }
        buf
    }

    pub fn decode(bytes: &[u8]) -> ObjectResult<Self> {
        let mut r = Reader::new(bytes);
        let mut version = [0u8; 4];
        version.copy_from_slice(r.read_bytes(4)?);
        if version != BINARY_VERSION {
            return Err(ObjectError::MalformedUniversalSection(format!(
                "binary version mismatch: found {version:?}, expected {BINARY_VERSION:?}"
            )));
        }
        let os = OsTag::from_u8(r.read_u8()?)
            .ok_or_else(|| ObjectError::MalformedUniversalSection("unknown OS tag".into()))?;
        let cpu = CpuTag::from_u8(r.read_u8()?)
            .ok_or_else(|| ObjectError::MalformedUniversalSection("unknown CPU tag".into()))?;
        let version_symbol_address = r.read_u64()?;
        let intrinsics_symbol_address = r.read_u64()?;

        let type_count = r.read_u64()?;
        let mut type_addresses = Vec::with_capacity(type_count as usize);
        for _ in 0..type_count {
            type_addresses.push(r.read_u64()?);
        }

        let code_count = r.read_u64()?;
        let mut code_addresses = Vec::with_capacity(code_count as usize);
        for _ in 0..code_count {
            code_addresses.push(r.read_u64()?);
        }

        let section_count = r.read_u32()?;
        let mut sections = Vec::with_capacity(section_count as usize);
        for _ in 0..section_count {
            let kind = SectionKind::from_u8(r.read_u8()?)
                .ok_or_else(|| ObjectError::MalformedUniversalSection("unknown section kind".into()))?;
            let address = r.read_u64()?;
            let size = r.read_u64()?;
            let bytes = r.read_bytes(size as usize)?.to_vec();
            sections.push(CopiedSection { kind, address, bytes });
        }

        Ok(UniversalSection {
            version,
            os,
            cpu,
            version_symbol_address,
            intrinsics_symbol_address,
            type_addresses,
            code_addresses,
            sections,
        })
    }

    /// Rejects a universal binary produced for a different OS/CPU than the
    /// one currently running (§8 scenario 6: "fails to load... with an
    /// OS-/CPU-tag mismatch error and no code is executed").
    pub fn check_host_compatible(&self) -> ObjectResult<()> {
        let host_os = OsTag::host();
        let host_cpu = CpuTag::host();
        if self.os != host_os || self.cpu != host_cpu {
            return Err(ObjectError::MalformedUniversalSection(format!(
                "artifact built for {:?}/{:?}, host is {host_os:?}/{host_cpu:?}",
                self.os, self.cpu
            )));
        }
        Ok(())
    }
}

/// Appends the universal custom section to the end of `wasm_bytes` (§6.2,
/// §4.4 "re-opened as an object file... appended to the original Wasm
/// bytes").
pub fn embed_in_wasm(wasm_bytes: &[u8], section: &UniversalSection) -> Vec<u8> {
    let payload = section.encode();
    let name = UNIVERSAL_SECTION_NAME.as_bytes();

    let mut content = Vec::with_capacity(name.len() + payload.len() + 5);
    write_uleb128(&mut content, name.len() as u64);
    content.extend_from_slice(name);
    content.extend_from_slice(&payload);

    let mut out = Vec::with_capacity(wasm_bytes.len() + content.len() + 6);
    out.extend_from_slice(wasm_bytes);
    out.push(0); // custom section id
    write_uleb128(&mut out, content.len() as u64);
    out.extend_from_slice(&content);
    out
}

/// Scans `wasm_bytes` for the `"wasmedge"` custom section and decodes it
/// (§6.2). Returns [`ObjectError::MissingUniversalSection`] if the module
/// carries no such section, e.g. when it's a standalone object instead.
pub fn extract_from_wasm(wasm_bytes: &[u8]) -> ObjectResult<UniversalSection> {
    for payload in wasmparser::Parser::new(0).parse_all(wasm_bytes) {
        if let wasmparser::Payload::CustomSection(reader) = payload? {
            if reader.name() == UNIVERSAL_SECTION_NAME {
                return UniversalSection::decode(reader.data());
            }
        }
    }
    Err(ObjectError::MissingUniversalSection(UNIVERSAL_SECTION_NAME))
}

fn write_uleb128(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

/// A tiny cursor over a byte slice, just enough to decode §6.2's
/// fixed-width fields without pulling in a general binary-reader crate.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, n: usize) -> ObjectResult<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(ObjectError::MalformedUniversalSection(format!(
                "unexpected end of section at byte {}",
                self.pos
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> ObjectResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32(&mut self) -> ObjectResult<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes(b.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> ObjectResult<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UniversalSection {
        UniversalSection {
            version: BINARY_VERSION,
            os: OsTag::Linux,
            cpu: CpuTag::X86_64,
            version_symbol_address: 0x1000,
            intrinsics_symbol_address: 0x1010,
            type_addresses: vec![0x2000, 0x2010],
            code_addresses: vec![0x3000],
            sections: vec![CopiedSection {
                kind: SectionKind::Text,
                address: 0,
                bytes: vec![0x90, 0x90, 0xc3],
            }],
        }
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let section = sample();
        let decoded = UniversalSection::decode(&section.encode()).unwrap();
        assert_eq!(decoded.os, section.os);
        assert_eq!(decoded.cpu, section.cpu);
        assert_eq!(decoded.type_addresses, section.type_addresses);
        assert_eq!(decoded.code_addresses, section.code_addresses);
        assert_eq!(decoded.sections.len(), 1);
        assert_eq!(decoded.sections[0].bytes, section.sections[0].bytes);
    }

    #[test]
    fn embedding_then_extracting_finds_the_same_section() {
        let section = sample();
        let minimal_wasm = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];
        let embedded = embed_in_wasm(&minimal_wasm, &section);
        let extracted = extract_from_wasm(&embedded).unwrap();
        assert_eq!(extracted.code_addresses, section.code_addresses);
    }

    #[test]
    fn mismatched_host_tags_are_rejected() {
        let mut section = sample();
        section.os = OsTag::Windows;
        section.cpu = CpuTag::Riscv64;
        assert!(section.check_host_compatible().is_err());
    }

    #[test]
    fn missing_section_is_reported() {
        let minimal_wasm = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];
        assert!(matches!(
            extract_from_wasm(&minimal_wasm),
            Err(ObjectError::MissingUniversalSection(_))
        ));
    }
}

//! Loads a universal-binary wasm module (§3.5, §6.2): extracts the
//! embedded native section, checks it against the host, then maps its
//! copied sections into a fresh anonymous region and resolves every
//! `tN`/`fN`/`version`/`intrinsics` address as an RVA into that region.
//!
//! §6.2 itself says "`version_symbol_address` and
//! `intrinsics_symbol_address` are RVA offsets into the embedded
//! image" — that's a relocation-free loading model, not a `dlopen`-able
//! container. Reassembling something `dlopen` would accept from the
//! copied section bytes alone would mean re-running a linker this
//! crate never carries; mapping the sections at their recorded
//! addresses and doing the arithmetic ourselves is the same kind of
//! external-collaborator boundary `aotc-object::codegen` draws around
//! instruction selection, just on the loading side.

use std::ptr::{self, NonNull};

use aotc_object::{CopiedSection, UniversalSection};
use aotc_runtime::IntrinsicTable;
use aotc_types::SectionKind;

use crate::error::{LoaderError, LoaderResult};

/// A universal-binary module mapped directly into anonymous memory: no
/// dynamic linker is involved, so its `tN`/`fN` addresses are RVA
/// offsets off `base` rather than symbols a loader looked up by name.
pub struct UniversalModule {
    base: NonNull<u8>,
    mapped_len: usize,
    pub version: [u8; 4],
    wrappers: Vec<*const ()>,
    functions: Vec<*const ()>,
}

// `base` only ever addresses this module's own mapped, read-only-after-load
// image; it's as shareable as `dylib::LoadedModule`'s library handle.
unsafe impl Send for UniversalModule {}
unsafe impl Sync for UniversalModule {}

impl UniversalModule {
    pub fn wrapper(&self, index: u32) -> Option<*const ()> {
        self.wrappers.get(index as usize).copied()
    }

    pub fn function(&self, index: u32) -> Option<*const ()> {
        self.functions.get(index as usize).copied()
    }
}

impl Drop for UniversalModule {
    fn drop(&mut self) {
        let r = unsafe { libc::munmap(self.base.as_ptr() as *mut libc::c_void, self.mapped_len) };
        debug_assert_eq!(r, 0, "munmap failed");
    }
}

/// Extracts the universal section from `wasm_bytes`, rejects it if it
/// wasn't built for this host (§8 scenario 6), maps its copied sections,
/// installs `table` as the module's intrinsics pointer, and resolves its
/// `tN`/`fN` address tables.
pub fn load_universal(wasm_bytes: &[u8], table: &IntrinsicTable) -> LoaderResult<UniversalModule> {
    let section = aotc_object::extract_from_wasm(wasm_bytes)?;
    section.check_host_compatible()?;

    let image = map_sections(&section.sections)?;
    let rva = |addr: u64| -> *const () { unsafe { image.base.as_ptr().add((addr - image.min_address) as usize) as *const () } };

    unsafe {
        let slot = rva(section.intrinsics_symbol_address) as *mut usize;
        *slot = table as *const IntrinsicTable as usize;
    }
    tracing::debug!("intrinsics pointer fixed up");

    let wrappers = section.type_addresses.iter().map(|&a| rva(a)).collect();
    let functions = section.code_addresses.iter().map(|&a| rva(a)).collect();

    Ok(UniversalModule {
        base: image.base,
        mapped_len: image.mapped_len,
        version: section.version,
        wrappers,
        functions,
    })
}

struct MappedImage {
    base: NonNull<u8>,
    mapped_len: usize,
    min_address: u64,
}

/// Maps `sections` into one anonymous region sized to span their
/// recorded addresses, copies each section's bytes to its offset within
/// that region, then tightens text sections down to read+execute so the
/// mapped image matches the permissions the linker originally gave it.
fn map_sections(sections: &[CopiedSection]) -> LoaderResult<MappedImage> {
    if sections.is_empty() {
        return Err(LoaderError::EmptyUniversalImage);
    }
    let min_address = sections.iter().map(|s| s.address).min().unwrap();
    let max_address = sections.iter().map(|s| s.address + s.bytes.len() as u64).max().unwrap();
    let image_len = (max_address - min_address) as usize;

    let page_size = page_size();
    let mapped_len = round_up(image_len, page_size);

    let base = unsafe {
        let ptr = libc::mmap(
            ptr::null_mut(),
            mapped_len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANON,
            -1,
            0,
        );
        if ptr == libc::MAP_FAILED {
            return Err(LoaderError::Mmap(std::io::Error::last_os_error()));
        }
        NonNull::new_unchecked(ptr as *mut u8)
    };

    for section in sections {
        let offset = (section.address - min_address) as usize;
        unsafe {
            ptr::copy_nonoverlapping(section.bytes.as_ptr(), base.as_ptr().add(offset), section.bytes.len());
        }
    }

    for section in sections {
        if section.kind != SectionKind::Text {
            continue;
        }
        let offset = (section.address - min_address) as usize;
        let start = align_down(offset, page_size);
        let end = round_up(offset + section.bytes.len(), page_size);
        unsafe {
            let r = libc::mprotect(base.as_ptr().add(start) as *mut libc::c_void, end - start, libc::PROT_READ | libc::PROT_EXEC);
            if r != 0 {
                return Err(LoaderError::Mmap(std::io::Error::last_os_error()));
            }
        }
    }

    Ok(MappedImage { base, mapped_len, min_address })
}

fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        4096
    } else {
        size as usize
    }
}

fn round_up(n: usize, align: usize) -> usize {
    (n + align - 1) / align * align
}

fn align_down(n: usize, align: usize) -> usize {
    n / align * align
}

#[cfg(test)]
mod tests {
    use super::*;
    use aotc_types::{CpuTag, OsTag};

    #[test]
    fn rejects_mismatched_target_before_mapping_anything() {
        let mut section = aotc_object::UniversalSection {
            version: aotc_types::BINARY_VERSION,
            os: OsTag::Linux,
            cpu: CpuTag::Riscv64,
            version_symbol_address: 0,
            intrinsics_symbol_address: 0,
            type_addresses: vec![],
            code_addresses: vec![],
            sections: vec![],
        };
        section.os = if OsTag::host() == OsTag::Linux { OsTag::Windows } else { OsTag::Linux };
        assert!(section.check_host_compatible().is_err());
    }

    #[test]
    fn mapping_no_sections_is_rejected() {
        let err = map_sections(&[]).unwrap_err();
        assert!(matches!(err, LoaderError::EmptyUniversalImage));
    }

    #[test]
    fn maps_a_single_section_and_copies_its_bytes() {
        let section = CopiedSection { kind: SectionKind::Data, address: 0x1000, bytes: vec![1, 2, 3, 4] };
        let image = map_sections(&[section]).unwrap();
        let slice = unsafe { std::slice::from_raw_parts(image.base.as_ptr(), 4) };
        assert_eq!(slice, &[1, 2, 3, 4]);
        let r = unsafe { libc::munmap(image.base.as_ptr() as *mut libc::c_void, image.mapped_len) };
        assert_eq!(r, 0);
    }
}

//! Constants shared between the packager and the loader for the universal
//! binary format (§3.5, §6.2).

/// The binary version tag stamped into every produced artifact and into the
/// `version` global symbol of every compiled module. The loader refuses to
/// load an artifact whose tag does not match.
pub const BINARY_VERSION: [u8; 4] = *b"AOT1";

/// The custom Wasm section name a universal binary is embedded under.
pub const UNIVERSAL_SECTION_NAME: &str = "wasmedge";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OsTag {
    Linux = 1,
    Macos = 2,
    Windows = 3,
}

impl OsTag {
    pub fn from_u8(v: u8) -> Option<OsTag> {
        match v {
            1 => Some(OsTag::Linux),
            2 => Some(OsTag::Macos),
            3 => Some(OsTag::Windows),
            _ => None,
        }
    }

    /// The tag of the OS this crate was built for.
    pub fn host() -> OsTag {
        if cfg!(target_os = "linux") {
            OsTag::Linux
        } else if cfg!(target_os = "macos") {
            OsTag::Macos
        } else if cfg!(target_os = "windows") {
            OsTag::Windows
        } else {
            // Best-effort default; unsupported hosts are rejected earlier
            // by the packager's linker-driver selection (§4.4).
            OsTag::Linux
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CpuTag {
    X86_64 = 1,
    Aarch64 = 2,
    Riscv64 = 3,
    Armv7 = 4,
}

impl CpuTag {
    pub fn from_u8(v: u8) -> Option<CpuTag> {
        match v {
            1 => Some(CpuTag::X86_64),
            2 => Some(CpuTag::Aarch64),
            3 => Some(CpuTag::Riscv64),
            4 => Some(CpuTag::Armv7),
            _ => None,
        }
    }

    pub fn host() -> CpuTag {
        if cfg!(target_arch = "x86_64") {
            CpuTag::X86_64
        } else if cfg!(target_arch = "aarch64") {
            CpuTag::Aarch64
        } else if cfg!(target_arch = "riscv64") {
            CpuTag::Riscv64
        } else if cfg!(target_arch = "arm") {
            CpuTag::Armv7
        } else {
            CpuTag::X86_64
        }
    }
}

/// The kind of a copied native section embedded in a universal binary
/// (§3.5, §6.2 step 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SectionKind {
    Text = 1,
    Data = 2,
    Bss = 3,
    /// `.pdata`/`.xdata` on Windows, `.eh_frame` elsewhere.
    Unwind = 4,
}

impl SectionKind {
    pub fn from_u8(v: u8) -> Option<SectionKind> {
        match v {
            1 => Some(SectionKind::Text),
            2 => Some(SectionKind::Data),
            3 => Some(SectionKind::Bss),
            4 => Some(SectionKind::Unwind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_tag_round_trips() {
        for t in [OsTag::Linux, OsTag::Macos, OsTag::Windows] {
            assert_eq!(OsTag::from_u8(t as u8), Some(t));
        }
    }

    #[test]
    fn cpu_tag_round_trips() {
        for t in [CpuTag::X86_64, CpuTag::Aarch64, CpuTag::Riscv64, CpuTag::Armv7] {
            assert_eq!(CpuTag::from_u8(t as u8), Some(t));
        }
    }
}

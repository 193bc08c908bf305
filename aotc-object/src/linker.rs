//! Drives the platform linker to turn a native object into a shared
//! object (§4.4 "invokes the platform linker to produce a shared object;
//! provides OS-specific arguments").
//!
//! Shelling out to the system `cc`/linker rather than embedding a linker
//! implementation matches the umbrella crate's own `wasmtime-cli`
//! posture toward native toolchains it doesn't reimplement (e.g. its use
//! of the host `cc` for the C API's sample embedding tests).

use std::path::Path;
use std::process::Command;

use aotc_types::OsTag;

use crate::error::{ObjectError, ObjectResult};

/// Links `object_path` into a shared object/dylib/dll at `output_path`,
/// using OS-appropriate flags (§4.4: "position-independent dlls... base
/// address 0"), then codesigns the result ad hoc on macOS (§4.4 "a
/// post-link `codesign -s -` is executed").
pub fn link_shared_object(object_path: &Path, output_path: &Path, os: OsTag) -> ObjectResult<()> {
    let mut cmd = match os {
        OsTag::Linux => {
            let mut cmd = Command::new("cc");
            cmd.arg("-shared")
                .arg("-fPIC")
                .arg("-Wl,--gc-sections")
                .arg("-o")
                .arg(output_path)
                .arg(object_path);
            cmd
        }
        OsTag::Macos => {
            let mut cmd = Command::new("cc");
            cmd.arg("-dynamiclib")
                .arg("-Wl,-image_base,0x0")
                .arg("-o")
                .arg(output_path)
                .arg(object_path);
            cmd
        }
        OsTag::Windows => {
            let mut cmd = Command::new("cc");
            cmd.arg("-shared").arg("-o").arg(output_path).arg(object_path);
            cmd
        }
    };

    tracing::info!(?object_path, ?output_path, ?os, "invoking linker");
    let status = cmd.status().map_err(ObjectError::Linker)?;
    if !status.success() {
        return Err(ObjectError::LinkFailed(status.code()));
    }

    if os == OsTag::Macos {
        tracing::debug!(?output_path, "ad hoc codesigning");
        let status = Command::new("codesign")
            .arg("-s")
            .arg("-")
            .arg(output_path)
            .status()
            .map_err(ObjectError::Linker)?;
        if !status.success() {
            return Err(ObjectError::CodesignFailed);
        }
    }

    Ok(())
}

//! The native code generator the Executable Packager drives (§4.4
//! "invokes the code generator to emit an object into memory").
//!
//! Turning an `aotc-ir::Function` into real machine code — instruction
//! selection and register allocation — is the external collaborator
//! [`aotc_object::codegen`] already draws a boundary around; this crate
//! is the seam where a caller plugs one in. [`StubBackend`] is a
//! placeholder that lets the rest of the pipeline (translate, wrap,
//! package, link, load) be exercised end to end without one: every
//! function is encoded as a single platform trap instruction, so a
//! loaded artifact is real and loadable but never actually callable.

use aotc_ir::Function;

/// Turns one compiled function's IR into machine code bytes ready to be
/// appended to an object's text section (§4.4).
pub trait CodeBackend {
    fn encode(&self, func: &Function) -> Vec<u8>;
}

/// Encodes every function as a single trap instruction for the host's
/// own architecture. Exists so the packaging/loading path has something
/// concrete to link and `dlopen` while no real instruction-selection
/// backend is wired in: a full ISA backend is its own large subsystem and
/// is a stated Non-goal of this core, the same way `cranelift-object`
/// never runs `cranelift-codegen`'s own backends on its own behalf.
pub struct StubBackend;

impl CodeBackend for StubBackend {
    fn encode(&self, _func: &Function) -> Vec<u8> {
        #[cfg(target_arch = "x86_64")]
        {
            vec![0x0f, 0x0b] // ud2
        }
        #[cfg(target_arch = "aarch64")]
        {
            vec![0x00, 0x00, 0x00, 0x00] // udf #0
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            vec![0x00]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aotc_ir::Signature;

    #[test]
    fn stub_backend_never_emits_an_empty_body() {
        let f = Function::with_name_signature("f0", Signature { params: vec![], returns: vec![] });
        assert!(!StubBackend.encode(&f).is_empty());
    }
}

//! Compiler configuration (§10.3).

use bitflags::bitflags;

/// Optimisation level forwarded to the code generator; kept coarse since
/// this compiler has no separate mid-level optimizer pass (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    None,
    #[default]
    Speed,
    SpeedAndSize,
}

/// Which CPU a module is compiled for (§4.1 "the host-CPU feature string is
/// queried (skipped if a 'generic' binary is requested)").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetCpu {
    /// Query and use the features of the machine doing the compiling.
    #[default]
    Host,
    /// Compile against the baseline ISA only, producing a binary portable
    /// across machines of the same architecture (§10.5 "generic" target
    /// support, supplemented from the original implementation's
    /// `--target-cpu generic` flag).
    Generic,
    /// An explicit `target-lexicon` triple string, e.g. `"x86_64-apple-darwin"`.
    Named(String),
}

bitflags! {
    /// Fast-path-enabling CPU feature flags (§4.1: "xop, sse4.1, ssse3,
    /// sse2 on x86-64; neon on aarch64").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CpuFeatures: u32 {
        const SSE2    = 1 << 0;
        const SSSE3   = 1 << 1;
        const SSE4_1  = 1 << 2;
        const XOP     = 1 << 3;
        const NEON    = 1 << 4;
    }
}

impl CpuFeatures {
    /// Detects host features via `target-lexicon`/`cfg!` gating; returns an
    /// empty set for `TargetCpu::Generic`.
    pub fn detect(target: &TargetCpu) -> Self {
        match target {
            TargetCpu::Generic => CpuFeatures::empty(),
            TargetCpu::Host => Self::detect_host(),
            TargetCpu::Named(triple) => Self::detect_named(triple),
        }
    }

    #[cfg(target_arch = "x86_64")]
    fn detect_host() -> Self {
        let mut f = CpuFeatures::empty();
        if std::is_x86_feature_detected!("sse2") {
            f |= CpuFeatures::SSE2;
        }
        if std::is_x86_feature_detected!("ssse3") {
            f |= CpuFeatures::SSSE3;
        }
        if std::is_x86_feature_detected!("sse4.1") {
            f |= CpuFeatures::SSE4_1;
        }
        if std::is_x86_feature_detected!("xop") {
            f |= CpuFeatures::XOP;
        }
        f
    }

    #[cfg(target_arch = "aarch64")]
    fn detect_host() -> Self {
        let mut f = CpuFeatures::empty();
        if std::arch::is_aarch64_feature_detected!("neon") {
            f |= CpuFeatures::NEON;
        }
        f
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn detect_host() -> Self {
        CpuFeatures::empty()
    }

    fn detect_named(triple: &str) -> Self {
        if triple.starts_with("x86_64") {
            CpuFeatures::SSE2 | CpuFeatures::SSSE3 | CpuFeatures::SSE4_1
        } else if triple.starts_with("aarch64") {
            CpuFeatures::NEON
        } else {
            CpuFeatures::empty()
        }
    }
}

/// Top-level compiler configuration (§10.3), built up by the CLI driver in
/// the `aotc` crate and threaded through to [`crate::context::CompilationContext`].
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub opt_level: OptLevel,
    pub target_cpu: TargetCpu,
    /// Enables the gas-metering instrumentation of §4.2.4.
    pub gas_metering: bool,
    /// Per-opcode cost table used when `gas_metering` is set; defaults to
    /// a flat cost of 1 per instruction when left empty.
    pub cost_table: Vec<(u16, u8)>,
    pub gas_limit: i64,
    /// Enables the interrupt checks injected at block/loop entry (§4.2.1,
    /// §5). Independent of gas metering: a caller may want cooperative
    /// cancellation without cost accounting.
    pub interrupt_checks: bool,
    /// Emit a standalone object file instead of wrapping it in the
    /// universal-binary custom section (§3.5, §6.2).
    pub standalone_object: bool,
}

impl CompilerConfig {
    /// The configured cost of `opcode` (§4.2.4), falling back to the
    /// documented flat default of 1 when `cost_table` has no override for
    /// it (true unconditionally when the table is empty).
    pub fn cost_of(&self, opcode: u16) -> u8 {
        self.cost_table
            .iter()
            .find(|&&(op, _)| op == opcode)
            .map(|&(_, cost)| cost)
            .unwrap_or(1)
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            opt_level: OptLevel::default(),
            target_cpu: TargetCpu::default(),
            gas_metering: false,
            cost_table: Vec::new(),
            gas_limit: i64::MAX,
            interrupt_checks: true,
            standalone_object: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_target_detects_no_cpu_features() {
        assert_eq!(CpuFeatures::detect(&TargetCpu::Generic), CpuFeatures::empty());
    }

    #[test]
    fn named_x86_64_triple_implies_baseline_sse() {
        let f = CpuFeatures::detect(&TargetCpu::Named("x86_64-unknown-linux-gnu".into()));
        assert!(f.contains(CpuFeatures::SSE2));
    }
}

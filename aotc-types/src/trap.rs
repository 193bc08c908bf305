//! The trap-code taxonomy compiled code can raise (§7, §8).

use std::fmt;

/// A concrete reason the trap intrinsic was invoked. Numeric values are
/// part of the compiled-artifact ABI (§8 scenario 2 references
/// `DivideByZero` as "code 1"): once assigned, a discriminant must not be
/// renumbered without bumping `kBinaryVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TrapCode {
    Unreachable = 0,
    DivideByZero = 1,
    IntegerOverflow = 2,
    InvalidConvToInt = 3,
    UnalignedAtomicAccess = 4,
    CostLimitExceeded = 5,
    Interrupted = 6,
    HostFuncError = 7,
}

impl TrapCode {
    pub const ALL: [TrapCode; 8] = [
        TrapCode::Unreachable,
        TrapCode::DivideByZero,
        TrapCode::IntegerOverflow,
        TrapCode::InvalidConvToInt,
        TrapCode::UnalignedAtomicAccess,
        TrapCode::CostLimitExceeded,
        TrapCode::Interrupted,
        TrapCode::HostFuncError,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<TrapCode> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Whether this trap block should be marked "likely not taken" when
    /// branched to (§4.2.6). Interrupts and cost-limit traps are the only
    /// ones reachable from otherwise-unconditional control-flow checks
    /// injected at every block/loop entry, so they're the ones worth the
    /// branch-weight metadata.
    pub fn is_hot_path_check(self) -> bool {
        matches!(self, TrapCode::Interrupted | TrapCode::CostLimitExceeded)
    }
}

impl fmt::Display for TrapCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TrapCode::Unreachable => "unreachable",
            TrapCode::DivideByZero => "integer divide by zero",
            TrapCode::IntegerOverflow => "integer overflow",
            TrapCode::InvalidConvToInt => "invalid conversion to integer",
            TrapCode::UnalignedAtomicAccess => "unaligned atomic access",
            TrapCode::CostLimitExceeded => "cost limit exceeded",
            TrapCode::Interrupted => "interrupted",
            TrapCode::HostFuncError => "host function error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_by_zero_is_code_one() {
        assert_eq!(TrapCode::DivideByZero.code(), 1);
    }

    #[test]
    fn code_round_trips_through_from_code() {
        for t in TrapCode::ALL {
            assert_eq!(TrapCode::from_code(t.code()), Some(t));
        }
        assert_eq!(TrapCode::from_code(999), None);
    }
}

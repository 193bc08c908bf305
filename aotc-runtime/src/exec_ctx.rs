//! The execution context struct passed as the hidden first argument to
//! every compiled function (§3.2).
//!
//! This is the Rust-side owner of the memory compiled code actually reads:
//! the fields here have the exact order the compiler's `lower(functype)`
//! and `ExecCtx` accessors (§4.1) assume, since compiled code indexes into
//! this struct by raw field offset rather than by name.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};

/// Per-opcode cost used by gas metering (§4.2.4); indexed by the
/// `wasmparser` operator's discriminant, capped at `u16::MAX` entries to
/// match the fixed-size `cost_table` the spec describes.
pub const COST_TABLE_LEN: usize = 65536;

/// One linear memory's base pointer and current byte length, reloaded on
/// every access since `memory.grow` may relocate the backing allocation
/// (§4.2.3).
#[derive(Debug)]
pub struct MemoryInstance {
    pub base: std::sync::atomic::AtomicPtr<u8>,
    pub len_bytes: AtomicU64,
}

impl MemoryInstance {
    pub fn new(base: *mut u8, len_bytes: u64) -> Self {
        MemoryInstance {
            base: std::sync::atomic::AtomicPtr::new(base),
            len_bytes: AtomicU64::new(len_bytes),
        }
    }
}

/// A 128-bit-wide global variable slot (§3.2 "pointers to 128-bit-wide
/// global slots" — wide enough to hold a `v128` global without a second
/// indirection).
#[derive(Debug, Default, Clone, Copy)]
#[repr(align(16))]
pub struct GlobalSlot(pub [u8; 16]);

/// The execution context (§3.2). Fields are read-only from compiled code's
/// point of view; the atomics behind `instr_count`/`gas`/`stop_token` are
/// the only parts mutated post-construction, always through a
/// read-modify-write op.
pub struct ExecCtx {
    pub memories: Vec<MemoryInstance>,
    pub globals: Vec<GlobalSlot>,
    pub instr_count: AtomicU64,
    pub cost_table: Box<[u8; COST_TABLE_LEN]>,
    pub gas: AtomicI64,
    pub gas_limit: i64,
    pub stop_token: AtomicU32,
}

impl ExecCtx {
    pub fn new(memory_count: usize, global_count: usize, gas_limit: i64) -> Self {
        ExecCtx {
            memories: Vec::with_capacity(memory_count),
            globals: vec![GlobalSlot::default(); global_count],
            instr_count: AtomicU64::new(0),
            cost_table: Box::new([1u8; COST_TABLE_LEN]),
            gas: AtomicI64::new(0),
            gas_limit,
            stop_token: AtomicU32::new(0),
        }
    }

    pub fn set_cost(&mut self, opcode: u16, cost: u8) {
        self.cost_table[opcode as usize] = cost;
    }

    /// Interrupt check performed on every `block`/`loop` entry (§4.2.1,
    /// §5): atomically swaps in 0 and reports whether the token had been
    /// set. Uses `SeqCst` — the spec calls out waits/fences as sequentially
    /// consistent and groups the stop token with them (§5).
    pub fn check_and_clear_interrupt(&self) -> bool {
        self.stop_token.swap(0, Ordering::SeqCst) != 0
    }

    pub fn request_interrupt(&self) {
        self.stop_token.store(1, Ordering::SeqCst);
    }

    /// Flushes `local_gas` into the shared accumulator with a
    /// compare-exchange retry loop, per §4.2.4. Returns `Err(())` when the
    /// flush would exceed `gas_limit`, in which case the shared counter is
    /// left unmodified and the caller must lower a `CostLimitExceeded`
    /// trap.
    pub fn flush_gas(&self, local_gas: i64) -> Result<(), ()> {
        let mut old = self.gas.load(Ordering::Relaxed);
        loop {
            let new = old.saturating_add(local_gas);
            if new > self.gas_limit {
                return Err(());
            }
            match self.gas.compare_exchange_weak(
                old,
                new,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => old = observed,
            }
        }
    }

    pub fn add_instr_count(&self, n: u64) {
        self.instr_count.fetch_add(n, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_gas_succeeds_while_under_the_limit() {
        let ctx = ExecCtx::new(0, 0, 100);
        assert!(ctx.flush_gas(40).is_ok());
        assert!(ctx.flush_gas(40).is_ok());
        assert_eq!(ctx.gas.load(Ordering::Relaxed), 80);
    }

    #[test]
    fn flush_gas_reports_cost_limit_exceeded_without_mutating_the_counter() {
        let ctx = ExecCtx::new(0, 0, 100);
        assert!(ctx.flush_gas(90).is_ok());
        assert!(ctx.flush_gas(20).is_err());
        assert_eq!(ctx.gas.load(Ordering::Relaxed), 90);
    }

    #[test]
    fn check_and_clear_interrupt_is_edge_triggered() {
        let ctx = ExecCtx::new(0, 0, 0);
        assert!(!ctx.check_and_clear_interrupt());
        ctx.request_interrupt();
        assert!(ctx.check_and_clear_interrupt());
        assert!(!ctx.check_and_clear_interrupt());
    }
}

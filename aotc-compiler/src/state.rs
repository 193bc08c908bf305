//! Per-function translation state (§4.2): the operand stack, control
//! stack, lazily-populated trap blocks, and the stack-local
//! instruction/gas accumulators.

use std::collections::HashMap;

use aotc_ir::{Block, StackSlot, Value};
use aotc_types::TrapCode;

use crate::control::ControlFrame;
use crate::error::{CompilerError, CompilerResult};

/// Translation state threaded through every call to the opcode translator
/// for one function body. Named and shaped after
/// `cranelift_wasm::state::TranslationState`, generalized with the
/// gas/instruction accumulators and trap-block cache §4.2 calls for.
pub struct FunctionState {
    pub operand_stack: Vec<Value>,
    pub control_stack: Vec<ControlFrame>,
    /// Lazily created per error code (§4.2.6).
    pub trap_blocks: HashMap<TrapCode, Block>,
    /// One stack slot per Wasm local (params first, then declared locals),
    /// indexed by local index.
    pub locals: Vec<StackSlot>,
    /// Reset to zero after each flush to the shared `ExecCtx::instr_count`.
    pub local_instr_count: i64,
    /// Reset to zero after each flush to the shared `ExecCtx::gas`.
    pub local_gas: i64,
    /// Set once an `unreachable`, trap, or divergent branch has been
    /// emitted in the current block; suppresses pushing further operands
    /// until the next structured-control boundary (§4.2.1 "If unreachable
    /// at end ... a dead-code basic block is created and discarded").
    pub reachable: bool,
}

impl FunctionState {
    pub fn new() -> Self {
        FunctionState {
            operand_stack: Vec::new(),
            control_stack: Vec::new(),
            trap_blocks: HashMap::new(),
            locals: Vec::new(),
            local_instr_count: 0,
            local_gas: 0,
            reachable: true,
        }
    }

    pub fn push1(&mut self, v: Value) {
        self.operand_stack.push(v);
    }

    pub fn push_many(&mut self, vs: impl IntoIterator<Item = Value>) {
        self.operand_stack.extend(vs);
    }

    pub fn pop1(&mut self, op: &'static str) -> CompilerResult<Value> {
        self.operand_stack
            .pop()
            .ok_or(CompilerError::OperandStackUnderflow { op, needed: 1, had: 0 })
    }

    pub fn pop2(&mut self, op: &'static str) -> CompilerResult<(Value, Value)> {
        let b = self.pop1(op)?;
        let a = self.pop1(op)?;
        Ok((a, b))
    }

    pub fn pop3(&mut self, op: &'static str) -> CompilerResult<(Value, Value, Value)> {
        let c = self.pop1(op)?;
        let b = self.pop1(op)?;
        let a = self.pop1(op)?;
        Ok((a, b, c))
    }

    pub fn pop_n(&mut self, op: &'static str, n: usize) -> CompilerResult<Vec<Value>> {
        if self.operand_stack.len() < n {
            return Err(CompilerError::OperandStackUnderflow {
                op,
                needed: n,
                had: self.operand_stack.len(),
            });
        }
        Ok(self.operand_stack.split_off(self.operand_stack.len() - n))
    }

    pub fn peek1(&self, op: &'static str) -> CompilerResult<Value> {
        self.operand_stack
            .last()
            .copied()
            .ok_or(CompilerError::OperandStackUnderflow { op, needed: 1, had: 0 })
    }

    pub fn push_control(&mut self, frame: ControlFrame) {
        self.control_stack.push(frame);
    }

    pub fn pop_control(&mut self) -> CompilerResult<ControlFrame> {
        self.control_stack.pop().ok_or(CompilerError::ControlStackUnderflow)
    }

    pub fn control_at(&self, relative_depth: u32) -> CompilerResult<&ControlFrame> {
        let len = self.control_stack.len();
        let idx = len
            .checked_sub(1 + relative_depth as usize)
            .ok_or(CompilerError::InvalidBranchDepth(relative_depth))?;
        Ok(&self.control_stack[idx])
    }

    pub fn control_at_mut(&mut self, relative_depth: u32) -> CompilerResult<&mut ControlFrame> {
        let len = self.control_stack.len();
        let idx = len
            .checked_sub(1 + relative_depth as usize)
            .ok_or(CompilerError::InvalidBranchDepth(relative_depth))?;
        Ok(&mut self.control_stack[idx])
    }

    /// Truncates the operand stack back to a frame's entry depth, used
    /// when entering unreachable code so subsequent pops see an empty
    /// (but type-correct-by-assumption) stack rather than stale values
    /// from before the trap (§3.3 invariant, §4.2.1 unreachable handling).
    pub fn truncate_to(&mut self, depth: usize) {
        self.operand_stack.truncate(depth);
    }
}

impl Default for FunctionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aotc_types::EntityRef;

    #[test]
    fn pop_n_returns_values_in_push_order() {
        let mut s = FunctionState::new();
        s.push1(Value::new(0));
        s.push1(Value::new(1));
        s.push1(Value::new(2));
        let popped = s.pop_n("test", 2).unwrap();
        assert_eq!(popped, vec![Value::new(1), Value::new(2)]);
        assert_eq!(s.operand_stack, vec![Value::new(0)]);
    }

    #[test]
    fn pop1_on_empty_stack_reports_underflow() {
        let mut s = FunctionState::new();
        let err = s.pop1("i32.add").unwrap_err();
        assert!(matches!(
            err,
            CompilerError::OperandStackUnderflow { op: "i32.add", needed: 1, had: 0 }
        ));
    }

    #[test]
    fn control_at_indexes_from_the_top_of_the_stack() {
        let mut s = FunctionState::new();
        s.push_control(ControlFrame::new_block(0, Block::new(0), aotc_types::BlockSignature::Empty));
        s.push_control(ControlFrame::new_block(0, Block::new(1), aotc_types::BlockSignature::Empty));
        assert_eq!(s.control_at(0).unwrap().jump_block, Block::new(1));
        assert_eq!(s.control_at(1).unwrap().jump_block, Block::new(0));
        assert!(s.control_at(2).is_err());
    }
}

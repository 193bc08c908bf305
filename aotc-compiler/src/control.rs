//! Control frames (§3.3): pushed on `block`/`loop`/`if`, popped on `end`.

use aotc_ir::{Block, Value};
use aotc_types::BlockSignature;

/// One `(values, from_block)` exit recorded for a frame's normal
/// (non-branch) or `br`-to-block exit, merged into a phi-style block
/// parameter list when the frame's `end` is reached (§3.3 `return_phi`).
#[derive(Debug, Clone)]
pub struct PendingExit {
    pub values: Vec<Value>,
    pub from_block: Block,
}

/// What kind of structured-control construct a frame was pushed for;
/// distinguishes `loop` (whose branch target is its header, looping back)
/// from `block`/`if` (whose branch target is the frame's end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Block,
    Loop,
    If,
    /// The `else` arm of an `if`, re-entered as if it were a fresh frame
    /// sharing the original frame's jump target (§4.2.1 "re-enter as if a
    /// fresh frame with same jump target").
    IfElse,
}

/// A pushed control-flow frame (§3.3).
#[derive(Debug, Clone)]
pub struct ControlFrame {
    pub kind: FrameKind,
    /// Operand-stack height when this frame was entered, not counting the
    /// frame's own block parameters.
    pub stack_depth: usize,
    pub unreachable: bool,
    /// Target of a `br`/`br_if` naming this frame: the loop header for
    /// `loop`, the end-block for `block`/`if`.
    pub jump_block: Block,
    /// Post-branch continuation; only loops set this (the loop's `end`
    /// block, reached once control falls out of the loop body rather than
    /// looping back).
    pub next_block: Option<Block>,
    /// The `then`-arm's end point, recorded so `else` knows where to
    /// resume bookkeeping; only `if` frames set this.
    pub else_block: Option<Block>,
    pub block_type: BlockSignature,
    pub exits: Vec<PendingExit>,
    /// The operand-stack values in place when this frame was entered, kept
    /// around only for `if` frames: an `if` with no `else` must forward
    /// them unchanged to `end` (validation requires `params == results` in
    /// that case), and unlike `block`/`loop` the `then`/`else` arms don't
    /// consume them through a block-parameter list (§4.2.1).
    pub params: Vec<Value>,
}

impl ControlFrame {
    pub fn new_block(stack_depth: usize, jump_block: Block, block_type: BlockSignature) -> Self {
        ControlFrame {
            kind: FrameKind::Block,
            stack_depth,
            unreachable: false,
            jump_block,
            next_block: None,
            else_block: None,
            block_type,
            exits: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn new_loop(
        stack_depth: usize,
        loop_header: Block,
        loop_end: Block,
        block_type: BlockSignature,
    ) -> Self {
        ControlFrame {
            kind: FrameKind::Loop,
            stack_depth,
            unreachable: false,
            jump_block: loop_header,
            next_block: Some(loop_end),
            else_block: None,
            block_type,
            exits: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn new_if(
        stack_depth: usize,
        end_block: Block,
        else_block: Block,
        block_type: BlockSignature,
        params: Vec<Value>,
    ) -> Self {
        ControlFrame {
            kind: FrameKind::If,
            stack_depth,
            unreachable: false,
            jump_block: end_block,
            next_block: None,
            else_block: Some(else_block),
            block_type,
            exits: Vec::new(),
            params,
        }
    }

    /// Branch target for `br`/`br_if` naming this frame, and the arity
    /// expected at that target (loop branches feed the loop's parameters;
    /// block/if branches feed the frame's result types).
    pub fn branch_target(&self) -> Block {
        self.jump_block
    }

    pub fn branch_arity(&self) -> usize {
        match self.kind {
            FrameKind::Loop => self.block_type.params().len(),
            _ => self.block_type.results().len(),
        }
    }

    pub fn record_exit(&mut self, values: Vec<Value>, from_block: Block) {
        self.exits.push(PendingExit { values, from_block });
    }
}

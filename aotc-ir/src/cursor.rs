//! A cursor for inserting instructions into a [`Function`]'s layout, the
//! way `cranelift_codegen::cursor::FuncCursor` lets `FunctionBuilder`
//! append to "whichever block is currently selected" without the caller
//! tracking block/position bookkeeping by hand.

use crate::entities::{Block, Inst};
use crate::function::Function;
use crate::instructions::InstData;

/// Where the cursor is positioned: nowhere, at the top of a block (before
/// its first instruction), or after a specific instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorPosition {
    Nowhere,
    Before(Block),
    After(Inst),
}

pub struct FuncCursor<'f> {
    pub func: &'f mut Function,
    pos: CursorPosition,
    current_block: Option<Block>,
}

impl<'f> FuncCursor<'f> {
    pub fn new(func: &'f mut Function) -> Self {
        FuncCursor {
            func,
            pos: CursorPosition::Nowhere,
            current_block: None,
        }
    }

    pub fn goto_bottom(&mut self, block: Block) {
        self.current_block = Some(block);
        match self.func.layout.block_insts(block).last().copied() {
            Some(last) => self.pos = CursorPosition::After(last),
            None => self.pos = CursorPosition::Before(block),
        }
    }

    pub fn current_block(&self) -> Option<Block> {
        self.current_block
    }

    /// Appends `data` at the cursor position and advances the cursor past
    /// it, returning the new instruction.
    pub fn ins(&mut self, data: InstData) -> Inst {
        let block = self
            .current_block
            .expect("FuncCursor::ins called with no block selected");
        let inst = self.func.dfg.make_inst(data);
        self.func.layout.append_inst(block, inst);
        self.pos = CursorPosition::After(inst);
        inst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{Function, Signature};
    use crate::instructions::Opcode;

    #[test]
    fn ins_appends_to_the_selected_block_in_order() {
        let mut func = Function::with_name_signature(
            "f",
            Signature {
                params: vec![],
                returns: vec![],
            },
        );
        let block = func.layout.append_block();
        let mut cursor = FuncCursor::new(&mut func);
        cursor.goto_bottom(block);
        let i0 = cursor.ins(InstData::Nullary { opcode: Opcode::Unreachable });
        let i1 = cursor.ins(InstData::UnaryImm {
            opcode: Opcode::Iconst,
            imm: 7,
        });
        assert_eq!(func.layout.block_insts(block), &[i0, i1]);
    }
}

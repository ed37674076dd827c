//! Pairs each `[` with its `]` while the graph is being built.
//!
//! A `[` allocates three blocks: the header that tests the cell, the body,
//! and the exit. The exit block gets a handle straight away, because the
//! header's conditional branch needs a target, but it only takes its place
//! in the layout once the matching `]` is reached.

use tracing::trace;

use crate::builder::{Cursor, GraphBuilder};
use crate::diagnostics::Position;
use crate::error::StructuralError;
use crate::ir::{BlockId, BlockKind, Terminator};
use crate::tape::Tape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoopFrame {
    header: BlockId,
    exit: BlockId,
    /// Where the `[` is in the source.
    position: Position,
}

#[derive(Debug, Default)]
pub(crate) struct LoopStack {
    frames: Vec<LoopFrame>,
    opened: usize,
}

impl LoopStack {
    pub(crate) fn new() -> Self {
        LoopStack::default()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// `[`: branch from the current block into a fresh header, test the
    /// cell there, and continue emitting into the loop body.
    pub(crate) fn open(
        &mut self,
        builder: &mut GraphBuilder,
        tape: &Tape,
        cursor: Cursor,
        position: Position,
    ) -> Cursor {
        let id = self.opened;
        self.opened += 1;

        let header = builder.allocate_block(format!("loop{}.header", id), BlockKind::LoopHeader);
        let body = builder.allocate_block(format!("loop{}.body", id), BlockKind::LoopBody);
        let exit = builder.allocate_block(format!("loop{}.exit", id), BlockKind::LoopExit);

        builder.terminate(cursor, Terminator::Branch(header));

        builder.attach(header);
        let header_cursor = Cursor::at(header);
        let cond = tape.cell_is_nonzero(builder, &header_cursor);
        builder.terminate(
            header_cursor,
            Terminator::CondBranch {
                cond,
                if_true: body,
                if_false: exit,
            },
        );

        self.frames.push(LoopFrame {
            header,
            exit,
            position,
        });
        trace!(loop_id = id, depth = self.frames.len(), %position, "loop opened");

        builder.attach(body);
        Cursor::at(body)
    }

    /// `]`: jump back to the innermost header and continue after the loop.
    pub(crate) fn close(
        &mut self,
        builder: &mut GraphBuilder,
        cursor: Cursor,
        position: Position,
    ) -> Result<Cursor, StructuralError> {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => return Err(StructuralError::UnmatchedClose { position }),
        };

        builder.terminate(cursor, Terminator::Branch(frame.header));
        builder.attach(frame.exit);
        trace!(depth = self.frames.len(), %position, "loop closed");

        Ok(Cursor::at(frame.exit))
    }

    /// At end of input every loop must have been closed.
    pub(crate) fn finish(&self) -> Result<(), StructuralError> {
        match self.frames.last() {
            Some(frame) => Err(StructuralError::UnmatchedOpen {
                position: frame.position,
            }),
            None => Ok(()),
        }
    }
}

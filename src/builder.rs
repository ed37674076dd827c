//! Lowers a stream of BF commands into a `ProgramGraph` in one forward pass.
//!
//! Blocks live in an arena and are referred to by `BlockId`. Allocating a
//! block and attaching it to the layout are separate steps, so a block can
//! be branched to before its position is known.
//!
//! The block currently being emitted into is a `Cursor`, which every step
//! takes by value and hands back. Terminating a block consumes its cursor,
//! so nothing can be emitted after a terminator.

use tracing::{debug, instrument};

use crate::bfir::{Command, Operator};
use crate::error::StructuralError;
use crate::ir::{
    BasicBlock, BinaryOp, BlockId, BlockKind, ExternFunction, Instruction, Operand, ProgramGraph,
    Terminator, Type, Value,
};
use crate::matcher::LoopStack;
use crate::tape::Tape;

/// The block instructions are currently appended to.
#[derive(Debug)]
pub(crate) struct Cursor {
    block: BlockId,
}

impl Cursor {
    pub(crate) fn at(block: BlockId) -> Self {
        Cursor { block }
    }

    pub(crate) fn block(&self) -> BlockId {
        self.block
    }
}

#[derive(Debug)]
struct PendingBlock {
    name: String,
    kind: BlockKind,
    instructions: Vec<Instruction>,
    terminator: Option<Terminator>,
}

#[derive(Debug, Default)]
pub(crate) struct GraphBuilder {
    blocks: Vec<PendingBlock>,
    layout: Vec<BlockId>,
    externs: Vec<ExternFunction>,
    next_value: u32,
}

impl GraphBuilder {
    pub(crate) fn new() -> Self {
        GraphBuilder::default()
    }

    /// Reserve a block. It has no place in the layout until `attach`.
    pub(crate) fn allocate_block(&mut self, name: String, kind: BlockKind) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(PendingBlock {
            name,
            kind,
            instructions: vec![],
            terminator: None,
        });
        id
    }

    /// Append a block to the layout, after every block attached so far.
    pub(crate) fn attach(&mut self, id: BlockId) {
        debug_assert!(!self.layout.contains(&id), "block attached twice");
        self.layout.push(id);
    }

    pub(crate) fn fresh_value(&mut self) -> Value {
        let value = Value(self.next_value);
        self.next_value += 1;
        value
    }

    pub(crate) fn push(&mut self, cursor: &Cursor, instruction: Instruction) {
        if let Instruction::Call { callee, .. } = &instruction {
            if !self.externs.contains(callee) {
                self.externs.push(*callee);
            }
        }
        self.blocks[cursor.block.0].instructions.push(instruction);
    }

    pub(crate) fn terminate(&mut self, cursor: Cursor, terminator: Terminator) {
        let block = &mut self.blocks[cursor.block.0];
        debug_assert!(block.terminator.is_none(), "block terminated twice");
        block.terminator = Some(terminator);
    }

    /// Freeze the arena into a graph. Only blocks in the layout are kept;
    /// each of them must have been terminated.
    fn finish(self, entry: BlockId, tape_capacity: usize) -> ProgramGraph {
        let GraphBuilder {
            blocks,
            layout,
            mut externs,
            next_value,
        } = self;

        // Renumber so handles follow layout order; unattached blocks are dropped.
        let mut renumbered = vec![None; blocks.len()];
        for (new_index, id) in layout.iter().enumerate() {
            renumbered[id.0] = Some(BlockId(new_index));
        }
        let remap = |id: BlockId| renumbered[id.0].expect("branch to a block outside the layout");

        let mut slots: Vec<Option<PendingBlock>> = blocks.into_iter().map(Some).collect();
        let blocks = layout
            .iter()
            .map(|id| {
                let pending = slots[id.0].take().expect("block attached twice");
                let terminator = match pending.terminator.expect("attached block left unterminated") {
                    Terminator::Branch(target) => Terminator::Branch(remap(target)),
                    Terminator::CondBranch {
                        cond,
                        if_true,
                        if_false,
                    } => Terminator::CondBranch {
                        cond,
                        if_true: remap(if_true),
                        if_false: remap(if_false),
                    },
                    Terminator::Return(value) => Terminator::Return(value),
                };
                BasicBlock {
                    name: pending.name,
                    kind: pending.kind,
                    instructions: pending.instructions,
                    terminator,
                }
            })
            .collect::<Vec<_>>();

        externs.sort();
        ProgramGraph {
            layout: (0..blocks.len()).map(BlockId).collect(),
            entry: remap(entry),
            blocks,
            externs,
            value_count: next_value,
            tape_capacity,
        }
    }
}

/// Lower one command into the block under `cursor`, returning the cursor
/// to continue from.
fn emit(
    builder: &mut GraphBuilder,
    tape: &Tape,
    loops: &mut LoopStack,
    command: Command,
    cursor: Cursor,
) -> Result<Cursor, StructuralError> {
    match command.operator {
        Operator::MoveRight => tape.move_right(builder, &cursor),
        Operator::MoveLeft => tape.move_left(builder, &cursor),
        Operator::Inc(count) => tape.adjust_cell(builder, &cursor, BinaryOp::Add, count),
        Operator::Dec(count) => tape.adjust_cell(builder, &cursor, BinaryOp::Sub, count),
        Operator::Output => tape.output_cell(builder, &cursor),
        Operator::Input => tape.input_cell(builder, &cursor),
        Operator::LoopOpen => return Ok(loops.open(builder, tape, cursor, command.position)),
        Operator::LoopClose => return loops.close(builder, cursor, command.position),
    }
    Ok(cursor)
}

/// Build the graph for `commands` on a tape of `tape_capacity` cells.
///
/// The capacity must already be validated to fit an `i32`.
#[instrument(level = "debug", skip(commands))]
pub(crate) fn build<I>(commands: I, tape_capacity: u32) -> Result<ProgramGraph, StructuralError>
where
    I: IntoIterator<Item = Command>,
{
    let mut builder = GraphBuilder::new();
    let mut loops = LoopStack::new();

    let entry = builder.allocate_block("entrypoint".to_owned(), BlockKind::Entry);
    builder.attach(entry);
    let mut cursor = Cursor::at(entry);

    let tape = Tape::allocate(&mut builder, &cursor, tape_capacity);

    for command in commands {
        cursor = emit(&mut builder, &tape, &mut loops, command, cursor).map_err(|err| {
            debug!(%err, position = %err.position(), "translation failed");
            err
        })?;
    }

    if let Err(err) = loops.finish() {
        debug!(%err, position = %err.position(), depth = loops.depth(), "translation failed");
        return Err(err);
    }

    debug_assert!(cursor.block() == *builder.layout.last().unwrap_or(&entry));
    builder.terminate(cursor, Terminator::Return(Operand::int(Type::I32, 0)));

    let graph = builder.finish(entry, tape_capacity as usize);
    debug!(
        blocks = graph.len(),
        values = graph.value_count(),
        "program graph built"
    );
    Ok(graph)
}

#![warn(trivial_numeric_casts)]

//! bfc-cfg lowers BF programs to a control-flow graph of typed, low-level
//! instructions, ready for a code-generating backend.
//! The IR conventions are forked from [bfc](https://github.com/Wilfred/bfc).
//!
//! ```
//! use bfc_cfg::{compile, BlockKind, CompileOptions};
//!
//! let graph = compile("+[-]", &CompileOptions::default()).unwrap();
//! assert_eq!(graph.blocks_of_kind(BlockKind::LoopHeader).count(), 1);
//! ```

pub use backend::{Backend, TextBackend};
pub use bfir::{coalesce, decompile, parse_operators, Command, Operator};
pub use diagnostics::{render_error, Position};
pub use error::{CompileError, OptionsError, StructuralError};
pub use ir::{
    BasicBlock, BinaryOp, BlockId, BlockKind, CmpOp, ExternFunction, Instruction, Operand,
    ProgramGraph, Terminator, Type, Value,
};
pub use options::{CompileOptions, OptimisationFlags, DEFAULT_TAPE_CAPACITY};

mod backend;
mod bfir;
mod builder;
mod diagnostics;
mod error;
mod ir;
mod matcher;
mod options;
mod tape;


use tracing::debug;

/// Translate BF `source` into a program graph.
///
/// Fails on a bracket that has no partner or on options that cannot be
/// honoured; no graph is produced in either case.
pub fn compile(source: &str, options: &CompileOptions) -> Result<ProgramGraph, CompileError> {
    options.validate()?;
    debug!(
        source_len = source.len(),
        tape_capacity = options.tape_capacity,
        flags = ?options.flags,
        "compiling"
    );

    // `validate` guarantees the capacity fits an i32.
    let capacity = options.tape_capacity as u32;
    let commands = parse_operators(source);
    let graph = if options.flags.contains(OptimisationFlags::COALESCE_RUNS) {
        builder::build(coalesce(commands), capacity)?
    } else {
        builder::build(commands, capacity)?
    };
    Ok(graph)
}

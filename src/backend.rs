//! The boundary to code generation. A `Backend` takes a finished
//! `ProgramGraph` and lowers it to whatever it produces: an LLVM module,
//! machine code, or, for `TextBackend`, a readable listing.

use std::fmt::{self, Write};

use crate::ir::{BlockId, ProgramGraph, Terminator};

pub trait Backend {
    type Output;
    type Error;

    fn lower(&mut self, graph: &ProgramGraph) -> Result<Self::Output, Self::Error>;
}

/// Renders the graph as an LLVM-flavoured listing: the external
/// declarations followed by `main` and its blocks in layout order.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextBackend;

impl TextBackend {
    fn write_graph<W: Write>(out: &mut W, graph: &ProgramGraph) -> fmt::Result {
        for callee in graph.externs() {
            write!(out, "declare {} @{}(", callee.return_type(), callee.name())?;
            for (i, param) in callee.params().iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                write!(out, "{}", param)?;
            }
            writeln!(out, ")")?;
        }
        if !graph.externs().is_empty() {
            writeln!(out)?;
        }

        writeln!(out, "define i32 @main() {{")?;
        for (i, (_, block)) in graph.blocks().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "{}:", block.name)?;
            for instruction in &block.instructions {
                writeln!(out, "  {}", instruction)?;
            }

            let label = move |id: BlockId| graph.block(id).name.as_str();
            match block.terminator {
                Terminator::Branch(target) => writeln!(out, "  br label %{}", label(target))?,
                Terminator::CondBranch {
                    cond,
                    if_true,
                    if_false,
                } => writeln!(
                    out,
                    "  br i1 {}, label %{}, label %{}",
                    cond,
                    label(if_true),
                    label(if_false)
                )?,
                Terminator::Return(value) => writeln!(out, "  ret i32 {}", value)?,
            }
        }
        write!(out, "}}")
    }
}

impl Backend for TextBackend {
    type Output = String;
    type Error = fmt::Error;

    fn lower(&mut self, graph: &ProgramGraph) -> Result<String, fmt::Error> {
        let mut out = String::new();
        TextBackend::write_graph(&mut out, graph)?;
        Ok(out)
    }
}

impl fmt::Display for ProgramGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        TextBackend::write_graph(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, CompileOptions};
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_loop_listing() {
        let graph = compile("[-].", &CompileOptions::default().with_tape_capacity(16)).unwrap();
        let listing = TextBackend.lower(&graph).unwrap();

        let expected = "\
declare i32 @putchar(i32)

define i32 @main() {
entrypoint:
  %0 = alloca i8, i32 16
  zeroinit i8, ptr %0, i32 16
  %1 = alloca i32
  store i32 0, ptr %1
  br label %loop0.header

loop0.header:
  %2 = load i32, ptr %1
  %3 = getelementptr i8, ptr %0, i32 %2
  %4 = load i8, ptr %3
  %5 = icmp ne i8 %4, 0
  br i1 %5, label %loop0.body, label %loop0.exit

loop0.body:
  %6 = load i32, ptr %1
  %7 = getelementptr i8, ptr %0, i32 %6
  %8 = load i8, ptr %7
  %9 = sub i8 %8, 1
  store i8 %9, ptr %7
  br label %loop0.header

loop0.exit:
  %10 = load i32, ptr %1
  %11 = getelementptr i8, ptr %0, i32 %10
  %12 = load i8, ptr %11
  %13 = sext i8 %12 to i32
  %14 = call i32 @putchar(i32 %13)
  ret i32 0
}";
        assert_eq!(listing, expected);
    }

    #[test]
    fn display_matches_text_backend() {
        let graph = compile(",>.", &CompileOptions::default()).unwrap();
        assert_eq!(graph.to_string(), TextBackend.lower(&graph).unwrap());
        assert!(graph
            .to_string()
            .starts_with("declare i32 @putchar(i32)\ndeclare i32 @getchar()\n\n"));
    }
}

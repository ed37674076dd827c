//! The program graph handed to a codegen backend: basic blocks of typed,
//! SSA-numbered instructions, each block ending in exactly one terminator.
//!
//! The instruction set is deliberately close to what an LLVM-style IR
//! builder accepts, so a backend can map it one instruction at a time.

use std::fmt;

/// Stable handle of a block in the graph's arena. Handles exist before the
/// block has a place in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An SSA value, defined by exactly one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(pub(crate) u32);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    I1,
    I8,
    I32,
    Ptr,
}

impl Type {
    /// Width in bits of an integer type.
    pub fn bits(self) -> Option<u32> {
        match self {
            Type::I1 => Some(1),
            Type::I8 => Some(8),
            Type::I32 => Some(32),
            Type::Ptr => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Type::I1 => "i1",
            Type::I8 => "i8",
            Type::I32 => "i32",
            Type::Ptr => "ptr",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Value(Value),
    /// An integer constant, already reduced to its type's width and held
    /// sign-extended.
    Const(Type, i64),
}

impl Operand {
    /// An integer constant of type `ty`, wrapped to the type's width.
    pub fn int(ty: Type, value: i64) -> Operand {
        let bits = ty.bits().unwrap_or(64);
        let shift = 64 - bits;
        Operand::Const(ty, (value << shift) >> shift)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Value(value) => write!(f, "{}", value),
            Operand::Const(_, constant) => write!(f, "{}", constant),
        }
    }
}

/// Integer arithmetic, wrapping at the operand type's width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    /// Unsigned remainder.
    URem,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::URem => "urem",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
        };
        write!(f, "{}", name)
    }
}

/// Runtime functions the generated program calls but does not define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExternFunction {
    /// `int putchar(int)`: write one character, return a status.
    PutChar,
    /// `int getchar(void)`: read one character. End of input is whatever
    /// the runtime's `getchar` does.
    GetChar,
}

impl ExternFunction {
    pub fn name(self) -> &'static str {
        match self {
            ExternFunction::PutChar => "putchar",
            ExternFunction::GetChar => "getchar",
        }
    }

    pub fn params(self) -> &'static [Type] {
        match self {
            ExternFunction::PutChar => &[Type::I32],
            ExternFunction::GetChar => &[],
        }
    }

    pub fn return_type(self) -> Type {
        Type::I32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Stack-allocate `count` elements of `ty`; `dest` is a pointer.
    Alloca { dest: Value, ty: Type, count: u32 },
    /// Set `count` elements of `ty` starting at `ptr` to zero.
    ZeroMemory { ptr: Value, ty: Type, count: u32 },
    Load { dest: Value, ty: Type, ptr: Value },
    Store { ty: Type, value: Operand, ptr: Value },
    /// Address of element `index` (an `i32`, unsigned) of a `ty` array.
    ElementPtr {
        dest: Value,
        ty: Type,
        base: Value,
        index: Value,
    },
    Binary {
        dest: Value,
        op: BinaryOp,
        ty: Type,
        lhs: Operand,
        rhs: Operand,
    },
    /// Integer comparison producing an `i1`.
    Compare {
        dest: Value,
        op: CmpOp,
        ty: Type,
        lhs: Operand,
        rhs: Operand,
    },
    SignExtend {
        dest: Value,
        from: Type,
        to: Type,
        value: Value,
    },
    Truncate {
        dest: Value,
        from: Type,
        to: Type,
        value: Value,
    },
    Call {
        dest: Value,
        callee: ExternFunction,
        args: Vec<Operand>,
    },
}

impl Instruction {
    /// The value this instruction defines, if any.
    pub fn dest(&self) -> Option<Value> {
        match *self {
            Instruction::Alloca { dest, .. }
            | Instruction::Load { dest, .. }
            | Instruction::ElementPtr { dest, .. }
            | Instruction::Binary { dest, .. }
            | Instruction::Compare { dest, .. }
            | Instruction::SignExtend { dest, .. }
            | Instruction::Truncate { dest, .. }
            | Instruction::Call { dest, .. } => Some(dest),
            Instruction::ZeroMemory { .. } | Instruction::Store { .. } => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Alloca { dest, ty, count } => {
                if *count == 1 {
                    write!(f, "{} = alloca {}", dest, ty)
                } else {
                    write!(f, "{} = alloca {}, i32 {}", dest, ty, count)
                }
            }
            Instruction::ZeroMemory { ptr, ty, count } => {
                write!(f, "zeroinit {}, ptr {}, i32 {}", ty, ptr, count)
            }
            Instruction::Load { dest, ty, ptr } => write!(f, "{} = load {}, ptr {}", dest, ty, ptr),
            Instruction::Store { ty, value, ptr } => {
                write!(f, "store {} {}, ptr {}", ty, value, ptr)
            }
            Instruction::ElementPtr {
                dest,
                ty,
                base,
                index,
            } => write!(f, "{} = getelementptr {}, ptr {}, i32 {}", dest, ty, base, index),
            Instruction::Binary {
                dest,
                op,
                ty,
                lhs,
                rhs,
            } => write!(f, "{} = {} {} {}, {}", dest, op, ty, lhs, rhs),
            Instruction::Compare {
                dest,
                op,
                ty,
                lhs,
                rhs,
            } => write!(f, "{} = icmp {} {} {}, {}", dest, op, ty, lhs, rhs),
            Instruction::SignExtend {
                dest,
                from,
                to,
                value,
            } => write!(f, "{} = sext {} {} to {}", dest, from, value, to),
            Instruction::Truncate {
                dest,
                from,
                to,
                value,
            } => write!(f, "{} = trunc {} {} to {}", dest, from, value, to),
            Instruction::Call { dest, callee, args } => {
                write!(f, "{} = call {} @{}(", dest, callee.return_type(), callee.name())?;
                for (i, (arg, ty)) in args.iter().zip(callee.params()).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", ty, arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// The single control transfer ending a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Branch(BlockId),
    CondBranch {
        cond: Value,
        if_true: BlockId,
        if_false: BlockId,
    },
    Return(Operand),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match *self {
            Terminator::Branch(target) => vec![target],
            Terminator::CondBranch {
                if_true, if_false, ..
            } => vec![if_true, if_false],
            Terminator::Return(_) => vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Entry,
    /// Tests the current cell and branches into the body or past the loop.
    LoopHeader,
    LoopBody,
    /// Where control continues once the loop's cell is zero.
    LoopExit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub name: String,
    pub kind: BlockKind,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

/// The `main` function of the translated program: every block, the order
/// they are laid out in, and the external functions they call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramGraph {
    pub(crate) blocks: Vec<BasicBlock>,
    pub(crate) layout: Vec<BlockId>,
    pub(crate) entry: BlockId,
    pub(crate) externs: Vec<ExternFunction>,
    pub(crate) value_count: u32,
    pub(crate) tape_capacity: usize,
}

impl ProgramGraph {
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    /// Blocks in layout order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &BasicBlock)> + '_ {
        self.layout.iter().map(move |&id| (id, &self.blocks[id.0]))
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// External functions the program calls, sorted and without repeats.
    pub fn externs(&self) -> &[ExternFunction] {
        &self.externs
    }

    /// Number of SSA values defined across all blocks.
    pub fn value_count(&self) -> u32 {
        self.value_count
    }

    pub fn tape_capacity(&self) -> usize {
        self.tape_capacity
    }

    pub fn blocks_of_kind(&self, kind: BlockKind) -> impl Iterator<Item = (BlockId, &BasicBlock)> + '_ {
        self.blocks().filter(move |(_, block)| block.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn int_constants_wrap_to_width() {
        assert_eq!(Operand::int(Type::I8, 255), Operand::Const(Type::I8, -1));
        assert_eq!(Operand::int(Type::I8, 256), Operand::Const(Type::I8, 0));
        assert_eq!(Operand::int(Type::I8, 3), Operand::Const(Type::I8, 3));
        assert_eq!(Operand::int(Type::I32, 2999), Operand::Const(Type::I32, 2999));
        assert_eq!(Operand::int(Type::I1, 1), Operand::Const(Type::I1, -1));
    }

    #[test]
    fn instruction_display() {
        let gep = Instruction::ElementPtr {
            dest: Value(4),
            ty: Type::I8,
            base: Value(0),
            index: Value(3),
        };
        assert_eq!(gep.to_string(), "%4 = getelementptr i8, ptr %0, i32 %3");

        let call = Instruction::Call {
            dest: Value(7),
            callee: ExternFunction::PutChar,
            args: vec![Operand::Value(Value(6))],
        };
        assert_eq!(call.to_string(), "%7 = call i32 @putchar(i32 %6)");

        let read = Instruction::Call {
            dest: Value(2),
            callee: ExternFunction::GetChar,
            args: vec![],
        };
        assert_eq!(read.to_string(), "%2 = call i32 @getchar()");
    }

    #[test]
    fn dest_of_store_is_none() {
        let store = Instruction::Store {
            ty: Type::I32,
            value: Operand::int(Type::I32, 0),
            ptr: Value(1),
        };
        assert_eq!(store.dest(), None);
        assert_eq!(store.to_string(), "store i32 0, ptr %1");
    }
}

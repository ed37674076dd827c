//! The tape the generated program works on: `capacity` zeroed `i8` cells
//! and an `i32` pointer kept in its own stack slot, so it can be read and
//! written independently of the cells.
//!
//! The pointer wraps modulo the capacity in both directions: `<` on cell 0
//! lands on the last cell, `>` on the last cell lands on cell 0.

use crate::builder::{Cursor, GraphBuilder};
use crate::ir::{BinaryOp, CmpOp, ExternFunction, Instruction, Operand, Type, Value};

pub(crate) struct Tape {
    cells: Value,
    pointer: Value,
    capacity: u32,
}

impl Tape {
    /// Emit the prologue: allocate and zero the cells, allocate the
    /// pointer and point it at cell 0.
    pub(crate) fn allocate(builder: &mut GraphBuilder, cursor: &Cursor, capacity: u32) -> Tape {
        let cells = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Alloca {
                dest: cells,
                ty: Type::I8,
                count: capacity,
            },
        );
        builder.push(
            cursor,
            Instruction::ZeroMemory {
                ptr: cells,
                ty: Type::I8,
                count: capacity,
            },
        );

        let pointer = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Alloca {
                dest: pointer,
                ty: Type::I32,
                count: 1,
            },
        );
        builder.push(
            cursor,
            Instruction::Store {
                ty: Type::I32,
                value: Operand::int(Type::I32, 0),
                ptr: pointer,
            },
        );

        Tape {
            cells,
            pointer,
            capacity,
        }
    }

    /// `>`
    pub(crate) fn move_right(&self, builder: &mut GraphBuilder, cursor: &Cursor) {
        self.shift_pointer(builder, cursor, 1);
    }

    /// `<`. Adding `capacity - 1` is subtracting one modulo the capacity,
    /// without the pointer ever going negative.
    pub(crate) fn move_left(&self, builder: &mut GraphBuilder, cursor: &Cursor) {
        self.shift_pointer(builder, cursor, i64::from(self.capacity) - 1);
    }

    fn shift_pointer(&self, builder: &mut GraphBuilder, cursor: &Cursor, amount: i64) {
        let index = self.load_pointer(builder, cursor);

        let moved = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Binary {
                dest: moved,
                op: BinaryOp::Add,
                ty: Type::I32,
                lhs: index.into(),
                rhs: Operand::int(Type::I32, amount),
            },
        );

        let wrapped = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Binary {
                dest: wrapped,
                op: BinaryOp::URem,
                ty: Type::I32,
                lhs: moved.into(),
                rhs: Operand::int(Type::I32, i64::from(self.capacity)),
            },
        );

        builder.push(
            cursor,
            Instruction::Store {
                ty: Type::I32,
                value: wrapped.into(),
                ptr: self.pointer,
            },
        );
    }

    fn load_pointer(&self, builder: &mut GraphBuilder, cursor: &Cursor) -> Value {
        let index = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Load {
                dest: index,
                ty: Type::I32,
                ptr: self.pointer,
            },
        );
        index
    }

    /// Address of the cell under the pointer.
    pub(crate) fn cell_address(&self, builder: &mut GraphBuilder, cursor: &Cursor) -> Value {
        let index = self.load_pointer(builder, cursor);
        let address = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::ElementPtr {
                dest: address,
                ty: Type::I8,
                base: self.cells,
                index,
            },
        );
        address
    }

    /// Load the current cell, returning its value and its address.
    pub(crate) fn load_cell(&self, builder: &mut GraphBuilder, cursor: &Cursor) -> (Value, Value) {
        let address = self.cell_address(builder, cursor);
        let value = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Load {
                dest: value,
                ty: Type::I8,
                ptr: address,
            },
        );
        (value, address)
    }

    /// `+` and `-` repeated `count` times. Cells are 8 bits wide, so only
    /// `count mod 256` is emitted.
    pub(crate) fn adjust_cell(
        &self,
        builder: &mut GraphBuilder,
        cursor: &Cursor,
        op: BinaryOp,
        count: usize,
    ) {
        let (current, address) = self.load_cell(builder, cursor);
        let amount = (count % 256) as i64;

        let updated = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Binary {
                dest: updated,
                op,
                ty: Type::I8,
                lhs: current.into(),
                rhs: Operand::int(Type::I8, amount),
            },
        );
        builder.push(
            cursor,
            Instruction::Store {
                ty: Type::I8,
                value: updated.into(),
                ptr: address,
            },
        );
    }

    /// `.`: the cell is sign-extended to the `int` that `putchar` takes.
    pub(crate) fn output_cell(&self, builder: &mut GraphBuilder, cursor: &Cursor) {
        let (current, _) = self.load_cell(builder, cursor);

        let widened = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::SignExtend {
                dest: widened,
                from: Type::I8,
                to: Type::I32,
                value: current,
            },
        );

        let status = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Call {
                dest: status,
                callee: ExternFunction::PutChar,
                args: vec![widened.into()],
            },
        );
    }

    /// `,`: the `int` from `getchar` is truncated to the cell width.
    pub(crate) fn input_cell(&self, builder: &mut GraphBuilder, cursor: &Cursor) {
        let read = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Call {
                dest: read,
                callee: ExternFunction::GetChar,
                args: vec![],
            },
        );

        let narrowed = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Truncate {
                dest: narrowed,
                from: Type::I32,
                to: Type::I8,
                value: read,
            },
        );

        let address = self.cell_address(builder, cursor);
        builder.push(
            cursor,
            Instruction::Store {
                ty: Type::I8,
                value: narrowed.into(),
                ptr: address,
            },
        );
    }

    /// The loop condition: is the current cell non-zero?
    pub(crate) fn cell_is_nonzero(&self, builder: &mut GraphBuilder, cursor: &Cursor) -> Value {
        let (current, _) = self.load_cell(builder, cursor);
        let cond = builder.fresh_value();
        builder.push(
            cursor,
            Instruction::Compare {
                dest: cond,
                op: CmpOp::Ne,
                ty: Type::I8,
                lhs: current.into(),
                rhs: Operand::int(Type::I8, 0),
            },
        );
        cond
    }
}

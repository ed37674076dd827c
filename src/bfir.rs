//! bfir defines the operator stream for BF. Every operator keeps the
//! position of the source text it came from, so structural errors can
//! point at the offending bracket.
//!
//! It also provides the run-length coalescing of `+` and `-` that happens
//! before emission, and a way back to source text.

use self::Operator::*;
use crate::diagnostics::Position;
use itertools::Itertools;
use std::fmt;

#[cfg(test)]
use pretty_assertions::assert_eq;

/// The eight BF operators. `Inc` and `Dec` carry a repeat count, which is
/// 1 straight out of the source and larger once runs are coalesced.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Operator {
    MoveRight,
    MoveLeft,
    Inc(usize),
    Dec(usize),
    Output,
    Input,
    LoopOpen,
    LoopClose,
}

impl Operator {
    /// Map a source character to its operator. Everything else is a
    /// comment.
    pub fn from_char(c: char) -> Option<Operator> {
        match c {
            '>' => Some(MoveRight),
            '<' => Some(MoveLeft),
            '+' => Some(Inc(1)),
            '-' => Some(Dec(1)),
            '.' => Some(Output),
            ',' => Some(Input),
            '[' => Some(LoopOpen),
            ']' => Some(LoopClose),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MoveRight => write!(f, ">"),
            MoveLeft => write!(f, "<"),
            Inc(count) => write!(f, "{}", "+".repeat(count)),
            Dec(count) => write!(f, "{}", "-".repeat(count)),
            Output => write!(f, "."),
            Input => write!(f, ","),
            LoopOpen => write!(f, "["),
            LoopClose => write!(f, "]"),
        }
    }
}

/// An operator together with the source range it was read from.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Command {
    pub operator: Operator,
    pub position: Position,
}

/// Filter BF source down to its operators, one command per operator
/// character. Positions are character indices into `source`.
pub fn parse_operators(source: &str) -> impl Iterator<Item = Command> + '_ {
    source.chars().enumerate().filter_map(|(index, c)| {
        Operator::from_char(c).map(|operator| Command {
            operator,
            position: Position::at(index),
        })
    })
}

/// Merge every maximal run of `Inc` into one `Inc` of the summed count,
/// and likewise for `Dec`. Everything else passes through untouched.
///
/// This is lazy and a normal form: coalescing a coalesced stream changes
/// nothing.
pub fn coalesce<I>(commands: I) -> impl Iterator<Item = Command>
where
    I: IntoIterator<Item = Command>,
{
    commands.into_iter().coalesce(|prev, next| {
        let merged = match (prev.operator, next.operator) {
            (Inc(a), Inc(b)) => Inc(a + b),
            (Dec(a), Dec(b)) => Dec(a + b),
            _ => return Err((prev, next)),
        };
        Ok(Command {
            operator: merged,
            position: prev.position.through(next.position),
        })
    })
}

/// Given a sequence of operators render them back into BF source code.
pub fn decompile<'a, I>(operators: I) -> String
where
    I: IntoIterator<Item = &'a Operator>,
{
    operators.into_iter().map(|op| op.to_string()).collect()
}

#[cfg(test)]
fn operators(source: &str) -> Vec<Operator> {
    parse_operators(source).map(|c| c.operator).collect()
}

#[cfg(test)]
fn coalesced(source: &str) -> Vec<Operator> {
    coalesce(parse_operators(source)).map(|c| c.operator).collect()
}

#[test]
fn parse_every_operator() {
    assert_eq!(
        operators("><+-.,[]"),
        [MoveRight, MoveLeft, Inc(1), Dec(1), Output, Input, LoopOpen, LoopClose]
    );
}

#[test]
fn parse_positions() {
    let commands: Vec<_> = parse_operators("a+ b-").collect();
    assert_eq!(
        commands,
        [
            Command {
                operator: Inc(1),
                position: Position::at(1),
            },
            Command {
                operator: Dec(1),
                position: Position::at(4),
            }
        ]
    );
}

#[test]
fn parse_comment() {
    assert!(operators("foo! ").is_empty());
}

#[test]
fn coalesce_increments() {
    assert_eq!(coalesced("+++"), [Inc(3)]);
    assert_eq!(coalesced("---"), [Dec(3)]);
}

#[test]
fn coalesce_does_not_mix_inc_and_dec() {
    assert_eq!(coalesced("++--+"), [Inc(2), Dec(2), Inc(1)]);
}

#[test]
fn coalesce_leaves_other_operators_alone() {
    assert_eq!(
        coalesced(">>..[[]]"),
        [MoveRight, MoveRight, Output, Output, LoopOpen, LoopOpen, LoopClose, LoopClose]
    );
}

#[test]
fn coalesce_across_comments() {
    let commands: Vec<_> = coalesce(parse_operators("+ a +\n+.")).collect();
    assert_eq!(
        commands,
        [
            Command {
                operator: Inc(3),
                position: Position { start: 0, end: 6 },
            },
            Command {
                operator: Output,
                position: Position::at(7),
            }
        ]
    );
}

#[test]
fn coalesce_long_run_is_not_truncated() {
    let source = "+".repeat(300);
    assert_eq!(coalesced(&source), [Inc(300)]);
}

#[test]
fn coalesce_empty() {
    assert!(coalesced("").is_empty());
}

#[test]
fn decompile_coalesced() {
    assert_eq!(decompile(&[Inc(3), MoveRight, Dec(2), LoopOpen, Output, LoopClose]), "+++>--[.]");
}

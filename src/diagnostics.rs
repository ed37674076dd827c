//! Source positions and human-readable errors for whoever hosts the
//! compiler.

use colored::Colorize;
use std::fmt;

#[cfg(test)]
use pretty_assertions::assert_eq;

/// An inclusive range of character indices in the source text.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

impl Position {
    pub fn at(index: usize) -> Self {
        Position {
            start: index,
            end: index,
        }
    }

    /// The smallest range covering both `self` and `other`.
    pub fn through(self, other: Position) -> Position {
        Position {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 1-based line and column of the character at `index`.
fn line_and_column(source: &str, index: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for c in source.chars().take(index) {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Render `message` about `position` in `source`, in the style of rustc:
/// a header, the offending line, and a caret run under the range.
pub fn render_error(source: &str, message: &str, position: Position) -> String {
    let (line, column) = line_and_column(source, position.start);
    let line_text = source.lines().nth(line - 1).unwrap_or("");

    // Ranges spanning several lines are underlined to the end of the first.
    let line_len = line_text.chars().count();
    let width = (position.end - position.start + 1).min(line_len.saturating_sub(column - 1).max(1));

    let gutter = " ".repeat(line.to_string().len());
    let mut result = String::new();
    result.push_str(&format!("{}: {}\n", "error".red().bold(), message.bold()));
    result.push_str(&format!("{}{} {}:{}\n", gutter, "-->".blue().bold(), line, column));
    result.push_str(&format!("{} {}\n", gutter, "|".blue().bold()));
    result.push_str(&format!(
        "{} {} {}\n",
        line.to_string().blue().bold(),
        "|".blue().bold(),
        line_text
    ));
    result.push_str(&format!(
        "{} {} {}{}",
        gutter,
        "|".blue().bold(),
        " ".repeat(column - 1),
        "^".repeat(width).red().bold()
    ));
    result
}

#[test]
fn test_through_adjacent() {
    let pos1 = Position { start: 1, end: 2 };
    let pos2 = Position { start: 3, end: 4 };

    assert_eq!(pos1.through(pos2), Position { start: 1, end: 4 });
}

#[test]
fn test_through_order() {
    let pos1 = Position { start: 3, end: 4 };
    let pos2 = Position { start: 1, end: 2 };

    assert_eq!(pos1.through(pos2), Position { start: 1, end: 4 });
}

#[test]
fn test_through_gap() {
    // Comments between coalesced operators are covered too.
    let pos1 = Position { start: 1, end: 2 };
    let pos2 = Position { start: 6, end: 6 };

    assert_eq!(pos1.through(pos2), Position { start: 1, end: 6 });
}

#[test]
fn test_through_overlap() {
    let pos1 = Position { start: 1, end: 1 };
    let pos2 = Position { start: 1, end: 3 };

    assert_eq!(pos1.through(pos2), Position { start: 1, end: 3 });
}

#[test]
fn test_position_debug() {
    assert_eq!(format!("{:?}", Position::at(7)), "7");
    assert_eq!(format!("{:?}", Position { start: 2, end: 5 }), "2-5");
}

#[test]
fn test_line_and_column() {
    assert_eq!(line_and_column("+++", 0), (1, 1));
    assert_eq!(line_and_column("+\n+]", 3), (2, 2));
}

#[test]
fn test_render_error() {
    colored::control::set_override(false);

    let rendered = render_error("++\n+]-", "this ] has no matching [", Position::at(4));
    assert_eq!(
        rendered,
        "error: this ] has no matching [\n --> 2:2\n  |\n2 | +]-\n  |  ^"
    );
}

use thiserror::Error;

use crate::diagnostics::{render_error, Position};

/// The bracket structure of a program is malformed. Translation stops at
/// the first one found and no graph is produced.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralError {
    #[error("this ] has no matching [")]
    UnmatchedClose { position: Position },

    /// Reported for the innermost `[` still open at end of input.
    #[error("this [ has no matching ]")]
    UnmatchedOpen { position: Position },
}

impl StructuralError {
    pub fn position(&self) -> Position {
        match *self {
            StructuralError::UnmatchedClose { position } => position,
            StructuralError::UnmatchedOpen { position } => position,
        }
    }

    /// Human-readable report pointing at the offending bracket in `source`.
    pub fn render(&self, source: &str) -> String {
        render_error(source, &self.to_string(), self.position())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsError {
    #[error("tape capacity must be at least one cell")]
    ZeroCapacity,

    #[error("tape capacity {capacity} does not fit the 32-bit tape pointer (max {max})")]
    CapacityTooLarge { capacity: usize, max: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("invalid compile options: {0}")]
    Options(#[from] OptionsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn structural_messages() {
        let close = StructuralError::UnmatchedClose {
            position: Position::at(3),
        };
        let open = StructuralError::UnmatchedOpen {
            position: Position::at(0),
        };

        assert_eq!(close.to_string(), "this ] has no matching [");
        assert_eq!(open.to_string(), "this [ has no matching ]");
        assert_eq!(open.position(), Position::at(0));
    }

    #[test]
    fn compile_error_wraps_structural_transparently() {
        let err: CompileError = StructuralError::UnmatchedClose {
            position: Position::at(0),
        }
        .into();

        assert_eq!(err.to_string(), "this ] has no matching [");
    }

    #[test]
    fn options_messages() {
        let err: CompileError = OptionsError::ZeroCapacity.into();
        assert_eq!(
            err.to_string(),
            "invalid compile options: tape capacity must be at least one cell"
        );
    }

    #[test]
    fn render_points_at_bracket() {
        colored::control::set_override(false);

        let err = StructuralError::UnmatchedOpen {
            position: Position::at(1),
        };
        let rendered = err.render("+[>");
        assert!(rendered.starts_with("error: this [ has no matching ]"));
        assert!(rendered.ends_with("|  ^"));
    }
}

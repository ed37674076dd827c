use bitflags::bitflags;

use crate::error::OptionsError;

/// Tape size used by the classic compiler this crate descends from.
pub const DEFAULT_TAPE_CAPACITY: usize = 3000;

bitflags! {
    /// Optimisations applied before emission.
    pub struct OptimisationFlags: u32 {
        /// Merge runs of `+` and `-` into a single counted add/sub.
        const COALESCE_RUNS = 0b0000_0001;
    }
}

impl Default for OptimisationFlags {
    fn default() -> Self {
        OptimisationFlags::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Number of 8-bit cells on the tape.
    pub tape_capacity: usize,
    pub flags: OptimisationFlags,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            tape_capacity: DEFAULT_TAPE_CAPACITY,
            flags: OptimisationFlags::default(),
        }
    }
}

impl CompileOptions {
    pub fn with_tape_capacity(self, tape_capacity: usize) -> Self {
        CompileOptions {
            tape_capacity,
            ..self
        }
    }

    pub fn with_flags(self, flags: OptimisationFlags) -> Self {
        CompileOptions { flags, ..self }
    }

    /// The pointer is an `i32` and wraps with `capacity - 1` added to it, so
    /// the capacity must be non-zero and representable as a positive `i32`.
    pub fn validate(&self) -> Result<(), OptionsError> {
        let max = i32::MAX as usize;
        if self.tape_capacity == 0 {
            return Err(OptionsError::ZeroCapacity);
        }
        if self.tape_capacity > max {
            return Err(OptionsError::CapacityTooLarge {
                capacity: self.tape_capacity,
                max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.tape_capacity, 3000);
        assert!(options.flags.contains(OptimisationFlags::COALESCE_RUNS));
        assert_eq!(options.validate(), Ok(()));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let options = CompileOptions::default().with_tape_capacity(0);
        assert_eq!(options.validate(), Err(OptionsError::ZeroCapacity));
    }

    #[test]
    fn oversized_capacity_is_rejected() {
        let capacity = i32::MAX as usize + 1;
        let options = CompileOptions::default().with_tape_capacity(capacity);
        assert_eq!(
            options.validate(),
            Err(OptionsError::CapacityTooLarge {
                capacity,
                max: i32::MAX as usize
            })
        );
    }

    #[test]
    fn flags_can_be_cleared() {
        let options = CompileOptions::default().with_flags(OptimisationFlags::empty());
        assert!(!options.flags.contains(OptimisationFlags::COALESCE_RUNS));
    }
}

use core::fmt;

use thiserror::Error;

/// A positional operation on a [`Sequence`](crate::Sequence).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Set,
    Insert,
    Erase,
}

impl Operation {
    /// Returns `true` if `index` is a valid position for this operation on a sequence of length
    /// `len`.
    ///
    /// Insertion accepts `0..=len`; every other operation accepts `0..len`.
    pub fn accepts(self, index: usize, len: usize) -> bool {
        match self {
            Operation::Insert => index <= len,
            Operation::Get | Operation::Set | Operation::Erase => index < len,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Get => "get",
            Operation::Set => "set",
            Operation::Insert => "insert",
            Operation::Erase => "erase",
        })
    }
}

/// Errors returned by [`Sequence`](crate::Sequence).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The position lies outside the range accepted by the operation.
    ///
    /// The sequence is left untouched.
    #[error("{op} index {index} out of range for sequence of length {len}")]
    OutOfRange {
        op: Operation,
        index: usize,
        len: usize,
    },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_ranges() {
        assert!(Operation::Insert.accepts(3, 3));
        assert!(!Operation::Insert.accepts(4, 3));

        for op in [Operation::Get, Operation::Set, Operation::Erase] {
            assert!(op.accepts(2, 3));
            assert!(!op.accepts(3, 3));
            assert!(!op.accepts(0, 0));
        }
    }

    #[test]
    fn out_of_range_message() {
        let err = Error::OutOfRange {
            op: Operation::Erase,
            index: 7,
            len: 7,
        };

        assert_eq!(
            err.to_string(),
            "erase index 7 out of range for sequence of length 7"
        );
    }
}

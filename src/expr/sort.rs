use crate::error::{ErrorKind, Result};
use std::fmt;

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Sort {
    Boolean,
    BitVector(usize),
    /// Array from bit-vector indices of width `index` to bit-vector values of width `value`.
    Array { index: usize, value: usize },
}

impl Sort {
    pub fn boolean() -> Self {
        Self::Boolean
    }

    pub fn bit_vector(width: usize) -> Self {
        Self::BitVector(width)
    }

    pub fn array(index: usize, value: usize) -> Self {
        Self::Array { index, value }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }

    pub fn is_bit_vector(&self) -> bool {
        matches!(self, Self::BitVector(..))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    pub fn expect_boolean(&self) -> Result<()> {
        if self.is_boolean() {
            Ok(())
        } else {
            Err(ErrorKind::Sort("bool".to_string(), self.to_string()).into())
        }
    }

    /// Returns the width if this is a bit-vector sort.
    pub fn expect_bit_vector(&self) -> Result<usize> {
        match self {
            Self::BitVector(width) => Ok(*width),
            _ => Err(ErrorKind::Sort("bit-vector".to_string(), self.to_string()).into()),
        }
    }

    /// Returns the `(index, value)` widths if this is an array sort.
    pub fn expect_array(&self) -> Result<(usize, usize)> {
        match self {
            Self::Array { index, value } => Ok((*index, *value)),
            _ => Err(ErrorKind::Sort("array".to_string(), self.to_string()).into()),
        }
    }

    pub fn expect_sort(&self, sort: &Sort) -> Result<()> {
        if self == sort {
            Ok(())
        } else {
            Err(ErrorKind::Sort(sort.to_string(), self.to_string()).into())
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "bool"),
            Self::BitVector(width) => write!(f, "w{}", width),
            Self::Array { index, value } => write!(f, "w{} -> w{}", index, value),
        }
    }
}

use crate::error::{ErrorKind, Result};
use crate::expr::{ArrayValue, BitVectorValue, Sort};
use std::convert::TryFrom;
use std::fmt;

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Constant {
    Boolean(bool),
    BitVector(BitVectorValue),
    Array(Box<ArrayValue>),
}

impl Constant {
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    pub fn bit_vector(value: BitVectorValue) -> Self {
        Self::BitVector(value)
    }

    pub fn bit_vector_u64(value: u64, bits: usize) -> Self {
        Self::bit_vector(BitVectorValue::from_u64(value, bits))
    }

    pub fn array(value: ArrayValue) -> Self {
        Self::Array(Box::new(value))
    }

    /// The value an unconstrained variable of the given sort takes.
    pub fn zero(sort: &Sort) -> Self {
        match sort {
            Sort::Boolean => Self::boolean(false),
            Sort::BitVector(width) => Self::bit_vector(BitVectorValue::zero(*width)),
            Sort::Array { index, value } => {
                Self::array(ArrayValue::new(*index, BitVectorValue::zero(*value)))
            }
        }
    }

    pub fn sort(&self) -> Sort {
        match self {
            Self::Boolean(_) => Sort::boolean(),
            Self::BitVector(bv) => Sort::bit_vector(bv.bits()),
            Self::Array(arr) => Sort::array(arr.index_bits(), arr.default_value().bits()),
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean(_))
    }

    pub fn is_bit_vector(&self) -> bool {
        matches!(self, Self::BitVector(..))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn unwrap_boolean(&self) -> Result<bool> {
        bool::try_from(self)
    }

    pub fn unwrap_bit_vector(&self) -> Result<&BitVectorValue> {
        match self {
            Self::BitVector(bv) => Ok(bv),
            _ => Err(ErrorKind::Sort("bit-vector".to_string(), self.sort().to_string()).into()),
        }
    }

    pub fn unwrap_array(&self) -> Result<&ArrayValue> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(ErrorKind::Sort("array".to_string(), self.sort().to_string()).into()),
        }
    }
}

impl TryFrom<&Constant> for bool {
    type Error = crate::error::Error;

    fn try_from(c: &Constant) -> Result<bool> {
        match c {
            Constant::Boolean(value) => Ok(*value),
            _ => Err(ErrorKind::Sort("bool".to_string(), c.sort().to_string()).into()),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{}", value),
            Self::BitVector(bv) => write!(f, "{}", bv),
            Self::Array(arr) => write!(f, "{}", arr),
        }
    }
}

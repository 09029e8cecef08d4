use crate::error::Result;
use crate::expr::{BitVectorValue, Constant, Expression, Sort, Variable};
use num_bigint::BigUint;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Array {
    Select,
    Store,
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Select => write!(f, "select"),
            Self::Store => write!(f, "store"),
        }
    }
}

impl Array {
    pub fn variable(name: &str, index_bits: usize, value_bits: usize) -> Variable {
        Variable::new(name, Sort::array(index_bits, value_bits))
    }

    pub fn constant(value: ArrayValue) -> Expression {
        Expression::constant(Constant::array(value))
    }

    pub fn select(arr: Expression, index: Expression) -> Result<Expression> {
        let (index_bits, value_bits) = arr.sort().expect_array()?;
        index.sort().expect_sort(&Sort::bit_vector(index_bits))?;

        Ok(Expression::new(
            Self::Select.into(),
            vec![arr, index],
            Sort::bit_vector(value_bits),
        ))
    }

    pub fn store(arr: Expression, index: Expression, value: Expression) -> Result<Expression> {
        let (index_bits, value_bits) = arr.sort().expect_array()?;
        index.sort().expect_sort(&Sort::bit_vector(index_bits))?;
        value.sort().expect_sort(&Sort::bit_vector(value_bits))?;

        let result_sort = arr.sort().clone();
        Ok(Expression::new(
            Self::Store.into(),
            vec![arr, index, value],
            result_sort,
        ))
    }
}

/// A concrete array: a default value plus explicitly stored entries.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ArrayValue {
    index_bits: usize,
    default: BitVectorValue,
    entries: BTreeMap<BigUint, BitVectorValue>,
}

impl ArrayValue {
    pub fn new(index_bits: usize, default: BitVectorValue) -> Self {
        Self {
            index_bits,
            default,
            entries: BTreeMap::new(),
        }
    }

    pub fn index_bits(&self) -> usize {
        self.index_bits
    }

    pub fn default_value(&self) -> &BitVectorValue {
        &self.default
    }

    pub fn entries(&self) -> impl Iterator<Item = (&BigUint, &BitVectorValue)> {
        self.entries.iter()
    }

    pub fn select(&self, index: &BitVectorValue) -> &BitVectorValue {
        self.entries.get(index.value()).unwrap_or(&self.default)
    }

    pub fn store(&mut self, index: &BitVectorValue, value: BitVectorValue) {
        if value == self.default {
            self.entries.remove(index.value());
        } else {
            self.entries.insert(index.value().clone(), value);
        }
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (index, value) in &self.entries {
            write!(f, "{} = {}, ", index, value)?;
        }
        write!(f, "default = {}]", self.default)
    }
}

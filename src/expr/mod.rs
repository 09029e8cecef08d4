use crate::error::Result;
use std::collections::BTreeSet;
use std::fmt;

mod array;
mod assignment;
mod bitvector;
mod boolean;
mod constant;
mod sort;
mod variable;

pub use self::array::{Array, ArrayValue};
pub use self::assignment::Assignment;
pub use self::bitvector::{BitVector, BitVectorValue};
pub use self::boolean::Boolean;
pub use self::constant::Constant;
pub use self::sort::Sort;
pub use self::variable::Variable;

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Operator {
    Variable(Variable),
    Constant(Constant),
    Ite,
    Equal,
    Boolean(Boolean),
    BitVector(BitVector),
    Array(Array),
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Variable(v) => v.fmt(f),
            Self::Constant(c) => c.fmt(f),
            Self::Ite => write!(f, "ite"),
            Self::Equal => write!(f, "="),
            Self::Boolean(op) => op.fmt(f),
            Self::BitVector(op) => op.fmt(f),
            Self::Array(op) => op.fmt(f),
        }
    }
}

impl From<Boolean> for Operator {
    fn from(op: Boolean) -> Self {
        Self::Boolean(op)
    }
}

impl From<BitVector> for Operator {
    fn from(op: BitVector) -> Self {
        Self::BitVector(op)
    }
}

impl From<Array> for Operator {
    fn from(op: Array) -> Self {
        Self::Array(op)
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Expression {
    operator: Operator,
    operands: Vec<Expression>,
    sort: Sort,
}

impl Expression {
    pub fn new(operator: Operator, operands: Vec<Expression>, sort: Sort) -> Self {
        Self {
            operator,
            operands,
            sort,
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn operands(&self) -> &[Expression] {
        &self.operands
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn variable(variable: Variable) -> Expression {
        let result_sort = variable.sort().clone();
        Expression::new(Operator::Variable(variable), vec![], result_sort)
    }

    pub fn constant(constant: Constant) -> Expression {
        let result_sort = constant.sort();
        Expression::new(Operator::Constant(constant), vec![], result_sort)
    }

    pub fn ite(cond: Expression, then: Expression, else_: Expression) -> Result<Expression> {
        cond.sort().expect_boolean()?;
        then.sort().expect_sort(else_.sort())?;

        let result_sort = then.sort().clone();
        Ok(Expression::new(
            Operator::Ite,
            vec![cond, then, else_],
            result_sort,
        ))
    }

    pub fn equal(lhs: Expression, rhs: Expression) -> Result<Expression> {
        lhs.sort().expect_sort(rhs.sort())?;

        Ok(Expression::new(
            Operator::Equal,
            vec![lhs, rhs],
            Sort::boolean(),
        ))
    }

    /// Returns the value if this `Expression` is a boolean constant.
    pub fn as_boolean(&self) -> Option<bool> {
        match self.operator {
            Operator::Constant(Constant::Boolean(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns all distinct `Variables` used in this `Expression`
    pub fn variables(&self) -> BTreeSet<&Variable> {
        let mut variables = BTreeSet::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables<'a>(&'a self, variables: &mut BTreeSet<&'a Variable>) {
        match &self.operator {
            Operator::Variable(variable) => {
                variables.insert(variable);
            }
            _ => {
                for operand in &self.operands {
                    operand.collect_variables(variables);
                }
            }
        }
    }

    /// Returns all constants appearing in this `Expression`.
    pub fn constants(&self) -> Vec<&Constant> {
        let mut constants = Vec::new();
        self.collect_constants(&mut constants);
        constants
    }

    fn collect_constants<'a>(&'a self, constants: &mut Vec<&'a Constant>) {
        match &self.operator {
            Operator::Constant(constant) => constants.push(constant),
            _ => {
                for operand in &self.operands {
                    operand.collect_constants(constants);
                }
            }
        }
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self::variable(variable)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.operands.is_empty() {
            self.operator.fmt(f)
        } else {
            write!(f, "({}", self.operator)?;
            for operand in &self.operands {
                write!(f, " {}", operand)?;
            }
            write!(f, ")")
        }
    }
}

use crate::error::Result;
use crate::expr::{Constant, Expression, Operator, Sort, Variable};
use std::fmt;

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Boolean {
    Not,
    Imply,
    And,
    Or,
    Xor,
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Not => write!(f, "not"),
            Self::Imply => write!(f, "=>"),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Xor => write!(f, "xor"),
        }
    }
}

macro_rules! boolean_binary {
    ( $name:ident, $op:expr ) => {
        pub fn $name(lhs: Expression, rhs: Expression) -> Result<Expression> {
            lhs.sort().expect_boolean()?;
            rhs.sort().expect_boolean()?;

            Ok(Expression::new($op.into(), vec![lhs, rhs], Sort::boolean()))
        }
    };
}

impl Boolean {
    pub fn variable(name: &str) -> Variable {
        Variable::new(name, Sort::boolean())
    }

    pub fn constant(value: bool) -> Expression {
        Expression::constant(Constant::boolean(value))
    }

    /// Negates `expr`, removing a double negation instead of stacking it.
    pub fn not(expr: Expression) -> Result<Expression> {
        expr.sort().expect_boolean()?;

        match expr.operator() {
            Operator::Boolean(Self::Not) => Ok(expr.operands()[0].clone()),
            Operator::Constant(Constant::Boolean(value)) => Ok(Self::constant(!value)),
            _ => Ok(Expression::new(Self::Not.into(), vec![expr], Sort::boolean())),
        }
    }

    boolean_binary!(imply, Self::Imply);
    boolean_binary!(and, Self::And);
    boolean_binary!(or, Self::Or);
    boolean_binary!(xor, Self::Xor);

    pub fn conjunction(formulas: &[Expression]) -> Result<Expression> {
        match formulas {
            [] => Ok(Self::constant(true)),
            [formula] => {
                formula.sort().expect_boolean()?;
                Ok(formula.clone())
            }
            _ => {
                for formula in formulas {
                    formula.sort().expect_boolean()?;
                }

                Ok(Expression::new(
                    Self::And.into(),
                    formulas.to_vec(),
                    Sort::boolean(),
                ))
            }
        }
    }
}

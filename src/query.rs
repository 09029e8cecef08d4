use crate::error::Result;
use crate::expr::{Boolean, Expression, Variable};
use std::collections::BTreeSet;
use std::fmt;

/// A question for a solver: is `expr` valid under the `constraints`?
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Query {
    constraints: Vec<Expression>,
    expr: Expression,
}

impl Query {
    pub fn new(constraints: Vec<Expression>, expr: Expression) -> Result<Self> {
        for constraint in &constraints {
            constraint.sort().expect_boolean()?;
        }
        expr.sort().expect_boolean()?;

        Ok(Self { constraints, expr })
    }

    /// The query without constraints asking for the validity of `true`.
    pub fn trivially_true() -> Self {
        Self {
            constraints: Vec::new(),
            expr: Boolean::constant(true),
        }
    }

    pub fn constraints(&self) -> &[Expression] {
        &self.constraints
    }

    pub fn expr(&self) -> &Expression {
        &self.expr
    }

    /// The same query with `expr` replaced by its negation.
    pub fn negate_expr(&self) -> Result<Query> {
        Ok(self.with_expr(Boolean::not(self.expr.clone())?))
    }

    pub fn with_expr(&self, expr: Expression) -> Query {
        Self {
            constraints: self.constraints.clone(),
            expr,
        }
    }

    pub fn with_constraints(&self, constraints: Vec<Expression>) -> Query {
        Self {
            constraints,
            expr: self.expr.clone(),
        }
    }

    /// Returns all variables of the constraints and the expression.
    pub fn variables(&self) -> BTreeSet<&Variable> {
        let mut variables = self.expr.variables();
        for constraint in &self.constraints {
            variables.extend(constraint.variables());
        }
        variables
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, constraint) in self.constraints.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", constraint)?;
        }
        write!(f, "] => {}", self.expr)
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Validity {
    /// The expression holds for all solutions of the constraints.
    True,
    /// The negated expression holds for all solutions of the constraints.
    False,
    Unknown,
}

impl Validity {
    pub fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

use crate::error::Result;
use crate::expr::{Array, BitVector, Boolean, Constant, Expression, Operator, Variable};
use std::collections::BTreeMap;
use std::fmt;

/// Concrete values for a set of variables, e.g. a counter-example produced by a solver.
///
/// Variables without a value evaluate to the zero value of their sort.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct Assignment {
    values: BTreeMap<Variable, Constant>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, variable: Variable, value: Constant) {
        self.values.insert(variable, value);
    }

    pub fn value(&self, variable: &Variable) -> Option<&Constant> {
        self.values.get(variable)
    }

    pub fn values(&self) -> impl Iterator<Item = (&Variable, &Constant)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Adds all values of `other`, overwriting values of the same variables.
    pub fn merge(&mut self, other: Assignment) {
        self.values.extend(other.values);
    }

    /// Checks whether all `constraints` evaluate to true under this assignment.
    pub fn satisfies(&self, constraints: &[Expression]) -> Result<bool> {
        for constraint in constraints {
            if !self.evaluate(constraint)?.unwrap_boolean()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn evaluate(&self, expr: &Expression) -> Result<Constant> {
        let operands = || -> Result<Vec<Constant>> {
            expr.operands().iter().map(|op| self.evaluate(op)).collect()
        };

        match expr.operator() {
            Operator::Variable(variable) => Ok(self
                .values
                .get(variable)
                .cloned()
                .unwrap_or_else(|| Constant::zero(variable.sort()))),
            Operator::Constant(constant) => Ok(constant.clone()),
            Operator::Ite => {
                // Only the chosen branch is evaluated.
                let cond = self.evaluate(&expr.operands()[0])?.unwrap_boolean()?;
                if cond {
                    self.evaluate(&expr.operands()[1])
                } else {
                    self.evaluate(&expr.operands()[2])
                }
            }
            Operator::Equal => {
                let values = operands()?;
                Ok(Constant::boolean(values[0] == values[1]))
            }
            Operator::Boolean(op) => evaluate_boolean(op, &operands()?),
            Operator::BitVector(op) => evaluate_bit_vector(op, &operands()?),
            Operator::Array(op) => evaluate_array(op, &operands()?),
        }
    }
}

fn evaluate_boolean(op: &Boolean, operands: &[Constant]) -> Result<Constant> {
    let values = operands
        .iter()
        .map(Constant::unwrap_boolean)
        .collect::<Result<Vec<bool>>>()?;

    let result = match op {
        Boolean::Not => !values[0],
        Boolean::Imply => !values[0] || values[1],
        Boolean::And => values.iter().all(|&v| v),
        Boolean::Or => values.iter().any(|&v| v),
        Boolean::Xor => values.iter().fold(false, |acc, &v| acc ^ v),
    };
    Ok(Constant::boolean(result))
}

fn evaluate_bit_vector(op: &BitVector, operands: &[Constant]) -> Result<Constant> {
    let values = operands
        .iter()
        .map(Constant::unwrap_bit_vector)
        .collect::<Result<Vec<_>>>()?;

    let result = match op {
        BitVector::Add => values[0].add(values[1]),
        BitVector::Sub => values[0].sub(values[1]),
        BitVector::Mul => values[0].mul(values[1]),
        BitVector::UDiv => values[0].udiv(values[1]),
        BitVector::URem => values[0].urem(values[1]),
        BitVector::And => values[0].and(values[1]),
        BitVector::Or => values[0].or(values[1]),
        BitVector::Xor => values[0].xor(values[1]),
        BitVector::Not => values[0].not(),
        BitVector::Shl => values[0].shl(values[1]),
        BitVector::LShr => values[0].lshr(values[1]),
        BitVector::ULt => return Ok(Constant::boolean(values[0].ult(values[1]))),
        BitVector::ULe => return Ok(Constant::boolean(values[0].ule(values[1]))),
        BitVector::SLt => return Ok(Constant::boolean(values[0].slt(values[1]))),
        BitVector::SLe => return Ok(Constant::boolean(values[0].sle(values[1]))),
        BitVector::Concat => values[0].concat(values[1]),
        BitVector::Extract(hi, lo) => values[0].extract(*hi, *lo),
        BitVector::ZeroExtend(n) => values[0].zero_extend(*n),
        BitVector::SignExtend(n) => values[0].sign_extend(*n),
    };
    Ok(Constant::bit_vector(result))
}

fn evaluate_array(op: &Array, operands: &[Constant]) -> Result<Constant> {
    let array = operands[0].unwrap_array()?;
    let index = operands[1].unwrap_bit_vector()?;

    match op {
        Array::Select => Ok(Constant::bit_vector(array.select(index).clone())),
        Array::Store => {
            let value = operands[2].unwrap_bit_vector()?;
            let mut array = array.clone();
            array.store(index, value.clone());
            Ok(Constant::array(array))
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (variable, value) in &self.values {
            writeln!(f, "{} = {}", variable, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ArrayValue, BitVectorValue};

    #[test]
    fn test_unassigned_variables_default_to_zero() {
        let x: Expression = BitVector::variable("x", 8).into();
        let expr = Expression::equal(x, BitVector::constant_u64(0, 8)).unwrap();

        assert_eq!(
            Assignment::new().evaluate(&expr).unwrap(),
            Constant::boolean(true)
        );
    }

    #[test]
    fn test_evaluate_array_read_after_write() {
        // GIVEN
        let arr = Array::variable("arr", 32, 8);
        let mut value = ArrayValue::new(32, BitVectorValue::zero(8));
        value.store(&BitVectorValue::from_u64(1, 32), BitVectorValue::from_u64(7, 8));
        let mut assignment = Assignment::new();
        assignment.assign(arr.clone(), Constant::array(value));

        let stored = Array::store(
            arr.into(),
            BitVector::constant_u64(2, 32),
            BitVector::constant_u64(9, 8),
        )
        .unwrap();

        // WHEN
        let at_1 = assignment
            .evaluate(&Array::select(stored.clone(), BitVector::constant_u64(1, 32)).unwrap())
            .unwrap();
        let at_2 = assignment
            .evaluate(&Array::select(stored, BitVector::constant_u64(2, 32)).unwrap())
            .unwrap();

        // THEN
        assert_eq!(at_1, Constant::bit_vector_u64(7, 8));
        assert_eq!(at_2, Constant::bit_vector_u64(9, 8));
    }

    #[test]
    fn test_satisfies() {
        let x = BitVector::variable("x", 8);
        let mut assignment = Assignment::new();
        assignment.assign(x.clone(), Constant::bit_vector_u64(5, 8));

        let gt_3 = BitVector::ult(BitVector::constant_u64(3, 8), x.clone().into()).unwrap();
        let lt_4 = BitVector::ult(x.into(), BitVector::constant_u64(4, 8)).unwrap();

        assert!(assignment.satisfies(&[gt_3.clone()]).unwrap());
        assert!(!assignment.satisfies(&[gt_3, lt_4]).unwrap());
    }
}

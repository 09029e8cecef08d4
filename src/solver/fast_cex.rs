use crate::error::Result;
use crate::expr::{ArrayValue, Assignment, BitVectorValue, Constant, Sort, Variable};
use crate::query::{Query, Validity};
use crate::solver::{ConstraintLog, LogConfig, Solver};
use std::collections::BTreeSet;

const MAX_CANDIDATES: usize = 16;

/// Answers queries cheaply by trying a few concrete assignments before asking the wrapped
/// solver.
///
/// A candidate satisfying the constraints but falsifying the expression proves the query
/// invalid. Candidates never prove validity, so those queries are always delegated.
pub struct FastCexSolver {
    solver: Box<dyn Solver>,
}

impl FastCexSolver {
    pub fn new(solver: Box<dyn Solver>) -> Self {
        Self { solver }
    }

    /// Returns a candidate which satisfies the constraints and falsifies the expression.
    fn find_counter_example(query: &Query) -> Result<Option<Assignment>> {
        for candidate in candidates(query) {
            if candidate.satisfies(query.constraints())?
                && !candidate.evaluate(query.expr())?.unwrap_boolean()?
            {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

/// Uniform assignments: every variable gets a value derived from the same seed.
fn candidates(query: &Query) -> Vec<Assignment> {
    let variables = query.variables();
    if variables.is_empty() {
        return vec![Assignment::new()];
    }

    let mut seeds: Vec<Seed> = vec![Seed::Zero, Seed::Ones];
    let mut constants = BTreeSet::new();
    for expr in query.constraints().iter().chain(Some(query.expr())) {
        for constant in expr.constants() {
            if let Constant::BitVector(bv) = constant {
                constants.insert(bv.clone());
            }
        }
    }
    for bv in constants {
        let one = BitVectorValue::from_u64(1, bv.bits());
        seeds.push(Seed::Value(bv.add(&one)));
        seeds.push(Seed::Value(bv.sub(&one)));
        seeds.push(Seed::Value(bv));
    }

    let mut assignments: Vec<Assignment> = Vec::new();
    for seed in seeds {
        let mut assignment = Assignment::new();
        for variable in &variables {
            assignment.assign((*variable).clone(), seed.value_for(variable));
        }
        if !assignments.contains(&assignment) {
            assignments.push(assignment);
        }
        if assignments.len() == MAX_CANDIDATES {
            break;
        }
    }
    assignments
}

enum Seed {
    Zero,
    Ones,
    Value(BitVectorValue),
}

impl Seed {
    fn bit_vector(&self, bits: usize) -> BitVectorValue {
        match self {
            Self::Zero => BitVectorValue::zero(bits),
            Self::Ones => BitVectorValue::ones(bits),
            Self::Value(bv) => BitVectorValue::new(bv.value().clone(), bits),
        }
    }

    fn value_for(&self, variable: &Variable) -> Constant {
        match variable.sort() {
            Sort::Boolean => Constant::boolean(match self {
                Self::Zero => false,
                Self::Ones => true,
                Self::Value(bv) => !bv.is_zero(),
            }),
            Sort::BitVector(bits) => Constant::bit_vector(self.bit_vector(*bits)),
            Sort::Array { index, value } => {
                Constant::array(ArrayValue::new(*index, self.bit_vector(*value)))
            }
        }
    }
}

impl Solver for FastCexSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        if Self::find_counter_example(query)?.is_some() {
            return Ok(false);
        }
        self.solver.compute_truth(query)
    }

    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        let may_be_false = Self::find_counter_example(query)?.is_some();
        let may_be_true = Self::find_counter_example(&query.negate_expr()?)?.is_some();

        match (may_be_true, may_be_false) {
            (true, true) => Ok(Validity::Unknown),
            // The expression can be true, so only validity is left open.
            (true, false) => {
                if self.solver.compute_truth(query)? {
                    Ok(Validity::True)
                } else {
                    Ok(Validity::Unknown)
                }
            }
            // The expression can be false, so only invalidity is left open.
            (false, true) => {
                if self.solver.compute_truth(&query.negate_expr()?)? {
                    Ok(Validity::False)
                } else {
                    Ok(Validity::Unknown)
                }
            }
            (false, false) => self.solver.compute_validity(query),
        }
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        if let Some(assignment) = Self::find_counter_example(query)? {
            return Ok(Some(assignment));
        }
        self.solver.compute_initial_values(query)
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        self.solver.render_log(query, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::expr::{BitVector, Expression};

    /// Fails every request so tests notice delegation.
    struct Unreachable;

    impl Solver for Unreachable {
        fn compute_truth(&mut self, _query: &Query) -> Result<bool> {
            Err(ErrorKind::SolverFailure("delegated".to_owned()).into())
        }

        fn compute_initial_values(&mut self, _query: &Query) -> Result<Option<Assignment>> {
            Err(ErrorKind::SolverFailure("delegated".to_owned()).into())
        }

        fn render_log(&self, _query: &Query, _config: Option<&LogConfig>) -> Result<ConstraintLog> {
            Err(ErrorKind::SolverFailure("delegated".to_owned()).into())
        }
    }

    /// Answers truth for the query it expects and fails for any other.
    struct Oracle {
        expected: Query,
        truth: bool,
    }

    impl Solver for Oracle {
        fn compute_truth(&mut self, query: &Query) -> Result<bool> {
            if *query == self.expected {
                Ok(self.truth)
            } else {
                Err(ErrorKind::SolverFailure("unexpected query".to_owned()).into())
            }
        }

        fn compute_initial_values(&mut self, _query: &Query) -> Result<Option<Assignment>> {
            Err(ErrorKind::SolverFailure("delegated".to_owned()).into())
        }

        fn render_log(&self, _query: &Query, _config: Option<&LogConfig>) -> Result<ConstraintLog> {
            Err(ErrorKind::SolverFailure("delegated".to_owned()).into())
        }
    }

    fn x_is_3() -> Expression {
        Expression::equal(x(), BitVector::constant_u64(3, 8)).unwrap()
    }

    fn x() -> Expression {
        BitVector::variable("x", 8).into()
    }

    #[test]
    fn test_counter_example_from_query_constants() {
        // GIVEN: x = 42 is not valid, x = 42 is a counter-example of x != 42
        let eq = Expression::equal(x(), BitVector::constant_u64(42, 8)).unwrap();
        let query = Query::new(vec![], crate::expr::Boolean::not(eq).unwrap()).unwrap();
        let mut solver = FastCexSolver::new(Box::new(Unreachable));

        // WHEN
        let values = solver.compute_initial_values(&query).unwrap().unwrap();

        // THEN
        assert_eq!(
            values.value(&BitVector::variable("x", 8)),
            Some(&Constant::bit_vector_u64(42, 8))
        );
        assert!(!solver.compute_truth(&query).unwrap());
    }

    #[test]
    fn test_both_outcomes_found_gives_unknown() {
        let query = Query::new(
            vec![],
            BitVector::ult(x(), BitVector::constant_u64(10, 8)).unwrap(),
        )
        .unwrap();
        let mut solver = FastCexSolver::new(Box::new(Unreachable));

        assert_eq!(solver.compute_validity(&query).unwrap(), Validity::Unknown);
    }

    #[test]
    fn test_no_counter_example_delegates() {
        let query = Query::new(
            vec![],
            BitVector::ule(x(), BitVector::constant_u64(255, 8)).unwrap(),
        )
        .unwrap();
        let mut solver = FastCexSolver::new(Box::new(Unreachable));

        assert!(solver.compute_truth(&query).is_err());
    }

    #[test]
    fn test_only_satisfying_candidates_asks_for_truth() {
        // GIVEN: x = 3 |- x < 10, every candidate satisfying x = 3 makes the expression true
        let query = Query::new(
            vec![x_is_3()],
            BitVector::ult(x(), BitVector::constant_u64(10, 8)).unwrap(),
        )
        .unwrap();
        let mut valid = FastCexSolver::new(Box::new(Oracle {
            expected: query.clone(),
            truth: true,
        }));
        let mut open = FastCexSolver::new(Box::new(Oracle {
            expected: query.clone(),
            truth: false,
        }));

        // WHEN
        let validity = valid.compute_validity(&query).unwrap();
        let undecided = open.compute_validity(&query).unwrap();

        // THEN
        assert_eq!(validity, Validity::True);
        assert_eq!(undecided, Validity::Unknown);
    }

    #[test]
    fn test_only_falsifying_candidates_asks_for_negated_truth() {
        // GIVEN: x = 3 |- 10 <= x, every candidate satisfying x = 3 makes the expression false
        let query = Query::new(
            vec![x_is_3()],
            BitVector::ule(BitVector::constant_u64(10, 8), x()).unwrap(),
        )
        .unwrap();
        let negated = query.negate_expr().unwrap();
        let mut invalid = FastCexSolver::new(Box::new(Oracle {
            expected: negated.clone(),
            truth: true,
        }));
        let mut open = FastCexSolver::new(Box::new(Oracle {
            expected: negated,
            truth: false,
        }));

        // WHEN
        let validity = invalid.compute_validity(&query).unwrap();
        let undecided = open.compute_validity(&query).unwrap();

        // THEN
        assert_eq!(validity, Validity::False);
        assert_eq!(undecided, Validity::Unknown);
    }
}

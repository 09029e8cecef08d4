use crate::error::{ErrorKind, Result};
use crate::expr::Assignment;
use crate::query::{Query, Validity};
use crate::solver::{ConstraintLog, LogConfig, Solver};

/// Checks that every model returned by the wrapped solver is a counter-example of the query.
pub struct AssignmentValidatingSolver {
    solver: Box<dyn Solver>,
}

impl AssignmentValidatingSolver {
    pub fn new(solver: Box<dyn Solver>) -> Self {
        Self { solver }
    }

    fn validate(query: &Query, assignment: &Assignment) -> Result<()> {
        for (i, constraint) in query.constraints().iter().enumerate() {
            if !assignment.evaluate(constraint)?.unwrap_boolean()? {
                return Err(ErrorKind::InvalidAssignment(format!(
                    "constraint {} ({}) is violated by {}",
                    i, constraint, assignment
                ))
                .into());
            }
        }

        if assignment.evaluate(query.expr())?.unwrap_boolean()? {
            return Err(ErrorKind::InvalidAssignment(format!(
                "query expression {} holds under {}",
                query.expr(),
                assignment
            ))
            .into());
        }

        Ok(())
    }
}

impl Solver for AssignmentValidatingSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        self.solver.compute_truth(query)
    }

    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        self.solver.compute_validity(query)
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        let values = self.solver.compute_initial_values(query)?;
        if let Some(assignment) = &values {
            Self::validate(query, assignment)?;
        }
        Ok(values)
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        self.solver.render_log(query, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BitVector, Constant, Expression};

    struct ModelSolver {
        model: Assignment,
    }

    impl Solver for ModelSolver {
        fn compute_truth(&mut self, _query: &Query) -> Result<bool> {
            Ok(false)
        }

        fn compute_initial_values(&mut self, _query: &Query) -> Result<Option<Assignment>> {
            Ok(Some(self.model.clone()))
        }

        fn render_log(&self, _query: &Query, _config: Option<&LogConfig>) -> Result<ConstraintLog> {
            Ok(ConstraintLog::new(String::new(), "smt2"))
        }
    }

    fn query() -> Query {
        // x > 5 => x = 7
        let x: Expression = BitVector::variable("x", 8).into();
        Query::new(
            vec![BitVector::ult(BitVector::constant_u64(5, 8), x.clone()).unwrap()],
            Expression::equal(x, BitVector::constant_u64(7, 8)).unwrap(),
        )
        .unwrap()
    }

    fn solver_returning(x: u64) -> AssignmentValidatingSolver {
        let mut model = Assignment::new();
        model.assign(BitVector::variable("x", 8), Constant::bit_vector_u64(x, 8));
        AssignmentValidatingSolver::new(Box::new(ModelSolver { model }))
    }

    #[test]
    fn test_counter_example_is_accepted() {
        let mut solver = solver_returning(6);
        assert!(solver.compute_initial_values(&query()).unwrap().is_some());
    }

    #[test]
    fn test_model_violating_constraint_is_rejected() {
        // GIVEN
        let mut solver = solver_returning(2);

        // WHEN
        let result = solver.compute_initial_values(&query());

        // THEN
        match result.unwrap_err().kind() {
            ErrorKind::InvalidAssignment(_) => {}
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_model_satisfying_expression_is_rejected() {
        let mut solver = solver_returning(7);
        assert!(solver.compute_initial_values(&query()).is_err());
    }
}

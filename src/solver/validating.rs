use crate::error::{ErrorKind, Result};
use crate::expr::Assignment;
use crate::query::{Query, Validity};
use crate::solver::{ConstraintLog, LogConfig, Solver};

/// Asks both the wrapped solver and an oracle and fails if they disagree.
pub struct ValidatingSolver {
    solver: Box<dyn Solver>,
    oracle: Box<dyn Solver>,
}

impl ValidatingSolver {
    pub fn new(solver: Box<dyn Solver>, oracle: Box<dyn Solver>) -> Self {
        Self { solver, oracle }
    }
}

fn mismatch<T>(query: &Query, what: &str, answer: &str, expected: &str) -> Result<T> {
    Err(ErrorKind::SolverMismatch(format!(
        "{} of {} is {} but the oracle says {}",
        what, query, answer, expected
    ))
    .into())
}

impl Solver for ValidatingSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        let answer = self.solver.compute_truth(query)?;
        let expected = self.oracle.compute_truth(query)?;
        if answer != expected {
            return mismatch(query, "truth", &answer.to_string(), &expected.to_string());
        }
        Ok(answer)
    }

    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        let answer = self.solver.compute_validity(query)?;
        let expected = self.oracle.compute_validity(query)?;
        if answer != expected {
            return mismatch(query, "validity", &answer.to_string(), &expected.to_string());
        }
        Ok(answer)
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        let answer = self.solver.compute_initial_values(query)?;
        let expected = self.oracle.compute_initial_values(query)?;

        let describe = |values: &Option<Assignment>| match values {
            Some(_) => "solvable".to_owned(),
            None => "unsolvable".to_owned(),
        };
        if answer.is_some() != expected.is_some() {
            return mismatch(
                query,
                "initial values",
                &describe(&answer),
                &describe(&expected),
            );
        }

        // Models may differ, the answer only has to be a counter-example.
        if let Some(assignment) = &answer {
            if !assignment.satisfies(query.constraints())?
                || assignment.evaluate(query.expr())?.unwrap_boolean()?
            {
                return Err(ErrorKind::InvalidAssignment(format!(
                    "{} is no counter-example of {}",
                    assignment, query
                ))
                .into());
            }
        }

        Ok(answer)
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        self.solver.render_log(query, config)
    }
}

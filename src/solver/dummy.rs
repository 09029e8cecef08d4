use crate::error::{ErrorKind, Result};
use crate::expr::Assignment;
use crate::query::Query;
use crate::solver::{ConstraintLog, LogConfig, Solver};

/// A core solver which fails every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct DummySolver;

impl DummySolver {
    pub fn new() -> Self {
        Self
    }
}

fn failure<T>(operation: &str) -> Result<T> {
    Err(ErrorKind::SolverFailure(format!("dummy solver cannot {}", operation)).into())
}

impl Solver for DummySolver {
    fn compute_truth(&mut self, _query: &Query) -> Result<bool> {
        failure("compute truth")
    }

    fn compute_initial_values(&mut self, _query: &Query) -> Result<Option<Assignment>> {
        failure("compute initial values")
    }

    fn render_log(&self, _query: &Query, _config: Option<&LogConfig>) -> Result<ConstraintLog> {
        failure("render queries")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operation_fails() {
        let mut solver = DummySolver::new();
        let query = Query::trivially_true();

        assert!(solver.compute_truth(&query).is_err());
        assert!(solver.compute_validity(&query).is_err());
        assert!(solver.compute_initial_values(&query).is_err());
        assert!(solver.render_log(&query, None).is_err());
    }
}

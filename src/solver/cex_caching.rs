use crate::error::Result;
use crate::expr::{Assignment, Boolean, Expression};
use crate::query::Query;
use crate::solver::{ConstraintLog, LogConfig, Solver};
use std::collections::{BTreeMap, BTreeSet};

/// The formulas which must hold together: all constraints and the negated expression.
type Key = BTreeSet<Expression>;

/// Caches counter-examples and answers truth queries through them.
///
/// A key is unsatisfiable if any subset of it is, and satisfiable by any model of one of its
/// supersets. Other cached models are tried by evaluation before the wrapped solver is asked.
pub struct CexCachingSolver {
    solver: Box<dyn Solver>,
    cache: BTreeMap<Key, Option<Assignment>>,
}

impl CexCachingSolver {
    pub fn new(solver: Box<dyn Solver>) -> Self {
        Self {
            solver,
            cache: BTreeMap::new(),
        }
    }

    fn key(query: &Query) -> Result<Key> {
        let mut key: Key = query.constraints().iter().cloned().collect();
        key.insert(Boolean::not(query.expr().clone())?);
        Ok(key)
    }

    fn lookup(&self, key: &Key) -> Result<Option<Option<Assignment>>> {
        if let Some(result) = self.cache.get(key) {
            return Ok(Some(result.clone()));
        }

        let unsat_subset = self
            .cache
            .iter()
            .any(|(cached, result)| result.is_none() && cached.is_subset(key));
        if unsat_subset {
            return Ok(Some(None));
        }

        let sat_superset = self
            .cache
            .iter()
            .find(|(cached, result)| result.is_some() && cached.is_superset(key));
        if let Some((_, result)) = sat_superset {
            return Ok(Some(result.clone()));
        }

        let formulas: Vec<Expression> = key.iter().cloned().collect();
        for assignment in self.cache.values().flatten() {
            if assignment.satisfies(&formulas)? {
                return Ok(Some(Some(assignment.clone())));
            }
        }

        Ok(None)
    }

    fn assignment(&mut self, query: &Query) -> Result<Option<Assignment>> {
        let key = Self::key(query)?;

        if let Some(result) = self.lookup(&key)? {
            log::debug!("Counter-example cache hit for {}", query);
            self.cache.insert(key, result.clone());
            return Ok(result);
        }

        let result = self.solver.compute_initial_values(query)?;
        self.cache.insert(key, result.clone());
        Ok(result)
    }
}

impl Solver for CexCachingSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        Ok(self.assignment(query)?.is_none())
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        self.assignment(query)
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        self.solver.render_log(query, config)
    }
}

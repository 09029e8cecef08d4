use crate::error::Result;
use crate::expr::{Assignment, Boolean, Expression, Operator};
use crate::query::{Query, Validity};
use crate::solver::{ConstraintLog, LogConfig, Solver};
use std::collections::{BTreeSet, HashMap};

/// What is known about the validity of a cached query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PartialValidity {
    True,
    False,
    Unknown,
    /// The expression is not valid, it may or may not be unsatisfiable.
    MayBeFalse,
    /// The negated expression is not valid.
    MayBeTrue,
}

impl PartialValidity {
    fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
            Self::MayBeFalse => Self::MayBeTrue,
            Self::MayBeTrue => Self::MayBeFalse,
        }
    }

    fn validity(self) -> Option<Validity> {
        match self {
            Self::True => Some(Validity::True),
            Self::False => Some(Validity::False),
            Self::Unknown => Some(Validity::Unknown),
            Self::MayBeFalse | Self::MayBeTrue => None,
        }
    }

    fn truth(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False | Self::Unknown | Self::MayBeFalse => Some(false),
            Self::MayBeTrue => None,
        }
    }
}

impl From<Validity> for PartialValidity {
    fn from(validity: Validity) -> Self {
        match validity {
            Validity::True => Self::True,
            Validity::False => Self::False,
            Validity::Unknown => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
struct CacheEntry {
    constraints: BTreeSet<Expression>,
    expr: Expression,
}

/// Caches truth and validity results.
///
/// `e` and `not e` under the same constraints share one entry, the result for the negated
/// form is negated on the way in and out.
pub struct CachingSolver {
    solver: Box<dyn Solver>,
    cache: HashMap<CacheEntry, PartialValidity>,
}

impl CachingSolver {
    pub fn new(solver: Box<dyn Solver>) -> Self {
        Self {
            solver,
            cache: HashMap::new(),
        }
    }

    /// Returns the canonical entry of `query` and whether its expression was negated.
    fn entry(query: &Query) -> (CacheEntry, bool) {
        let constraints = query.constraints().iter().cloned().collect();
        let expr = query.expr();
        match expr.operator() {
            Operator::Boolean(Boolean::Not) => (
                CacheEntry {
                    constraints,
                    expr: expr.operands()[0].clone(),
                },
                true,
            ),
            _ => (
                CacheEntry {
                    constraints,
                    expr: expr.clone(),
                },
                false,
            ),
        }
    }

    fn lookup(&self, entry: &CacheEntry, negated: bool) -> Option<PartialValidity> {
        self.cache
            .get(entry)
            .map(|&result| if negated { result.negate() } else { result })
    }

    fn store(&mut self, entry: CacheEntry, negated: bool, result: PartialValidity) {
        let result = if negated { result.negate() } else { result };
        self.cache.insert(entry, result);
    }
}

impl Solver for CachingSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        let (entry, negated) = Self::entry(query);
        let cached = self.lookup(&entry, negated);

        if let Some(truth) = cached.and_then(PartialValidity::truth) {
            log::debug!("Cache hit for truth of {}", query);
            return Ok(truth);
        }

        let is_valid = self.solver.compute_truth(query)?;
        if is_valid {
            self.store(entry, negated, PartialValidity::True);
        } else if cached.is_none() {
            self.store(entry, negated, PartialValidity::MayBeFalse);
        } else {
            // MayBeTrue and MayBeFalse together.
            self.store(entry, negated, PartialValidity::Unknown);
        }
        Ok(is_valid)
    }

    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        let (entry, negated) = Self::entry(query);

        if let Some(validity) = self
            .lookup(&entry, negated)
            .and_then(PartialValidity::validity)
        {
            log::debug!("Cache hit for validity of {}", query);
            return Ok(validity);
        }

        let validity = self.solver.compute_validity(query)?;
        self.store(entry, negated, validity.into());
        Ok(validity)
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        self.solver.compute_initial_values(query)
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        self.solver.render_log(query, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BitVector;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Claims `x < 10` is valid and anything else is not.
    struct CountingSolver {
        calls: Rc<Cell<usize>>,
    }

    impl Solver for CountingSolver {
        fn compute_truth(&mut self, query: &Query) -> Result<bool> {
            self.calls.set(self.calls.get() + 1);
            Ok(query.expr() == &x_lt_10())
        }

        fn compute_initial_values(&mut self, _query: &Query) -> Result<Option<Assignment>> {
            Ok(None)
        }

        fn render_log(&self, _query: &Query, _config: Option<&LogConfig>) -> Result<ConstraintLog> {
            Ok(ConstraintLog::new(String::new(), "smt2"))
        }
    }

    fn x_lt_10() -> Expression {
        BitVector::ult(
            BitVector::variable("x", 8).into(),
            BitVector::constant_u64(10, 8),
        )
        .unwrap()
    }

    fn caching_solver() -> (CachingSolver, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let solver = CachingSolver::new(Box::new(CountingSolver {
            calls: Rc::clone(&calls),
        }));
        (solver, calls)
    }

    #[test]
    fn test_validity_is_cached() {
        // GIVEN
        let (mut solver, calls) = caching_solver();
        let query = Query::new(vec![], x_lt_10()).unwrap();

        // WHEN
        let first = solver.compute_validity(&query).unwrap();
        let second = solver.compute_validity(&query).unwrap();

        // THEN
        assert_eq!(first, Validity::True);
        assert_eq!(second, Validity::True);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_negated_query_shares_entry() {
        // GIVEN
        let (mut solver, calls) = caching_solver();
        let query = Query::new(vec![], x_lt_10()).unwrap();
        solver.compute_validity(&query).unwrap();

        // WHEN
        let negated = solver.compute_validity(&query.negate_expr().unwrap()).unwrap();
        let truth = solver.compute_truth(&query.negate_expr().unwrap()).unwrap();

        // THEN
        assert_eq!(negated, Validity::False);
        assert!(!truth);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_invalid_truth_does_not_answer_validity() {
        // GIVEN
        let (mut solver, calls) = caching_solver();
        let query = Query::new(vec![], Boolean::variable("b").into()).unwrap();
        assert!(!solver.compute_truth(&query).unwrap());

        // WHEN
        assert!(!solver.compute_truth(&query).unwrap());
        let validity = solver.compute_validity(&query).unwrap();

        // THEN: the repeated truth query is a hit, validity needs two more solver calls
        assert_eq!(validity, Validity::Unknown);
        assert_eq!(calls.get(), 3);
    }
}

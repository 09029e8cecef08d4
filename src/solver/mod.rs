use crate::environment::CoreSolver;
use crate::error::{ErrorKind, Result};
use crate::expr::Assignment;
use crate::query::{Query, Validity};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

mod ackermann;
mod assignment_validating;
mod caching;
mod cex_caching;
mod chain;
mod dummy;
mod fast_cex;
mod independent;
mod logging;
mod rsmt;
mod validating;

pub use self::ackermann::ackermannize;
pub use self::assignment_validating::AssignmentValidatingSolver;
pub use self::caching::CachingSolver;
pub use self::cex_caching::CexCachingSolver;
pub use self::chain::{construct_solver_chain, solver_path};
pub use self::dummy::DummySolver;
pub use self::fast_cex::FastCexSolver;
pub use self::independent::IndependentSolver;
pub use self::logging::{Dialect, QueryLoggingSolver, QueryType};
pub use self::rsmt::RSMTSolver;
pub use self::validating::ValidatingSolver;

/// Rendering options of the Z3 query dialect.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Z3LogConfig {
    /// Eliminate array reads with the Ackermann reduction.
    pub ackermannize_arrays: bool,
    /// Use `fp.to_ieee_bv` when converting floating-point terms.
    pub use_to_ieee_bv_function: bool,
}

/// Backend specific rendering choices for `Solver::render_log`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LogConfig {
    Z3(Z3LogConfig),
}

/// A query rendered in a solver's native language.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConstraintLog {
    pub text: String,
    /// Canonical file extension of the language, without a leading dot.
    pub extension: String,
}

impl ConstraintLog {
    pub fn new<S: Into<String>>(text: String, extension: S) -> Self {
        Self {
            text,
            extension: extension.into(),
        }
    }
}

/// The capability shared by core solvers and all decorators wrapping them.
///
/// Errors raised by a wrapped solver must be passed on unchanged.
pub trait Solver {
    /// Returns whether the query expression holds for every solution of the constraints.
    fn compute_truth(&mut self, query: &Query) -> Result<bool>;

    /// Determines whether the query expression must be true, must be false, or may be either.
    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        if self.compute_truth(query)? {
            return Ok(Validity::True);
        }
        if self.compute_truth(&query.negate_expr()?)? {
            Ok(Validity::False)
        } else {
            Ok(Validity::Unknown)
        }
    }

    /// Returns a solution of the constraints for which the query expression is false,
    /// or `None` if no such solution exists.
    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>>;

    /// Renders `query` in the solver's language.
    ///
    /// Rendering has no side effects, so it can be used to probe the language's file extension.
    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog>;
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        (**self).compute_truth(query)
    }

    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        (**self).compute_validity(query)
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        (**self).compute_initial_values(query)
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        (**self).render_log(query, config)
    }
}

/// A handle to a solver which is reachable from more than one place.
///
/// The solver chain uses this for the undecorated core solver, which sits at the bottom of
/// the chain and also serves as oracle for the validating solver.
#[derive(Clone)]
pub struct SharedSolver {
    solver: Rc<RefCell<Box<dyn Solver>>>,
}

impl SharedSolver {
    pub fn new(solver: Box<dyn Solver>) -> Self {
        Self {
            solver: Rc::new(RefCell::new(solver)),
        }
    }
}

impl fmt::Debug for SharedSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSolver({} handles)", Rc::strong_count(&self.solver))
    }
}

impl Solver for SharedSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        self.solver.borrow_mut().compute_truth(query)
    }

    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        self.solver.borrow_mut().compute_validity(query)
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        self.solver.borrow_mut().compute_initial_values(query)
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        self.solver.borrow().render_log(query, config)
    }
}

/// Creates core solvers, e.g. the oracle of a cross-check.
pub trait CoreSolverFactory {
    fn create_core_solver(&self, kind: CoreSolver) -> Result<Box<dyn Solver>>;
}

/// Creates core solvers which drive an external SMT solver process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmtSolverFactory;

impl SmtSolverFactory {
    /// Returns whether support for `kind` was compiled in.
    pub fn is_supported(kind: CoreSolver) -> bool {
        match kind {
            CoreSolver::Z3 => cfg!(feature = "z3"),
            CoreSolver::CVC4 => cfg!(feature = "cvc4"),
            CoreSolver::Yices2 => cfg!(feature = "yices2"),
            CoreSolver::Dummy => true,
        }
    }
}

impl CoreSolverFactory for SmtSolverFactory {
    fn create_core_solver(&self, kind: CoreSolver) -> Result<Box<dyn Solver>> {
        if !Self::is_supported(kind) {
            return Err(ErrorKind::UnsupportedSolver(kind.to_string()).into());
        }

        match kind {
            CoreSolver::Dummy => Ok(Box::new(DummySolver::new())),
            _ => Ok(Box::new(RSMTSolver::new(kind)?)),
        }
    }
}

pub fn create_core_solver(kind: CoreSolver) -> Result<Box<dyn Solver>> {
    SmtSolverFactory.create_core_solver(kind)
}

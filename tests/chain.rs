use solver_chain::diagnostics::RecordingDiagnostics;
use solver_chain::environment::{
    CoreSolver, LogPaths, QueryLogging, SolverOptions, SolverOptionsBuilder,
};
use solver_chain::error::{ErrorKind, Result};
use solver_chain::expr::{Assignment, BitVector, Constant, Expression};
use solver_chain::query::{Query, Validity};
use solver_chain::solver::{
    construct_solver_chain, ConstraintLog, CoreSolverFactory, DummySolver, LogConfig,
    SmtSolverFactory, Solver, Z3LogConfig,
};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Core solver which records every request.
///
/// It only ever considers the all-zero assignment, which is enough to answer the small
/// queries used here consistently.
#[derive(Clone, Default)]
struct RecordingSolver {
    calls: Rc<RefCell<Vec<String>>>,
    configs: Rc<RefCell<Vec<Option<LogConfig>>>>,
}

impl RecordingSolver {
    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn configs(&self) -> Vec<Option<LogConfig>> {
        self.configs.borrow().clone()
    }

    fn counter_example(query: &Query) -> Result<Option<Assignment>> {
        let mut zero = Assignment::new();
        for variable in query.variables() {
            zero.assign(variable.clone(), Constant::zero(variable.sort()));
        }
        if zero.satisfies(query.constraints())? && !zero.evaluate(query.expr())?.unwrap_boolean()?
        {
            Ok(Some(zero))
        } else {
            Ok(None)
        }
    }
}

impl Solver for RecordingSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        self.calls.borrow_mut().push("truth".to_owned());
        Ok(Self::counter_example(query)?.is_none())
    }

    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        self.calls.borrow_mut().push("validity".to_owned());
        if Self::counter_example(query)?.is_none() {
            Ok(Validity::True)
        } else if Self::counter_example(&query.negate_expr()?)?.is_none() {
            Ok(Validity::False)
        } else {
            Ok(Validity::Unknown)
        }
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        self.calls.borrow_mut().push("initial_values".to_owned());
        Self::counter_example(query)
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        self.configs.borrow_mut().push(config.cloned());
        Ok(ConstraintLog::new(
            solver_chain::smtlib::render_query(query),
            "smt2",
        ))
    }
}

/// Factory which cannot create any solver.
struct NoSolvers;

impl CoreSolverFactory for NoSolvers {
    fn create_core_solver(&self, kind: CoreSolver) -> Result<Box<dyn Solver>> {
        Err(ErrorKind::UnsupportedSolver(kind.to_string()).into())
    }
}

fn log_paths(dir: &Path) -> LogPaths {
    let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
    LogPaths {
        query_smt2: path("all.smt2"),
        base_solver_query_smt2: path("base.smt2"),
        query_kquery: path("all.kquery"),
        base_solver_query_kquery: path("base.kquery"),
        query_core_solver_lang: path("all-core."),
        base_core_solver_lang: path("base-core."),
    }
}

fn plain_options() -> SolverOptionsBuilder {
    let mut builder = SolverOptionsBuilder::default();
    builder
        .use_cex_cache(false)
        .use_cache(false)
        .use_independent_solver(false);
    builder
}

fn logging(logs: &[QueryLogging]) -> BTreeSet<QueryLogging> {
    logs.iter().cloned().collect()
}

fn x() -> Expression {
    BitVector::variable("x", 8).into()
}

fn lt(lhs: Expression, value: u64) -> Expression {
    BitVector::ult(lhs, BitVector::constant_u64(value, 8)).unwrap()
}

fn file_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_every_log_toggle_creates_its_file() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let core = RecordingSolver::default();
    let options = SolverOptionsBuilder::default()
        .query_logging(QueryLogging::all().into_iter().collect())
        .build()
        .unwrap();
    let mut diagnostics = RecordingDiagnostics::new();

    // WHEN
    let solver = construct_solver_chain(
        Box::new(core.clone()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut diagnostics,
    )
    .unwrap();
    drop(solver);

    // THEN
    let expected: BTreeSet<String> = [
        "base.kquery",
        "base.smt2",
        "base-core.smt2",
        "base-core.no_fp_to_ieee_bv.smt2",
        "base-core.aa.smt2",
        "base-core.aa.no_fp_to_ieee_bv.smt2",
        "all.kquery",
        "all.smt2",
        "all-core.smt2",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect();
    assert_eq!(file_names(dir.path()), expected);

    // nine logs, counter-example cache, query cache, independence
    assert_eq!(diagnostics.messages.len(), 12);
    assert!(diagnostics.warnings.is_empty());

    let z3 = |ackermannize_arrays, use_to_ieee_bv_function| {
        Some(LogConfig::Z3(Z3LogConfig {
            ackermannize_arrays,
            use_to_ieee_bv_function,
        }))
    };
    assert_eq!(
        core.configs(),
        vec![
            z3(false, true),
            z3(false, false),
            z3(true, true),
            z3(true, false),
            z3(false, true),
        ]
    );
    assert!(core.calls().is_empty());
}

#[test]
fn test_core_solver_lang_path_joins_base_infix_and_extension() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let mut paths = log_paths(dir.path());
    paths.base_core_solver_lang = dir.path().join("q").to_string_lossy().into_owned();
    let options = plain_options()
        .query_logging(logging(&[QueryLogging::SolverCoreSolverLangAaNoFpToIeeeBv]))
        .build()
        .unwrap();
    let mut diagnostics = RecordingDiagnostics::new();

    // WHEN
    construct_solver_chain(
        Box::new(RecordingSolver::default()),
        &options,
        &paths,
        &NoSolvers,
        &mut diagnostics,
    )
    .unwrap();

    // THEN
    let expected = dir.path().join("qaa.no_fp_to_ieee_bv.smt2");
    assert!(expected.is_file());
    assert_eq!(
        diagnostics.messages,
        vec![format!(
            "Logging all (might be ackermannized) queries avoiding use of fp.to_ieee_bv in core solver's language to {}",
            expected.display()
        )]
    );
}

#[test]
fn test_ackermannization_against_other_core_warns_and_still_logs() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let core = RecordingSolver::default();
    let options = plain_options()
        .core_solver(CoreSolver::CVC4)
        .query_logging(logging(&[QueryLogging::SolverCoreSolverLangAa]))
        .build()
        .unwrap();
    let mut diagnostics = RecordingDiagnostics::new();

    // WHEN
    let mut solver = construct_solver_chain(
        Box::new(core.clone()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut diagnostics,
    )
    .unwrap();
    solver
        .compute_truth(&Query::new(vec![], lt(x(), 3)).unwrap())
        .unwrap();
    drop(solver);

    // THEN
    assert_eq!(
        diagnostics.warnings,
        vec!["Core solver is not Z3, cannot ackermannize arrays".to_owned()]
    );
    assert_eq!(core.configs(), vec![None, None]);
    let log = fs::read_to_string(dir.path().join("base-core.aa.smt2")).unwrap();
    assert!(log.contains("; Query 0 -- Type: Truth"));
}

#[test]
fn test_cex_cache_answers_truth_through_models() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let core = RecordingSolver::default();
    let options = plain_options().use_cex_cache(true).build().unwrap();
    let mut solver = construct_solver_chain(
        Box::new(core.clone()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut RecordingDiagnostics::new(),
    )
    .unwrap();

    // WHEN
    let query = Query::new(vec![], lt(x(), 3)).unwrap();
    assert!(solver.compute_truth(&query).unwrap());
    assert!(solver.compute_truth(&query).unwrap());

    // THEN
    assert_eq!(core.calls(), vec!["initial_values"]);
}

#[test]
fn test_query_cache_forwards_truth_and_validity() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let core = RecordingSolver::default();
    let options = plain_options().use_cache(true).build().unwrap();
    let mut solver = construct_solver_chain(
        Box::new(core.clone()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut RecordingDiagnostics::new(),
    )
    .unwrap();

    // WHEN
    let proven = Query::new(vec![], lt(x(), 3)).unwrap();
    let other = Query::new(vec![], lt(x(), 200)).unwrap();
    assert!(solver.compute_truth(&proven).unwrap());
    assert_eq!(solver.compute_validity(&proven).unwrap(), Validity::True);
    assert_eq!(solver.compute_validity(&other).unwrap(), Validity::True);
    assert_eq!(solver.compute_validity(&other).unwrap(), Validity::True);

    // THEN: a proven truth also answers validity
    assert_eq!(core.calls(), vec!["truth", "validity"]);
}

#[test]
fn test_query_cache_sees_independence_reduced_queries() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let core = RecordingSolver::default();
    let options = plain_options()
        .use_cache(true)
        .use_independent_solver(true)
        .build()
        .unwrap();
    let mut solver = construct_solver_chain(
        Box::new(core.clone()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut RecordingDiagnostics::new(),
    )
    .unwrap();
    let y: Expression = BitVector::variable("y", 8).into();
    let z: Expression = BitVector::variable("z", 8).into();

    // WHEN: the queries only differ in constraints unrelated to x
    let first = Query::new(vec![lt(x(), 5), lt(y, 3)], lt(x(), 10)).unwrap();
    let second = Query::new(vec![lt(x(), 5), lt(z, 7)], lt(x(), 10)).unwrap();
    solver.compute_truth(&first).unwrap();
    solver.compute_truth(&second).unwrap();

    // THEN
    assert_eq!(core.calls(), vec!["truth"]);
}

#[test]
fn test_debug_validation_asks_core_solver_again() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let core = RecordingSolver::default();
    let options = plain_options().debug_validate_solver(true).build().unwrap();
    let mut solver = construct_solver_chain(
        Box::new(core.clone()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut RecordingDiagnostics::new(),
    )
    .unwrap();
    let query = Query::new(vec![], lt(x(), 3)).unwrap();

    // WHEN
    solver.compute_truth(&query).unwrap();
    solver.compute_validity(&query).unwrap();
    solver.compute_initial_values(&query).unwrap();

    // THEN
    assert_eq!(
        core.calls(),
        vec![
            "truth",
            "truth",
            "validity",
            "validity",
            "initial_values",
            "initial_values"
        ]
    );
}

#[test]
fn test_debug_validation_asks_core_solver_once_behind_caches() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let core = RecordingSolver::default();
    let options = SolverOptionsBuilder::default()
        .use_cex_cache(true)
        .use_cache(true)
        .use_independent_solver(true)
        .debug_validate_solver(true)
        .build()
        .unwrap();
    let mut solver = construct_solver_chain(
        Box::new(core.clone()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut RecordingDiagnostics::new(),
    )
    .unwrap();
    let query = Query::new(vec![], lt(x(), 3)).unwrap();

    // WHEN
    assert!(solver.compute_truth(&query).unwrap());
    assert!(solver.compute_truth(&query).unwrap());

    // THEN: the repeated query is a cache hit, so only the validation reaches the core
    assert_eq!(core.calls(), vec!["initial_values", "truth", "truth"]);
}

#[test]
fn test_separate_constructions_share_nothing() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let options = SolverOptions::default();
    let first_core = RecordingSolver::default();
    let second_core = RecordingSolver::default();
    let build = |core: &RecordingSolver| {
        construct_solver_chain(
            Box::new(core.clone()),
            &options,
            &log_paths(dir.path()),
            &NoSolvers,
            &mut RecordingDiagnostics::new(),
        )
        .unwrap()
    };
    let mut first = build(&first_core);
    let mut second = build(&second_core);
    let query = Query::new(vec![], lt(x(), 3)).unwrap();

    // WHEN
    first.compute_truth(&query).unwrap();
    second.compute_truth(&query).unwrap();
    first.compute_truth(&query).unwrap();
    drop(first);
    let truth = second.compute_truth(&query).unwrap();
    let validity = second
        .compute_validity(&Query::new(vec![], lt(x(), 200)).unwrap())
        .unwrap();

    // THEN: the second chain keeps its cache and its core after the first is gone
    assert!(truth);
    assert_eq!(validity, Validity::True);
    assert_eq!(first_core.calls(), vec!["initial_values"]);
    assert_eq!(second_core.calls(), vec!["initial_values", "initial_values"]);
}

#[test]
fn test_failing_probe_aborts_construction() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let options = plain_options()
        .query_logging(logging(&[
            QueryLogging::SolverKQuery,
            QueryLogging::SolverCoreSolverLang,
        ]))
        .build()
        .unwrap();
    let mut diagnostics = RecordingDiagnostics::new();

    // WHEN
    let result = construct_solver_chain(
        Box::new(DummySolver::new()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut diagnostics,
    );

    // THEN
    match result.err().map(|e| e.kind().to_string()) {
        Some(message) => assert!(message.contains("solver:core"), "{}", message),
        None => panic!("construction should fail"),
    }
    let expected: BTreeSet<String> = vec!["base.kquery".to_owned()].into_iter().collect();
    assert_eq!(file_names(dir.path()), expected);
    assert_eq!(diagnostics.messages.len(), 1);
}

#[test]
fn test_unopenable_log_file_names_the_path() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let mut paths = log_paths(dir.path());
    paths.query_kquery = dir
        .path()
        .join("missing")
        .join("all.kquery")
        .to_string_lossy()
        .into_owned();
    let options = plain_options()
        .query_logging(logging(&[QueryLogging::AllKQuery]))
        .build()
        .unwrap();

    // WHEN
    let result = construct_solver_chain(
        Box::new(RecordingSolver::default()),
        &options,
        &paths,
        &NoSolvers,
        &mut RecordingDiagnostics::new(),
    );

    // THEN
    let error = result.err().expect("construction should fail");
    assert!(error.to_string().contains("all:kquery"));
    let causes: Vec<String> = error.iter().map(|cause| cause.to_string()).collect();
    assert!(causes.iter().any(|cause| cause.contains(&paths.query_kquery)));
}

#[test]
fn test_unavailable_cross_check_solver_aborts_construction() {
    let dir = tempfile::tempdir().unwrap();
    let options = plain_options()
        .cross_check_core_solver(Some(CoreSolver::Yices2))
        .build()
        .unwrap();

    let result = construct_solver_chain(
        Box::new(RecordingSolver::default()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut RecordingDiagnostics::new(),
    );

    assert!(result.is_err());
}

#[test]
fn test_cross_check_oracle_errors_pass_through() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let core = RecordingSolver::default();
    let options = plain_options()
        .cross_check_core_solver(Some(CoreSolver::Dummy))
        .build()
        .unwrap();
    let mut solver = construct_solver_chain(
        Box::new(core.clone()),
        &options,
        &log_paths(dir.path()),
        &SmtSolverFactory,
        &mut RecordingDiagnostics::new(),
    )
    .unwrap();

    // WHEN
    let result = solver.compute_truth(&Query::new(vec![], lt(x(), 3)).unwrap());

    // THEN
    match result.unwrap_err().kind() {
        ErrorKind::SolverFailure(_) => {}
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(core.calls(), vec!["truth"]);
}

#[test]
fn test_full_log_sees_queries_answered_by_caches() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let options = SolverOptionsBuilder::default()
        .query_logging(logging(&[
            QueryLogging::SolverKQuery,
            QueryLogging::AllKQuery,
        ]))
        .build()
        .unwrap();
    let mut solver = construct_solver_chain(
        Box::new(RecordingSolver::default()),
        &options,
        &log_paths(dir.path()),
        &NoSolvers,
        &mut RecordingDiagnostics::new(),
    )
    .unwrap();
    let query = Query::new(vec![lt(x(), 5)], lt(x(), 10)).unwrap();

    // WHEN
    solver.compute_truth(&query).unwrap();
    solver.compute_truth(&query).unwrap();
    drop(solver);

    // THEN
    let count = |name: &str| {
        fs::read_to_string(dir.path().join(name))
            .unwrap()
            .matches("# Query ")
            .count()
    };
    assert_eq!(count("all.kquery"), 2);
    assert_eq!(count("base.kquery"), 1);
}

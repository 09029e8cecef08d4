use crate::diagnostics::Diagnostics;
use crate::environment::{CoreSolver, LogPaths, QueryLogging, SolverOptions};
use crate::error::{ErrorKind, Result, ResultExt};
use crate::query::Query;
use crate::solver::{
    AssignmentValidatingSolver, CachingSolver, CexCachingSolver, CoreSolverFactory,
    FastCexSolver, IndependentSolver, LogConfig, QueryLoggingSolver, SharedSolver, Solver,
    ValidatingSolver, Z3LogConfig,
};

/// Returns `base`, followed by `infix`, followed by the file extension of `solver`'s
/// language under `config`.
///
/// The extension is found by rendering a trivial query, the rendered text is discarded.
pub fn solver_path(
    solver: &dyn Solver,
    base: &str,
    config: Option<&LogConfig>,
    infix: Option<&str>,
) -> Result<String> {
    let log = solver.render_log(&Query::trivially_true(), config)?;
    Ok(format!("{}{}{}", base, infix.unwrap_or(""), log.extension))
}

/// A log of the queries reaching the core solver, in the core solver's language.
struct CoreSolverLangLog {
    logging: QueryLogging,
    ackermannize_arrays: bool,
    use_to_ieee_bv_function: bool,
    infix: Option<&'static str>,
    description: &'static str,
}

const CORE_SOLVER_LANG_LOGS: [CoreSolverLangLog; 4] = [
    CoreSolverLangLog {
        logging: QueryLogging::SolverCoreSolverLang,
        ackermannize_arrays: false,
        use_to_ieee_bv_function: true,
        infix: None,
        description: "Logging queries that reach solver in core solver's language",
    },
    CoreSolverLangLog {
        logging: QueryLogging::SolverCoreSolverLangNoFpToIeeeBv,
        ackermannize_arrays: false,
        use_to_ieee_bv_function: false,
        infix: Some("no_fp_to_ieee_bv."),
        description: "Logging queries that reach solver avoiding use of fp.to_ieee_bv in core solver's language",
    },
    CoreSolverLangLog {
        logging: QueryLogging::SolverCoreSolverLangAa,
        ackermannize_arrays: true,
        use_to_ieee_bv_function: true,
        infix: Some("aa."),
        description: "Logging all (might be ackermannized) queries in core solver's language",
    },
    CoreSolverLangLog {
        logging: QueryLogging::SolverCoreSolverLangAaNoFpToIeeeBv,
        ackermannize_arrays: true,
        use_to_ieee_bv_function: false,
        infix: Some("aa.no_fp_to_ieee_bv."),
        description: "Logging all (might be ackermannized) queries avoiding use of fp.to_ieee_bv in core solver's language",
    },
];

/// The rendering options for the core solver's language.
///
/// Only Z3 has options; requesting ackermannization from another core solver is reported and
/// ignored.
fn z3_config(
    core_solver: CoreSolver,
    ackermannize_arrays: bool,
    use_to_ieee_bv_function: bool,
    diagnostics: &mut dyn Diagnostics,
) -> Option<LogConfig> {
    if core_solver == CoreSolver::Z3 {
        return Some(LogConfig::Z3(Z3LogConfig {
            ackermannize_arrays,
            use_to_ieee_bv_function,
        }));
    }
    if ackermannize_arrays {
        diagnostics.warning("Core solver is not Z3, cannot ackermannize arrays");
    }
    None
}

fn stage(name: &str) -> ErrorKind {
    ErrorKind::ChainConstruction(name.to_owned())
}

/// Wraps `core_solver` into the decorators enabled by `options`.
///
/// The decorators are applied in a fixed order: logs of the queries reaching the core solver,
/// assignment validation, the fast counter-example search, the counter-example cache, the
/// query cache, independence splitting, validation against the core solver, logs of all
/// queries and finally cross-checking against a second core solver created by `factory`.
///
/// Log files are created while building. On error everything built so far is dropped.
pub fn construct_solver_chain(
    core_solver: Box<dyn Solver>,
    options: &SolverOptions,
    paths: &LogPaths,
    factory: &dyn CoreSolverFactory,
    diagnostics: &mut dyn Diagnostics,
) -> Result<Box<dyn Solver>> {
    let core = SharedSolver::new(core_solver);
    let mut solver: Box<dyn Solver> = Box::new(core.clone());

    let logging = &options.query_logging;
    let min_query_time_to_log = options.min_query_time_to_log;

    if logging.contains(&QueryLogging::SolverKQuery) {
        let path = &paths.base_solver_query_kquery;
        solver = Box::new(
            QueryLoggingSolver::kquery(solver, path, min_query_time_to_log)
                .chain_err(|| stage(QueryLogging::SolverKQuery.name()))?,
        );
        diagnostics.message(&format!(
            "Logging queries that reach solver in .kquery format to {}",
            path
        ));
    }

    if logging.contains(&QueryLogging::SolverSmtLib) {
        let path = &paths.base_solver_query_smt2;
        solver = Box::new(
            QueryLoggingSolver::smtlib(solver, path, min_query_time_to_log)
                .chain_err(|| stage(QueryLogging::SolverSmtLib.name()))?,
        );
        diagnostics.message(&format!(
            "Logging queries that reach solver in .smt2 format to {}",
            path
        ));
    }

    for lang_log in &CORE_SOLVER_LANG_LOGS {
        if !logging.contains(&lang_log.logging) {
            continue;
        }

        let config = z3_config(
            options.core_solver,
            lang_log.ackermannize_arrays,
            lang_log.use_to_ieee_bv_function,
            diagnostics,
        );
        let path = solver_path(
            solver.as_ref(),
            &paths.base_core_solver_lang,
            config.as_ref(),
            lang_log.infix,
        )
        .chain_err(|| stage(lang_log.logging.name()))?;
        solver = Box::new(
            QueryLoggingSolver::core_solver_lang(solver, &path, min_query_time_to_log, config)
                .chain_err(|| stage(lang_log.logging.name()))?,
        );
        diagnostics.message(&format!("{} to {}", lang_log.description, path));
    }

    if options.use_assignment_validating_solver {
        solver = Box::new(AssignmentValidatingSolver::new(solver));
        diagnostics.message("Validating assignments computed by the solver");
    }

    if options.use_fast_cex_solver {
        solver = Box::new(FastCexSolver::new(solver));
        diagnostics.message("Using fast counter-example search");
    }

    if options.use_cex_cache {
        solver = Box::new(CexCachingSolver::new(solver));
        diagnostics.message("Using counter-example cache");
    }

    if options.use_cache {
        solver = Box::new(CachingSolver::new(solver));
        diagnostics.message("Using query cache");
    }

    if options.use_independent_solver {
        solver = Box::new(IndependentSolver::new(solver));
        diagnostics.message("Splitting queries into independent constraint sets");
    }

    if options.debug_validate_solver {
        solver = Box::new(ValidatingSolver::new(solver, Box::new(core.clone())));
        diagnostics.message("Validating solver results against the core solver");
    }

    if logging.contains(&QueryLogging::AllKQuery) {
        let path = &paths.query_kquery;
        solver = Box::new(
            QueryLoggingSolver::kquery(solver, path, min_query_time_to_log)
                .chain_err(|| stage(QueryLogging::AllKQuery.name()))?,
        );
        diagnostics.message(&format!(
            "Logging all queries in .kquery format to {}",
            path
        ));
    }

    if logging.contains(&QueryLogging::AllSmtLib) {
        let path = &paths.query_smt2;
        solver = Box::new(
            QueryLoggingSolver::smtlib(solver, path, min_query_time_to_log)
                .chain_err(|| stage(QueryLogging::AllSmtLib.name()))?,
        );
        diagnostics.message(&format!("Logging all queries in .smt2 format to {}", path));
    }

    if logging.contains(&QueryLogging::AllCoreSolverLang) {
        let config = z3_config(options.core_solver, false, true, diagnostics);
        let path = solver_path(
            solver.as_ref(),
            &paths.query_core_solver_lang,
            config.as_ref(),
            None,
        )
        .chain_err(|| stage(QueryLogging::AllCoreSolverLang.name()))?;
        solver = Box::new(
            QueryLoggingSolver::core_solver_lang(solver, &path, min_query_time_to_log, config)
                .chain_err(|| stage(QueryLogging::AllCoreSolverLang.name()))?,
        );
        diagnostics.message(&format!(
            "Logging all queries in core solver's language to {}",
            path
        ));
    }

    if let Some(kind) = options.cross_check_core_solver {
        let oracle = factory
            .create_core_solver(kind)
            .chain_err(|| stage("cross-check"))?;
        solver = Box::new(ValidatingSolver::new(solver, oracle));
        diagnostics.message(&format!("Cross-checking solver results with {}", kind));
    }

    Ok(solver)
}

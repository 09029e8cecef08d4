#[macro_use]
extern crate clap;
use clap::{Arg, ArgMatches};
use colored::*;
use console::style;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use solver_chain::diagnostics::ConsoleDiagnostics;
use solver_chain::environment::{CoreSolver, Environment, QueryLogging};
use solver_chain::error::Result;
use solver_chain::kquery;
use solver_chain::query::Validity;
use solver_chain::solver::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let solvers = ["z3", "cvc4", "yices2", "dummy"];
    let logs: Vec<&'static str> = QueryLogging::all().iter().map(|l| l.name()).collect();

    let arguments = app_from_crate!()
        .arg(
            Arg::with_name("environment_file")
                .short("e")
                .long("env")
                .value_name("FILE")
                .help("Sets environment file to use")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("solver")
                .long("solver")
                .value_name("SOLVER")
                .possible_values(&solvers)
                .help("Sets core solver to use (overwrites environment)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cross_check")
                .long("cross-check")
                .value_name("SOLVER")
                .possible_values(&solvers)
                .help("Cross-checks all results with a second core solver")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("log")
                .long("log")
                .value_name("TYPE")
                .possible_values(&logs)
                .help("Enables a query log (may be given multiple times)")
                .multiple(true)
                .number_of_values(1)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("output_dir")
                .short("o")
                .long("output-dir")
                .value_name("DIR")
                .help("Sets directory for query logs (overwrites environment)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("min_query_time")
                .long("min-query-time")
                .value_name("MS")
                .help("Only logs queries taking at least MS milliseconds, negative values log failed queries only")
                .allow_hyphen_values(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("assignment_validating")
                .long("validate-assignments")
                .help("Validates assignments computed by the solver"),
        )
        .arg(
            Arg::with_name("fast_cex")
                .long("fast-cex")
                .help("Tries cheap counter-examples before solving"),
        )
        .arg(
            Arg::with_name("no_cex_cache")
                .long("no-cex-cache")
                .help("Disables the counter-example cache"),
        )
        .arg(
            Arg::with_name("no_cache")
                .long("no-cache")
                .help("Disables the query cache"),
        )
        .arg(
            Arg::with_name("no_independent")
                .long("no-independent")
                .help("Disables splitting queries into independent constraint sets"),
        )
        .arg(
            Arg::with_name("debug_validate")
                .long("debug-validate")
                .help("Validates all results against the undecorated core solver"),
        )
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .help("Enables debug mode"),
        )
        .arg(
            Arg::with_name("input_file")
                .value_name("FILE")
                .help("KQuery file with the queries to solve")
                .required(true)
                .index(1),
        )
        .get_matches();

    if let Err(e) = solve_queries(&arguments) {
        println!("{}", style(e).bold().red());
        process::exit(-1);
    }
}

fn parse_core_solver(name: &str) -> CoreSolver {
    match name {
        "z3" => CoreSolver::Z3,
        "cvc4" => CoreSolver::CVC4,
        "yices2" => CoreSolver::Yices2,
        "dummy" => CoreSolver::Dummy,
        _ => panic!("unknown solver"),
    }
}

fn build_environment(arguments: &ArgMatches) -> Result<Environment> {
    let mut env = if let Some(file_path) = arguments.value_of("environment_file") {
        // Load given environment file
        let env_file = Path::new(file_path);
        if !env_file.is_file() {
            return Err(format!("Environment file '{}' does not exist", file_path).into());
        }
        Environment::from_file(env_file)?
    } else {
        // Try to find a environment file for the current input
        let input_file = Path::new(arguments.value_of("input_file").unwrap_or_default());
        let env_file = input_file.with_extension("yaml");
        if env_file.is_file() {
            println!(
                "Using environment defined in '{}'",
                style(env_file.display()).yellow()
            );
            Environment::from_file(&env_file)?
        } else {
            Environment::default()
        }
    };

    if let Some(solver) = arguments.value_of("solver") {
        env.solver.core_solver = parse_core_solver(solver);
    }

    if let Some(solver) = arguments.value_of("cross_check") {
        env.solver.cross_check_core_solver = Some(parse_core_solver(solver));
    }

    if let Some(logs) = arguments.values_of("log") {
        env.solver
            .query_logging
            .extend(logs.filter_map(QueryLogging::from_name));
    }

    if let Some(dir) = arguments.value_of("output_dir") {
        env.output_directory = PathBuf::from(dir);
    }

    if let Some(ms) = arguments.value_of("min_query_time") {
        env.solver.min_query_time_to_log = ms
            .parse()
            .map_err(|_| format!("Invalid minimum query time '{}'", ms))?;
    }

    if arguments.is_present("assignment_validating") {
        env.solver.use_assignment_validating_solver = true;
    }
    if arguments.is_present("fast_cex") {
        env.solver.use_fast_cex_solver = true;
    }
    if arguments.is_present("no_cex_cache") {
        env.solver.use_cex_cache = false;
    }
    if arguments.is_present("no_cache") {
        env.solver.use_cache = false;
    }
    if arguments.is_present("no_independent") {
        env.solver.use_independent_solver = false;
    }
    if arguments.is_present("debug_validate") {
        env.solver.debug_validate_solver = true;
    }

    if arguments.is_present("debug") {
        env.debug = true;
    }

    Ok(env)
}

fn solve_queries(arguments: &ArgMatches) -> Result<()> {
    let input_file = arguments.value_of("input_file").unwrap_or_default();

    let env = build_environment(arguments)?;

    let level = if env.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(e) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        log::debug!("Keeping installed logger: {}", e);
    }

    if env.debug {
        println!("{}:\n{}\n---", "Environment".bold(), style(&env).cyan());
    }

    println!(
        "{} Loading queries '{}'",
        style("[1/3]").bold().dim(),
        input_file.yellow()
    );
    let queries = kquery::parse_queries(&fs::read_to_string(input_file)?)?;

    println!(
        "{} Constructing {} solver chain",
        style("[2/3]").bold().dim(),
        env.solver.core_solver
    );
    fs::create_dir_all(&env.output_directory)?;
    let core_solver = create_core_solver(env.solver.core_solver)?;
    let mut solver = construct_solver_chain(
        core_solver,
        &env.solver,
        &env.log_paths(),
        &SmtSolverFactory,
        &mut ConsoleDiagnostics,
    )?;

    println!(
        "{} Solving {} queries ...",
        style("[3/3]").bold().dim(),
        queries.len()
    );
    for (idx, query) in queries.iter().enumerate() {
        let validity = solver.compute_validity(query)?;
        let verdict = match validity {
            Validity::True => "valid".bold().green(),
            Validity::False => "invalid".bold().red(),
            Validity::Unknown => "unknown".bold().yellow(),
        };
        println!("Query {}: {}", idx, verdict);
        if env.debug && validity != Validity::True {
            if let Some(assignment) = solver.compute_initial_values(query)? {
                println!("{}", style(assignment).cyan());
            }
        }
    }

    Ok(())
}

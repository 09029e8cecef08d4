use crate::error::Result;
use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CoreSolver {
    #[serde(rename = "z3")]
    Z3,
    #[serde(rename = "cvc4")]
    CVC4,
    #[serde(rename = "yices2")]
    Yices2,
    #[serde(rename = "dummy")]
    Dummy,
}

impl Default for CoreSolver {
    fn default() -> Self {
        Self::Z3
    }
}

impl fmt::Display for CoreSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Z3 => write!(f, "Z3"),
            Self::CVC4 => write!(f, "CVC4"),
            Self::Yices2 => write!(f, "Yices2"),
            Self::Dummy => write!(f, "Dummy"),
        }
    }
}

/// Query logs which can be written.
///
/// `Solver*` logs only contain the queries reaching the core solver, whereas `All*` logs
/// contain every query issued to the solver chain.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum QueryLogging {
    #[serde(rename = "all:kquery")]
    AllKQuery,
    #[serde(rename = "all:smt2")]
    AllSmtLib,
    #[serde(rename = "all:core")]
    AllCoreSolverLang,
    #[serde(rename = "solver:kquery")]
    SolverKQuery,
    #[serde(rename = "solver:smt2")]
    SolverSmtLib,
    #[serde(rename = "solver:core")]
    SolverCoreSolverLang,
    #[serde(rename = "solver:core:no_fp_to_ieee_bv")]
    SolverCoreSolverLangNoFpToIeeeBv,
    #[serde(rename = "solver:core:aa")]
    SolverCoreSolverLangAa,
    #[serde(rename = "solver:core:aa:no_fp_to_ieee_bv")]
    SolverCoreSolverLangAaNoFpToIeeeBv,
}

impl QueryLogging {
    pub fn all() -> Vec<Self> {
        vec![
            Self::AllKQuery,
            Self::AllSmtLib,
            Self::AllCoreSolverLang,
            Self::SolverKQuery,
            Self::SolverSmtLib,
            Self::SolverCoreSolverLang,
            Self::SolverCoreSolverLangNoFpToIeeeBv,
            Self::SolverCoreSolverLangAa,
            Self::SolverCoreSolverLangAaNoFpToIeeeBv,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AllKQuery => "all:kquery",
            Self::AllSmtLib => "all:smt2",
            Self::AllCoreSolverLang => "all:core",
            Self::SolverKQuery => "solver:kquery",
            Self::SolverSmtLib => "solver:smt2",
            Self::SolverCoreSolverLang => "solver:core",
            Self::SolverCoreSolverLangNoFpToIeeeBv => "solver:core:no_fp_to_ieee_bv",
            Self::SolverCoreSolverLangAa => "solver:core:aa",
            Self::SolverCoreSolverLangAaNoFpToIeeeBv => "solver:core:aa:no_fp_to_ieee_bv",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|logging| logging.name() == name)
    }
}

impl fmt::Display for QueryLogging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct SolverOptions {
    pub core_solver: CoreSolver,
    /// Cross-check every result of the chain with a separate solver of this kind.
    pub cross_check_core_solver: Option<CoreSolver>,
    pub query_logging: BTreeSet<QueryLogging>,
    /// Only queries taking at least this many milliseconds are logged.
    /// A negative value logs only queries which failed.
    pub min_query_time_to_log: i64,
    pub use_assignment_validating_solver: bool,
    pub use_fast_cex_solver: bool,
    pub use_cex_cache: bool,
    pub use_cache: bool,
    pub use_independent_solver: bool,
    /// Validate every result of the chain against the undecorated core solver.
    pub debug_validate_solver: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            core_solver: CoreSolver::default(),
            cross_check_core_solver: None,
            query_logging: BTreeSet::new(),
            min_query_time_to_log: 0,
            use_assignment_validating_solver: false,
            use_fast_cex_solver: false,
            use_cex_cache: true,
            use_cache: true,
            use_independent_solver: true,
            debug_validate_solver: false,
        }
    }
}

/// Base paths of the query logs.
///
/// The core solver language paths are prefixes, the final path is completed with the
/// file extension of the core solver's language.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LogPaths {
    pub query_smt2: String,
    pub base_solver_query_smt2: String,
    pub query_kquery: String,
    pub base_solver_query_kquery: String,
    pub query_core_solver_lang: String,
    pub base_core_solver_lang: String,
}

impl LogPaths {
    pub fn in_directory(directory: &Path) -> Self {
        let path = |name: &str| directory.join(name).to_string_lossy().into_owned();

        Self {
            query_smt2: path("all-queries.smt2"),
            base_solver_query_smt2: path("solver-queries.smt2"),
            query_kquery: path("all-queries.kquery"),
            base_solver_query_kquery: path("solver-queries.kquery"),
            query_core_solver_lang: path("all-queries."),
            base_core_solver_lang: path("solver-queries."),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub solver: SolverOptions,
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    #[serde(default = "disabled")]
    pub debug: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            solver: SolverOptions::default(),
            output_directory: default_output_directory(),
            debug: false,
        }
    }
}

impl Environment {
    pub fn from_file(path: &Path) -> Result<Environment> {
        let file = File::open(path)
            .map_err(|_| format!("Environment file '{}' could not be loaded", path.display()))?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn log_paths(&self) -> LogPaths {
        LogPaths::in_directory(&self.output_directory)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_yaml::to_string(self) {
            Ok(yaml) => write!(f, "{}", yaml),
            Err(_) => Err(fmt::Error),
        }
    }
}

fn disabled() -> bool {
    false
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

use crate::error::{ErrorKind, Result, ResultExt};
use crate::expr::Assignment;
use crate::kquery;
use crate::query::{Query, Validity};
use crate::smtlib;
use crate::solver::{ConstraintLog, LogConfig, Solver};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryType {
    Truth,
    Validity,
    InitialValues,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truth => write!(f, "Truth"),
            Self::Validity => write!(f, "Validity"),
            Self::InitialValues => write!(f, "InitialValues"),
        }
    }
}

/// The language queries are written in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Dialect {
    KQuery,
    SmtLib,
    /// The native language of the wrapped solver, rendered with the given options.
    CoreSolverLang(Option<LogConfig>),
}

impl Dialect {
    fn comment(&self) -> &'static str {
        match self {
            Self::KQuery => "#",
            Self::SmtLib | Self::CoreSolverLang(_) => ";",
        }
    }
}

/// Writes every query passing through it to a log file before delegating.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct QueryLoggingSolver {
    #[derivative(Debug = "ignore")]
    solver: Box<dyn Solver>,
    dialect: Dialect,
    path: String,
    #[derivative(Debug = "ignore")]
    log: BufWriter<File>,
    /// Milliseconds; negative values log failed queries only.
    min_query_time_to_log: i64,
    query_count: usize,
}

impl QueryLoggingSolver {
    pub fn new(
        solver: Box<dyn Solver>,
        dialect: Dialect,
        path: &str,
        min_query_time_to_log: i64,
    ) -> Result<Self> {
        let file = File::create(path).chain_err(|| ErrorKind::LogFile(path.to_owned()))?;

        Ok(Self {
            solver,
            dialect,
            path: path.to_owned(),
            log: BufWriter::new(file),
            min_query_time_to_log,
            query_count: 0,
        })
    }

    pub fn kquery(solver: Box<dyn Solver>, path: &str, min_query_time_to_log: i64) -> Result<Self> {
        Self::new(solver, Dialect::KQuery, path, min_query_time_to_log)
    }

    pub fn smtlib(solver: Box<dyn Solver>, path: &str, min_query_time_to_log: i64) -> Result<Self> {
        Self::new(solver, Dialect::SmtLib, path, min_query_time_to_log)
    }

    pub fn core_solver_lang(
        solver: Box<dyn Solver>,
        path: &str,
        min_query_time_to_log: i64,
        config: Option<LogConfig>,
    ) -> Result<Self> {
        Self::new(
            solver,
            Dialect::CoreSolverLang(config),
            path,
            min_query_time_to_log,
        )
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    fn render(&self, query: &Query) -> Result<String> {
        match &self.dialect {
            Dialect::KQuery => Ok(kquery::render_query(query)),
            Dialect::SmtLib => Ok(smtlib::render_query(query)),
            Dialect::CoreSolverLang(config) => {
                Ok(self.solver.render_log(query, config.as_ref())?.text)
            }
        }
    }

    fn begin_entry(&mut self, query: &Query, query_type: QueryType) -> Result<String> {
        let number = self.query_count;
        self.query_count += 1;
        Ok(format!(
            "{} Query {} -- Type: {}\n{}",
            self.dialect.comment(),
            number,
            query_type,
            self.render(query)?
        ))
    }

    fn end_entry(
        &mut self,
        mut entry: String,
        outcome: &str,
        failed: bool,
        elapsed: Duration,
    ) -> Result<()> {
        let should_log = if self.min_query_time_to_log < 0 {
            failed
        } else {
            elapsed.as_millis() >= self.min_query_time_to_log as u128
        };
        if !should_log {
            return Ok(());
        }

        let comment = self.dialect.comment();
        entry.push_str(&format!("{}   {}\n", comment, outcome));
        entry.push_str(&format!(
            "{}   Query took {:.6}s\n\n",
            comment,
            elapsed.as_secs_f64()
        ));

        self.log.write_all(entry.as_bytes())?;
        self.log.flush()?;
        Ok(())
    }

    /// Runs `operation` on the wrapped solver and logs it.
    ///
    /// Logging problems are reported through `log` and never change the solver's answer.
    fn logged<T, F, D>(
        &mut self,
        query: &Query,
        query_type: QueryType,
        operation: F,
        describe: D,
    ) -> Result<T>
    where
        F: FnOnce(&mut dyn Solver, &Query) -> Result<T>,
        D: FnOnce(&T) -> String,
    {
        let entry = match self.begin_entry(query, query_type) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Failed to render query for '{}': {}", self.path, e);
                None
            }
        };

        let start = Instant::now();
        let result = operation(self.solver.as_mut(), query);
        let elapsed = start.elapsed();

        if let Some(entry) = entry {
            let (outcome, failed) = match &result {
                Ok(value) => (format!("OK -- {}", describe(value)), false),
                Err(e) => (format!("FAIL -- {}", e), true),
            };
            if let Err(e) = self.end_entry(entry, &outcome, failed, elapsed) {
                log::warn!("Failed to write query log '{}': {}", self.path, e);
            }
        }

        result
    }
}

impl Solver for QueryLoggingSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        self.logged(
            query,
            QueryType::Truth,
            |solver, query| solver.compute_truth(query),
            |is_valid| format!("Truth: {}", is_valid),
        )
    }

    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        self.logged(
            query,
            QueryType::Validity,
            |solver, query| solver.compute_validity(query),
            |validity: &Validity| format!("Validity: {}", validity),
        )
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        self.logged(
            query,
            QueryType::InitialValues,
            |solver, query| solver.compute_initial_values(query),
            |values: &Option<Assignment>| match values {
                Some(assignment) => format!("Solvable: true\n{}", assignment),
                None => "Solvable: false".to_owned(),
            },
        )
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        self.solver.render_log(query, config)
    }
}

impl Drop for QueryLoggingSolver {
    fn drop(&mut self) {
        if let Err(e) = self.log.flush() {
            log::warn!("Failed to flush query log '{}': {}", self.path, e);
        }
    }
}

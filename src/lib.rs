#[macro_use]
extern crate derivative;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate error_chain;
extern crate log;
extern crate num_bigint;
extern crate num_traits;
extern crate rsmt2;
extern crate serde;
extern crate serde_yaml;

pub mod diagnostics;
pub mod environment;
pub mod expr;
pub mod kquery;
pub mod query;
pub mod smtlib;
pub mod solver;

pub mod error {
    error_chain! {
        types {
            Error, ErrorKind, ResultExt, Result;
        }

        foreign_links {
            ParseBigIntError(::num_bigint::ParseBigIntError);
            RSmt2(::rsmt2::errors::Error);
            IOError(::std::io::Error);
            SerdeYAML(::serde_yaml::Error);
        }

        errors {
            Sort(expected: String, actual: String) {
                description("Sort error")
                display("Sort error, expected {} but got {}", expected, actual)
            }
            Parse(m: String) {
                description("Failed to parse query")
                display("Parse error: {}", m)
            }
            UnsupportedSolver(name: String) {
                description("Unsupported core solver")
                display("Unsupported core solver '{}'", name)
            }
            SolverFailure(m: String) {
                description("Solver failure")
                display("Solver failure: {}", m)
            }
            SolverMismatch(m: String) {
                description("Solvers disagree")
                display("Solver mismatch: {}", m)
            }
            InvalidAssignment(m: String) {
                description("Invalid assignment")
                display("Invalid assignment: {}", m)
            }
            LogFile(path: String) {
                description("Failed to open query log file")
                display("Could not open query log file '{}'", path)
            }
            ChainConstruction(stage: String) {
                description("Failed to construct solver chain")
                display("Failed to construct solver chain at stage: {}", stage)
            }
        }
    }
}

//! Rendering of queries in the SMT-LIBv2 format.

use crate::expr::{Constant, Expression, Operator, Sort, Variable};
use crate::query::Query;
use std::fmt::{self, Write};

pub const EXTENSION: &str = "smt2";

pub const LOGIC: &str = "QF_AUFBV";

pub fn sort_to_string(sort: &Sort) -> String {
    match sort {
        Sort::Boolean => "Bool".to_string(),
        Sort::BitVector(width) => format!("(_ BitVec {})", width),
        Sort::Array { index, value } => {
            format!("(Array (_ BitVec {}) (_ BitVec {}))", index, value)
        }
    }
}

pub fn constant_to_string(constant: &Constant) -> String {
    match constant {
        Constant::Boolean(true) => "true".to_string(),
        Constant::Boolean(false) => "false".to_string(),
        Constant::BitVector(bv) => format!("(_ bv{} {})", bv.value(), bv.bits()),
        Constant::Array(arr) => {
            let sort = sort_to_string(&constant.sort());
            let default = constant_to_string(&Constant::bit_vector(arr.default_value().clone()));
            let mut s = format!("((as const {}) {})", sort, default);
            for (index, value) in arr.entries() {
                s = format!(
                    "(store {} (_ bv{} {}) {})",
                    s,
                    index,
                    arr.index_bits(),
                    constant_to_string(&Constant::bit_vector(value.clone()))
                );
            }
            s
        }
    }
}

fn write_expression<W: Write>(w: &mut W, expr: &Expression) -> fmt::Result {
    let operator = match expr.operator() {
        Operator::Variable(v) => return write!(w, "{}", v.name()),
        Operator::Constant(c) => return write!(w, "{}", constant_to_string(c)),
        op => op,
    };

    write!(w, "({}", operator)?;
    for operand in expr.operands() {
        write!(w, " ")?;
        write_expression(w, operand)?;
    }
    write!(w, ")")
}

pub fn expression_to_string(expr: &Expression) -> String {
    let mut s = String::new();
    // Writing into a `String` cannot fail.
    let _ = write_expression(&mut s, expr);
    s
}

fn declaration(variable: &Variable) -> String {
    format!(
        "(declare-fun {} () {})",
        variable.name(),
        sort_to_string(variable.sort())
    )
}

/// Renders `query` as a self-contained SMT-LIBv2 script.
///
/// The constraints are asserted together with the negated query expression, i.e. the
/// script is unsatisfiable iff the query expression is valid.
pub fn render_query(query: &Query) -> String {
    let mut s = String::new();
    let _ = render_query_into(&mut s, query);
    s
}

fn render_query_into<W: Write>(w: &mut W, query: &Query) -> fmt::Result {
    writeln!(w, "(set-logic {})", LOGIC)?;
    for variable in query.variables() {
        writeln!(w, "{}", declaration(variable))?;
    }
    for constraint in query.constraints() {
        write!(w, "(assert ")?;
        write_expression(w, constraint)?;
        writeln!(w, ")")?;
    }
    write!(w, "(assert (not ")?;
    write_expression(w, query.expr())?;
    writeln!(w, "))")?;
    writeln!(w, "(check-sat)")?;
    writeln!(w, "(exit)")
}

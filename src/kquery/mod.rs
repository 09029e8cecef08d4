//! The KQuery format: declarations followed by `(query [constraints] expr)` forms.
//!
//! ```text
//! array input : w32 -> w8 = symbolic
//! var x : w8
//! (query [(Ult x (w8 10))]
//!        (Eq (Read input (w32 0)) x))
//! ```

use crate::expr::{
    Array, BitVector, Boolean, Constant, Expression, Operator, Sort, Variable,
};
use crate::query::Query;
use std::fmt::{self, Write};

mod parser;

pub use self::parser::parse_queries;

pub const EXTENSION: &str = "kquery";

fn boolean_name(op: &Boolean) -> &'static str {
    match op {
        Boolean::Not => "Not",
        Boolean::Imply => "Implies",
        Boolean::And => "And",
        Boolean::Or => "Or",
        Boolean::Xor => "Xor",
    }
}

fn bit_vector_name(op: &BitVector) -> &'static str {
    match op {
        BitVector::Add => "Add",
        BitVector::Sub => "Sub",
        BitVector::Mul => "Mul",
        BitVector::UDiv => "UDiv",
        BitVector::URem => "URem",
        BitVector::And => "And",
        BitVector::Or => "Or",
        BitVector::Xor => "Xor",
        BitVector::Not => "Not",
        BitVector::Shl => "Shl",
        BitVector::LShr => "LShr",
        BitVector::ULt => "Ult",
        BitVector::ULe => "Ule",
        BitVector::SLt => "Slt",
        BitVector::SLe => "Sle",
        BitVector::Concat => "Concat",
        BitVector::Extract(..) => "Extract",
        BitVector::ZeroExtend(_) => "ZExt",
        BitVector::SignExtend(_) => "SExt",
    }
}

fn write_constant<W: Write>(w: &mut W, constant: &Constant) -> fmt::Result {
    match constant {
        Constant::Boolean(value) => write!(w, "{}", value),
        Constant::BitVector(bv) => write!(w, "(w{} {})", bv.bits(), bv.value()),
        Constant::Array(arr) => {
            let default = arr.default_value();
            let mut s = format!(
                "(ConstArray w{} (w{} {}))",
                arr.index_bits(),
                default.bits(),
                default.value()
            );
            for (index, value) in arr.entries() {
                s = format!(
                    "(Write {} (w{} {}) (w{} {}))",
                    s,
                    arr.index_bits(),
                    index,
                    value.bits(),
                    value.value()
                );
            }
            write!(w, "{}", s)
        }
    }
}

fn write_expression<W: Write>(w: &mut W, expr: &Expression) -> fmt::Result {
    match expr.operator() {
        Operator::Variable(variable) => return write!(w, "{}", variable.name()),
        Operator::Constant(constant) => return write_constant(w, constant),
        Operator::Ite => write!(w, "(Select")?,
        Operator::Equal => write!(w, "(Eq")?,
        Operator::Boolean(op) => write!(w, "({}", boolean_name(op))?,
        Operator::BitVector(op) => {
            write!(w, "({}", bit_vector_name(op))?;
            match op {
                BitVector::Extract(hi, lo) => write!(w, " w{} {}", hi - lo + 1, lo)?,
                BitVector::ZeroExtend(_) | BitVector::SignExtend(_) => {
                    write!(w, " {}", expr.sort())?
                }
                _ => {}
            }
        }
        Operator::Array(Array::Select) => write!(w, "(Read")?,
        Operator::Array(Array::Store) => write!(w, "(Write")?,
    }

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

pub fn declaration(variable: &Variable) -> String {
    match variable.sort() {
        Sort::Array { .. } => format!("array {} : {} = symbolic", variable.name(), variable.sort()),
        sort => format!("var {} : {}", variable.name(), sort),
    }
}

/// Renders the declarations of all variables used by `query` followed by the query itself.
pub fn render_query(query: &Query) -> String {
    let mut s = String::new();
    for variable in query.variables() {
        s.push_str(&declaration(variable));
        s.push('\n');
    }

    s.push_str("(query [");
    for (i, constraint) in query.constraints().iter().enumerate() {
        if i > 0 {
            s.push_str("\n        ");
        }
        s.push_str(&expression_to_string(constraint));
    }
    s.push_str("]\n       ");
    s.push_str(&expression_to_string(query.expr()));
    s.push_str(")\n");
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_query() {
        // GIVEN
        let x: Expression = BitVector::variable("x", 8).into();
        let input: Expression = Array::variable("input", 32, 8).into();
        let query = Query::new(
            vec![BitVector::ult(x.clone(), BitVector::constant_u64(10, 8)).unwrap()],
            Expression::equal(
                Array::select(input, BitVector::constant_u64(0, 32)).unwrap(),
                x,
            )
            .unwrap(),
        )
        .unwrap();

        // WHEN
        let text = render_query(&query);

        // THEN
        assert_eq!(
            text,
            "array input : w32 -> w8 = symbolic\n\
             var x : w8\n\
             (query [(Ult x (w8 10))]\n       \
             (Eq (Read input (w32 0)) x))\n"
        );
    }

    #[test]
    fn test_rendered_query_parses_back() {
        // GIVEN
        let x: Expression = BitVector::variable("x", 16).into();
        let b: Expression = Boolean::variable("b").into();
        let query = Query::new(
            vec![
                Boolean::or(
                    b.clone(),
                    BitVector::slt(
                        BitVector::sign_extend(16, BitVector::extract(7, 0, x.clone()).unwrap())
                            .unwrap(),
                        x.clone(),
                    )
                    .unwrap(),
                )
                .unwrap(),
                Boolean::not(b).unwrap(),
            ],
            Expression::equal(
                BitVector::zero_extend(
                    16,
                    BitVector::not(BitVector::extract(15, 8, x).unwrap()).unwrap(),
                )
                .unwrap(),
                BitVector::constant_u64(0, 16),
            )
            .unwrap(),
        )
        .unwrap();

        // WHEN
        let parsed = parse_queries(&render_query(&query)).unwrap();

        // THEN
        assert_eq!(parsed, vec![query]);
    }
}

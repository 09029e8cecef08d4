use crate::environment::CoreSolver;
use crate::error::{ErrorKind, Result};
use crate::expr::{Assignment, Boolean, Expression, Sort, Variable};
use crate::query::Query;
use crate::smtlib;
use crate::solver::{ackermannize, ConstraintLog, LogConfig, Solver};
use rsmt2::parse::*;
use rsmt2::print::{Expr2Smt, Sort2Smt, Sym2Smt};
use rsmt2::{Logic, SmtConf, SmtRes};

/// Core solver driving an external SMT solver process through rsmt2.
pub struct RSMTSolver {
    kind: CoreSolver,
    solver: rsmt2::Solver<Parser>,
}

impl RSMTSolver {
    pub fn new(kind: CoreSolver) -> Result<Self> {
        let mut conf = match kind {
            CoreSolver::Z3 => SmtConf::z3(),
            CoreSolver::CVC4 => SmtConf::cvc4(),
            CoreSolver::Yices2 => SmtConf::yices_2(),
            CoreSolver::Dummy => return Err(ErrorKind::UnsupportedSolver(kind.to_string()).into()),
        };

        // Activate model production
        conf.models();

        let mut solver = rsmt2::Solver::new(conf, Parser::new())?;
        solver.set_logic(Logic::QF_AUFBV)?;

        Ok(Self { kind, solver })
    }

    pub fn kind(&self) -> CoreSolver {
        self.kind
    }

    /// Checks the constraints together with the negated expression in a fresh scope.
    fn solve(&mut self, query: &Query) -> Result<Option<Assignment>> {
        self.solver.push(1)?;
        let result = self.solve_in_scope(query);
        self.solver.pop(1)?;
        result
    }

    fn solve_in_scope(&mut self, query: &Query) -> Result<Option<Assignment>> {
        let variables = query.variables();
        for variable in &variables {
            self.solver.declare_const(*variable, variable.sort())?;
        }
        for constraint in query.constraints() {
            self.solver.assert(constraint)?;
        }
        self.solver.assert(&Boolean::not(query.expr().clone())?)?;

        if !self.solver.check_sat()? {
            return Ok(None);
        }

        let mut assignment = Assignment::new();
        for variable in variables {
            let expr: Expression = variable.clone().into();
            let values = self.solver.get_values(&[&expr])?;
            if let Some((_, value)) = values.into_iter().next() {
                assignment.assign(variable.clone(), value);
            }
        }
        Ok(Some(assignment))
    }
}

impl Solver for RSMTSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        Ok(self.solve(query)?.is_none())
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        self.solve(query)
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        let text = match (self.kind, config) {
            (CoreSolver::Z3, Some(LogConfig::Z3(z3))) => {
                let query = if z3.ackermannize_arrays {
                    ackermannize(query)?
                } else {
                    query.clone()
                };
                format!(
                    "; ackermannize-arrays: {}\n; fp.to_ieee_bv: {}\n{}",
                    z3.ackermannize_arrays,
                    z3.use_to_ieee_bv_function,
                    smtlib::render_query(&query)
                )
            }
            _ => smtlib::render_query(query),
        };
        Ok(ConstraintLog::new(text, smtlib::EXTENSION))
    }
}

impl Expr2Smt<()> for Expression {
    fn expr_to_smt2<Writer>(&self, w: &mut Writer, _: ()) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        write!(w, "{}", smtlib::expression_to_string(self))?;
        Ok(())
    }
}

impl Sym2Smt<()> for Variable {
    fn sym_to_smt2<Writer>(&self, w: &mut Writer, _: ()) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        write!(w, "{}", self.name())?;
        Ok(())
    }
}

impl Sort2Smt for Sort {
    fn sort_to_smt2<Writer>(&self, w: &mut Writer) -> SmtRes<()>
    where
        Writer: ::std::io::Write,
    {
        write!(w, "{}", smtlib::sort_to_string(self))?;
        Ok(())
    }
}

mod parser {
    use super::*;
    use crate::expr::{ArrayValue, BitVectorValue, Constant};
    use nom::{
        branch::alt,
        bytes::complete::{tag, take_while1},
        character::complete::{char, digit1, hex_digit1, multispace0, multispace1},
        combinator::{all_consuming, map, map_opt, map_res, value},
        sequence::{delimited, preceded, tuple},
        IResult,
    };
    use num_bigint::BigUint;
    use std::str::FromStr;

    fn width(input: &str) -> IResult<&str, usize> {
        map_res(digit1, FromStr::from_str)(input)
    }

    fn bit_vec_sort(input: &str) -> IResult<&str, usize> {
        // (_ BitVec 8)
        map(
            tuple((
                tag("(_"),
                multispace1,
                tag("BitVec"),
                multispace1,
                width,
                char(')'),
            )),
            |(_, _, _, _, bits, _)| bits,
        )(input)
    }

    fn array_sort(input: &str) -> IResult<&str, (usize, usize)> {
        map(
            tuple((
                tag("(Array"),
                multispace1,
                bit_vec_sort,
                multispace1,
                bit_vec_sort,
                char(')'),
            )),
            |(_, _, index, _, value, _)| (index, value),
        )(input)
    }

    fn bin_digit1(input: &str) -> IResult<&str, &str> {
        take_while1(|c| c == '0' || c == '1')(input)
    }

    fn boolean_literal(input: &str) -> IResult<&str, Constant> {
        alt((
            value(Constant::boolean(false), tag("false")),
            value(Constant::boolean(true), tag("true")),
        ))(input)
    }

    fn bitvec_literal_hex(input: &str) -> IResult<&str, BitVectorValue> {
        map_opt(preceded(tag("#x"), hex_digit1), |s: &str| {
            BigUint::parse_bytes(s.as_bytes(), 16).map(|v| BitVectorValue::new(v, 4 * s.len()))
        })(input)
    }

    fn bitvec_literal_binary(input: &str) -> IResult<&str, BitVectorValue> {
        map_opt(preceded(tag("#b"), bin_digit1), |s: &str| {
            BigUint::parse_bytes(s.as_bytes(), 2).map(|v| BitVectorValue::new(v, s.len()))
        })(input)
    }

    fn bitvec_literal_smt(input: &str) -> IResult<&str, BitVectorValue> {
        // (_ bv42 64)
        map_opt(
            tuple((tag("(_"), multispace1, tag("bv"), digit1, multispace1, width, char(')'))),
            |(_, _, _, value, _, bits, _): (_, _, _, &str, _, usize, _)| {
                BigUint::parse_bytes(value.as_bytes(), 10).map(|v| BitVectorValue::new(v, bits))
            },
        )(input)
    }

    fn bitvec_literal(input: &str) -> IResult<&str, BitVectorValue> {
        alt((
            bitvec_literal_hex,
            bitvec_literal_binary,
            bitvec_literal_smt,
        ))(input)
    }

    fn array_init(input: &str) -> IResult<&str, ArrayValue> {
        // ((as const (Array (_ BitVec 32) (_ BitVec 8))) #x00)
        map(
            tuple((
                char('('),
                tag("(as"),
                multispace1,
                tag("const"),
                multispace1,
                array_sort,
                char(')'),
                multispace1,
                bitvec_literal,
                char(')'),
            )),
            |(_, _, _, _, _, (index_bits, _), _, _, default, _)| {
                ArrayValue::new(index_bits, default)
            },
        )(input)
    }

    fn array_store(input: &str) -> IResult<&str, ArrayValue> {
        // (store arr index value)
        map(
            tuple((
                tag("(store"),
                multispace1,
                array_nested,
                multispace1,
                bitvec_literal,
                multispace1,
                bitvec_literal,
                char(')'),
            )),
            |(_, _, mut arr, _, index, _, value, _)| {
                arr.store(&index, value);
                arr
            },
        )(input)
    }

    fn array_nested(input: &str) -> IResult<&str, ArrayValue> {
        alt((array_init, array_store))(input)
    }

    fn literal(input: &str) -> IResult<&str, Constant> {
        alt((
            boolean_literal,
            map(bitvec_literal, Constant::bit_vector),
            map(array_nested, Constant::array),
        ))(input)
    }

    pub(super) fn parse_literal(input: &str) -> SmtRes<Constant> {
        match all_consuming(delimited(multispace0, literal, multispace0))(input) {
            Ok((_, lit)) => Ok(lit),
            Err(_) => Err(format!("Failed to parse literal '{}'", input).into()),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self {}
    }
}

impl<'a> ValueParser<crate::expr::Constant, &'a str> for Parser {
    fn parse_value(self, input: &'a str) -> SmtRes<crate::expr::Constant> {
        parser::parse_literal(input)
    }
}

impl<'a> ExprParser<String, (), &'a str> for Parser {
    fn parse_expr(self, input: &'a str, _: ()) -> SmtRes<String> {
        Ok(input.into())
    }
}

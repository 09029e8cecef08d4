use crate::error::{ErrorKind, Result};
use crate::expr::{
    Array, ArrayValue, BitVector, BitVectorValue, Boolean, Constant, Expression, Operator, Sort,
    Variable,
};
use crate::query::Query;
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace1, not_line_ending},
    combinator::{all_consuming, map, value},
    multi::many0,
    sequence::{delimited, preceded, terminated},
    IResult,
};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Eq, PartialEq)]
enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
    Bracket(Vec<SExpr>),
}

fn skip(input: &str) -> IResult<&str, ()> {
    let comment = value((), preceded(char('#'), not_line_ending));
    value((), many0(alt((value((), multispace1), comment))))(input)
}

fn atom(input: &str) -> IResult<&str, SExpr> {
    map(
        take_while1(|c: char| !c.is_whitespace() && !"()[]#".contains(c)),
        |s: &str| SExpr::Atom(s.to_string()),
    )(input)
}

fn list(input: &str) -> IResult<&str, SExpr> {
    map(
        delimited(
            char('('),
            many0(preceded(skip, sexpr)),
            preceded(skip, char(')')),
        ),
        SExpr::List,
    )(input)
}

fn bracket(input: &str) -> IResult<&str, SExpr> {
    map(
        delimited(
            char('['),
            many0(preceded(skip, sexpr)),
            preceded(skip, char(']')),
        ),
        SExpr::Bracket,
    )(input)
}

fn sexpr(input: &str) -> IResult<&str, SExpr> {
    alt((list, bracket, atom))(input)
}

fn document(input: &str) -> IResult<&str, Vec<SExpr>> {
    all_consuming(terminated(many0(preceded(skip, sexpr)), skip))(input)
}

fn parse_error<T>(message: String) -> Result<T> {
    Err(ErrorKind::Parse(message).into())
}

fn parse_width(atom: &SExpr) -> Result<usize> {
    match atom {
        SExpr::Atom(s) if s.starts_with('w') => match s[1..].parse() {
            Ok(width) => Ok(width),
            Err(_) => parse_error(format!("invalid width '{}'", s)),
        },
        _ => parse_error(format!("expected width but got {:?}", atom)),
    }
}

fn parse_number(atom: &SExpr) -> Result<BigUint> {
    let s = match atom {
        SExpr::Atom(s) => s,
        _ => return parse_error(format!("expected number but got {:?}", atom)),
    };
    let parsed = if let Some(hex) = s.strip_prefix("0x") {
        BigUint::parse_bytes(hex.as_bytes(), 16)
    } else {
        BigUint::parse_bytes(s.as_bytes(), 10)
    };
    match parsed {
        Some(number) => Ok(number),
        None => parse_error(format!("invalid number '{}'", s)),
    }
}

/// Turns s-expressions into declarations and queries.
#[derive(Default)]
struct Interpreter {
    declarations: BTreeMap<String, Variable>,
}

impl Interpreter {
    fn declare(&mut self, variable: Variable) -> Result<()> {
        if let Some(existing) = self.declarations.get(variable.name()) {
            if existing.sort() != variable.sort() {
                return parse_error(format!(
                    "'{}' redeclared as {} (was {})",
                    variable.name(),
                    variable.sort(),
                    existing.sort()
                ));
            }
        }
        self.declarations
            .insert(variable.name().to_string(), variable);
        Ok(())
    }

    fn interpret(&mut self, items: &[SExpr]) -> Result<Vec<Query>> {
        let mut queries = Vec::new();
        let mut rest = items;

        while let Some((head, tail)) = rest.split_first() {
            rest = match head {
                SExpr::Atom(keyword) if keyword == "array" => self.array_declaration(tail)?,
                SExpr::Atom(keyword) if keyword == "var" => self.var_declaration(tail)?,
                SExpr::List(items) => {
                    queries.push(self.query(items)?);
                    tail
                }
                _ => return parse_error(format!("unexpected {:?}", head)),
            };
        }

        Ok(queries)
    }

    // array NAME [SIZE]? : wI -> wV = symbolic
    fn array_declaration<'a>(&mut self, items: &'a [SExpr]) -> Result<&'a [SExpr]> {
        let (name, mut rest) = match items.split_first() {
            Some((SExpr::Atom(name), rest)) => (name.clone(), rest),
            _ => return parse_error("expected array name".to_string()),
        };
        if let Some(SExpr::Bracket(_)) = rest.first() {
            rest = &rest[1..];
        }
        match rest {
            [SExpr::Atom(colon), index, SExpr::Atom(arrow), value, tail @ ..]
                if colon == ":" && arrow == "->" =>
            {
                let sort = Sort::array(parse_width(index)?, parse_width(value)?);
                self.declare(Variable::new(name, sort))?;
                // The `= symbolic` suffix is optional.
                match tail {
                    [SExpr::Atom(eq), SExpr::Atom(symbolic), rest @ ..]
                        if eq == "=" && symbolic == "symbolic" =>
                    {
                        Ok(rest)
                    }
                    _ => Ok(tail),
                }
            }
            _ => parse_error(format!("malformed declaration of array '{}'", name)),
        }
    }

    // var NAME : SORT
    fn var_declaration<'a>(&mut self, items: &'a [SExpr]) -> Result<&'a [SExpr]> {
        match items {
            [SExpr::Atom(name), SExpr::Atom(colon), sort, tail @ ..] if colon == ":" => {
                let sort = match sort {
                    SExpr::Atom(s) if s == "bool" => Sort::boolean(),
                    width => Sort::bit_vector(parse_width(width)?),
                };
                self.declare(Variable::new(name.as_str(), sort))?;
                Ok(tail)
            }
            _ => parse_error("malformed variable declaration".to_string()),
        }
    }

    // (query [CONSTRAINTS] EXPR)
    fn query(&self, items: &[SExpr]) -> Result<Query> {
        match items {
            [SExpr::Atom(keyword), SExpr::Bracket(constraints), expr] if keyword == "query" => {
                let constraints = constraints
                    .iter()
                    .map(|c| self.expression(c))
                    .collect::<Result<Vec<_>>>()?;
                Query::new(constraints, self.expression(expr)?)
            }
            _ => parse_error(format!("expected query but got {:?}", items)),
        }
    }

    fn expression(&self, sexpr: &SExpr) -> Result<Expression> {
        match sexpr {
            SExpr::Atom(s) if s == "true" => Ok(Boolean::constant(true)),
            SExpr::Atom(s) if s == "false" => Ok(Boolean::constant(false)),
            SExpr::Atom(name) => match self.declarations.get(name) {
                Some(variable) => Ok(variable.clone().into()),
                None => parse_error(format!("undeclared symbol '{}'", name)),
            },
            SExpr::List(items) => match items.split_first() {
                Some((SExpr::Atom(head), args)) => self.application(head, args),
                _ => parse_error(format!("malformed expression {:?}", items)),
            },
            SExpr::Bracket(_) => parse_error("unexpected '['".to_string()),
        }
    }

    fn application(&self, head: &str, args: &[SExpr]) -> Result<Expression> {
        if head.starts_with('w') && args.len() == 1 {
            let width = parse_width(&SExpr::Atom(head.to_string()))?;
            return Ok(BitVector::constant(BitVectorValue::new(
                parse_number(&args[0])?,
                width,
            )));
        }

        match head {
            "Extract" => match args {
                [width, offset, expr] => {
                    let width = parse_width(width)?;
                    let offset = number_to_usize(parse_number(offset)?)?;
                    BitVector::extract(offset + width - 1, offset, self.expression(expr)?)
                }
                _ => arity_error(head, 3),
            },
            "ZExt" | "SExt" => match args {
                [width, expr] => {
                    let width = parse_width(width)?;
                    let expr = self.expression(expr)?;
                    if head == "ZExt" {
                        BitVector::zero_extend(width, expr)
                    } else {
                        BitVector::sign_extend(width, expr)
                    }
                }
                _ => arity_error(head, 2),
            },
            "ConstArray" => match args {
                [index, default] => {
                    let default = self.expression(default)?;
                    match default.operator() {
                        Operator::Constant(Constant::BitVector(bv)) => Ok(Array::constant(
                            ArrayValue::new(parse_width(index)?, bv.clone()),
                        )),
                        _ => parse_error("ConstArray expects a constant default".to_string()),
                    }
                }
                _ => arity_error(head, 2),
            },
            _ => {
                let operands = args
                    .iter()
                    .map(|arg| self.expression(arg))
                    .collect::<Result<Vec<_>>>()?;
                apply(head, operands)
            }
        }
    }
}

fn number_to_usize(number: BigUint) -> Result<usize> {
    match number.to_usize() {
        Some(n) => Ok(n),
        None => parse_error(format!("number {} out of range", number)),
    }
}

fn arity_error<T>(head: &str, arity: usize) -> Result<T> {
    parse_error(format!("'{}' expects {} arguments", head, arity))
}

fn apply(head: &str, operands: Vec<Expression>) -> Result<Expression> {
    let is_boolean = operands
        .first()
        .map(|op| op.sort().is_boolean())
        .unwrap_or(false);

    let fold = |f: fn(Expression, Expression) -> Result<Expression>| {
        let mut iter = operands.clone().into_iter();
        match (iter.next(), iter.next()) {
            (Some(first), Some(second)) => iter.try_fold(f(first, second)?, |acc, op| f(acc, op)),
            _ => arity_error(head, 2),
        }
    };

    match (head, operands.as_slice()) {
        ("Eq", [lhs, rhs]) => Expression::equal(lhs.clone(), rhs.clone()),
        ("Select", [cond, then, else_]) => {
            Expression::ite(cond.clone(), then.clone(), else_.clone())
        }
        ("Not", [expr]) if is_boolean => Boolean::not(expr.clone()),
        ("Not", [expr]) => BitVector::not(expr.clone()),
        ("Implies", [lhs, rhs]) => Boolean::imply(lhs.clone(), rhs.clone()),
        ("And", [_, _, ..]) if is_boolean => Boolean::conjunction(&operands),
        ("And", _) => fold(BitVector::and),
        ("Or", _) if is_boolean => fold(Boolean::or),
        ("Or", _) => fold(BitVector::or),
        ("Xor", _) if is_boolean => fold(Boolean::xor),
        ("Xor", _) => fold(BitVector::xor),
        ("Add", _) => fold(BitVector::add),
        ("Sub", [lhs, rhs]) => BitVector::sub(lhs.clone(), rhs.clone()),
        ("Mul", _) => fold(BitVector::mul),
        ("UDiv", [lhs, rhs]) => BitVector::udiv(lhs.clone(), rhs.clone()),
        ("URem", [lhs, rhs]) => BitVector::urem(lhs.clone(), rhs.clone()),
        ("Shl", [lhs, rhs]) => BitVector::shl(lhs.clone(), rhs.clone()),
        ("LShr", [lhs, rhs]) => BitVector::lshr(lhs.clone(), rhs.clone()),
        ("Ult", [lhs, rhs]) => BitVector::ult(lhs.clone(), rhs.clone()),
        ("Ule", [lhs, rhs]) => BitVector::ule(lhs.clone(), rhs.clone()),
        ("Slt", [lhs, rhs]) => BitVector::slt(lhs.clone(), rhs.clone()),
        ("Sle", [lhs, rhs]) => BitVector::sle(lhs.clone(), rhs.clone()),
        ("Concat", [high, low]) => BitVector::concat(high.clone(), low.clone()),
        ("Read", [arr, index]) => Array::select(arr.clone(), index.clone()),
        ("Write", [arr, index, value]) => Array::store(arr.clone(), index.clone(), value.clone()),
        _ => parse_error(format!(
            "unknown operator '{}' with {} operands",
            head,
            operands.len()
        )),
    }
}

/// Parses all queries of a KQuery document.
pub fn parse_queries(input: &str) -> Result<Vec<Query>> {
    let items = match document(input) {
        Ok((_, items)) => items,
        Err(nom::Err::Error((rest, _))) | Err(nom::Err::Failure((rest, _))) => {
            let offset = input.len() - rest.len();
            let line = input[..offset].lines().count().max(1);
            return parse_error(format!("syntax error in line {}", line));
        }
        Err(nom::Err::Incomplete(_)) => return parse_error("incomplete input".to_string()),
    };

    Interpreter::default().interpret(&items)
}

use crate::error::Result;
use crate::expr::{Array, Boolean, Constant, Expression, Operator, Sort, Variable};
use crate::query::Query;
use std::collections::{BTreeMap, BTreeSet};

/// A read `arr[index]` which was replaced by `value`.
struct Read {
    index: Expression,
    value: Variable,
}

/// Eliminates array reads with the Ackermann reduction.
///
/// Every `select` on an array variable which is only ever read becomes a fresh bit-vector
/// variable. For each pair of reads on the same array the constraint
/// `index_k = index_l => value_k = value_l` is added. Arrays which are written or compared
/// as a whole are left untouched.
pub fn ackermannize(query: &Query) -> Result<Query> {
    let mut candidates = BTreeSet::new();
    let mut excluded = BTreeSet::new();
    for expr in query.constraints().iter().chain(Some(query.expr())) {
        classify_arrays(expr, false, &mut candidates, &mut excluded);
    }
    let eligible: BTreeSet<Variable> = candidates.difference(&excluded).cloned().collect();
    if eligible.is_empty() {
        return Ok(query.clone());
    }

    let mut reducer = Reducer {
        eligible,
        taken_names: query
            .variables()
            .into_iter()
            .map(|variable| variable.name().to_owned())
            .collect(),
        reads: BTreeMap::new(),
    };

    let mut constraints = query
        .constraints()
        .iter()
        .map(|constraint| reducer.rewrite(constraint))
        .collect::<Result<Vec<_>>>()?;
    let expr = reducer.rewrite(query.expr())?;

    constraints.extend(reducer.consistency_constraints()?);

    Query::new(constraints, expr)
}

fn classify_arrays(
    expr: &Expression,
    read_position: bool,
    candidates: &mut BTreeSet<Variable>,
    excluded: &mut BTreeSet<Variable>,
) {
    match expr.operator() {
        Operator::Variable(variable) if variable.sort().is_array() => {
            if read_position {
                candidates.insert(variable.clone());
            } else {
                excluded.insert(variable.clone());
            }
        }
        Operator::Array(Array::Select) => {
            for (i, operand) in expr.operands().iter().enumerate() {
                classify_arrays(operand, i == 0, candidates, excluded);
            }
        }
        _ => {
            for operand in expr.operands() {
                classify_arrays(operand, false, candidates, excluded);
            }
        }
    }
}

struct Reducer {
    eligible: BTreeSet<Variable>,
    taken_names: BTreeSet<String>,
    reads: BTreeMap<Variable, Vec<Read>>,
}

impl Reducer {
    fn rewrite(&mut self, expr: &Expression) -> Result<Expression> {
        if expr.operands().is_empty() {
            return Ok(expr.clone());
        }

        let operands = expr
            .operands()
            .iter()
            .map(|operand| self.rewrite(operand))
            .collect::<Result<Vec<_>>>()?;

        if let Operator::Array(Array::Select) = expr.operator() {
            if let Operator::Variable(array) = operands[0].operator() {
                if self.eligible.contains(array) {
                    let array = array.clone();
                    return Ok(self.read(array, operands[1].clone(), expr.sort()).into());
                }
            }
        }

        Ok(Expression::new(
            expr.operator().clone(),
            operands,
            expr.sort().clone(),
        ))
    }

    /// Returns the variable standing for `array[index]`, reusing it for repeated reads.
    fn read(&mut self, array: Variable, index: Expression, sort: &Sort) -> Variable {
        if let Some(read) = self
            .reads
            .get(&array)
            .and_then(|reads| reads.iter().find(|read| read.index == index))
        {
            return read.value.clone();
        }

        let value = Variable::new(self.fresh_name(array.name()), sort.clone());
        self.reads.entry(array).or_default().push(Read {
            index,
            value: value.clone(),
        });
        value
    }

    fn fresh_name(&mut self, array_name: &str) -> String {
        let mut k = 0;
        loop {
            let name = format!("{}_ack{}", array_name, k);
            if self.taken_names.insert(name.clone()) {
                return name;
            }
            k += 1;
        }
    }

    fn consistency_constraints(&self) -> Result<Vec<Expression>> {
        let mut constraints = Vec::new();
        for reads in self.reads.values() {
            for (k, first) in reads.iter().enumerate() {
                for second in &reads[k + 1..] {
                    if distinct_constants(&first.index, &second.index) {
                        continue;
                    }
                    constraints.push(Boolean::imply(
                        Expression::equal(first.index.clone(), second.index.clone())?,
                        Expression::equal(first.value.clone().into(), second.value.clone().into())?,
                    )?);
                }
            }
        }
        Ok(constraints)
    }
}

fn distinct_constants(lhs: &Expression, rhs: &Expression) -> bool {
    match (lhs.operator(), rhs.operator()) {
        (Operator::Constant(Constant::BitVector(l)), Operator::Constant(Constant::BitVector(r))) => {
            l != r
        }
        _ => false,
    }
}

use crate::error::Result;
use crate::expr::{Assignment, Boolean, Expression, Variable};
use crate::query::{Query, Validity};
use crate::solver::{ConstraintLog, LogConfig, Solver};
use std::collections::BTreeSet;

/// Drops constraints which cannot influence the query expression.
///
/// Constraints are related if they share a variable, directly or through other constraints.
/// Models are computed per group of related formulas and merged.
pub struct IndependentSolver {
    solver: Box<dyn Solver>,
}

impl IndependentSolver {
    pub fn new(solver: Box<dyn Solver>) -> Self {
        Self { solver }
    }
}

/// Returns the constraints related to the query expression, keeping their order.
///
/// Constraints without variables are always kept, an unsatisfiable one decides every query.
fn relevant_constraints(query: &Query) -> Vec<Expression> {
    let constraints = query.constraints();
    let mut variables: BTreeSet<&Variable> = query.expr().variables();
    let mut taken = vec![false; constraints.len()];

    loop {
        let mut changed = false;
        for (i, constraint) in constraints.iter().enumerate() {
            if taken[i] {
                continue;
            }
            let constraint_variables = constraint.variables();
            if constraint_variables.is_empty()
                || !constraint_variables.is_disjoint(&variables)
            {
                taken[i] = true;
                variables.extend(constraint_variables);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    constraints
        .iter()
        .zip(taken)
        .filter(|(_, taken)| *taken)
        .map(|(constraint, _)| constraint.clone())
        .collect()
}

/// Splits `formulas` into groups which share no variables.
fn independent_groups(formulas: Vec<Expression>) -> Vec<Vec<Expression>> {
    let mut groups: Vec<(BTreeSet<Variable>, Vec<Expression>)> = Vec::new();

    for formula in formulas {
        let variables: BTreeSet<Variable> = formula.variables().into_iter().cloned().collect();

        let (related, mut unrelated): (Vec<_>, Vec<_>) = groups
            .into_iter()
            .partition(|(group_variables, _)| !group_variables.is_disjoint(&variables));

        let mut merged_variables = variables;
        let mut merged_formulas = Vec::new();
        for (group_variables, group_formulas) in related {
            merged_variables.extend(group_variables);
            merged_formulas.extend(group_formulas);
        }
        merged_formulas.push(formula);

        unrelated.push((merged_variables, merged_formulas));
        groups = unrelated;
    }

    groups.into_iter().map(|(_, formulas)| formulas).collect()
}

impl Solver for IndependentSolver {
    fn compute_truth(&mut self, query: &Query) -> Result<bool> {
        let reduced = query.with_constraints(relevant_constraints(query));
        self.solver.compute_truth(&reduced)
    }

    fn compute_validity(&mut self, query: &Query) -> Result<Validity> {
        let reduced = query.with_constraints(relevant_constraints(query));
        self.solver.compute_validity(&reduced)
    }

    fn compute_initial_values(&mut self, query: &Query) -> Result<Option<Assignment>> {
        let mut formulas = query.constraints().to_vec();
        formulas.push(Boolean::not(query.expr().clone())?);

        let mut assignment = Assignment::new();
        for group in independent_groups(formulas) {
            let group_query = Query::new(group, Boolean::constant(false))?;
            match self.solver.compute_initial_values(&group_query)? {
                Some(values) => assignment.merge(values),
                None => return Ok(None),
            }
        }
        Ok(Some(assignment))
    }

    fn render_log(&self, query: &Query, config: Option<&LogConfig>) -> Result<ConstraintLog> {
        self.solver.render_log(query, config)
    }
}

use good_lp::Solution as LpSolution;
use good_lp::solvers::SolutionStatus;
use good_lp::solvers::coin_cbc::coin_cbc;
use good_lp::{Expression, ResolutionError, SolverModel, Variable, variable, variables};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::error::Error;
use crate::model::{ColumnKind, Model, Row, Sense};

/// Flows below this are treated as zero when decoding the plan.
const FLOW_EPSILON: f64 = 1e-9;

/// CBC reasons for stopping without proving anything about the model.
const NOT_SOLVED_REASONS: [&str; 3] = ["Stopped", "Abandoned", "UserEvent"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Optimal,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Optimal => "Optimal",
            Status::Infeasible => "Infeasible",
            Status::Unbounded => "Unbounded",
            Status::NotSolved => "Not Solved",
        };
        f.write_str(label)
    }
}

/// Outcome of a solve. Values and the decoded plan are empty unless the
/// status is [`Status::Optimal`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub status: Status,
    pub objective: Option<f64>,
    /// site names whose open decision resolved to 1
    #[serde(rename = "open")]
    pub open_sites: Vec<String>,
    /// site → area → tons, non-zero flows only
    pub flows: BTreeMap<String, BTreeMap<String, f64>>,
    /// variable name → resolved value
    #[serde(skip)]
    pub values: BTreeMap<String, f64>,
}

impl Solution {
    fn without_values(status: Status) -> Self {
        Solution {
            status,
            objective: None,
            open_sites: Vec::new(),
            flows: BTreeMap::new(),
            values: BTreeMap::new(),
        }
    }

    /// Total tons received by a site.
    pub fn inflow(&self, site: &str) -> f64 {
        self.flows
            .get(site)
            .map(|areas| areas.values().sum())
            .unwrap_or(0.0)
    }

    /// Total tons shipped out of an area.
    pub fn outflow(&self, area: &str) -> f64 {
        self.flows
            .values()
            .filter_map(|areas| areas.get(area))
            .sum()
    }
}

/// Solve the model with CBC.
///
/// Infeasible and unbounded models are ordinary outcomes and come back as a
/// [`Solution`] carrying that status. Only a solver that fails to run is an
/// error.
pub fn solve(model: &Model) -> Result<Solution, Error> {
    // Rows without terms reduce to `0 <sense> rhs` and are decided here; CBC
    // never sees them.
    if let Some(row) = model.rows.iter().find(|row| is_violated_constant_row(row)) {
        warn!(model = %model.name, row = %row.name, "row cannot be satisfied");
        return Ok(Solution::without_values(Status::Infeasible));
    }

    let mut problem_vars = variables!();
    let handles: Vec<Variable> = model
        .columns
        .iter()
        .map(|column| {
            let definition = match column.kind {
                ColumnKind::Binary => variable().binary(),
                ColumnKind::Continuous => variable().min(0),
            };
            problem_vars.add(definition.name(column.name.clone()))
        })
        .collect();

    let objective = linear_expression(&model.objective, &handles);

    #[allow(unused_mut)]
    let mut lp = problem_vars.minimise(objective).using(coin_cbc);
    #[cfg(not(debug_assertions))]
    lp.set_parameter("loglevel", "0");

    let lp = model
        .rows
        .iter()
        .filter(|row| !row.terms.is_empty())
        .fold(lp, |lp, row| lp.with(row_constraint(row, &handles)));

    let resolved = match lp.solve() {
        Ok(resolved) => resolved,
        Err(err) => {
            let status = status_from_error(err)?;
            warn!(model = %model.name, %status, "no optimal solution");
            return Ok(Solution::without_values(status));
        }
    };

    let status = status_from_solution(resolved.status());
    if status != Status::Optimal {
        warn!(model = %model.name, %status, "solver stopped before proving optimality");
        return Ok(Solution::without_values(status));
    }

    let column_values: Vec<f64> = handles.iter().map(|&v| resolved.value(v)).collect();
    let solution = create_solution(model, &column_values);
    info!(
        objective = solution.objective,
        open = ?solution.open_sites,
        "solved landfill location model"
    );
    Ok(solution)
}

fn linear_expression(terms: &[(usize, f64)], handles: &[Variable]) -> Expression {
    terms
        .iter()
        .fold(Expression::from(0.0), |sum, &(column, coefficient)| {
            sum + handles[column] * coefficient
        })
}

fn row_constraint(row: &Row, handles: &[Variable]) -> good_lp::Constraint {
    let lhs = linear_expression(&row.terms, handles);
    match row.sense {
        Sense::GreaterOrEqual => lhs.geq(row.rhs),
        Sense::LessOrEqual => lhs.leq(row.rhs),
    }
}

fn is_violated_constant_row(row: &Row) -> bool {
    row.terms.is_empty()
        && match row.sense {
            Sense::GreaterOrEqual => 0.0 < row.rhs,
            Sense::LessOrEqual => 0.0 > row.rhs,
        }
}

/// CBC also hands back a solution when it stops on a time or gap limit; only
/// a proven optimum counts as [`Status::Optimal`].
fn status_from_solution(status: SolutionStatus) -> Status {
    match status {
        SolutionStatus::Optimal => Status::Optimal,
        _ => Status::NotSolved,
    }
}

/// Map a solver error to the status it stands for, or to
/// [`Error::SolverUnavailable`] when the solver itself failed.
fn status_from_error(err: ResolutionError) -> Result<Status, Error> {
    match err {
        ResolutionError::Infeasible => Ok(Status::Infeasible),
        ResolutionError::Unbounded => Ok(Status::Unbounded),
        ResolutionError::Other(reason) if NOT_SOLVED_REASONS.contains(&reason) => {
            Ok(Status::NotSolved)
        }
        other => Err(Error::SolverUnavailable(other.to_string())),
    }
}

/// Decode resolved column values into a solution.
fn create_solution(model: &Model, column_values: &[f64]) -> Solution {
    let values = model
        .columns
        .iter()
        .zip(column_values)
        .map(|(column, &value)| (column.name.clone(), value))
        .collect();

    let objective = model
        .objective
        .iter()
        .map(|&(column, coefficient)| coefficient * column_values[column])
        .sum();

    let open_sites = model
        .open
        .iter()
        .filter(|&&(_, column)| column_values[column] >= 0.5)
        .map(|(site, _)| site.clone())
        .collect();

    let mut flows: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for ((site, area), column) in &model.routes {
        let tons = column_values[*column];
        if tons > FLOW_EPSILON {
            flows
                .entry(site.clone())
                .or_default()
                .insert(area.clone(), tons);
        }
    }

    Solution {
        status: Status::Optimal,
        objective: Some(objective),
        open_sites,
        flows,
        values,
    }
}

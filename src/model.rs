use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::Error;
use crate::problem::Problem;

pub const MODEL_NAME: &str = "Landfill_Location_Problem";
pub const OBJECTIVE_NAME: &str = "Sum_of_Costs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Binary,
    Continuous,
}

/// A decision variable of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    GreaterOrEqual,
    LessOrEqual,
}

/// A named linear constraint `Σ coefficient × column <sense> rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

/// A minimisation MILP over named columns.
///
/// Terms refer to columns by index into [`Model::columns`]. The model is a
/// plain description: it can be solved any number of times and written out
/// as LP text without touching the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub columns: Vec<Column>,
    pub objective: Vec<(usize, f64)>,
    pub rows: Vec<Row>,
    /// site → column of its open decision
    pub(crate) open: Vec<(String, usize)>,
    /// (site, area) → column of its route flow
    pub(crate) routes: Vec<((String, String), usize)>,
}

/// Build the landfill location model for a validated problem.
///
/// Columns are one `Open_<site>` binary per site followed by one
/// `Route_<site>_<area>` continuous flow per route, in declaration order.
pub fn build_model(problem: &Problem) -> Result<Model, Error> {
    problem.validate()?;

    let (columns, open, routes) = init_columns(problem);
    let objective = create_objective(problem, &open, &routes);

    let mut rows = Vec::with_capacity(problem.areas.len() + problem.sites.len());
    rows.extend(constrain_demand_satisfied(problem, &routes));
    rows.extend(constrain_flow_to_open_sites(problem, &open, &routes));

    info!(
        columns = columns.len(),
        rows = rows.len(),
        big_m = problem.big_m,
        "built landfill location model"
    );

    Ok(Model {
        name: MODEL_NAME.to_owned(),
        columns,
        objective,
        rows,
        open,
        routes,
    })
}

pub fn open_name(site: &str) -> String {
    format!("Open_{site}")
}

pub fn route_name(site: &str, area: &str) -> String {
    format!("Route_{site}_{area}")
}

type OpenColumns = Vec<(String, usize)>;
type RouteColumns = Vec<((String, String), usize)>;

fn init_columns(problem: &Problem) -> (Vec<Column>, OpenColumns, RouteColumns) {
    let mut columns = Vec::with_capacity(problem.sites.len() * (problem.areas.len() + 1));
    let mut open = Vec::with_capacity(problem.sites.len());
    let mut routes = Vec::with_capacity(problem.sites.len() * problem.areas.len());

    for site in &problem.sites {
        open.push((site.clone(), columns.len()));
        columns.push(Column {
            name: open_name(site),
            kind: ColumnKind::Binary,
        });
    }

    for site in &problem.sites {
        for area in &problem.areas {
            routes.push(((site.clone(), area.clone()), columns.len()));
            columns.push(Column {
                name: route_name(site, area),
                kind: ColumnKind::Continuous,
            });
        }
    }

    (columns, open, routes)
}

/// Transportation + fixed + operating costs, merged per column.
fn create_objective(
    problem: &Problem,
    open: &OpenColumns,
    routes: &RouteColumns,
) -> Vec<(usize, f64)> {
    let mut coefficients = BTreeMap::new();

    for ((site, area), column) in routes {
        let transport = problem.transport_cost[site][area];
        *coefficients.entry(*column).or_insert(0.0) += transport;
    }
    for (site, column) in open {
        *coefficients.entry(*column).or_insert(0.0) += problem.fixed_cost[site];
    }
    for ((site, _), column) in routes {
        *coefficients.entry(*column).or_insert(0.0) += problem.operating_cost[site];
    }

    coefficients.into_iter().collect()
}

/// Every area ships out at least its demand: `Σ_site Route(site, area) >= Demand(area)`.
fn constrain_demand_satisfied(problem: &Problem, routes: &RouteColumns) -> Vec<Row> {
    problem
        .areas
        .iter()
        .map(|area| {
            let terms = routes
                .iter()
                .filter(|((_, a), _)| a == area)
                .map(|(_, column)| (*column, 1.0))
                .collect();
            let rhs = problem.demand[area];
            debug!(area = %area, demand = rhs, "demand row");
            Row {
                name: format!("Demand_{area}"),
                terms,
                sense: Sense::GreaterOrEqual,
                rhs,
            }
        })
        .collect()
}

/// No flow into a closed site: `Σ_area Route(site, area) - BigM × Open(site) <= 0`.
fn constrain_flow_to_open_sites(
    problem: &Problem,
    open: &OpenColumns,
    routes: &RouteColumns,
) -> Vec<Row> {
    open.iter()
        .map(|(site, open_column)| {
            let mut terms: Vec<(usize, f64)> = routes
                .iter()
                .filter(|((s, _), _)| s == site)
                .map(|(_, column)| (*column, 1.0))
                .collect();
            terms.push((*open_column, -problem.big_m));
            Row {
                name: format!("Linking_{site}"),
                terms,
                sense: Sense::LessOrEqual,
                rhs: 0.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;

    fn column_index(model: &Model, name: &str) -> usize {
        model
            .columns
            .iter()
            .position(|c| c.name == name)
            .unwrap_or_else(|| panic!("no column {name}"))
    }

    #[test]
    fn creates_one_open_decision_per_site_and_one_flow_per_route() {
        let model = build_model(&Problem::metropolis()).unwrap();

        assert_eq!(model.columns.len(), 4 + 4 * 6);
        let binaries: Vec<_> = model
            .columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Binary)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(binaries, ["Open_L1", "Open_L2", "Open_L3", "Open_L4"]);
        assert_eq!(model.columns[4].name, "Route_L1_A");
        assert_eq!(model.columns[27].name, "Route_L4_F");
        assert_eq!(model.routes.len(), 24);
    }

    #[test]
    fn objective_merges_transport_and_operating_costs() {
        let model = build_model(&Problem::metropolis()).unwrap();
        let coefficient = |name: &str| {
            let column = column_index(&model, name);
            model
                .objective
                .iter()
                .find(|(c, _)| *c == column)
                .map(|(_, coef)| *coef)
                .unwrap()
        };

        assert_eq!(model.objective.len(), 28);
        assert_eq!(coefficient("Open_L1"), 1000.0);
        assert_eq!(coefficient("Open_L3"), 700.0);
        // 14 transport + 8 operating
        assert_eq!(coefficient("Route_L1_A"), 22.0);
        // 6 transport + 11 operating
        assert_eq!(coefficient("Route_L4_F"), 17.0);
    }

    #[test]
    fn demand_and_linking_rows() {
        let model = build_model(&Problem::metropolis()).unwrap();
        assert_eq!(model.rows.len(), 6 + 4);

        let demand_c = model.rows.iter().find(|r| r.name == "Demand_C").unwrap();
        assert_eq!(demand_c.sense, Sense::GreaterOrEqual);
        assert_eq!(demand_c.rhs, 1500.0);
        let names: Vec<_> = demand_c
            .terms
            .iter()
            .map(|(c, coef)| {
                assert_eq!(*coef, 1.0);
                model.columns[*c].name.as_str()
            })
            .collect();
        assert_eq!(
            names,
            ["Route_L1_C", "Route_L2_C", "Route_L3_C", "Route_L4_C"]
        );

        let linking = model.rows.iter().find(|r| r.name == "Linking_L2").unwrap();
        assert_eq!(linking.sense, Sense::LessOrEqual);
        assert_eq!(linking.rhs, 0.0);
        assert_eq!(linking.terms.len(), 7);
        assert_eq!(
            linking.terms.last(),
            Some(&(column_index(&model, "Open_L2"), -9999.0))
        );
    }

    #[test]
    fn building_is_deterministic() {
        let problem = Problem::metropolis();
        assert_eq!(build_model(&problem).unwrap(), build_model(&problem).unwrap());
    }

    #[test]
    fn fails_fast_on_small_big_m() {
        let mut problem = Problem::metropolis();
        problem.big_m = 1000.0;
        let err = build_model(&problem).unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::BigMTooSmall { .. })
        ));
    }
}

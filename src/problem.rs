use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConfigurationError;

/// Input tables of a landfill location problem.
///
/// Sites and areas are kept in declaration order; that order drives the
/// order of the model's columns and rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub sites: Vec<String>,
    pub areas: Vec<String>,
    #[serde(rename = "fixedCost")]
    pub fixed_cost: BTreeMap<String, f64>,
    #[serde(rename = "operatingCost")]
    pub operating_cost: BTreeMap<String, f64>,
    /// site → area → cost per ton shipped
    #[serde(rename = "transportCost")]
    pub transport_cost: BTreeMap<String, BTreeMap<String, f64>>,
    pub demand: BTreeMap<String, f64>,
    #[serde(rename = "bigM", default = "default_big_m")]
    pub big_m: f64,
}

fn default_big_m() -> f64 {
    9999.0
}

impl Problem {
    /// The Metropolis city council instance: four candidate landfills and six
    /// collection areas.
    pub fn metropolis() -> Self {
        let sites = ["L1", "L2", "L3", "L4"];
        let areas = ["A", "B", "C", "D", "E", "F"];
        let transport = [
            // A  B   C   D   E  F
            [14., 12., 13., 10., 8., 11.], // L1
            [16., 11., 8., 15., 12., 10.], // L2
            [10., 12., 9., 14., 10., 8.],  // L3
            [8., 14., 11., 12., 11., 6.],  // L4
        ];

        let transport_cost: BTreeMap<String, BTreeMap<String, f64>> = sites
            .iter()
            .zip(transport)
            .map(|(site, row)| {
                let costs: BTreeMap<String, f64> = areas
                    .iter()
                    .zip(row)
                    .map(|(area, cost)| (area.to_string(), cost))
                    .collect();
                (site.to_string(), costs)
            })
            .collect();

        Problem {
            sites: sites.map(String::from).to_vec(),
            areas: areas.map(String::from).to_vec(),
            fixed_cost: table(&sites, [1000., 800., 700., 900.]),
            operating_cost: table(&sites, [8., 10., 9., 11.]),
            transport_cost,
            demand: table(&areas, [500., 700., 1500., 1000., 1800., 1200.]),
            big_m: default_big_m(),
        }
    }

    pub fn total_demand(&self) -> f64 {
        self.demand.values().sum()
    }

    /// Check the tables against the declared sites and areas.
    ///
    /// Runs before any model is built so that bad data never reaches the
    /// solver.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let sites = unique(&self.sites).map_err(ConfigurationError::DuplicateSite)?;
        let areas = unique(&self.areas).map_err(ConfigurationError::DuplicateArea)?;

        check_site_table("fixedCost", &self.fixed_cost, &sites)?;
        check_site_table("operatingCost", &self.operating_cost, &sites)?;
        check_area_table("demand", &self.demand, &areas)?;

        for site in self.transport_cost.keys() {
            if !sites.contains(site.as_str()) {
                return Err(ConfigurationError::UnknownSite {
                    table: "transportCost",
                    site: site.clone(),
                });
            }
        }
        for site in &self.sites {
            let Some(costs) = self.transport_cost.get(site) else {
                return Err(ConfigurationError::MissingEntry {
                    table: "transportCost",
                    key: site.clone(),
                });
            };
            check_area_table("transportCost", costs, &areas)
                .map_err(|err| qualify_with_site(site, err))?;
        }

        check_value("bigM", "bigM", self.big_m)?;
        let total_demand = self.total_demand();
        if self.big_m < total_demand {
            return Err(ConfigurationError::BigMTooSmall {
                big_m: self.big_m,
                total_demand,
            });
        }

        Ok(())
    }
}

fn table<const N: usize>(keys: &[&str; N], values: [f64; N]) -> BTreeMap<String, f64> {
    keys.iter()
        .zip(values)
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Prefix transport cost keys with their site so errors name the full route.
fn qualify_with_site(site: &str, err: ConfigurationError) -> ConfigurationError {
    match err {
        ConfigurationError::MissingEntry { table, key } => ConfigurationError::MissingEntry {
            table,
            key: format!("{site}/{key}"),
        },
        ConfigurationError::InvalidValue { table, key, value } => {
            ConfigurationError::InvalidValue {
                table,
                key: format!("{site}/{key}"),
                value,
            }
        }
        other => other,
    }
}

/// Collect names into a set, returning the first duplicate as the error.
fn unique(names: &[String]) -> Result<BTreeSet<&str>, String> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(name.clone());
        }
    }
    Ok(seen)
}

fn check_value(table: &'static str, key: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidValue {
            table,
            key: key.to_owned(),
            value,
        })
    }
}

fn check_site_table(
    table: &'static str,
    values: &BTreeMap<String, f64>,
    sites: &BTreeSet<&str>,
) -> Result<(), ConfigurationError> {
    if let Some(site) = values.keys().find(|site| !sites.contains(site.as_str())) {
        return Err(ConfigurationError::UnknownSite {
            table,
            site: site.clone(),
        });
    }
    check_complete(table, values, sites)
}

fn check_area_table(
    table: &'static str,
    values: &BTreeMap<String, f64>,
    areas: &BTreeSet<&str>,
) -> Result<(), ConfigurationError> {
    if let Some(area) = values.keys().find(|area| !areas.contains(area.as_str())) {
        return Err(ConfigurationError::UnknownArea {
            table,
            area: area.clone(),
        });
    }
    check_complete(table, values, areas)
}

fn check_complete(
    table: &'static str,
    values: &BTreeMap<String, f64>,
    keys: &BTreeSet<&str>,
) -> Result<(), ConfigurationError> {
    for &key in keys {
        let Some(&value) = values.get(key) else {
            return Err(ConfigurationError::MissingEntry {
                table,
                key: key.to_owned(),
            });
        };
        check_value(table, key, value)?;
    }
    Ok(())
}

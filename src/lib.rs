pub mod error;
pub mod lp_format;
pub mod model;
pub mod problem;
pub mod report;
pub mod solve;

pub use error::{ConfigurationError, Error};
pub use model::{Model, build_model};
pub use problem::Problem;
pub use report::report;
pub use solve::{Solution, Status, solve};

impl Problem {
    /// Build the model for this problem and solve it.
    pub fn solve(&self) -> Result<Solution, Error> {
        let model = build_model(self)?;
        solve::solve(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::fs::{read_dir, read_to_string};
    use std::path::Path;

    const TOLERANCE: f64 = 1e-6;

    #[derive(Debug, Deserialize)]
    struct Expected {
        status: Status,
        objective: Option<f64>,
        #[serde(default)]
        open: Vec<String>,
        #[serde(default)]
        flows: BTreeMap<String, BTreeMap<String, f64>>,
    }

    #[derive(Debug, Deserialize)]
    struct ExpectedFile {
        solution: Expected,
    }

    fn assert_flows_match(
        expected: &BTreeMap<String, BTreeMap<String, f64>>,
        received: &BTreeMap<String, BTreeMap<String, f64>>,
        test_file: &Path,
    ) {
        let sites: Vec<_> = expected.keys().collect();
        let received_sites: Vec<_> = received.keys().collect();
        assert_eq!(sites, received_sites, "{}", test_file.display());

        for (site, areas) in expected {
            let received_areas = &received[site];
            assert_eq!(
                areas.keys().collect::<Vec<_>>(),
                received_areas.keys().collect::<Vec<_>>(),
                "{}: areas served by {site}",
                test_file.display()
            );
            for (area, tons) in areas {
                let got = received_areas[area];
                assert!(
                    (got - tons).abs() < TOLERANCE,
                    "{}: {site}/{area} expected {tons}, got {got}",
                    test_file.display()
                );
            }
        }
    }

    // Helper function to run a test from a test file
    fn run_test_file(test_file: &Path) {
        println!("Running test for file: {:?}", test_file);

        let failure_message = format!("Failed to read test file: {}", test_file.display());
        let yaml_content = read_to_string(test_file).expect(&failure_message);

        // Split the file content at the "solution:" marker to separate input and expected output
        let parts: Vec<&str> = yaml_content.split("solution:").collect();

        let failure_message = format!("Failed to parse input YAML: {}", test_file.display());
        let input_yaml = parts.first().expect("No input found in test file").trim();
        let problem: Problem = serde_yaml::from_str(input_yaml).expect(&failure_message);

        let failure_message = format!("Failed to parse expected YAML: {}", test_file.display());
        let expected_yaml = format!("solution:{}", parts.get(1).expect(&failure_message));

        let failure_message = format!(
            "Failed to deserialize expected solution: {}",
            test_file.display()
        );
        let expected: ExpectedFile = serde_yaml::from_str(&expected_yaml).expect(&failure_message);
        let expected = expected.solution;

        let failure_message = format!("Failed to solve test file: {}", test_file.display());
        let received = problem.solve().expect(&failure_message);

        println!("expected: {:?}", expected);
        println!("received: {}", report(&received));

        assert_eq!(expected.status, received.status, "{}", test_file.display());
        match (expected.objective, received.objective) {
            (Some(want), Some(got)) => assert!(
                (want - got).abs() < TOLERANCE,
                "{}: objective expected {want}, got {got}",
                test_file.display()
            ),
            (want, got) => assert_eq!(want, got, "{}", test_file.display()),
        }
        assert_eq!(expected.open, received.open_sites, "{}", test_file.display());
        assert_flows_match(&expected.flows, &received.flows, test_file);
    }

    #[test]
    fn run_all_test_files() {
        // Read all files from the test_data directory
        let test_data_dir = Path::new("test_data");
        let mut entries: Vec<_> = read_dir(test_data_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.is_file() && path.extension().map(|ext| ext == "yaml").unwrap_or(false)
            })
            .collect();

        // Sort paths lexically by filename
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        assert!(!entries.is_empty(), "no test files in test_data");

        for path in entries {
            run_test_file(&path);
        }
    }

    #[test]
    fn metropolis_test_file_matches_builtin_instance() {
        let yaml_content = read_to_string("test_data/metropolis.yaml").unwrap();
        let input_yaml = yaml_content.split("solution:").next().unwrap();
        let problem: Problem = serde_yaml::from_str(input_yaml).unwrap();
        assert_eq!(problem, Problem::metropolis());
    }

    #[test]
    fn serializes_solution_as_yaml() {
        let solution = Problem::metropolis().solve().unwrap();
        let yaml = serde_yaml::to_string(&solution).unwrap();
        let parsed: Expected = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.status, Status::Optimal);
        assert_eq!(parsed.open, ["L1", "L3"]);
        assert!(!yaml.contains("Route_"));
    }
}

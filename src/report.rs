use crate::solve::Solution;

/// Render a solution as plain text: the status, every variable with its
/// resolved value sorted by name, then the total cost.
pub fn report(solution: &Solution) -> String {
    let mut out = format!("Status: {}\n", solution.status);

    if let Some(objective) = solution.objective {
        let listing: String = solution
            .values
            .iter()
            .map(|(name, value)| format!("{name} = {value}\n"))
            .collect();
        out.push('\n');
        out.push_str(&listing);
        out.push('\n');
        out.push_str(&format!("Total Cost of Transportation = {objective}\n"));
    }

    out
}

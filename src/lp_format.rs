//! CPLEX-LP text output of a [`Model`], for inspecting what gets handed to
//! the solver.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::Error;
use crate::model::{ColumnKind, Model, OBJECTIVE_NAME, Sense};

/// Terms per line before an expression wraps.
const TERMS_PER_LINE: usize = 8;

pub fn write_lp<W: Write>(model: &Model, mut out: W) -> io::Result<()> {
    writeln!(out, "\\* {} *\\", model.name)?;

    writeln!(out, "Minimize")?;
    let objective = format_terms(model, &model.objective);
    writeln!(out, "{}: {}", OBJECTIVE_NAME, objective)?;

    writeln!(out, "Subject To")?;
    for row in &model.rows {
        let sense = match row.sense {
            Sense::GreaterOrEqual => ">=",
            Sense::LessOrEqual => "<=",
        };
        let lhs = format_terms(model, &row.terms);
        writeln!(out, "{}: {} {} {}", row.name, lhs, sense, number(row.rhs))?;
    }

    let binaries: Vec<_> = model
        .columns
        .iter()
        .filter(|c| c.kind == ColumnKind::Binary)
        .collect();
    if !binaries.is_empty() {
        writeln!(out, "Binaries")?;
        for column in binaries {
            writeln!(out, "{}", column.name)?;
        }
    }

    writeln!(out, "End")?;
    out.flush()
}

pub fn write_lp_file(model: &Model, path: &Path) -> Result<(), Error> {
    let file = File::create(path)?;
    write_lp(model, BufWriter::new(file))?;
    Ok(())
}

fn format_terms(model: &Model, terms: &[(usize, f64)]) -> String {
    if terms.is_empty() {
        return "0".to_owned();
    }

    let mut text = String::new();
    for (i, &(column, coefficient)) in terms.iter().enumerate() {
        if i > 0 && i % TERMS_PER_LINE == 0 {
            text.push_str("\n ");
        }
        let name = &model.columns[column].name;
        let sign = if coefficient < 0.0 { "-" } else { "+" };
        let magnitude = coefficient.abs();

        if i == 0 && sign == "+" {
            text.push_str(&term(magnitude, name));
        } else {
            if i % TERMS_PER_LINE != 0 {
                text.push(' ');
            }
            text.push_str(sign);
            text.push(' ');
            text.push_str(&term(magnitude, name));
        }
    }
    text
}

fn term(magnitude: f64, name: &str) -> String {
    if magnitude == 1.0 {
        name.to_owned()
    } else {
        format!("{} {}", number(magnitude), name)
    }
}

fn number(value: f64) -> impl Display {
    // -0 would otherwise print as "-0"
    if value == 0.0 { 0.0 } else { value }
}

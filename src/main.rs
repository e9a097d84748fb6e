use std::fs::read_to_string;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use landfill::{Problem, build_model, lp_format, report, solve};
use tracing::info;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Problem file in YAML; the built-in Metropolis instance is used when omitted
    input: Option<PathBuf>,

    /// Write the model in LP format to this path before solving
    #[arg(long, value_name = "PATH")]
    write_lp: Option<PathBuf>,

    /// Print the solution as YAML instead of the text report
    #[arg(long)]
    yaml: bool,

    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let problem = match &cli.input {
        Some(path) => {
            let buf = read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_yaml::from_str(&buf)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => {
            info!("no input given, using the Metropolis instance");
            Problem::metropolis()
        }
    };

    let model = build_model(&problem)?;
    if let Some(path) = &cli.write_lp {
        lp_format::write_lp_file(&model, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote model");
    }

    let solution = solve(&model)?;

    if cli.yaml {
        println!("{}", serde_yaml::to_string(&solution)?);
    } else {
        print!("{}", report(&solution));
    }
    Ok(())
}

use cf_app::{AppResult, Driver, StepReport, load_case, registered_models, validate_case};
use cf_mesh::TopoChangeMap;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(about = "closureflow CLI - run-time selectable closure models on an adaptive mesh", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every model family and the variants registered under it
    Families,
    /// Validate a case file and build every model it selects
    Validate {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
    /// Step a case and report the closure fields
    Run {
        /// Path to the case YAML file
        case_path: PathBuf,
        /// Number of steps to take
        #[arg(long, default_value_t = 5)]
        steps: usize,
        /// Wall temperature change per step [K]
        #[arg(long, default_value_t = 0.0)]
        wall_ramp: f64,
        /// Split every cell once before this step
        #[arg(long)]
        refine_at: Option<usize>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Families => cmd_families(),
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Run {
            case_path,
            steps,
            wall_ramp,
            refine_at,
        } => cmd_run(&case_path, steps, wall_ramp, refine_at),
    }
}

fn cmd_families() -> AppResult<()> {
    let mut current = "";
    for entry in registered_models() {
        if entry.family != current {
            println!("{}:", entry.family);
            current = entry.family;
        }
        println!("  {} ({})", entry.tag, entry.origin);
    }
    Ok(())
}

fn cmd_validate(case_path: &Path) -> AppResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = load_case(case_path)?;
    validate_case(&case)?;
    let driver = Driver::new(&case)?;
    println!(
        "✓ Case '{}' is valid ({} cells, {} mesh objects)",
        driver.name(),
        driver.mesh().n_cells(),
        driver.objects().len()
    );
    Ok(())
}

fn cmd_run(case_path: &Path, steps: usize, wall_ramp: f64, refine_at: Option<usize>) -> AppResult<()> {
    let case = load_case(case_path)?;
    validate_case(&case)?;
    let mut driver = Driver::new(&case)?;
    println!("Running case '{}' for {steps} steps", driver.name());

    for step in 1..=steps {
        if refine_at == Some(step) {
            let n_cells = driver.mesh().n_cells();
            let all: Vec<usize> = (0..n_cells).collect();
            driver.topo_change(&TopoChangeMap::refine(n_cells, &all)?)?;
            println!("  refined {n_cells} -> {} cells", driver.mesh().n_cells());
        }
        if step > 1 && wall_ramp != 0.0 {
            driver.ramp_wall_temperature(wall_ramp)?;
        }
        print_report(&driver.step()?);
    }

    println!("✓ Completed {steps} steps");
    Ok(())
}

fn print_report(report: &StepReport) {
    print!("step {:>4}  cells {:>5}", report.step, report.n_cells);
    if let Some((lo, hi)) = report.xi {
        print!("  Xi [{lo:.3}, {hi:.3}]");
    }
    println!("  parcels {}", report.parcels);

    for interface in &report.interfaces {
        let k = match interface.k_range {
            Some((lo, hi)) => format!("[{lo:.4e}, {hi:.4e}]"),
            None => "-".to_string(),
        };
        match interface.mass_transfer {
            Some(rate) => println!(
                "    {:<40} {:<14} K {k}  dmdt {rate:.4e}",
                interface.name, interface.model
            ),
            None => println!("    {:<40} {:<14} K {k}", interface.name, interface.model),
        }
    }
}

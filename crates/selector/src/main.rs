use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use selector::{
    Config, ReportFormat, SelectError, SolveOutcome, Strategy, build, diagnostics, export_report, extract,
    read_latency_csv, solve,
};
use std::{io::ErrorKind, path::PathBuf, process::ExitCode};

#[derive(Parser)]
#[command(author, version, about = "Pick hosting sites that keep every worker location within a latency cap", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", default_value = "config/default.toml")]
    config: PathBuf,

    /// Latency matrix CSV (Location,Workers,<site>...)
    #[arg(short = 'm', long = "matrix")]
    matrix: Option<PathBuf>,

    /// Maximum acceptable latency in ms
    #[arg(long = "cap")]
    cap: Option<u64>,

    /// Number of sites to select
    #[arg(short = 'k', long = "k")]
    k: Option<usize>,

    /// Connectivity warning threshold in ms
    #[arg(short = 't', long = "threshold")]
    threshold: Option<u64>,

    /// reduction | branch-and-bound | milp
    #[arg(short = 's', long = "strategy")]
    strategy: Option<Strategy>,

    /// Run branch-and-bound on all cores
    #[arg(short = 'p', long = "parallel")]
    parallel: bool,

    /// Directory for the report
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// csv | json
    #[arg(short = 'f', long = "format")]
    format: Option<ReportFormat>,
}

enum RunOutcome {
    Solved,
    Infeasible,
}

fn main() -> ExitCode {
    // Initialize logger - defaults to RUST_LOG if set, otherwise INFO
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let args = Args::parse();
    match run(&args) {
        Ok(RunOutcome::Solved) => ExitCode::SUCCESS,
        Ok(RunOutcome::Infeasible) => ExitCode::from(1),
        Err(e) => {
            error!("Error: {e:#}");

            // Provide helpful hints for common errors
            for cause in e.chain() {
                if let Some(kind) = io_error_kind(cause) {
                    match kind {
                        ErrorKind::PermissionDenied => {
                            error!("Hint: Run in a writable directory or set SELECTOR_OUTPUT_DIR.");
                            break;
                        }
                        ErrorKind::NotFound => {
                            error!("Hint: Check the matrix path given with --matrix or in the config file.");
                            break;
                        }
                        _ => {}
                    }
                }
            }
            ExitCode::from(2)
        }
    }
}

fn io_error_kind(cause: &(dyn std::error::Error + 'static)) -> Option<ErrorKind> {
    if let Some(ioe) = cause.downcast_ref::<std::io::Error>() {
        return Some(ioe.kind());
    }
    // SelectError::Io is transparent, so the io::Error never shows up in the chain
    match cause.downcast_ref::<SelectError>() {
        Some(SelectError::Io(ioe)) => Some(ioe.kind()),
        _ => None,
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = if args.config.exists() {
        Config::load_from_file(&args.config)?
    } else {
        warn!(
            "Config file not found: {}, using default settings",
            args.config.display()
        );
        Config::default()
    };
    config.apply_env()?;

    // command line wins over file and environment
    if let Some(matrix) = &args.matrix {
        config.input.matrix = matrix.clone();
    }
    if let Some(cap) = args.cap {
        config.selector.cap = cap;
    }
    if let Some(k) = args.k {
        config.selector.k = k;
    }
    if let Some(threshold) = args.threshold {
        config.selector.quality_threshold = Some(threshold);
    }
    if let Some(strategy) = args.strategy {
        config.selector.strategy = strategy;
    }
    if args.parallel {
        config.selector.parallel = true;
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = Some(dir.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }

    config.validate()?;
    log::debug!("configuration: {:#?}", config);
    Ok(config)
}

fn run(args: &Args) -> Result<RunOutcome> {
    let config = load_config(args)?;

    let mut table = read_latency_csv(&config.input.matrix).with_context(|| {
        format!(
            "Failed to read latency matrix {}",
            config.input.matrix.display()
        )
    })?;
    if let Some(enabled) = &config.input.enabled_sites {
        table = table.restrict_sites(enabled)?;
        info!("Restricted to {} enabled sites", table.sites().len());
    }

    let scenario = table.into_scenario(config.settings())?;
    for warning in diagnostics::scan(&scenario)? {
        warn!("{warning}");
    }

    let instance = build(&scenario)?;
    let solution = match solve(&instance, &config.solve_options())? {
        SolveOutcome::Optimal(solution) => solution,
        SolveOutcome::Infeasible(report) => {
            error!("{report}");
            for v in &report.violations {
                info!("  {} exceeds the cap at {} ({}ms)", v.site, v.demand, v.cost);
            }
            return Ok(RunOutcome::Infeasible);
        }
    };

    info!("Location:");
    for site in solution.selection().iter() {
        info!("  {site}");
    }
    info!("Minimum total latency: {}", solution.objective());

    let rows = extract(&solution)?;
    info!("Answer results in the following latencies");
    for row in &rows {
        info!(
            "{} workers in {} with latency of {}ms to {}",
            row.weight, row.demand, row.cost, row.site
        );
    }

    let path = export_report(
        config.output.format,
        &solution,
        &rows,
        config.output.dir.as_deref(),
        &config.output.file_name,
    )?;
    info!("Saved latencies to {} for reporting.", path.display());

    let stats = solution.stats();
    log::debug!(
        "search: {} nodes, {} bound prunings, {} sites pruned, {:?}",
        stats.nodes_explored,
        stats.prunings_bound,
        stats.sites_pruned,
        stats.time_total
    );

    Ok(RunOutcome::Solved)
}

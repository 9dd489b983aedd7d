pub mod builder;
pub mod config;
pub mod constants;
pub mod csv_reader;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod solution;

pub use builder::{Instance, build};
pub use config::Config;
pub use constants::{DEFAULT_CAP, DEFAULT_K, DEFAULT_QUALITY_THRESHOLD, REPORT_HEADERS};
pub use csv_reader::{LatencyTable, read_latency_csv};
pub use diagnostics::{ConnectivityWarning, scan};
pub use engine::{InfeasibleReport, SolveOptions, SolveOutcome, Strategy, solve};
pub use error::{Result, SelectError};
pub use export::{ReportFormat, export_report};
pub use extract::{ReportRow, extract};
pub use model::{CandidateSite, CostMatrix, DemandPoint, Scenario, Settings};
pub use solution::{SelectionSet, Solution};

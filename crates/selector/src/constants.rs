/// Feasibility cap (ms) every selected site must meet for every location
pub const DEFAULT_CAP: u64 = 450;
/// Number of hosting sites to select
pub const DEFAULT_K: usize = 2;
/// Below this best-case latency (ms) a site counts as reasonably connected
pub const DEFAULT_QUALITY_THRESHOLD: u64 = 130;

/// Expected headers in the latency matrix
pub const EXPECTED_LOCATION_HEADER: &str = "Location";
pub const EXPECTED_WEIGHT_HEADER: &str = "Workers";

/// Report headers
pub const REPORT_HEADERS: [&str; 4] = [
    "Location",
    "Number of Workers",
    "Latency",
    "Hosting Location",
];

pub const DEFAULT_MATRIX_PATH: &str = "data/latencies.csv";
pub const DEFAULT_REPORT_FILE: &str = "latencies_to_suggestion.csv";
pub const ENV_OUTPUT_DIR: &str = "SELECTOR_OUTPUT_DIR";

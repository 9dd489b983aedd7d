use crate::constants::{EXPECTED_LOCATION_HEADER, EXPECTED_WEIGHT_HEADER};
use crate::error::{Result, SelectError};
use crate::model::{CandidateSite, CostMatrix, DemandPoint, Scenario, Settings};

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Sites, weighted locations and latencies as read from a matrix file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatencyTable {
    sites: Vec<CandidateSite>,
    demands: Vec<DemandPoint>,
    matrix: CostMatrix,
}

impl LatencyTable {
    pub fn sites(&self) -> &[CandidateSite] {
        &self.sites
    }

    pub fn demands(&self) -> &[DemandPoint] {
        &self.demands
    }

    pub fn matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    /// Keeps only the listed sites, in the order of the file.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if a listed site is not in the file
    pub fn restrict_sites(mut self, enabled: &[String]) -> Result<Self> {
        let known: HashSet<&str> = self.sites.iter().map(CandidateSite::name).collect();
        if let Some(unknown) = enabled.iter().find(|s| !known.contains(s.as_str())) {
            return Err(SelectError::InvalidConfiguration(format!(
                "enabled site '{}' is not in the latency matrix",
                unknown
            )));
        }

        let enabled: HashSet<&str> = enabled.iter().map(String::as_str).collect();
        self.sites.retain(|s| enabled.contains(s.name()));
        Ok(self)
    }

    /// Validates the table against `settings`
    pub fn into_scenario(self, settings: Settings) -> Result<Scenario> {
        Scenario::new(self.sites, self.demands, &self.matrix, settings)
    }
}

/// Reads a latency matrix from a CSV file
///
/// # Errors
/// Returns error if file cannot be read or CSV format is invalid
pub fn read_latency_csv<P: AsRef<Path>>(path: P) -> Result<LatencyTable> {
    let file = std::fs::File::open(path)?;
    read_latency_from_reader(file)
}

/// Read CSV with `Location,Workers,<site>...` format.
/// - One row per location; the second column is its worker count
/// - An empty cell leaves that (location, site) pair out of the matrix
/// - Blank rows are skipped; a row with data but no location name is rejected
pub fn read_latency_from_reader<R: Read>(reader: R) -> Result<LatencyTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let sites = validate_csv_headers(&mut rdr)?;
    let mut demands = Vec::new();
    let mut seen = HashSet::new();
    let mut matrix = CostMatrix::new();

    for (idx, rec) in rdr.records().enumerate() {
        let rec = rec?;
        // header is row 1
        let row = idx + 2;

        let Some((demand, costs)) = parse_record(&rec, row, &sites)? else {
            continue;
        };
        if !seen.insert(demand.name().to_string()) {
            return Err(SelectError::InvalidConfiguration(format!(
                "duplicate location '{}' at row {}",
                demand.name(),
                row
            )));
        }
        for (site, cost) in sites.iter().zip(costs) {
            if let Some(cost) = cost {
                matrix.insert(demand.name(), site.name(), cost);
            }
        }
        demands.push(demand);
    }

    log::info!(
        "loaded latency matrix: {} locations x {} sites, {} entries",
        demands.len(),
        sites.len(),
        matrix.len()
    );

    Ok(LatencyTable {
        sites,
        demands,
        matrix,
    })
}

/// Validates the two fixed headers and returns the site columns
fn validate_csv_headers<R: Read>(csv_reader: &mut csv::Reader<R>) -> Result<Vec<CandidateSite>> {
    let headers = csv_reader
        .headers()
        .map_err(|e| SelectError::CsvHeader(format!("Failed to read headers: {}", e)))?;

    let location_header = headers
        .get(0)
        .ok_or_else(|| SelectError::CsvHeader("Missing location column at index 0".to_string()))?;
    let weight_header = headers
        .get(1)
        .ok_or_else(|| SelectError::CsvHeader("Missing workers column at index 1".to_string()))?;

    if !location_header.eq_ignore_ascii_case(EXPECTED_LOCATION_HEADER) {
        return Err(SelectError::CsvHeader(format!(
            "Expected '{}' in column 0, found '{}'",
            EXPECTED_LOCATION_HEADER, location_header
        )));
    }

    if !weight_header.eq_ignore_ascii_case(EXPECTED_WEIGHT_HEADER) {
        return Err(SelectError::CsvHeader(format!(
            "Expected '{}' in column 1, found '{}'",
            EXPECTED_WEIGHT_HEADER, weight_header
        )));
    }

    let mut sites = Vec::with_capacity(headers.len().saturating_sub(2));
    let mut seen = HashSet::new();
    for (col, name) in headers.iter().enumerate().skip(2) {
        if name.is_empty() {
            return Err(SelectError::CsvHeader(format!(
                "Empty site name in column {}",
                col
            )));
        }
        if !seen.insert(name) {
            return Err(SelectError::InvalidConfiguration(format!(
                "duplicate site column '{}'",
                name
            )));
        }
        sites.push(CandidateSite::new(name));
    }

    if sites.is_empty() {
        return Err(SelectError::CsvHeader(
            "No site columns after the workers column".to_string(),
        ));
    }

    Ok(sites)
}

type ParsedRow = (DemandPoint, Vec<Option<u64>>);

fn parse_record(rec: &StringRecord, row: usize, sites: &[CandidateSite]) -> Result<Option<ParsedRow>> {
    if rec.iter().all(|f| f.trim().is_empty()) {
        return Ok(None);
    }
    let name = get_column_value(rec, 0, row)?;
    let weight_str = get_column_value(rec, 1, row)?;

    if name.is_empty() {
        return Err(SelectError::InvalidConfiguration(format!(
            "row {}: location name is empty but the row has data",
            row
        )));
    }
    let weight = parse_number(weight_str, row, EXPECTED_WEIGHT_HEADER)?;

    if rec.len() > sites.len() + 2 {
        log::warn!(
            "row {}: {} trailing cells without a site column ignored",
            row,
            rec.len() - sites.len() - 2
        );
    }

    let costs = sites
        .iter()
        .enumerate()
        .map(|(j, site)| match rec.get(j + 2).map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_number(value, row, site.name()).map(Some),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some((DemandPoint::new(name, weight), costs)))
}

/// Safely extracts a column value from a CSV record
fn get_column_value(record: &StringRecord, column_index: usize, row_number: usize) -> Result<&str> {
    record
        .get(column_index)
        .map(str::trim)
        .ok_or_else(|| SelectError::CsvRow {
            row: row_number,
            got: record.len(),
        })
}

fn parse_number(value: &str, row: usize, column: &str) -> Result<u64> {
    value.parse().map_err(|source| SelectError::NumberParse {
        row,
        column: column.to_string(),
        value: value.to_string(),
        source,
    })
}

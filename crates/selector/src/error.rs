use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SelectError>;

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Missing cost entry for demand point '{demand}' and site '{site}'")]
    MissingCostEntry { demand: String, site: String },

    #[error("Objective overflow while weighting costs for site '{site}'")]
    ObjectiveOverflow { site: String },

    #[error("Malformed solution: {0}")]
    MalformedSolution(String),

    #[error("Optimization solver error: {0}")]
    Solver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid CSV Header: {0}")]
    CsvHeader(String),

    #[error("Invalid CSV row {row}: expected at least 2 columns, got {got}")]
    CsvRow { row: usize, got: usize },

    #[error("Invalid number at row {row}, column '{column}': {value}")]
    NumberParse {
        row: usize,
        column: String,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create file {path}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

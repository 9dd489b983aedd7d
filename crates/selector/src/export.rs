use crate::{
    constants::REPORT_HEADERS,
    engine::Strategy,
    error::{Result, SelectError},
    extract::ReportRow,
    solution::Solution,
};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    strategy: Strategy,
    selection: &'a [String],
    objective: u64,
    rows: &'a [ReportRow],
}

/// Writes the report in `format` and returns its path.
///
/// For JSON the extension of `file_name` is replaced with `.json`.
pub fn export_report(
    format: ReportFormat,
    solution: &Solution,
    rows: &[ReportRow],
    output_dir: Option<&Path>,
    file_name: &str,
) -> Result<PathBuf> {
    match format {
        ReportFormat::Csv => export_csv_with_path(rows, output_dir, file_name),
        ReportFormat::Json => {
            let file_name = Path::new(file_name).with_extension("json");
            export_json_with_path(solution, rows, output_dir, &file_name.to_string_lossy())
        }
    }
}

pub fn export_csv_with_path(
    rows: &[ReportRow],
    output_dir: Option<&Path>,
    file_name: &str,
) -> Result<PathBuf> {
    let (file_path, file) = create_output_file(output_dir, file_name)?;

    let writer = BufWriter::new(file);
    #[allow(unused_mut)]
    let mut builder = WriterBuilder::new();
    #[cfg(windows)]
    {
        use csv::Terminator;
        builder = builder.terminator(Terminator::CRLF);
    }

    let mut wtr = builder.from_writer(writer);

    wtr.write_record(REPORT_HEADERS)?;
    for row in rows {
        let weight = row.weight.to_string();
        let cost = row.cost.to_string();
        wtr.write_record([
            row.demand.as_str(),
            weight.as_str(),
            cost.as_str(),
            row.site.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(file_path)
}

pub fn export_json_with_path(
    solution: &Solution,
    rows: &[ReportRow],
    output_dir: Option<&Path>,
    file_name: &str,
) -> Result<PathBuf> {
    let (file_path, file) = create_output_file(output_dir, file_name)?;

    let report = JsonReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        strategy: solution.strategy(),
        selection: solution.selection().sites(),
        objective: solution.objective(),
        rows,
    };

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(file_path)
}

fn create_output_file(output_dir: Option<&Path>, file_name: &str) -> Result<(PathBuf, File)> {
    let file_path = if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir).map_err(|e| SelectError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        dir.join(file_name)
    } else {
        file_name.into()
    };

    let file = File::create(&file_path).map_err(|e| SelectError::CreateFile {
        path: file_path.clone(),
        source: e,
    })?;
    Ok((file_path, file))
}

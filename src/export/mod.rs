//! Output of a projection as a terminal table, CSV or JSON

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::error::{InputError, Result};
use crate::projection::Projection;

pub mod csv;
pub mod json;
pub mod text;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Coloured table for the terminal
    Table,
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = InputError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" | "txt" => Ok(ExportFormat::Table),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(InputError::InvalidFormat {
                value: s.to_string(),
            }),
        }
    }
}

/// Write a projection in the given format
pub fn write_projection<W: Write>(
    projection: &Projection,
    format: ExportFormat,
    writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Table => text::write_table(projection, writer),
        ExportFormat::Csv => csv::write_points(&projection.points, writer),
        ExportFormat::Json => json::write_json(projection, writer),
    }
}

/// Export a projection to a file
pub fn export_projection<P: AsRef<Path>>(
    projection: &Projection,
    format: ExportFormat,
    output_path: P,
) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    write_projection(projection, format, std::io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, ProjectionRequest};
    use crate::projection::Vo2MaxProjector;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Table);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_projection_to_file() {
        let projection = Vo2MaxProjector::run(&ProjectionRequest::new(Gender::Male, 80, 30.0));

        let temp_file = NamedTempFile::new().unwrap();
        export_projection(&projection, ExportFormat::Csv, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.starts_with("age,vo2max,percentile"));
    }
}

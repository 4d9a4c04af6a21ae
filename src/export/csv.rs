use csv::Writer;
use std::io::Write;

use crate::error::Result;
use crate::models::ProjectionPoint;

/// Write projection points as `age,vo2max,percentile` rows
pub fn write_points<W: Write>(points: &[ProjectionPoint], writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    writer.write_record(["age", "vo2max", "percentile"])?;
    for point in points {
        writer.write_record(&[
            point.age.to_string(),
            format!("{:.2}", point.vo2max),
            format!("{:.2}", point.percentile),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::projection::project;

    #[test]
    fn test_write_points() {
        let points = project(90, 48.0, Gender::Female);
        let mut buffer = Vec::new();
        write_points(&points, &mut buffer).unwrap();

        let content = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["age,vo2max,percentile", "90,48.00,1.00", "100,43.20,1.00"]);
    }

    #[test]
    fn test_empty_projection_writes_header_only() {
        let mut buffer = Vec::new();
        write_points(&[], &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "age,vo2max,percentile\n");
    }
}

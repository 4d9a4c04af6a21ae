use std::io::Write;

use crate::error::Result;
use crate::projection::Projection;

/// Write a projection as pretty-printed JSON
pub fn write_json<W: Write>(projection: &Projection, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, projection)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, ProjectionRequest};
    use crate::projection::Vo2MaxProjector;

    #[test]
    fn test_write_json() {
        let request = ProjectionRequest::new(Gender::Male, 20, 48.0)
            .with_activities("run".parse().unwrap());
        let projection = Vo2MaxProjector::run(&request);

        let mut buffer = Vec::new();
        write_json(&projection, &mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();

        assert!(content.contains("\"gender\": \"male\""));
        assert!(content.contains("\"activities\": [\n      \"run\"\n    ]"));
        assert!(content.contains("\"limited_from_age\": 60"));

        let parsed: Projection = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.points.len(), 9);
    }
}

use colored::*;
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};

use crate::error::Result;
use crate::projection::Projection;

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "Age")]
    age: i32,
    #[tabled(rename = "VO2max (ml/kg/min)")]
    vo2max: String,
    #[tabled(rename = "Percentile")]
    percentile: String,
}

/// Write a projection as a human-readable table followed by activity notes
pub fn write_table<W: Write>(projection: &Projection, mut writer: W) -> Result<()> {
    let request = &projection.request;
    writeln!(
        writer,
        "{}",
        format!(
            "VO2max projection: {} starting at age {} with {:.1} ml/kg/min",
            request.gender, request.age, request.vo2max
        )
        .bold()
    )?;

    if projection.points.is_empty() {
        writeln!(writer, "{}", "No projected points: starting age is past the projection limit".yellow())?;
        return Ok(());
    }

    let rows: Vec<PointRow> = projection
        .points
        .iter()
        .map(|p| PointRow {
            age: p.age,
            vo2max: format!("{:.1}", p.vo2max),
            percentile: format!("{:.0}%", p.percentile * 100.0),
        })
        .collect();
    writeln!(writer, "{}", Table::new(rows).with(Style::rounded()))?;

    for outlook in &projection.outlooks {
        let line = outlook.summary();
        if outlook.limited_from_age.is_some() {
            writeln!(writer, "  {} {}", "•".red(), line)?;
        } else {
            writeln!(writer, "  {} {}", "•".green(), line)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, ProjectionRequest};
    use crate::projection::Vo2MaxProjector;

    fn render(request: ProjectionRequest) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        write_table(&Vo2MaxProjector::run(&request), &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_table_contents() {
        let output = render(
            ProjectionRequest::new(Gender::Male, 20, 48.0)
                .with_activities("hike,walk".parse().unwrap()),
        );

        assert!(output.contains("Male starting at age 20"));
        assert!(output.contains("VO2max (ml/kg/min)"));
        assert!(output.contains("70%"));
        assert!(output.contains("difficulty with hiking starting at 90"));
        assert!(output.contains("Slow Walk stays above 15.0"));
    }

    #[test]
    fn test_empty_projection_message() {
        let output = render(ProjectionRequest::new(Gender::Female, 110, 48.0));
        assert!(output.contains("No projected points"));
    }
}

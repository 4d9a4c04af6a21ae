//! Chart description for the VO2max trend
//!
//! A [`ChartSpec`] is a renderer-agnostic, serializable description of the
//! two-axis line chart: VO2max on the primary axis, percentile on the
//! secondary axis, age along the bottom and one dotted reference line per
//! selected activity. With the `charts` feature it can be drawn to SVG.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{InputError, Result};
use crate::models::ActivitySet;
use crate::projection::Projection;

/// Default upper bound of the VO2max axis (ml/kg/min)
pub const DEFAULT_VO2MAX_AXIS_MAX: f64 = 70.0;

/// Which y axis a series is plotted against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: String,
    /// Fixed range, or None to fit the data
    pub range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub axis: AxisSide,
    /// CSS colour name
    pub color: String,
    pub width: u32,
    pub points: Vec<(f64, f64)>,
}

/// Horizontal dotted line marking an activity requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub y: f64,
    pub label: String,
    pub dash: String,
    pub annotation_position: String,
    pub annotation_font_size: u32,
    pub annotation_font_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub secondary_y_axis: Axis,
    pub series: Vec<Series>,
    pub reference_lines: Vec<ReferenceLine>,
}

impl ChartSpec {
    /// Describe a projection with the default VO2max axis
    pub fn from_projection(projection: &Projection) -> Self {
        Self::with_axis_max(projection, DEFAULT_VO2MAX_AXIS_MAX)
    }

    pub fn with_axis_max(projection: &Projection, vo2max_axis_max: f64) -> Self {
        let vo2max_points = projection
            .points
            .iter()
            .map(|p| (p.age as f64, p.vo2max))
            .collect();
        let percentile_points = projection
            .points
            .iter()
            .map(|p| (p.age as f64, p.percentile))
            .collect();

        ChartSpec {
            title: "VO2max Predictor".to_string(),
            x_axis: Axis {
                title: "Age".to_string(),
                range: None,
            },
            y_axis: Axis {
                title: "VO2max".to_string(),
                range: Some((0.0, vo2max_axis_max)),
            },
            secondary_y_axis: Axis {
                title: "Percentile".to_string(),
                range: Some((0.0, 1.0)),
            },
            series: vec![
                Series {
                    name: "VO2_max".to_string(),
                    axis: AxisSide::Primary,
                    color: "blue".to_string(),
                    width: 4,
                    points: vo2max_points,
                },
                Series {
                    name: "Percentile".to_string(),
                    axis: AxisSide::Secondary,
                    color: "firebrick".to_string(),
                    width: 4,
                    points: percentile_points,
                },
            ],
            reference_lines: reference_lines(&projection.request.activities),
        }
    }

    /// Age span covered by the series, padded so a single point stays visible
    pub fn x_range(&self) -> (f64, f64) {
        if let Some(range) = self.x_axis.range {
            return range;
        }
        let xs = self.series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
        let (min, max) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
        if min > max {
            (0.0, 100.0)
        } else {
            (min - 5.0, max + 5.0)
        }
    }
}

/// Reference lines for the selected activities, independent of the trend
pub fn reference_lines(activities: &ActivitySet) -> Vec<ReferenceLine> {
    activities
        .iter()
        .map(|activity| ReferenceLine {
            y: activity.threshold(),
            label: activity.label().to_string(),
            dash: "dot".to_string(),
            annotation_position: "bottom right".to_string(),
            annotation_font_size: 10,
            annotation_font_color: "black".to_string(),
        })
        .collect()
}

/// Output format of a rendered chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    Svg,
    /// The [`ChartSpec`] itself, for a client-side renderer
    Json,
}

impl FromStr for ChartFormat {
    type Err = InputError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "svg" => Ok(ChartFormat::Svg),
            "json" => Ok(ChartFormat::Json),
            _ => Err(InputError::InvalidFormat {
                value: s.to_string(),
            }),
        }
    }
}

/// Render a chart in the requested format.
///
/// Without the `charts` feature there is no SVG backend and `Svg` falls
/// back to the JSON description.
pub fn render(spec: &ChartSpec, format: ChartFormat, width: u32, height: u32) -> Result<String> {
    match format {
        ChartFormat::Json => Ok(serde_json::to_string_pretty(spec)?),
        #[cfg(feature = "charts")]
        ChartFormat::Svg => render_svg(spec, width, height),
        #[cfg(not(feature = "charts"))]
        ChartFormat::Svg => {
            let _ = (width, height);
            tracing::warn!("SVG rendering needs the `charts` feature, writing the JSON chart description");
            Ok(serde_json::to_string_pretty(spec)?)
        }
    }
}

#[cfg(feature = "charts")]
pub use svg::render_svg;

#[cfg(feature = "charts")]
mod svg {
    use plotters::prelude::*;
    use plotters::style::{FontDesc, FontFamily, FontStyle};

    use super::{AxisSide, ChartSpec};
    use crate::error::{Result, Vo2TrendError};

    const FIREBRICK: RGBColor = RGBColor(178, 34, 34);

    fn color_for(name: &str) -> RGBColor {
        match name {
            "blue" => BLUE,
            "firebrick" => FIREBRICK,
            "red" => RED,
            "green" => GREEN,
            _ => BLACK,
        }
    }

    fn chart_err<E: std::fmt::Display>(err: E) -> Vo2TrendError {
        Vo2TrendError::Chart(err.to_string())
    }

    /// Draw the chart as an SVG document
    pub fn render_svg(spec: &ChartSpec, width: u32, height: u32) -> Result<String> {
        let mut buffer = String::new();
        {
            let root = SVGBackend::with_string(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;

            let (x_min, x_max) = spec.x_range();
            let (y_min, y_max) = spec.y_axis.range.unwrap_or((0.0, 70.0));
            let (y2_min, y2_max) = spec.secondary_y_axis.range.unwrap_or((0.0, 1.0));

            let mut chart = ChartBuilder::on(&root)
                .caption(
                    &spec.title,
                    FontDesc::new(FontFamily::SansSerif, 24.0, FontStyle::Normal),
                )
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .right_y_label_area_size(50)
                .build_cartesian_2d(x_min..x_max, y_min..y_max)
                .map_err(chart_err)?
                .set_secondary_coord(x_min..x_max, y2_min..y2_max);

            chart
                .configure_mesh()
                .x_desc(spec.x_axis.title.as_str())
                .y_desc(spec.y_axis.title.as_str())
                .draw()
                .map_err(chart_err)?;
            chart
                .configure_secondary_axes()
                .y_desc(spec.secondary_y_axis.title.as_str())
                .draw()
                .map_err(chart_err)?;

            for line in &spec.reference_lines {
                let style = BLACK.mix(0.6).stroke_width(1);
                // Dotted: short segments along the line
                let step = (x_max - x_min) / 60.0;
                let dots = (0..60).step_by(2).map(|i| {
                    let x0 = x_min + step * i as f64;
                    PathElement::new(vec![(x0, line.y), (x0 + step, line.y)], style)
                });
                chart.draw_series(dots).map_err(chart_err)?;
                chart
                    .draw_series(std::iter::once(Text::new(
                        line.label.clone(),
                        (x_max - step * 8.0, line.y - (y_max - y_min) * 0.03),
                        FontDesc::new(
                            FontFamily::SansSerif,
                            line.annotation_font_size as f64,
                            FontStyle::Normal,
                        )
                        .color(&BLACK),
                    )))
                    .map_err(chart_err)?;
            }

            for series in &spec.series {
                let color = color_for(&series.color);
                let style = color.stroke_width(series.width);
                let points = series.points.iter().copied();
                let drawn = match series.axis {
                    AxisSide::Primary => chart
                        .draw_series(LineSeries::new(points, style))
                        .map_err(chart_err)?,
                    AxisSide::Secondary => chart
                        .draw_secondary_series(LineSeries::new(points, style))
                        .map_err(chart_err)?,
                };
                drawn.label(series.name.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(4))
                });
            }

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(chart_err)?;

            root.present().map_err(chart_err)?;
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, ProjectionRequest};
    use crate::projection::Vo2MaxProjector;

    fn projection(activities: &str) -> Projection {
        let request = ProjectionRequest::new(Gender::Male, 20, 48.0)
            .with_activities(activities.parse().unwrap());
        Vo2MaxProjector::run(&request)
    }

    #[test]
    fn test_axes() {
        let spec = ChartSpec::from_projection(&projection(""));
        assert_eq!(spec.y_axis.range, Some((0.0, 70.0)));
        assert_eq!(spec.secondary_y_axis.range, Some((0.0, 1.0)));
        assert_eq!(spec.x_axis.title, "Age");
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[1].axis, AxisSide::Secondary);
        assert_eq!(spec.series[0].points[0], (20.0, 48.0));
        assert!(spec.reference_lines.is_empty());
    }

    #[test]
    fn test_reference_lines_follow_activities() {
        let spec = ChartSpec::from_projection(&projection("run,walk"));
        let ys: Vec<f64> = spec.reference_lines.iter().map(|l| l.y).collect();
        assert_eq!(ys, vec![34.3, 15.0]);
        assert_eq!(spec.reference_lines[0].label, "Running");
        assert_eq!(spec.reference_lines[1].dash, "dot");
    }

    #[test]
    fn test_run_threshold_is_constant() {
        for (age, vo2max, gender) in [(20, 48.0, Gender::Male), (70, 20.0, Gender::Female)] {
            let request = ProjectionRequest::new(gender, age, vo2max)
                .with_activities("run".parse().unwrap());
            let spec = ChartSpec::from_projection(&Vo2MaxProjector::run(&request));
            assert_eq!(spec.reference_lines[0].y, 34.3);
        }
    }

    #[test]
    fn test_x_range_padding() {
        let request = ProjectionRequest::new(Gender::Male, 100, 48.0);
        let spec = ChartSpec::from_projection(&Vo2MaxProjector::run(&request));
        assert_eq!(spec.x_range(), (95.0, 105.0));

        let request = ProjectionRequest::new(Gender::Male, 110, 48.0);
        let spec = ChartSpec::from_projection(&Vo2MaxProjector::run(&request));
        assert_eq!(spec.x_range(), (0.0, 100.0));
    }

    #[test]
    fn test_custom_axis_max() {
        let spec = ChartSpec::with_axis_max(&projection(""), 90.0);
        assert_eq!(spec.y_axis.range, Some((0.0, 90.0)));
    }

    #[test]
    fn test_chart_format_parsing() {
        assert_eq!("SVG".parse::<ChartFormat>().unwrap(), ChartFormat::Svg);
        assert_eq!("json".parse::<ChartFormat>().unwrap(), ChartFormat::Json);
        assert_eq!(
            "png".parse::<ChartFormat>(),
            Err(InputError::InvalidFormat {
                value: "png".to_string()
            })
        );
    }

    #[test]
    fn test_render_json() {
        let spec = ChartSpec::from_projection(&projection("walk"));
        let json = render(&spec, ChartFormat::Json, 800, 500).unwrap();
        let parsed: ChartSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, spec);
    }

    #[cfg(not(feature = "charts"))]
    #[test]
    fn test_svg_falls_back_to_json() {
        let spec = ChartSpec::from_projection(&projection("run"));
        let output = render(&spec, ChartFormat::Svg, 800, 500).unwrap();
        let parsed: ChartSpec = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.reference_lines[0].label, "Running");
    }

    #[cfg(feature = "charts")]
    #[test]
    fn test_render_dispatches_svg() {
        let spec = ChartSpec::from_projection(&projection("run"));
        let output = render(&spec, ChartFormat::Svg, 800, 500).unwrap();
        assert!(output.starts_with("<svg"));
        assert!(output.contains("Running"));
    }

    #[cfg(feature = "charts")]
    #[test]
    fn test_render_svg() {
        let spec = ChartSpec::from_projection(&projection("hike"));
        let svg = render_svg(&spec, 800, 500).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Hiking"));
        assert!(svg.contains("Percentile"));
    }
}

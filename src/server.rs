//! HTTP front end for the VO2max predictor
//!
//! [`Vo2TrendApp`] is built once at startup from an [`AppConfig`] and holds
//! no mutable state. Every request is parsed into a [`ProjectionRequest`],
//! projected from scratch and rendered; nothing is cached between requests.

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::fmt::Write as _;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};

use crate::chart::ChartSpec;
use crate::config::{AppConfig, InputDefaults};
use crate::error::{InputError, Result, Vo2TrendError};
use crate::models::{Activity, ActivitySet, ProjectionRequest};
use crate::projection::{Projection, Vo2MaxProjector};

/// Raw query parameters as submitted by the form or an API client.
///
/// Values stay strings until [`ProjectionQuery::into_request`] so that empty
/// form fields fall back to the configured defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionQuery {
    pub gender: Option<String>,
    pub age: Option<String>,
    pub vo2max: Option<String>,
    /// Each entry may itself be a comma-separated list
    pub activities: Vec<String>,
}

impl ProjectionQuery {
    /// Collect parameters from decoded `key=value` pairs; `activities` may repeat
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = ProjectionQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "gender" => query.gender = Some(value),
                "age" => query.age = Some(value),
                "vo2max" => query.vo2max = Some(value),
                "activities" => query.activities.push(value),
                _ => {}
            }
        }
        query
    }

    /// Whether a gender is available from the query or the defaults
    pub fn has_gender(&self, defaults: &InputDefaults) -> bool {
        non_empty(&self.gender).is_some() || defaults.gender.is_some()
    }

    pub fn into_request(
        self,
        defaults: &InputDefaults,
    ) -> std::result::Result<ProjectionRequest, InputError> {
        let gender = match non_empty(&self.gender) {
            Some(value) => value.parse()?,
            None => defaults.gender.ok_or(InputError::MissingGender)?,
        };

        let age = match non_empty(&self.age) {
            Some(value) => value.parse().map_err(|_| InputError::InvalidNumber {
                field: "age".to_string(),
                value: value.to_string(),
            })?,
            None => defaults.age,
        };

        let vo2max = match non_empty(&self.vo2max) {
            Some(value) => value.parse().map_err(|_| InputError::InvalidNumber {
                field: "vo2max".to_string(),
                value: value.to_string(),
            })?,
            None => defaults.vo2max,
        };

        let mut activities = ActivitySet::new();
        for list in &self.activities {
            for activity in ActivitySet::parse_list(list)?.iter() {
                activities.insert(activity);
            }
        }

        let request = ProjectionRequest::new(gender, age, vo2max).with_activities(activities);
        request.validate()?;
        Ok(request)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl IntoResponse for Vo2TrendError {
    fn into_response(self) -> Response {
        if self.severity().to_tracing_level() == Level::WARN {
            warn!(error = %self, "Request rejected");
        } else {
            error!(error = %self, "Request failed");
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({ "error": self.user_message() }));
        (status, body).into_response()
    }
}

/// The interactive VO2max predictor application
#[derive(Debug, Clone)]
pub struct Vo2TrendApp {
    config: Arc<AppConfig>,
}

impl Vo2TrendApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Vo2TrendError::Configuration(e.to_string()))?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build all routes
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/", get(index_handler))
            .route("/api/projection", get(projection_handler))
            .route("/api/chart", get(chart_handler))
            .route("/health", get(health_handler));

        #[cfg(feature = "charts")]
        let router = router.route("/chart.svg", get(svg_handler));

        router
            .with_state(self.config.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn serve(self) -> anyhow::Result<()> {
        let address = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {}", address))?;

        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, "VO2max predictor listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

fn project_query(config: &AppConfig, pairs: Vec<(String, String)>) -> Result<Projection> {
    let request = ProjectionQuery::from_pairs(pairs).into_request(&config.defaults)?;
    info!(
        gender = %request.gender,
        age = request.age,
        vo2max = request.vo2max,
        activities = request.activities.len(),
        "Projection requested"
    );
    Ok(Vo2MaxProjector::run(&request))
}

async fn projection_handler(
    State(config): State<Arc<AppConfig>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Projection>> {
    project_query(&config, pairs).map(Json)
}

async fn chart_handler(
    State(config): State<Arc<AppConfig>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ChartSpec>> {
    let projection = project_query(&config, pairs)?;
    Ok(Json(ChartSpec::with_axis_max(
        &projection,
        config.chart.vo2max_axis_max,
    )))
}

#[cfg(feature = "charts")]
async fn svg_handler(
    State(config): State<Arc<AppConfig>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let projection = project_query(&config, pairs)?;
    let spec = ChartSpec::with_axis_max(&projection, config.chart.vo2max_axis_max);
    let svg = crate::chart::render_svg(&spec, config.chart.width, config.chart.height)?;
    Ok(([(axum::http::header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn index_handler(
    State(config): State<Arc<AppConfig>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = ProjectionQuery::from_pairs(pairs);
    let form = render_form(&query, &config.defaults);

    // Until a gender is chosen the page only shows the form
    if !query.has_gender(&config.defaults) {
        return Html(page(&form, "")).into_response();
    }

    match query.into_request(&config.defaults) {
        Ok(request) => {
            let projection = Vo2MaxProjector::run(&request);
            let result = render_result(&projection, &config);
            Html(page(&form, &result)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Invalid form input");
            let message = format!(
                "<p class=\"error\">{}</p>",
                escape_html(&Vo2TrendError::from(e).user_message())
            );
            (StatusCode::BAD_REQUEST, Html(page(&form, &message))).into_response()
        }
    }
}

fn page(form: &str, result: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>VO2max Predictor</title></head>\n\
         <body>\n<h1 style=\"text-align:center;margin-top:40px;margin-bottom:40px\">VO2max Predictor</h1>\n\
         {}\n{}\n</body>\n</html>\n",
        form, result
    )
}

fn render_form(query: &ProjectionQuery, defaults: &InputDefaults) -> String {
    let selected_gender = non_empty(&query.gender)
        .and_then(|g| g.parse().ok())
        .or(defaults.gender);
    let age = non_empty(&query.age)
        .map(str::to_string)
        .unwrap_or_else(|| defaults.age.to_string());
    let vo2max = non_empty(&query.vo2max)
        .map(str::to_string)
        .unwrap_or_else(|| defaults.vo2max.to_string());
    let checked: ActivitySet = query
        .activities
        .iter()
        .flat_map(|list| ActivitySet::parse_list(list).unwrap_or_default().iter().collect::<Vec<_>>())
        .collect();

    let mut html = String::from("<form method=\"get\" action=\"/\">\n");
    html.push_str("<select name=\"gender\" style=\"width:50%\">\n<option value=\"\">Select Gender...</option>\n");
    for (value, label) in [("m", "Male"), ("f", "Female")] {
        let selected = selected_gender.map(|g| g.to_string()) == Some(label.to_string());
        let _ = writeln!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            value,
            if selected { " selected" } else { "" },
            label
        );
    }
    html.push_str("</select><br>\n");
    let _ = writeln!(
        html,
        "Age: <input name=\"age\" type=\"number\" placeholder=\"Age\" value=\"{}\"><br>",
        escape_html(&age)
    );
    let _ = writeln!(
        html,
        "VO2max <input name=\"vo2max\" type=\"number\" step=\"any\" placeholder=\"VO2max\" value=\"{}\"><br><br>",
        escape_html(&vo2max)
    );
    html.push_str("Activities<br>\n");
    for activity in Activity::ALL {
        let _ = writeln!(
            html,
            "<label><input type=\"checkbox\" name=\"activities\" value=\"{}\"{}> {}</label><br>",
            activity.key(),
            if checked.contains(activity) { " checked" } else { "" },
            activity.description()
        );
    }
    html.push_str("<button type=\"submit\">Update</button>\n</form>");
    html
}

fn render_result(projection: &Projection, config: &AppConfig) -> String {
    let mut html = String::new();

    #[cfg(feature = "charts")]
    {
        let spec = ChartSpec::with_axis_max(projection, config.chart.vo2max_axis_max);
        match crate::chart::render_svg(&spec, config.chart.width, config.chart.height) {
            Ok(svg) => html.push_str(&svg),
            Err(e) => error!(error = %e, "Chart rendering failed"),
        }
    }
    #[cfg(not(feature = "charts"))]
    let _ = config;

    html.push_str("\n<table>\n<tr><th>Age</th><th>VO2max</th><th>Percentile</th></tr>\n");
    for point in &projection.points {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{:.1}</td><td>{:.2}</td></tr>",
            point.age, point.vo2max, point.percentile
        );
    }
    html.push_str("</table>\n");

    for outlook in &projection.outlooks {
        let _ = writeln!(html, "<p>{}</p>", escape_html(&outlook.summary()));
    }
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_defaults() {
        let defaults = InputDefaults::default();
        let request = ProjectionQuery::from_pairs(pairs(&[("gender", "m"), ("age", "")]))
            .into_request(&defaults)
            .unwrap();

        assert_eq!(request.gender, Gender::Male);
        assert_eq!(request.age, 20);
        assert_eq!(request.vo2max, 48.0);
        assert!(request.activities.is_empty());
    }

    #[test]
    fn test_query_missing_gender() {
        let defaults = InputDefaults::default();
        let query = ProjectionQuery::from_pairs(pairs(&[("age", "30")]));
        assert!(!query.has_gender(&defaults));
        assert_eq!(query.into_request(&defaults), Err(InputError::MissingGender));

        let defaults = InputDefaults {
            gender: Some(Gender::Female),
            ..InputDefaults::default()
        };
        let request = ProjectionQuery::default().into_request(&defaults).unwrap();
        assert_eq!(request.gender, Gender::Female);
    }

    #[test]
    fn test_query_rejects_bad_values() {
        let defaults = InputDefaults::default();
        let bad = [
            pairs(&[("gender", "x")]),
            pairs(&[("gender", "m"), ("age", "twenty")]),
            pairs(&[("gender", "m"), ("vo2max", "NaN")]),
            pairs(&[("gender", "m"), ("activities", "swim")]),
            pairs(&[("gender", "m"), ("age", "-1")]),
        ];
        for query in bad {
            assert!(ProjectionQuery::from_pairs(query).into_request(&defaults).is_err());
        }
    }

    #[test]
    fn test_query_rejects_age_below_floor() {
        let query = ProjectionQuery::from_pairs(pairs(&[("gender", "m"), ("age", "-20000000")]));
        assert_eq!(
            query.into_request(&InputDefaults::default()),
            Err(InputError::AgeOutOfRange {
                value: -20_000_000,
                min: 0
            })
        );

        let request = ProjectionQuery::from_pairs(pairs(&[("gender", "m"), ("age", "0")]))
            .into_request(&InputDefaults::default())
            .unwrap();
        assert_eq!(request.age, 0);
    }

    #[test]
    fn test_repeated_activities_merge() {
        let request = ProjectionQuery::from_pairs(pairs(&[
            ("gender", "f"),
            ("activities", "run"),
            ("activities", "hike,run"),
        ]))
        .into_request(&InputDefaults::default())
        .unwrap();

        assert_eq!(
            request.activities.iter().collect::<Vec<_>>(),
            vec![Activity::Run, Activity::Hike]
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_app_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.chart.width = 0;
        assert!(matches!(
            Vo2TrendApp::new(config),
            Err(Vo2TrendError::Configuration(_))
        ));
    }
}

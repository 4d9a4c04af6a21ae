// Library interface for vo2trend modules
// This allows integration tests and benchmarks to access the core functionality

pub mod chart;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod projection;
pub mod server;

// Re-export commonly used types for convenience
pub use chart::ChartSpec;
pub use config::AppConfig;
pub use error::{InputError, Result, Vo2TrendError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::{Activity, ActivitySet, Gender, ProjectionPoint, ProjectionRequest};
pub use projection::{project, ActivityOutlook, Projection, Vo2MaxProjector};
pub use server::Vo2TrendApp;

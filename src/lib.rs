// src/lib.rs - Library interface for internal module access

pub mod axis_names;
pub mod config;
pub mod constants;
pub mod data_analysis;
pub mod data_input;
pub mod error;
pub mod report;
pub mod types;

pub use config::{AnalysisConfig, WindowKind};
pub use data_analysis::aggregator::{CurveStatus, RepresentativeCurve};
pub use data_analysis::trace::{analyze_axes, Trace};
pub use data_input::log_data::{AxisChannels, ChannelKind};
pub use error::{AnalysisError, AnalysisResult};

pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

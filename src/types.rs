// src/types.rs
// Type aliases shared by the per-axis driver, CLI and report writer

use crate::axis_names::AXIS_COUNT;
use crate::data_analysis::trace::Trace;
use crate::data_input::log_data::AxisChannels;
use crate::error::AnalysisResult;

// Decoded input, one entry per axis; `None` when the log lacks that axis.
pub type AllAxisChannels = [Option<AxisChannels>; AXIS_COUNT];

// Each axis succeeds or fails on its own.
pub type AxisOutcome = Option<AnalysisResult<Trace>>;
pub type AllAxisOutcomes = [AxisOutcome; AXIS_COUNT];

// (time, value) pairs handed to an external renderer.
pub type CurvePoints = Vec<(f64, f64)>;

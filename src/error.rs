// src/error.rs

use thiserror::Error;

/// Failures raised by the step-response pipeline for a single axis.
///
/// Each kind is detected locally and returned unchanged to the caller; none
/// of them is retried because the input itself is structurally unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("frame length of {frame_len} samples does not fit into {available} samples")]
    WindowTooLarge { frame_len: usize, available: usize },
    #[error("effective sample rate {sample_rate_hz} Hz is below the required {min_hz} Hz or not finite")]
    InsufficientSampleRate { sample_rate_hz: f64, min_hz: f64 },
    #[error("channel '{channel}' has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: String,
        expected: usize,
        actual: usize,
    },
    #[error("time decreases at sample {index}")]
    NonMonotonicTime { index: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

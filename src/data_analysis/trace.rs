// src/data_analysis/trace.rs

use log::{debug, info, warn};
use ndarray::{s, Array1, Array2};

use crate::axis_names::ControlAxis;
use crate::config::AnalysisConfig;
use crate::constants::MAX_SENSIBLE_RESPONSE_TIME_S;
use crate::data_analysis::aggregator::{aggregate_responses, AggregationParams, RepresentativeCurve};
use crate::data_analysis::deconvolution::WienerDeconvolver;
use crate::data_analysis::frame_classifier::{FrameMasks, FrameStats};
use crate::data_analysis::noise_analysis::{analyze_noise, NoiseAnalysis};
use crate::data_analysis::resample::{resample_uniform, UniformSeries};
use crate::data_analysis::window::{taper, FrameGeometry, FrameStack};
use crate::data_input::log_data::{AxisChannels, ChannelKind};
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{AllAxisChannels, AllAxisOutcomes, CurvePoints};

/// Step-response analysis of a single axis.
///
/// Built once from decoded channels and not modified afterwards;
/// `reclassify` produces a new Trace for a different rate threshold
/// without repeating the deconvolution.
#[derive(Debug, Clone)]
pub struct Trace {
    pub name: String,
    pub config: AnalysisConfig,
    pub series: UniformSeries,
    pub geometry: FrameGeometry,
    /// Relative time of each response sample, starting at 0
    pub time_resp: Array1<f64>,
    /// One step response per frame
    pub step_responses: Array2<f64>,
    pub stats: FrameStats,
    pub masks: FrameMasks,
    pub low_response: RepresentativeCurve,
    /// `None` when no frame qualifies as high-rate
    pub high_response: Option<RepresentativeCurve>,
    pub noise: Option<NoiseAnalysis>,
}

impl Trace {
    pub fn compute(name: &str, channels: &AxisChannels, config: &AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        let series = resample_uniform(&channels.time_s, &channels.channels())?;

        let sample_rate_hz = series.sample_rate_hz();
        if !sample_rate_hz.is_finite() || sample_rate_hz < config.min_sample_rate_hz {
            return Err(AnalysisError::InsufficientSampleRate {
                sample_rate_hz,
                min_hz: config.min_sample_rate_hz,
            });
        }

        let frame_len = series.samples_for(config.framelen_s);
        let response_len = series.samples_for(config.resplen_s).min(series.len());
        let geometry = FrameGeometry::new(series.len(), frame_len, config.superpos)?;
        debug!(
            "{}: {:.1} Hz, frame {} samples, response {} samples, {} frames",
            name, sample_rate_hz, frame_len, response_len, geometry.count
        );

        let stack = FrameStack::from_series(
            &series,
            &[ChannelKind::Setpoint, ChannelKind::Measured, ChannelKind::Throttle],
            geometry,
        );
        let window = taper(config.window, frame_len, config.tukey_alpha);
        let windowed = |kind: ChannelKind| {
            stack
                .windowed(kind, &window)
                .ok_or_else(|| AnalysisError::InsufficientData(format!("channel '{}' is missing", kind.name())))
        };
        let inp = windowed(ChannelKind::Setpoint)?;
        let outp = windowed(ChannelKind::Measured)?;
        let thr = windowed(ChannelKind::Throttle)?;

        let mut deconvolver = WienerDeconvolver::new(
            frame_len,
            response_len,
            series.grid_step(),
            sample_rate_hz,
            config.cutfreq_hz,
            config.min_sample_rate_hz,
            config.fft_block,
        )?;
        let step_responses = deconvolver.step_responses(&inp, &outp)?;
        let stats = FrameStats::compute(&inp, &outp, &thr, &stack.time);

        let t0 = series.time[0];
        let time_resp = series.time.slice(s![0..deconvolver.response_len()]).mapv(|t| t - t0);

        // the noise pass is optional; a window that does not fit only drops it
        let noise = match analyze_noise(&series, config) {
            Ok(noise) => noise,
            Err(e @ AnalysisError::WindowTooLarge { .. }) => {
                warn!("{}: noise analysis skipped: {}", name, e);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self::classified(
            name.to_string(),
            config.clone(),
            series,
            geometry,
            time_resp,
            step_responses,
            stats,
            noise,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn classified(
        name: String,
        config: AnalysisConfig,
        series: UniformSeries,
        geometry: FrameGeometry,
        time_resp: Array1<f64>,
        step_responses: Array2<f64>,
        stats: FrameStats,
        noise: Option<NoiseAnalysis>,
    ) -> Self {
        let mut masks = FrameMasks::classify(
            &stats.max_in,
            config.threshold,
            config.trusted_min_rate,
            config.min_high_frames,
        );
        let withdrawn = masks.distrust(&stats.finite);
        if withdrawn > 0 {
            warn!("{}: {} frames contain non-finite samples and are ignored", name, withdrawn);
        }
        let params = AggregationParams::from(&config);
        let low_response = aggregate_responses(&step_responses, &masks.low_weights(), &time_resp, params);
        let high_response = (masks.high_count() > 0)
            .then(|| aggregate_responses(&step_responses, &masks.high_weights(), &time_resp, params));
        if low_response.is_no_data() {
            warn!("{}: no trusted low-rate frames", name);
        }
        Self {
            name,
            config,
            series,
            geometry,
            time_resp,
            step_responses,
            stats,
            masks,
            low_response,
            high_response,
            noise,
        }
    }

    /// Re-runs classification and aggregation for another low/high threshold.
    pub fn reclassify(&self, threshold: f64) -> Self {
        let config = AnalysisConfig { threshold, ..self.config.clone() };
        Self::classified(
            self.name.clone(),
            config,
            self.series.clone(),
            self.geometry,
            self.time_resp.clone(),
            self.step_responses.clone(),
            self.stats.clone(),
            self.noise.clone(),
        )
    }

    pub fn frame_count(&self) -> usize {
        self.geometry.count
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.series.sample_rate_hz()
    }

    /// Time at which the low-rate response first reaches 1.0.
    pub fn response_time(&self) -> Option<f64> {
        self.low_response.response_time(MAX_SENSIBLE_RESPONSE_TIME_S)
    }

    pub fn low_curve(&self) -> CurvePoints {
        curve_points(&self.low_response)
    }

    pub fn high_curve(&self) -> Option<CurvePoints> {
        self.high_response.as_ref().map(curve_points)
    }
}

fn curve_points(curve: &RepresentativeCurve) -> CurvePoints {
    curve.time.iter().cloned().zip(curve.value.iter().cloned()).collect()
}

/// Analyses each present axis independently. A failing axis is reported in
/// its own slot and does not stop the others.
pub fn analyze_axes(axes: &AllAxisChannels, config: &AnalysisConfig) -> AllAxisOutcomes {
    let mut outcomes: AllAxisOutcomes = Default::default();
    for axis in ControlAxis::ALL {
        let Some(channels) = &axes[axis.index()] else {
            continue;
        };
        let outcome = Trace::compute(axis.name(), channels, config);
        match &outcome {
            Ok(trace) => info!(
                "{}: {} frames, {} low-rate, {} high-rate",
                axis.name(),
                trace.frame_count(),
                trace.masks.low_count(),
                trace.masks.high_count()
            ),
            Err(e) => warn!("{}: analysis failed: {}", axis.name(), e),
        }
        outcomes[axis.index()] = Some(outcome);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_channels(n: usize, fs: f64) -> AxisChannels {
        let time: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        AxisChannels::new(time, vec![0.0; n], vec![0.0; n], vec![50.0; n])
    }

    #[test]
    fn low_sample_rate_fails() {
        let err = Trace::compute("roll", &flat_channels(500, 50.0), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientSampleRate { .. }));
    }

    #[test]
    fn duplicate_timestamps_fail_on_sample_rate() {
        let mut ch = flat_channels(500, 1000.0);
        ch.time_s = vec![1.0; 500];
        let err = Trace::compute("roll", &ch, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientSampleRate { .. }));
    }

    #[test]
    fn log_shorter_than_frame_is_too_large() {
        let err = Trace::compute("roll", &flat_channels(800, 1000.0), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::WindowTooLarge { .. }));
    }

    #[test]
    fn motionless_log_reports_no_data() {
        let trace = Trace::compute("roll", &flat_channels(3000, 1000.0), &AnalysisConfig::default()).unwrap();
        assert!(trace.low_response.is_no_data());
        assert!(trace.high_response.is_none());
        assert!(trace.noise.is_none());
        assert_eq!(trace.time_resp.len(), 500);
        assert_eq!(trace.step_responses.dim(), (trace.frame_count(), 500));
        assert_eq!(trace.response_time(), None);
    }

    #[test]
    fn one_failing_axis_does_not_stop_the_others() {
        let axes: AllAxisChannels = [
            Some(flat_channels(3000, 1000.0)),
            Some(flat_channels(100, 1000.0)),
            None,
        ];
        let outcomes = analyze_axes(&axes, &AnalysisConfig::default());
        assert!(matches!(outcomes[0], Some(Ok(_))));
        assert!(matches!(outcomes[1], Some(Err(AnalysisError::WindowTooLarge { .. }))));
        assert!(outcomes[2].is_none());
    }

    #[test]
    fn invalid_config_is_rejected_before_work() {
        let cfg = AnalysisConfig { bin_count: 0, ..Default::default() };
        let err = Trace::compute("roll", &flat_channels(3000, 1000.0), &cfg).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn noise_window_longer_than_log_keeps_step_response() {
        let channels = flat_channels(1500, 1000.0).with_d_term_error(vec![0.0; 1500]);
        let cfg = AnalysisConfig { noise_framelen_s: 2.0, ..Default::default() };
        assert!(cfg.validate().is_ok());
        let trace = Trace::compute("roll", &channels, &cfg).unwrap();
        assert!(trace.noise.is_none());
        assert_eq!(trace.time_resp.len(), 500);
        assert!(trace.frame_count() > 0);
    }
}

// tests/step_response_integration.rs

use step_response_analyzer::data_input::log_parser::parse_log;
use step_response_analyzer::report::{write_step_response, write_trace_reports};
use step_response_analyzer::{analyze_axes, AnalysisConfig, AxisChannels, CurveStatus, RepresentativeCurve, Trace};

/// Fixed-seed linear congruential generator, uniform in [-0.5, 0.5).
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f64 / (1u64 << 31) as f64) - 0.5
    }
}

/// Discrete first-order lag with time constant `tau` at rate `fs`, one sample of delay.
fn first_order(input: &[f64], fs: f64, tau: f64) -> Vec<f64> {
    let a = (-1.0 / (fs * tau)).exp();
    let mut out = vec![0.0; input.len()];
    for i in 1..input.len() {
        out[i] = a * out[i - 1] + (1.0 - a) * input[i - 1];
    }
    out
}

fn step_log() -> AxisChannels {
    let fs = 200.0;
    let n = 2000;
    let time: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
    let setpoint: Vec<f64> = time.iter().map(|&t| if t >= 5.0 { 600.0 } else { 0.0 }).collect();
    let measured = first_order(&setpoint, fs, 0.05);
    AxisChannels::new(time, setpoint, measured, vec![50.0; n])
}

/// Band-limited noise through a 20 ms first-order plant, sampled at 1 kHz.
fn broadband_log() -> AxisChannels {
    let fs = 1000.0;
    let n = 10_000;
    let mut rng = Lcg(12345);
    let raw: Vec<f64> = (0..n).map(|_| rng.next() * 1600.0).collect();
    let setpoint = first_order(&raw, fs, 0.003);
    let measured = first_order(&setpoint, fs, 0.02);
    let time: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
    AxisChannels::new(time, setpoint, measured, vec![50.0; n])
}

/// `broadband_log` of `n` samples with uniform sensor noise of +-300 deg/s on the gyro.
fn noisy_broadband_log(n: usize) -> AxisChannels {
    let fs = 1000.0;
    let mut rng = Lcg(12345);
    let raw: Vec<f64> = (0..n).map(|_| rng.next() * 1600.0).collect();
    let setpoint = first_order(&raw, fs, 0.003);
    let mut sensor = Lcg(999);
    let measured: Vec<f64> = first_order(&setpoint, fs, 0.02)
        .into_iter()
        .map(|v| v + sensor.next() * 600.0)
        .collect();
    let time: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
    AxisChannels::new(time, setpoint, measured, vec![50.0; n])
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn assert_first_order_shape(curve: &RepresentativeCurve, label: &str) {
    assert_eq!(curve.status, CurveStatus::Estimated, "{}", label);
    let value = curve.value.as_slice().unwrap();
    let settled = mean(&value[300..]);
    assert!(settled > 0.85 && settled < 1.1, "{}: settled at {}", label, settled);
    assert!(value[0].abs() < 0.1, "{}: starts at {}", label, value[0]);

    // tau * ln 2 is about 14 ms
    let half = value.iter().position(|&v| v > 0.5 * settled).unwrap();
    assert!((9..=20).contains(&half), "{}: half rise at {} ms", label, half);
    assert!(value[60] > 0.85 * settled, "{}: {} at 3 tau", label, value[60]);
}

#[test]
fn broadband_input_recovers_first_order_step() {
    let trace = Trace::compute("Roll", &broadband_log(), &AnalysisConfig::default()).unwrap();
    assert_eq!(trace.time_resp.len(), 500);
    assert!((trace.sample_rate_hz() - 1000.0).abs() < 0.5);
    assert!(trace.masks.low_count() > 0);
    assert!(trace.masks.high_count() >= 10);

    assert_first_order_shape(&trace.low_response, "low");
    let high = trace.high_response.as_ref().unwrap();
    assert_first_order_shape(high, "high");
}

#[test]
fn longer_log_tightens_the_identified_step() {
    let tau = 0.02;
    let error = |n: usize| {
        let trace = Trace::compute("Roll", &noisy_broadband_log(n), &AnalysisConfig::default()).unwrap();
        let curve = &trace.low_response;
        assert_eq!(curve.status, CurveStatus::Estimated);
        let deviation: Vec<f64> = curve
            .time
            .iter()
            .zip(curve.value.iter())
            .take(300)
            .map(|(&t, &v)| (v - (1.0 - (-t / tau).exp())).abs())
            .collect();
        (mean(&deviation), curve.frames)
    };
    let (short_error, short_frames) = error(3_000);
    let (long_error, long_frames) = error(10_000);
    assert!(long_frames > short_frames);
    assert!(long_error < 0.85 * short_error, "3 s: {}, 10 s: {}", short_error, long_error);
}

#[test]
fn gyro_gaps_are_excluded_instead_of_flattening_the_curve() {
    let clean = Trace::compute("Roll", &broadband_log(), &AnalysisConfig::default()).unwrap();

    let mut channels = broadband_log();
    let gaps = [2500, 2600, 7000, 7100];
    for &i in &gaps {
        channels.measured[i] = f64::NAN;
    }
    let trace = Trace::compute("Roll", &channels, &AnalysisConfig::default()).unwrap();

    let trusted = |t: &Trace| t.masks.trusted.iter().filter(|&&x| x).count();
    assert!(trusted(&trace) < trusted(&clean));
    for frame in 0..trace.frame_count() {
        let range = trace.geometry.range(frame);
        if gaps.iter().any(|g| range.contains(g)) {
            assert!(!trace.masks.trusted[frame], "frame {} overlaps a gap", frame);
            assert!(!trace.stats.finite[frame]);
        }
    }

    assert_first_order_shape(&trace.low_response, "low with gaps");
    assert_first_order_shape(trace.high_response.as_ref().unwrap(), "high with gaps");
}

#[test]
fn step_log_classifies_every_frame_once() {
    let trace = Trace::compute("Roll", &step_log(), &AnalysisConfig::default()).unwrap();
    assert_eq!(trace.frame_count(), 150);
    assert_eq!(trace.time_resp.len(), 100);
    for (low, high) in trace.masks.low.iter().zip(trace.masks.high.iter()) {
        assert!(low ^ high);
    }
    // frames holding the full 600 deg/s command are high-rate
    assert!(trace.masks.high_count() > 60);
    assert_eq!(trace.masks.low_count() + trace.masks.high_count(), 150);
}

#[test]
fn step_log_high_rate_curve_rises_early_and_stays_clustered() {
    let trace = Trace::compute("Roll", &step_log(), &AnalysisConfig::default()).unwrap();
    let high = trace.high_response.as_ref().unwrap();
    assert_eq!(high.status, CurveStatus::Estimated);
    assert!(high.frames >= 10);

    // 0.15 s is three time constants
    let start = high.value[0];
    let at_three_tau = high.value[30];
    assert!(start < 0.4, "start {}", start);
    // zero-phase estimate of steady frames plateaus near 0.64
    assert!(at_three_tau > 0.55 && at_three_tau < 0.75, "at 3 tau {}", at_three_tau);
    assert!(at_three_tau - start > 0.25);

    // identical frames pile up in few value bins
    assert!(high.width[0] < 0.05, "width {}", high.width[0]);
}

#[test]
fn repeated_analysis_is_bit_identical() {
    let channels = step_log();
    let a = Trace::compute("Roll", &channels, &AnalysisConfig::default()).unwrap();
    let b = Trace::compute("Roll", &channels, &AnalysisConfig::default()).unwrap();
    assert_eq!(a.step_responses, b.step_responses);
    assert_eq!(a.low_response.value, b.low_response.value);
    assert_eq!(a.low_response.width, b.low_response.width);
    assert_eq!(
        a.high_response.as_ref().map(|c| c.value.clone()),
        b.high_response.as_ref().map(|c| c.value.clone())
    );
}

#[test]
fn reclassify_matches_fresh_analysis() {
    let channels = step_log();
    let config = AnalysisConfig::default();
    let trace = Trace::compute("Roll", &channels, &config).unwrap();
    let lowered = trace.reclassify(100.0);
    let fresh = Trace::compute("Roll", &channels, &AnalysisConfig { threshold: 100.0, ..config }).unwrap();
    assert_eq!(lowered.masks.low, fresh.masks.low);
    assert_eq!(lowered.low_response.value, fresh.low_response.value);
    assert!(lowered.masks.low_count() < trace.masks.low_count());
}

#[test]
fn csv_log_runs_through_all_axes_and_reports() {
    let mut log = String::from("\"Product\",\"decoder\"\ntime (us),setpoint[0],gyroADC[0],axisD[0],debug[0],setpoint[1],gyroADC[1],setpoint[3]\n");
    let channels = broadband_log();
    for i in 0..channels.time_s.len() {
        let t_us = (channels.time_s[i] * 1e6).round() as i64;
        log.push_str(&format!(
            "{},{},{},{},{},0,0,500\n",
            t_us,
            channels.setpoint[i],
            channels.measured[i],
            channels.measured[i] * 0.1,
            channels.measured[i] * 2.0
        ));
    }
    let axes = parse_log(log.as_bytes()).unwrap();
    assert!(axes[0].is_some() && axes[1].is_some() && axes[2].is_none());

    let outcomes = analyze_axes(&axes, &AnalysisConfig::default());
    let roll = outcomes[0].as_ref().unwrap().as_ref().unwrap();
    let noise = roll.noise.as_ref().unwrap();
    assert_eq!(noise.transmission.status, CurveStatus::Estimated);
    // debug is twice the gyro everywhere
    for (&a, &f) in noise.transmission.attenuation.iter().zip(noise.transmission.frequency.iter()) {
        if a > 0.0 {
            assert!((a - 0.5).abs() < 1e-6, "{} at {} Hz", a, f);
        }
    }

    // the motionless pitch axis still yields a trace, flagged as no data
    let pitch = outcomes[1].as_ref().unwrap().as_ref().unwrap();
    assert!(pitch.low_response.is_no_data());
    assert!(pitch.high_response.is_none());

    let dir = std::env::temp_dir().join(format!("step_response_report_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let written = write_trace_reports(&dir, "flight", roll).unwrap();
    assert_eq!(written.len(), 2);
    assert!(written[0].ends_with("flight_Roll_step_response.csv"));
    assert!(written[1].ends_with("flight_Roll_filter_transmission.csv"));
    let step_csv = std::fs::read_to_string(&written[0]).unwrap();
    assert_eq!(step_csv.lines().count(), 501);
    std::fs::remove_dir_all(&dir).unwrap();

    let mut buf = Vec::new();
    write_step_response(&mut buf, pitch).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.lines().nth(1).unwrap().ends_with(",,"));
}

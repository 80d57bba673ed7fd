// src/constants.rs

// Frame geometry for the step-response deconvolution.
pub const FRAME_LENGTH_S: f64 = 1.0; // Length of each analysis frame in seconds
pub const RESPONSE_LENGTH_S: f64 = 0.5; // Length of the step response kept from each frame
pub const SUPERPOSITION_FACTOR: usize = 16; // Number of overlapping frames within one frame length
pub const TUKEY_ALPHA: f64 = 1.0; // Alpha for Tukey window (1.0 is Hanning window)

// Wiener deconvolution regularisation.
pub const CUTOFF_FREQUENCY_HZ: f64 = 25.0; // Above this the input is not trusted
pub const DECONVOLUTION_SIGNAL_TO_NOISE: f64 = 10.0; // Passband SNR prior
pub const FFT_BLOCK_SAMPLES: usize = 1024; // Frames are zero-padded to a multiple of this
pub const MIN_SAMPLE_RATE_HZ: f64 = 100.0;

// Frame classification.
pub const SETPOINT_THRESHOLD: f64 = 500.0; // Threshold for low/high setpoint masking
pub const MOVEMENT_THRESHOLD_DEG_S: f64 = 20.0; // Frames below this are noise, not control
pub const MIN_HIGH_RATE_FRAMES: usize = 10;

// Response histogram aggregation. The smoothing width and density threshold are
// empirical and exposed through AnalysisConfig for tuning.
pub const RESPONSE_VALUE_MIN: f64 = -1.5;
pub const RESPONSE_VALUE_MAX: f64 = 3.5;
pub const RESPONSE_VALUE_BINS: usize = 1000;
pub const RESPONSE_SMOOTHING_BINS: f64 = 7.0;
pub const RESPONSE_DENSITY_THRESHOLD: f64 = 0.5;

// Reported response time is dropped above this.
pub const MAX_SENSIBLE_RESPONSE_TIME_S: f64 = 0.2;

// Noise / filter transmission analysis.
pub const NOISE_FRAME_LENGTH_S: f64 = 0.3;
pub const NOISE_SUPERPOSITION_FACTOR: usize = 16;
pub const NOISE_EXCLUDE_END_S: f64 = 2.0; // Landing tends to inject non-representative noise
pub const NOISE_SMOOTHING_BINS: f64 = 3.0;
pub const NOISE_FREQUENCY_DECIMATION: usize = 4; // FFT bins per heat-map frequency bin
pub const THROTTLE_BINS: usize = 101;
pub const THROTTLE_MIN: f64 = 0.0;
pub const THROTTLE_MAX: f64 = 100.0;
pub const NOISE_PEAK_SEARCH_MIN_HZ: f64 = 100.0;

// Gaussian kernels are truncated at this many standard deviations.
pub const GAUSSIAN_TRUNCATE_SIGMAS: f64 = 4.0;

// src/constants.rs

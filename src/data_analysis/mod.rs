// src/data_analysis/mod.rs

pub mod aggregator;
pub mod deconvolution;
pub mod fft_utils;
pub mod frame_classifier;
pub mod histogram;
pub mod noise_analysis;
pub mod resample;
pub mod smoothing;
pub mod trace;
pub mod window;

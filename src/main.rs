// src/main.rs

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use step_response_analyzer::axis_names::ControlAxis;
use step_response_analyzer::config::AnalysisConfig;
use step_response_analyzer::data_analysis::trace::{analyze_axes, Trace};
use step_response_analyzer::data_input::log_parser::parse_log_file;
use step_response_analyzer::report::write_trace_reports;

struct CliArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    threshold: Option<f64>,
    output_dir: Option<PathBuf>,
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <input_file.csv> [--config <config.json>] [--threshold <deg/s>] [--output-dir <dir>]",
        program
    );
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut input = None;
    let mut config = None;
    let mut threshold = None;
    let mut output_dir = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| iter.next().cloned().ok_or_else(|| anyhow!("{} requires a value", flag));
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--threshold" => {
                let raw = value("--threshold")?;
                threshold = Some(raw.parse::<f64>().with_context(|| format!("invalid threshold '{}'", raw))?);
            }
            "--output-dir" => output_dir = Some(PathBuf::from(value("--output-dir")?)),
            other if other.starts_with("--") => bail!("unknown option '{}'", other),
            other => {
                if input.is_some() {
                    bail!("more than one input file given");
                }
                input = Some(PathBuf::from(other));
            }
        }
    }

    Ok(CliArgs {
        input: input.ok_or_else(|| anyhow!("no input file given"))?,
        config,
        threshold,
        output_dir,
    })
}

fn load_config(args: &CliArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
            AnalysisConfig::from_json_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

fn summarize(trace: &Trace) {
    info!(
        "{}: {:.1} Hz, {} frames ({} low-rate, {} high-rate)",
        trace.name,
        trace.sample_rate_hz(),
        trace.frame_count(),
        trace.masks.low_count(),
        trace.masks.high_count()
    );
    match trace.response_time() {
        Some(t) => info!("{}: response time {:.1} ms", trace.name, t * 1000.0),
        None => info!("{}: response time not determined", trace.name),
    }
    if let Some(noise) = &trace.noise {
        info!(
            "{}: noise analysis over {} windows, gyro peak above 100 Hz {:.3}",
            trace.name, noise.windows, noise.gyro.peak_above_100hz
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage(args.first().map(String::as_str).unwrap_or("step_response_analyzer"));
            std::process::exit(1);
        }
    };
    let config = load_config(&cli)?;

    let input_path: &Path = &cli.input;
    let root_name = input_path.file_stem().unwrap_or_default().to_string_lossy().to_string();
    let output_dir = match &cli.output_dir {
        Some(dir) => dir.clone(),
        None => input_path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    if !output_dir.as_os_str().is_empty() {
        fs::create_dir_all(&output_dir).with_context(|| format!("creating {}", output_dir.display()))?;
    }

    info!("Reading {}", input_path.display());
    let axes = parse_log_file(input_path)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("reading {}", input_path.display()))?;

    let outcomes = analyze_axes(&axes, &config);
    let mut written = 0usize;
    for axis in ControlAxis::ALL {
        match &outcomes[axis.index()] {
            None => info!("{}: not present in log", axis.name()),
            Some(Err(e)) => {
                println!("insufficient motion/data for axis {}", axis.name());
                warn!("{}: {}", axis.name(), e);
            }
            Some(Ok(trace)) => {
                summarize(trace);
                let paths = write_trace_reports(&output_dir, &root_name, trace)
                    .map_err(|e| anyhow!("{}", e))
                    .with_context(|| format!("writing reports for {}", axis.name()))?;
                for path in &paths {
                    info!("  wrote {}", path.display());
                }
                written += paths.len();
            }
        }
    }
    info!("Done, {} files written.", written);
    Ok(())
}

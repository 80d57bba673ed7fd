// src/data_input/log_parser.rs

use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::axis_names::{ControlAxis, AXIS_COUNT};
use crate::data_input::log_data::AxisChannels;
use crate::types::AllAxisChannels;

/// Time column and its scale to seconds.
const TIME_HEADERS: [(&str, f64); 2] = [("time (us)", 1e-6), ("time (s)", 1.0)];

/// Throttle column and its scale to percent. `setpoint[3]` is logged in [0, 1000].
const THROTTLE_HEADERS: [(&str, f64); 2] = [("throttle", 1.0), ("setpoint[3]", 0.1)];

/// Column positions of one axis in the CSV header; `None` when absent.
#[derive(Debug, Clone, Default)]
struct AxisColumns {
    setpoint: Option<usize>,
    measured: Option<usize>,
    d_term_error: Option<usize>,
    debug: Option<usize>,
}

impl AxisColumns {
    fn locate(header: &StringRecord, axis: usize) -> Self {
        let find = |name: String| header.iter().position(|h| h.trim() == name);
        Self {
            setpoint: find(format!("setpoint[{}]", axis)),
            measured: find(format!("gyroADC[{}]", axis)),
            d_term_error: find(format!("axisD[{}]", axis)),
            // gyroUnfilt is preferred; debug[i] is the fallback reference
            debug: find(format!("gyroUnfilt[{}]", axis)).or_else(|| find(format!("debug[{}]", axis))),
        }
    }

    fn is_usable(&self) -> bool {
        self.setpoint.is_some() && self.measured.is_some()
    }
}

/// Per-axis column buffers filled row by row.
#[derive(Debug, Default)]
struct AxisBuffers {
    setpoint: Vec<f64>,
    measured: Vec<f64>,
    d_term_error: Vec<f64>,
    debug: Vec<f64>,
}

/// Reads a decoded flight log CSV and returns the channels of every axis
/// that has both a setpoint and a gyro column.
///
/// Lines before the header row (key/value metadata written by log
/// decoders) are skipped. Rows with a missing or unparsable time are
/// dropped; other unparsable cells become NaN.
pub fn parse_log_file(input_file_path: &Path) -> Result<AllAxisChannels, Box<dyn Error>> {
    let file = File::open(input_file_path)?;
    parse_log(BufReader::new(file))
}

/// Same as [`parse_log_file`] for any reader.
pub fn parse_log<R: Read>(reader: R) -> Result<AllAxisChannels, Box<dyn Error>> {
    let csv_content = strip_preamble(BufReader::new(reader))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_content.as_bytes());
    let header = reader.headers()?.clone();
    debug!("CSV headers: {:?}", header);

    let (time_idx, time_scale) = TIME_HEADERS
        .iter()
        .find_map(|&(name, scale)| header.iter().position(|h| h == name).map(|idx| (idx, scale)))
        .ok_or("missing time column ('time (us)' or 'time (s)')")?;
    let throttle_col = THROTTLE_HEADERS
        .iter()
        .find_map(|&(name, scale)| header.iter().position(|h| h == name).map(|idx| (idx, scale)));
    if throttle_col.is_none() {
        warn!("No throttle column found; throttle is taken as 0");
    }

    let columns: Vec<AxisColumns> = (0..AXIS_COUNT).map(|axis| AxisColumns::locate(&header, axis)).collect();
    for axis in ControlAxis::ALL {
        let cols = &columns[axis.index()];
        info!(
            "  {}: setpoint {}, gyro {}, D-term {}, debug {}",
            axis.name(),
            found(cols.setpoint),
            found(cols.measured),
            found(cols.d_term_error),
            found(cols.debug)
        );
    }
    if !columns.iter().any(AxisColumns::is_usable) {
        return Err("no axis has both 'setpoint[i]' and 'gyroADC[i]' columns".into());
    }

    let mut time_s: Vec<f64> = Vec::new();
    let mut throttle: Vec<f64> = Vec::new();
    let mut buffers: Vec<AxisBuffers> = (0..AXIS_COUNT).map(|_| AxisBuffers::default()).collect();

    for (row_index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping row {} due to CSV read error: {}", row_index + 1, e);
                continue;
            }
        };
        let parse = |idx: Option<usize>| -> f64 {
            idx.and_then(|i| record.get(i))
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };

        let time = parse(Some(time_idx));
        if !time.is_finite() {
            warn!("Skipping row {} due to missing or invalid time", row_index + 1);
            continue;
        }
        time_s.push(time * time_scale);
        throttle.push(match throttle_col {
            Some((idx, scale)) => parse(Some(idx)) * scale,
            None => 0.0,
        });
        for (cols, buf) in columns.iter().zip(buffers.iter_mut()) {
            if !cols.is_usable() {
                continue;
            }
            buf.setpoint.push(parse(cols.setpoint));
            buf.measured.push(parse(cols.measured));
            if cols.d_term_error.is_some() {
                buf.d_term_error.push(parse(cols.d_term_error));
            }
            if cols.debug.is_some() {
                buf.debug.push(parse(cols.debug));
            }
        }
    }
    info!("Finished reading {} data rows.", time_s.len());

    let mut axes: AllAxisChannels = Default::default();
    for (axis, (cols, buf)) in columns.iter().zip(buffers).enumerate() {
        if !cols.is_usable() {
            continue;
        }
        let mut channels = AxisChannels::new(time_s.clone(), buf.setpoint, buf.measured, throttle.clone());
        if cols.d_term_error.is_some() {
            channels = channels.with_d_term_error(buf.d_term_error);
        }
        if cols.debug.is_some() {
            channels = channels.with_debug(buf.debug);
        }
        channels.check_lengths()?;
        axes[axis] = Some(channels);
    }
    Ok(axes)
}

/// Drops everything before the first line that looks like the column header.
fn strip_preamble<R: BufRead>(reader: R) -> Result<String, Box<dyn Error>> {
    let mut csv_lines: Vec<String> = Vec::new();
    let mut skipped = 0usize;
    for line_result in reader.lines() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        if csv_lines.is_empty() {
            let is_header = line.contains("time") && (line.contains("gyroADC") || line.contains("setpoint"));
            if !is_header {
                skipped += 1;
                continue;
            }
        }
        csv_lines.push(line);
    }
    if csv_lines.is_empty() {
        return Err("Could not find CSV headers in the file".into());
    }
    if skipped > 0 {
        debug!("Skipped {} lines before the CSV header", skipped);
    }
    Ok(csv_lines.join("\n"))
}

fn found(idx: Option<usize>) -> &'static str {
    if idx.is_some() {
        "found"
    } else {
        "not found"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
\"Product\",\"Blackbox flight data recorder\"
\"firmwareType\",\"Cleanflight\"
time (us), setpoint[0], setpoint[1], setpoint[3], gyroADC[0], gyroADC[1], axisD[0], debug[0]
1000, 10, 20, 500, 9, 18, 1, 8
2000, 11, 21, 600, 10, 19, 2, 9
bad, 0, 0, 0, 0, 0, 0, 0
3000, 12, x, 700, 11, 20, 3, 10
";

    #[test]
    fn reads_axes_with_setpoint_and_gyro() {
        let axes = parse_log(LOG.as_bytes()).unwrap();
        let roll = axes[0].as_ref().unwrap();
        assert_eq!(roll.time_s, vec![0.001, 0.002, 0.003]);
        assert_eq!(roll.setpoint, vec![10.0, 11.0, 12.0]);
        assert_eq!(roll.measured, vec![9.0, 10.0, 11.0]);
        assert_eq!(roll.throttle, vec![50.0, 60.0, 70.0]);
        assert_eq!(roll.d_term_error, Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(roll.debug, Some(vec![8.0, 9.0, 10.0]));

        let pitch = axes[1].as_ref().unwrap();
        assert!(pitch.setpoint[2].is_nan());
        assert!(pitch.d_term_error.is_none());
        assert!(axes[2].is_none());
    }

    #[test]
    fn seconds_time_column_and_direct_throttle() {
        let log = "time (s),throttle,setpoint[2],gyroADC[2]\n0.5,40,1,2\n0.75,41,3,4\n";
        let axes = parse_log(log.as_bytes()).unwrap();
        let yaw = axes[2].as_ref().unwrap();
        assert_eq!(yaw.time_s, vec![0.5, 0.75]);
        assert_eq!(yaw.throttle, vec![40.0, 41.0]);
    }

    #[test]
    fn missing_header_is_an_error() {
        assert!(parse_log("a,b\n1,2\n".as_bytes()).is_err());
        let no_gyro = "time (us),setpoint[0]\n1,2\n";
        assert!(parse_log(no_gyro.as_bytes()).is_err());
    }
}

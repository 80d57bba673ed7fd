// src/report.rs
// Writes aggregated curves as CSV for an external renderer.

use csv::Writer;
use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::data_analysis::aggregator::CurveStatus;
use crate::data_analysis::noise_analysis::FilterTransmission;
use crate::data_analysis::trace::Trace;

const STEP_RESPONSE_HEADER: [&str; 5] = ["time_s", "low_response", "low_width", "high_response", "high_width"];
const TRANSMISSION_HEADER: [&str; 2] = ["frequency_hz", "attenuation"];

/// Writes one row per response sample. High-rate columns are left empty
/// when the trace has no high-rate class.
pub fn write_step_response<W: Write>(out: W, trace: &Trace) -> Result<(), Box<dyn Error>> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(STEP_RESPONSE_HEADER)?;

    let low = &trace.low_response;
    let high = trace.high_response.as_ref();
    for (i, t) in trace.time_resp.iter().enumerate() {
        let (high_value, high_width) = match high {
            Some(curve) => (curve.value[i].to_string(), curve.width[i].to_string()),
            None => (String::new(), String::new()),
        };
        writer.write_record([
            t.to_string(),
            low.value[i].to_string(),
            low.width[i].to_string(),
            high_value,
            high_width,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the filter transmission curve; nothing but the header for `NoData`.
pub fn write_filter_transmission<W: Write>(out: W, transmission: &FilterTransmission) -> Result<(), Box<dyn Error>> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(TRANSMISSION_HEADER)?;
    if transmission.status == CurveStatus::Estimated {
        for (f, a) in transmission.frequency.iter().zip(transmission.attenuation.iter()) {
            writer.write_record([f.to_string(), a.to_string()])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes `<stem>_<Axis>_step_response.csv` and, when the noise analysis
/// ran, `<stem>_<Axis>_filter_transmission.csv` into `output_dir`.
/// Returns the paths written.
pub fn write_trace_reports(output_dir: &Path, stem: &str, trace: &Trace) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut written = Vec::new();

    let step_path = output_dir.join(format!("{}_{}_step_response.csv", stem, trace.name));
    write_step_response(File::create(&step_path)?, trace)?;
    written.push(step_path);

    if let Some(noise) = &trace.noise {
        let transmission_path = output_dir.join(format!("{}_{}_filter_transmission.csv", stem, trace.name));
        write_filter_transmission(File::create(&transmission_path)?, &noise.transmission)?;
        written.push(transmission_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn transmission_rows_follow_frequency_axis() {
        let transmission = FilterTransmission {
            frequency: Array1::from(vec![0.0, 10.0]),
            attenuation: Array1::from(vec![1.0, 0.5]),
            status: CurveStatus::Estimated,
        };
        let mut buf = Vec::new();
        write_filter_transmission(&mut buf, &transmission).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "frequency_hz,attenuation\n0,1\n10,0.5\n");
    }

    #[test]
    fn no_data_transmission_writes_only_header() {
        let transmission = FilterTransmission {
            frequency: Array1::from(vec![0.0, 10.0]),
            attenuation: Array1::zeros(2),
            status: CurveStatus::NoData,
        };
        let mut buf = Vec::new();
        write_filter_transmission(&mut buf, &transmission).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "frequency_hz,attenuation\n");
    }
}

//! Lines printed by the benchmark and the sentinel the runner writes for
//! failed pairs.
//!
//! A result line carries eight `label:value` segments joined by `|`:
//!
//! ```text
//! Detector:FAST|Descriptor:BRISK|Matcher:MAT_BF|Total:1824|Vehicle:149|Matches:0|Time Detector[ms]:1.21|Time Descriptor[ms]:2.03
//! ```
//!
//! Only the values are interpreted. The labels differ between benchmark builds
//! (`DetectorTime` vs `Time Detector[ms]`), so they are not compared.

use crate::errors::*;
use std::fmt::Display;
use std::num::ParseFloatError;
use std::str::FromStr;

/// Every result line starts with this marker.
const MARKER: &str = "Detector";

/// Prefix of the line recorded for a pair the benchmark rejected.
const INVALID: &str = "Invalid combination";

const NUM_SEGMENTS: usize = 8;

/// A processing time in ms together with the text the benchmark printed for
/// it, so reports can repeat the value verbatim (`12`, `1.5e-05`).
#[derive(Debug, Clone, PartialEq)]
pub struct Millis {
    value: f64,
    text: String,
}

impl Millis {
    /// The parsed value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The value as printed.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<f64> for Millis {
    fn from(value: f64) -> Millis {
        Millis {
            value: value,
            text: value.to_string(),
        }
    }
}

impl FromStr for Millis {
    type Err = ParseFloatError;

    fn from_str(s: &str) -> ::std::result::Result<Millis, ParseFloatError> {
        let text = s.trim();
        Ok(Millis {
            value: text.parse()?,
            text: text.to_string(),
        })
    }
}

/// Metrics for a single processed image.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Keypoint detector.
    pub detector: String,

    /// Keypoint descriptor.
    pub descriptor: String,

    /// Descriptor matcher (e.g. `MAT_BF`).
    pub matcher: String,

    /// Keypoints detected in the whole image.
    pub total: usize,

    /// Keypoints within the preceding vehicle's bounding box.
    pub vehicle: usize,

    /// Keypoints matched against the previous image.
    pub matches: usize,

    /// Detector processing time.
    pub detector_time: Millis,

    /// Descriptor processing time.
    pub descriptor_time: Millis,
}

impl Measurement {
    /// Whether a line of benchmark output is a result line.
    pub fn is_result_line(line: &str) -> bool {
        line.starts_with(MARKER)
    }
}

fn malformed(line: &str, reason: String) -> Error {
    ErrorKind::ParseFormat(line.to_string(), reason).into()
}

fn value_of<'a>(line: &str, segment: &'a str) -> Result<&'a str> {
    match segment.split_once(':') {
        Some((_label, value)) => Ok(value.trim()),
        None => Err(malformed(line, format!("segment '{}' has no ':'", segment))),
    }
}

fn name_of(line: &str, field: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(malformed(line, format!("empty {}", field)));
    }
    Ok(value.to_string())
}

fn number_of<T>(line: &str, field: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse::<T>()
        .map_err(|e| malformed(line, format!("{} '{}': {}", field, value, e)))
}

impl FromStr for Measurement {
    type Err = Error;

    fn from_str(line: &str) -> Result<Measurement> {
        let segments = line.trim_end().split('|').collect::<Vec<_>>();
        if segments.len() != NUM_SEGMENTS {
            bail!(malformed(
                line,
                format!("expected {} segments, found {}", NUM_SEGMENTS, segments.len()),
            ));
        }

        let v = segments
            .iter()
            .map(|s| value_of(line, s))
            .collect::<Result<Vec<&str>>>()?;

        Ok(Measurement {
            detector: name_of(line, "detector", v[0])?,
            descriptor: name_of(line, "descriptor", v[1])?,
            matcher: v[2].to_string(),
            total: number_of(line, "total", v[3])?,
            vehicle: number_of(line, "vehicle", v[4])?,
            matches: number_of(line, "matches", v[5])?,
            detector_time: number_of(line, "detector time", v[6])?,
            descriptor_time: number_of(line, "descriptor time", v[7])?,
        })
    }
}

/// A line of the sweep transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultLine {
    /// One image worth of metrics.
    Measurement(Measurement),

    /// The benchmark exited with an error for this pair.
    Invalid {
        /// Keypoint detector.
        detector: String,
        /// Keypoint descriptor.
        descriptor: String,
    },
}

impl ResultLine {
    /// Formats the sentinel recorded for a pair the benchmark rejected.
    pub fn sentinel(detector: &str, descriptor: &str) -> String {
        format!("{}|{}|{}", INVALID, detector, descriptor)
    }
}

impl FromStr for ResultLine {
    type Err = Error;

    fn from_str(line: &str) -> Result<ResultLine> {
        if !line.starts_with(INVALID) {
            return line.parse().map(ResultLine::Measurement);
        }

        let parts = line.trim_end().split('|').collect::<Vec<_>>();
        match parts.as_slice() {
            [_, detector, descriptor] => Ok(ResultLine::Invalid {
                detector: detector.to_string(),
                descriptor: descriptor.to_string(),
            }),
            _ => Err(malformed(line, "sentinel needs a detector and a descriptor".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "Detector:FAST|Descriptor:BRISK|Matcher:BF|Total:100|Vehicle:10|\
                        Matches:8|DetectorTime:1.5|DescriptorTime:0.7";

    #[test]
    fn parses_all_segments_in_order() {
        let m: Measurement = LINE.parse().unwrap();
        assert_eq!(m.detector, "FAST");
        assert_eq!(m.descriptor, "BRISK");
        assert_eq!(m.matcher, "BF");
        assert_eq!(m.total, 100);
        assert_eq!(m.vehicle, 10);
        assert_eq!(m.matches, 8);
        assert_eq!(m.detector_time.value(), 1.5);
        assert_eq!(m.descriptor_time.value(), 0.7);
    }

    #[test]
    fn ignores_labels_and_line_ending() {
        let line = "Detector:ORB|Descriptor:FREAK|Matcher:MAT_BF|Total:500|Vehicle:92|\
                    Matches:0|Time Detector[ms]:6.03|Time Descriptor[ms]:31.2\r";
        let m: Measurement = line.parse().unwrap();
        assert_eq!(m.detector, "ORB");
        assert_eq!(m.matches, 0);
        assert_eq!(m.descriptor_time.value(), 31.2);
    }

    #[test]
    fn times_keep_their_printed_text() {
        let line = LINE
            .replace("DetectorTime:1.5", "DetectorTime:12")
            .replace("DescriptorTime:0.7", "DescriptorTime: 1.5e-05");
        let m: Measurement = line.parse().unwrap();
        assert_eq!(m.detector_time.value(), 12.0);
        assert_eq!(m.detector_time.as_str(), "12");
        assert_eq!(m.descriptor_time.value(), 1.5e-5);
        assert_eq!(m.descriptor_time.as_str(), "1.5e-05");
        assert_eq!(Millis::from(0.25).as_str(), "0.25");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        let err = "Detector:FAST|Descriptor:BRISK|Matcher:BF"
            .parse::<Measurement>()
            .unwrap_err();
        match *err.kind() {
            ErrorKind::ParseFormat(_, ref reason) => assert!(reason.contains("found 3")),
            _ => panic!("unexpected error {}", err),
        }
    }

    #[test]
    fn rejects_segment_without_colon() {
        let line = LINE.replace("Total:100", "Total100");
        assert!(line.parse::<Measurement>().is_err());
    }

    #[test]
    fn rejects_non_numeric_values() {
        let line = LINE.replace("Vehicle:10", "Vehicle:ten");
        let err = line.parse::<Measurement>().unwrap_err();
        assert!(err.to_string().contains("vehicle 'ten'"));

        let line = LINE.replace("Total:100", "Total:-1");
        assert!(line.parse::<Measurement>().is_err());
    }

    #[test]
    fn result_line_recognizes_sentinel() {
        let line = ResultLine::sentinel("HARRIS", "AKAZE");
        assert_eq!(line, "Invalid combination|HARRIS|AKAZE");
        assert_eq!(
            line.parse::<ResultLine>().unwrap(),
            ResultLine::Invalid {
                detector: "HARRIS".into(),
                descriptor: "AKAZE".into(),
            }
        );
        assert!("Invalid combination|HARRIS".parse::<ResultLine>().is_err());
    }

    #[test]
    fn result_line_wraps_measurement() {
        match LINE.parse::<ResultLine>().unwrap() {
            ResultLine::Measurement(m) => assert_eq!(m.total, 100),
            other => panic!("unexpected {:?}", other),
        }
        assert!(Measurement::is_result_line(LINE));
        assert!(!Measurement::is_result_line("Using detector: FAST"));
    }
}

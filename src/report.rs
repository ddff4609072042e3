//! CSV export of the aggregated table.

use super::aggregate::AggregateTable;
use super::measurement::Measurement;
use super::setting::Setting;
use crate::errors::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

/// Column titles of the report.
pub const HEADER: [&str; 8] = [
    "Detector",
    "Descriptor",
    "Image",
    "Total Keypoints",
    "Keypoints on vehicle",
    "Detector Time",
    "Descriptor Time",
    "Matches",
];

/// One image of the report, in `HEADER` order. Times are written as the
/// benchmark printed them.
#[derive(Serialize, Debug)]
struct Row<'a> {
    detector: &'a str,
    descriptor: &'a str,
    image: usize,
    total: usize,
    vehicle: usize,
    detector_time: &'a str,
    descriptor_time: &'a str,
    matches: usize,
}

impl<'a> Row<'a> {
    fn new(image: usize, m: &'a Measurement) -> Row<'a> {
        Row {
            detector: &m.detector,
            descriptor: &m.descriptor,
            image: image,
            total: m.total,
            vehicle: m.vehicle,
            detector_time: m.detector_time.as_str(),
            descriptor_time: m.descriptor_time.as_str(),
            matches: m.matches,
        }
    }
}

/// Writes one row per (detector, descriptor, image) and a blank row after
/// each combination.
pub fn write_csv<W: Write>(table: &AggregateTable, wtr: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(wtr);
    writer.write_record(&HEADER)?;

    for (detector, descriptors) in table.iter() {
        for (descriptor, bundle) in descriptors {
            trace!("{}/{}: {} rows", detector, descriptor, bundle.len());
            for (idx, m) in bundle.images().iter().enumerate() {
                writer.serialize(Row::new(idx, m))?;
            }
            writer.write_record(&[""])?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Writes the report to `<results_dir>/<report_name>.csv` and returns its
/// path.
pub fn export_csv(table: &AggregateTable, setting: &Setting) -> Result<PathBuf> {
    let path = setting.report_path();
    fs::create_dir_all(&setting.results_dir)
        .chain_err(|| format!("failed to create {}", setting.results_dir))?;
    let file = File::create(&path).chain_err(|| format!("failed to open {:?}", path))?;
    write_csv(table, file).chain_err(|| format!("failed to write {:?}", path))?;
    info!("exported {} combinations to {:?}", table.len(), path);
    Ok(path)
}

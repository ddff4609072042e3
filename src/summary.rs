//! Per-descriptor means and their bar charts.

use super::aggregate::{AggregateTable, DescriptorTable, SeriesBundle};
use super::chart::{color, Figure, Panel, Series};
use super::setting::Setting;
use super::utils::{mean, round2};
use crate::errors::*;
use std::path::PathBuf;

/// Means over all images of one (detector, descriptor) combination. Times
/// are rounded to two decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorSummary {
    /// Keypoint descriptor.
    pub descriptor: String,

    /// Mean keypoints per image.
    pub total: f64,

    /// Mean keypoints on the vehicle per image.
    pub vehicle: f64,

    /// Mean matches per image.
    pub matches: f64,

    /// Mean detector time (ms).
    pub detector_time: f64,

    /// Mean descriptor time (ms).
    pub descriptor_time: f64,
}

impl DescriptorSummary {
    /// Summarizes a bundle; `None` if it holds no image.
    pub fn from_bundle(descriptor: &str, bundle: &SeriesBundle) -> Option<DescriptorSummary> {
        let counts = |v: &[usize]| mean(v.iter().map(|&x| x as f64));
        let times = |v: &[f64]| mean(v.iter().cloned()).map(round2);

        Some(DescriptorSummary {
            descriptor: descriptor.to_string(),
            total: counts(bundle.total())?,
            vehicle: counts(bundle.vehicle())?,
            matches: counts(bundle.matches())?,
            detector_time: times(bundle.detector_time())?,
            descriptor_time: times(bundle.descriptor_time())?,
        })
    }
}

impl ::std::fmt::Display for DescriptorSummary {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        write!(
            f,
            "{:>6}: total {:8.1}, vehicle {:6.1}, matches {:6.1}, detector {:7.2} ms, descriptor {:7.2} ms",
            self.descriptor,
            self.total,
            self.vehicle,
            self.matches,
            self.detector_time,
            self.descriptor_time
        )
    }
}

/// Summaries of every descriptor under one detector, in table order.
pub fn summarize(descriptors: &DescriptorTable) -> Vec<DescriptorSummary> {
    descriptors
        .iter()
        .filter_map(|(descriptor, bundle)| DescriptorSummary::from_bundle(descriptor, bundle))
        .collect()
}

fn labels(summaries: &[DescriptorSummary]) -> Vec<String> {
    summaries.iter().map(|s| s.descriptor.clone()).collect()
}

fn column<F: Fn(&DescriptorSummary) -> f64>(summaries: &[DescriptorSummary], f: F) -> Vec<f64> {
    summaries.iter().map(f).collect()
}

/// Bars of mean total, on-vehicle and matched keypoints per descriptor.
pub fn mean_points_figure(detector: &str, summaries: &[DescriptorSummary]) -> Figure {
    let mut panel = Panel::bars(format!("{}: Mean of Points Detected", detector), labels(summaries))
        .with_y_label("Mean number of points")
        .with_legend()
        .with_values();
    panel.push(Series::new("Total", column(summaries, |s| s.total), color(0)));
    panel.push(Series::new("On Vehicle", column(summaries, |s| s.vehicle), color(1)));
    panel.push(Series::new("Matches", column(summaries, |s| s.matches), color(2)));

    let mut figure = Figure::new(format!("mean_points_{}", detector), 1, 1);
    figure.push(panel);
    figure
}

/// Bars of mean detector and descriptor time per descriptor.
pub fn computing_times_figure(detector: &str, summaries: &[DescriptorSummary]) -> Figure {
    let title = format!("{}: Detector and Descriptor Processing Times", detector);
    let mut panel = Panel::bars(title, labels(summaries))
        .with_y_label("Mean time [ms]")
        .with_legend()
        .with_values();
    panel.push(Series::new("Detector", column(summaries, |s| s.detector_time), color(0)));
    panel.push(Series::new("Descriptor", column(summaries, |s| s.descriptor_time), color(1)));

    let mut figure = Figure::new(format!("computing_times_{}", detector), 1, 1);
    figure.push(panel);
    figure
}

/// Logs the summary of every detector and saves its two bar charts. Returns
/// the saved paths.
pub fn render_summary_figures(table: &AggregateTable, setting: &Setting) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for (detector, descriptors) in table.iter() {
        let summaries = summarize(descriptors);
        info!("{} detector:", detector);
        for s in &summaries {
            info!("  {}", s);
        }

        for figure in vec![
            mean_points_figure(detector, &summaries),
            computing_times_figure(detector, &summaries),
        ] {
            let path = setting.figure_path(&figure.name);
            figure.save(&path)?;
            paths.push(path);
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{Measurement, Millis};

    fn bundle(times: &[f64]) -> SeriesBundle {
        let mut bundle = SeriesBundle::default();
        for (i, &t) in times.iter().enumerate() {
            bundle.push(Measurement {
                detector: "BRISK".into(),
                descriptor: "FREAK".into(),
                matcher: "MAT_BF".into(),
                total: 2700 + i,
                vehicle: 270 + i,
                matches: 200,
                detector_time: Millis::from(t * 10.0),
                descriptor_time: Millis::from(t),
            });
        }
        bundle
    }

    #[test]
    fn means_round_times() {
        let s = DescriptorSummary::from_bundle("FREAK", &bundle(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(s.descriptor, "FREAK");
        assert_eq!(s.total, 2701.0);
        assert_eq!(s.vehicle, 271.0);
        assert_eq!(s.matches, 200.0);
        assert_eq!(s.detector_time, 20.0);
        assert_eq!(s.descriptor_time, 2.0);

        let s = DescriptorSummary::from_bundle("FREAK", &bundle(&[1.111, 1.113])).unwrap();
        assert_eq!(s.descriptor_time, 1.11);
        assert_eq!(s.detector_time, 11.12);
    }

    #[test]
    fn empty_bundle_has_no_summary() {
        assert!(DescriptorSummary::from_bundle("ORB", &SeriesBundle::default()).is_none());
    }

    #[test]
    fn figures_have_one_bar_group_per_descriptor() {
        let mut descriptors = DescriptorTable::new();
        descriptors.insert("BRIEF".to_string(), bundle(&[1.0]));
        descriptors.insert("FREAK".to_string(), bundle(&[2.0]));
        let summaries = summarize(&descriptors);

        let points = mean_points_figure("BRISK", &summaries);
        assert_eq!(points.name, "mean_points_BRISK");
        let panel = &points.panels()[0];
        assert_eq!(panel.categories, vec!["BRIEF".to_string(), "FREAK".to_string()]);
        assert_eq!(panel.series.len(), 3);
        assert!(panel.legend && panel.annotate);
        assert_eq!(panel.y_label, "Mean number of points");

        let times = computing_times_figure("BRISK", &summaries);
        assert_eq!(times.name, "computing_times_BRISK");
        assert_eq!(times.panels()[0].series[1].values, vec![1.0, 2.0]);
    }

    #[test]
    fn summary_line_is_readable() {
        let s = DescriptorSummary::from_bundle("FREAK", &bundle(&[1.0])).unwrap();
        let line = s.to_string();
        assert!(line.contains("FREAK"));
        assert!(line.contains("descriptor    1.00 ms"));
    }
}

//! Per-detector figures of the per-image series.

use super::aggregate::{AggregateTable, DescriptorTable};
use super::chart::{color, Figure, Panel, Series};
use super::setting::Setting;
use super::utils::{mean, to_f64};
use crate::errors::*;
use std::path::PathBuf;

/// Match counts without the first image, which has no previous frame to
/// match against.
pub fn matches_after_first(matches: &[usize]) -> Vec<f64> {
    matches.iter().skip(1).map(|&m| m as f64).collect()
}

/// Mean over the descriptors of each image's value.
pub fn per_image_mean(series: &[&[f64]]) -> Vec<f64> {
    let images = series.iter().map(|s| s.len()).max().unwrap_or(0);
    (0..images)
        .filter_map(|i| mean(series.iter().filter_map(|s| s.get(i).cloned())))
        .collect()
}

/// Keypoints per image, total on the left axis and on the vehicle on the
/// right. The detector finds the same keypoints whatever the descriptor, so
/// the first descriptor's series stand for all of them.
fn points_panel(detector: &str, descriptors: &DescriptorTable) -> Panel {
    let mut panel = Panel::lines(format!("{} detector", detector))
        .with_x_label("Image")
        .with_y_label("Number of points detected in image")
        .with_right_label("Number of points detected on vehicle");
    if let Some(bundle) = descriptors.values().next() {
        panel.push(Series::new("total", to_f64(bundle.total()), color(3)));
        panel.push(Series::new("vehicle", to_f64(bundle.vehicle()), color(0)).on_right());
    }
    panel
}

fn detector_time_panel(detector: &str, descriptors: &DescriptorTable) -> Panel {
    let times = descriptors
        .values()
        .map(|b| b.detector_time())
        .collect::<Vec<_>>();
    let mut panel = Panel::lines(format!("{} detector time", detector))
        .with_x_label("Image")
        .with_y_label("Average time of the detector [ms]");
    panel.push(Series::new("detector time [ms]", per_image_mean(&times), color(0)));
    panel
}

fn descriptor_time_panel(detector: &str, descriptors: &DescriptorTable) -> Panel {
    let means = descriptors
        .values()
        .map(|b| mean(b.descriptor_time().iter().cloned()).unwrap_or(::std::f64::NAN))
        .collect::<Vec<_>>();
    let mut panel = Panel::lines(format!("Average descriptor time with {} detector", detector))
        .with_categories(descriptors.keys().cloned().collect())
        .with_y_label("Average time of the descriptor [ms]");
    panel.push(Series::new("descriptor time [ms]", means, color(0)));
    panel
}

fn matches_panel(detector: &str, descriptors: &DescriptorTable) -> Panel {
    let title = format!("Matched points with {} detector\nNote: First image skipped", detector);
    let mut panel = Panel::lines(title)
        .with_x_label("Image")
        .with_y_label("Matched points")
        .with_legend();
    for (j, (descriptor, bundle)) in descriptors.iter().enumerate() {
        let series = Series::new(descriptor.as_str(), matches_after_first(bundle.matches()), color(j));
        panel.push(series.starting_at(1));
    }
    panel
}

/// The 2x2 figure of one detector: keypoints, detector time, descriptor time
/// and matches.
pub fn detector_figure(detector: &str, descriptors: &DescriptorTable) -> Figure {
    let mut figure = Figure::new(detector, 2, 2);
    figure.push(points_panel(detector, descriptors));
    figure.push(detector_time_panel(detector, descriptors));
    figure.push(descriptor_time_panel(detector, descriptors));
    figure.push(matches_panel(detector, descriptors));
    figure
}

/// Saves `<results_dir>/<DETECTOR>.png` for every detector and returns the
/// paths.
pub fn render_detector_figures(table: &AggregateTable, setting: &Setting) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for (detector, descriptors) in table.iter() {
        let path = setting.figure_path(detector);
        detector_figure(detector, descriptors).save(&path)?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Axis;
    use crate::measurement::{Measurement, Millis};

    fn table() -> AggregateTable {
        let mut table = AggregateTable::default();
        for (descriptor, scale) in &[("BRISK", 1.0), ("ORB", 3.0)] {
            for i in 0..5 {
                table.add(Measurement {
                    detector: "FAST".into(),
                    descriptor: descriptor.to_string(),
                    matcher: "MAT_BF".into(),
                    total: 100 + i,
                    vehicle: 10 + i,
                    matches: 50 + i * 10,
                    detector_time: Millis::from(i as f64 * *scale),
                    descriptor_time: Millis::from(*scale),
                });
            }
        }
        table
    }

    #[test]
    fn match_series_skips_first_image() {
        let plotted = matches_after_first(&[7, 1, 2, 3, 4]);
        assert_eq!(plotted, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(matches_after_first(&[]).is_empty());
    }

    #[test]
    fn per_image_mean_tolerates_ragged_series() {
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 4.0];
        assert_eq!(per_image_mean(&[&a, &b]), vec![2.0, 3.0, 3.0]);
        assert!(per_image_mean(&[]).is_empty());
    }

    #[test]
    fn detector_figure_layout() {
        let table = table();
        let figure = detector_figure("FAST", table.descriptors("FAST").unwrap());
        let panels = figure.panels();
        assert_eq!(panels.len(), 4);

        // keypoints: total left, vehicle right, not skipped
        assert_eq!(panels[0].series[0].values.len(), 5);
        assert_eq!(panels[0].series[1].axis, Axis::Right);

        // detector time averaged over descriptors per image
        assert_eq!(panels[1].series[0].values, vec![0.0, 2.0, 4.0, 6.0, 8.0]);

        // one descriptor time point per descriptor
        assert_eq!(panels[2].categories, vec!["BRISK".to_string(), "ORB".to_string()]);
        assert_eq!(panels[2].series[0].values, vec![1.0, 3.0]);

        // matches skip index 0 but keep order and x position
        for s in &panels[3].series {
            assert_eq!(s.values, vec![60.0, 70.0, 80.0, 90.0]);
            assert_eq!(s.offset, 1);
        }
        let legend = panels[3].series.iter().map(|s| s.label.as_str()).collect::<Vec<_>>();
        assert_eq!(legend, vec!["BRISK", "ORB"]);
        assert!(panels[3].legend);
        assert!(panels[3].title.ends_with("Note: First image skipped"));

        // only the descriptor panels carry a legend
        assert!(!panels[0].legend && !panels[1].legend && !panels[2].legend);
        assert_eq!(panels[0].x_label, "Image");
        assert_eq!(panels[0].right_label, "Number of points detected on vehicle");
        assert_eq!(panels[2].y_label, "Average time of the descriptor [ms]");
    }

    #[test]
    fn renders_one_file_per_detector() {
        let dir = ::std::env::temp_dir().join(format!("featurebench-plots-{}", ::std::process::id()));
        let mut setting = Setting::default();
        setting.results_dir = dir.to_string_lossy().into_owned();

        let paths = render_detector_figures(&table(), &setting).unwrap();
        assert_eq!(paths, vec![dir.join("FAST.png")]);
        assert!(paths[0].exists());
        ::std::fs::remove_dir_all(&dir).unwrap();
    }
}

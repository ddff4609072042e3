//! Featurebench: sweeps an external keypoint detector/descriptor benchmark and
//! reports the results.
//!
//! The benchmark binary is run once for every (detector, descriptor) pair. The
//! lines it prints are parsed into [Measurement](struct.Measurement.html)s,
//! folded into an [AggregateTable](struct.AggregateTable.html) and finally
//! exported as a CSV report and a set of PNG figures.
//!
//! ```text
//! Runner (Trial per pair) => AggregateTable => CSV report
//!                                           => detector figures
//!                                           => summary figures
//! ```
#![recursion_limit = "1024"]
#![deny(missing_docs)]

extern crate ab_glyph;
extern crate average;
extern crate chrono;
extern crate csv;
extern crate env_logger;
#[macro_use]
extern crate error_chain;
extern crate image;
extern crate imageproc;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate toml;

#[allow(missing_docs)]
pub mod errors;

mod measurement;
pub use measurement::{Measurement, Millis, ResultLine};

mod runner;
pub use runner::{Benchmark, Outcome, ProcessBenchmark, Runner, Transcript, Trial};

mod aggregate;
pub use aggregate::{AggregateTable, DescriptorTable, NamedMap, SeriesBundle};

mod report;
pub use report::{export_csv, write_csv};

pub mod chart;
pub use chart::show_figures;

mod plots;
pub use plots::{detector_figure, render_detector_figures};

mod summary;
pub use summary::{DescriptorSummary, render_summary_figures, summarize};

mod setting;
pub use setting::Setting;

mod logger;
pub use logger::init_logger;

mod utils;

/// Keypoint detectors known to the benchmark.
pub const DETECTORS: [&str; 7] = ["SHITOMASI", "HARRIS", "FAST", "BRISK", "ORB", "AKAZE", "SIFT"];

/// Keypoint descriptors known to the benchmark.
pub const DESCRIPTORS: [&str; 6] = ["BRISK", "BRIEF", "ORB", "FREAK", "AKAZE", "SIFT"];

/// Whether the benchmark opens its visualization window. Keep it off for
/// sweeps; with it on every image waits for a key press.
pub const VISIBLE: bool = false;

/// Returns every (detector, descriptor) pair, detector major.
pub fn all_combinations() -> Vec<(&'static str, &'static str)> {
    iproduct!(DETECTORS.iter(), DESCRIPTORS.iter())
        .map(|(&detector, &descriptor)| (detector, descriptor))
        .collect::<Vec<_>>()
}

/// Runs the benchmark over every combination, echoes the transcript and
/// aggregates it.
pub fn collect(setting: &Setting) -> AggregateTable {
    print!("Computing...");
    let mut runner = Runner::new(ProcessBenchmark::new(setting, VISIBLE));
    let trials = runner.sweep(&all_combinations());

    println!("\nResults:");
    for line in trials.iter().flat_map(|t| t.lines()) {
        println!("{}", line);
    }

    println!("\nProcessing data:");
    AggregateTable::from_trials(&trials)
}

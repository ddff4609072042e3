//! Drives the external benchmark over detector/descriptor pairs.
//!
//! Pairs run strictly one after another: the benchmark owns a display window
//! when visualization is on, so two instances must never overlap.

use super::measurement::{Measurement, ResultLine};
use super::setting::Setting;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Command;

/// What a finished benchmark process left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Exit code zero.
    pub success: bool,

    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,

    /// Everything written to stdout.
    pub stdout: String,
}

/// The seam between the sweep and the benchmark executable.
pub trait Benchmark {
    /// Runs the benchmark for one pair and blocks until it exits. An `Err`
    /// means the process could not be started at all.
    fn run(&mut self, detector: &str, descriptor: &str) -> io::Result<Transcript>;
}

/// Runs the benchmark as a child process.
#[derive(Debug, Clone)]
pub struct ProcessBenchmark {
    executable: PathBuf,
    build_dir: PathBuf,
    visible: bool,
}

impl ProcessBenchmark {
    /// Creates a `ProcessBenchmark` for the executable named in `setting`.
    pub fn new(setting: &Setting, visible: bool) -> Self {
        ProcessBenchmark {
            executable: PathBuf::from(&setting.executable),
            build_dir: PathBuf::from(&setting.build_dir),
            visible: visible,
        }
    }
}

impl Benchmark for ProcessBenchmark {
    fn run(&mut self, detector: &str, descriptor: &str) -> io::Result<Transcript> {
        let visible = if self.visible { "true" } else { "false" };
        trace!(
            "spawning {:?} {} {} {} in {:?}",
            self.executable,
            visible,
            detector,
            descriptor,
            self.build_dir
        );

        let output = Command::new(&self.executable)
            .arg(visible)
            .arg(detector)
            .arg(descriptor)
            .current_dir(&self.build_dir)
            .output()?;

        if !output.stderr.is_empty() {
            debug!(
                "{}/{} stderr: {}",
                detector,
                descriptor,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        Ok(Transcript {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// How a single benchmark run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The benchmark exited successfully; holds its result lines in order.
    Completed(Vec<String>),

    /// The benchmark ran but exited with an error (usually an unsupported
    /// detector/descriptor combination).
    ExitFailed(Option<i32>),

    /// The benchmark could not be started.
    SpawnFailed(String),
}

/// One (detector, descriptor) execution attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    /// Keypoint detector.
    pub detector: String,

    /// Keypoint descriptor.
    pub descriptor: String,

    /// How the run ended.
    pub outcome: Outcome,
}

impl Trial {
    /// Whether the run produced measurements.
    pub fn is_valid(&self) -> bool {
        match self.outcome {
            Outcome::Completed(_) => true,
            _ => false,
        }
    }

    /// Renders the trial as transcript lines: the result lines for a
    /// completed run, the invalid-combination sentinel for a failed one and
    /// nothing when the process never started.
    pub fn lines(&self) -> Vec<String> {
        match self.outcome {
            Outcome::Completed(ref lines) => lines.clone(),
            Outcome::ExitFailed(_) => vec![ResultLine::sentinel(&self.detector, &self.descriptor)],
            Outcome::SpawnFailed(_) => Vec::new(),
        }
    }
}

/// Runs a `Benchmark` for every requested pair.
pub struct Runner<B> {
    benchmark: B,
}

impl<B: Benchmark> Runner<B> {
    /// Creates a new `Runner`.
    pub fn new(benchmark: B) -> Self {
        Runner { benchmark: benchmark }
    }

    /// Runs one pair. Never fails: process errors become the trial's outcome.
    pub fn run_pair(&mut self, detector: &str, descriptor: &str) -> Trial {
        let outcome = match self.benchmark.run(detector, descriptor) {
            Ok(ref transcript) if transcript.success => {
                let lines = transcript
                    .stdout
                    .lines()
                    .filter(|line| Measurement::is_result_line(line))
                    .map(String::from)
                    .collect::<Vec<_>>();
                debug!("{}/{}: {} result lines", detector, descriptor, lines.len());
                Outcome::Completed(lines)
            }
            Ok(transcript) => {
                debug!("{}/{}: exit code {:?}", detector, descriptor, transcript.code);
                Outcome::ExitFailed(transcript.code)
            }
            Err(e) => {
                debug!("{}/{}: failed to start benchmark: {}", detector, descriptor, e);
                Outcome::SpawnFailed(e.to_string())
            }
        };

        Trial {
            detector: detector.to_string(),
            descriptor: descriptor.to_string(),
            outcome: outcome,
        }
    }

    /// Runs every pair in order, printing a dot per attempt.
    pub fn sweep(&mut self, pairs: &[(&str, &str)]) -> Vec<Trial> {
        let mut trials = Vec::with_capacity(pairs.len());
        for &(detector, descriptor) in pairs {
            trials.push(self.run_pair(detector, descriptor));
            print!(".");
            let _ = io::stdout().flush();
        }

        let failed = trials.iter().filter(|t| !t.is_valid()).count();
        info!("swept {} pairs, {} without results", trials.len(), failed);
        trials
    }

    /// Gives the benchmark back.
    pub fn into_inner(self) -> B {
        self.benchmark
    }
}

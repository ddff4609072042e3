//! Where the benchmark lives and where reports go, in TOML.
//!
//! ```toml
//! build_dir = "./build"
//! executable = "./2D_feature_tracking"
//! results_dir = "./results"
//! report_name = "task8_9"
//! viewer = "xdg-open"
//! ```
//!
//! Every key is optional.

use crate::errors::*;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// The sweep setting.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Setting {
    /// Working directory of the benchmark process.
    pub build_dir: String,

    /// Benchmark executable, relative to `build_dir` unless absolute.
    pub executable: String,

    /// Directory receiving the CSV report and the figures.
    pub results_dir: String,

    /// File stem of the CSV report.
    pub report_name: String,

    /// Program used to display the figures once they are saved.
    pub viewer: Option<String>,
}

impl Default for Setting {
    fn default() -> Setting {
        Setting {
            build_dir: "./build".to_string(),
            executable: "./2D_feature_tracking".to_string(),
            results_dir: "./results".to_string(),
            report_name: "task8_9".to_string(),
            viewer: None,
        }
    }
}

impl Setting {
    /// Initialize from a file.
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Setting> {
        let errmsg = format!("{}", path.as_ref().display());
        let mut file = File::open(path).chain_err(|| ErrorKind::Setting(errmsg.clone()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .chain_err(|| ErrorKind::Setting(errmsg.clone()))?;
        Setting::parse(&contents).chain_err(|| ErrorKind::Setting(errmsg))
    }

    /// Parses a setting from TOML text.
    pub fn parse(contents: &str) -> Result<Setting> {
        Ok(toml::from_str(contents)?)
    }

    /// Path of the CSV report.
    pub fn report_path(&self) -> PathBuf {
        self.figure_dir().join(format!("{}.csv", self.report_name))
    }

    /// Path of a figure named `name`.
    pub fn figure_path(&self, name: &str) -> PathBuf {
        self.figure_dir().join(format!("{}.png", name))
    }

    fn figure_dir(&self) -> &Path {
        Path::new(&self.results_dir)
    }
}

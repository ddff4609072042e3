//! Runs the benchmark for every detector/descriptor pair and charts the mean
//! keypoints, matches and processing times of each descriptor.

extern crate featurebench;
#[macro_use]
extern crate log;
extern crate structopt;

use featurebench::errors::*;
use featurebench::*;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "summary")]
#[structopt(about = "Benchmark every detector/descriptor pair and chart the means")]
struct Opt {
    /// TOML file overriding the default paths.
    #[structopt(short = "s", long = "setting")]
    setting_path: Option<String>,

    /// Do not open the figures once they are saved.
    #[structopt(long = "no-show")]
    no_show: bool,
}

fn main() {
    if let Err(ref e) = run() {
        println!("error: {}", e);
        for e in e.iter().skip(1) {
            println!("caused by: {}", e);
        }
        ::std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let opt = Opt::from_args();
    init_logger()?;
    debug!("{:?}", opt);

    let setting = match opt.setting_path {
        Some(ref path) => Setting::init(path)?,
        None => Setting::default(),
    };

    let table = collect(&setting);

    println!("\nPlotting fancy plots:");
    let figures = render_summary_figures(&table, &setting)?;
    if !opt.no_show {
        show_figures(&figures, setting.viewer.as_deref());
    }

    println!("Finished");
    Ok(())
}

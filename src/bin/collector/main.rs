//! Runs the benchmark for every detector/descriptor pair, writes the per-image
//! CSV report and one four-panel figure per detector.

extern crate featurebench;
#[macro_use]
extern crate log;
extern crate structopt;

use featurebench::errors::*;
use featurebench::*;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "collector")]
#[structopt(about = "Benchmark every detector/descriptor pair and report per image")]
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

        // The backtrace is not always generated. Run with
        // `RUST_BACKTRACE=1` to get one.
        if let Some(backtrace) = e.backtrace() {
            println!("backtrace: {:?}", backtrace);
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

    println!("\nExporting data");
    export_csv(&table, &setting)?;

    println!("\nPlotting fancy plots:");
    let figures = render_detector_figures(&table, &setting)?;
    if !opt.no_show {
        show_figures(&figures, setting.viewer.as_deref());
    }

    println!("Finished");
    Ok(())
}

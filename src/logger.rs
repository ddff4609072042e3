//! Log output for the binaries.

use crate::errors::*;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Installs an `env_logger` that prefixes every record with a UTC timestamp,
/// its level and module. `RUST_LOG` overrides the default `info` filter.
pub fn init_logger() -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.format(|buf, record| {
        let t = chrono::Utc::now();
        writeln!(
            buf,
            "{} {}:{}: {}",
            t.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.module_path().unwrap_or("?"),
            record.args()
        )
    });

    match env::var("RUST_LOG") {
        Ok(filters) => builder.parse_filters(&filters),
        Err(_) => builder.filter_level(LevelFilter::Info),
    };

    builder.try_init().chain_err(|| "a logger is already installed")
}

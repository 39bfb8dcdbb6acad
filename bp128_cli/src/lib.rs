//! Pieces shared by the `bp128` and `bp128-demo` binaries.

use std::io::Write;

use log::LevelFilter;

/// Install the `[LEVEL] message` logger at `level`. `RUST_LOG` overrides it.
pub fn init_logging(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_default_env();
    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    builder.init();
}

/// Map a `-v` count to a level: warn, info, debug, then trace.
pub fn verbosity_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

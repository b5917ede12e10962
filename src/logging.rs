use env_logger::{Builder, Env};
use log::LevelFilter;

/// Sets up the global logger. `RUST_LOG` overrides the default filter, which
/// shows this crate at info (debug with `verbose`) and everything else at warn.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let filter = format!("warn,{}={level}", env!("CARGO_CRATE_NAME"));

    let mut builder = Builder::from_env(Env::default().default_filter_or(filter));
    builder.format_timestamp_millis();
    // already initialised
    let _ = builder.try_init();
}

/// Tracing setup.
///
/// The renderer owns the terminal, so log lines go to the file named by
/// `OVERWORLD_LOG` and are dropped otherwise. `RUST_LOG` picks the
/// filter, defaulting to `info`.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_ENV_VAR: &str = "OVERWORLD_LOG";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match std::env::var_os(LOG_FILE_ENV_VAR) {
        Some(path) => match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
            Err(e) => {
                eprintln!("cannot open log file {}: {e}", path.to_string_lossy());
                BoxMakeWriter::new(io::sink)
            }
        },
        None => BoxMakeWriter::new(io::sink),
    };

    // A subscriber may already be installed (e.g. under a test harness).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .compact()
        .try_init();
}

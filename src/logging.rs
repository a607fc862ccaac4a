use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Builder, Env, Target};

use crate::app_dirs::AppDirs;

/// Send log output to `path`, filtered by `RUST_LOG` (default `info`).
///
/// The experiment owns the terminal, so nothing may go to stderr while it runs.
pub fn init_file_logger(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    // a second init in the same process is harmless
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init();
    Ok(())
}

/// Log to the state directory. If the file cannot be opened the run goes on
/// without a logger and one line is printed before the terminal is taken over.
pub fn init_default() {
    if let Some(path) = AppDirs::log_path() {
        init_or_report(&path, &mut io::stderr());
    }
}

fn init_or_report<W: Write>(path: &Path, out: &mut W) {
    if let Err(e) = init_file_logger(path) {
        let _ = writeln!(out, "logging disabled, cannot open {}: {e}", path.display());
    }
}

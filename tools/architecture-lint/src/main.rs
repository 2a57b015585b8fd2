//! Lint the layer boundaries of the portal client.
//!
//! Usage: `architecture-lint [CLIENT_DIR]`. The directory defaults to
//! `client`, relative to the working directory, and must contain `src/`.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let client_dir = env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("client"), PathBuf::from);
    match architecture_lint::lint_client_sources(&client_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr().lock(), "{}: {err}", client_dir.display());
            ExitCode::FAILURE
        }
    }
}

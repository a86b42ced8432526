// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Log file setup.
//!
//! The terminal is the display, so log output goes to a file instead of
//! stderr. The filter defaults to `info` and can be changed with `RUST_LOG`.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};

use crate::config::APP_NAME;

const LOG_FILE_NAME: &str = "disorganiser.log";

/// Default log file location, under the user's cache directory when one is
/// known and the working directory otherwise.
pub(crate) fn default_log_path() -> PathBuf {
    match dirs::cache_dir() {
        Some(dir) => dir.join(APP_NAME).join(LOG_FILE_NAME),
        None => PathBuf::from(LOG_FILE_NAME),
    }
}

/// Routes the `log` facade into an appending log file.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the file cannot
/// be opened.
pub(crate) fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();

    Ok(())
}
